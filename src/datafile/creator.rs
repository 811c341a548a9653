//! Datafile creation: build (or reuse) a model and persist it with its code.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::loader::{LoadOptions, Loader};
use crate::container::{self, write_atomic, Container, FormatVersion};
use crate::error::PicoError;
use crate::models::{
    payload, CodeSource, KindCatalog, NamespaceRegistry, PicoModel, DEFAULT_ENTRY_POINT,
};
use crate::telemetry::{self, DatafileSpan, SpanExt};

/// Prefix of every generated logical name.
pub const LOGICAL_NAME_PREFIX: &str = "pico.datafiles.";

const LOGICAL_NAME_HASH_CHARS: usize = 32;

static NAME_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Summary of a successful [`Creator::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReport {
    pub output_path: PathBuf,
    pub logical_name: String,
    pub format_version: String,
    /// Model taken from an existing datafile rather than constructed.
    pub reused: bool,
    pub bytes_written: usize,
}

/// Generate a fresh logical name for code at `code_source_path`.
///
/// The name hashes the absolute source path with the current time and a
/// process-wide sequence number, so repeated runs never collide.
pub fn generate_logical_name(code_source_path: &Path) -> String {
    let absolute = code_source_path
        .canonicalize()
        .unwrap_or_else(|_| code_source_path.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(absolute.to_string_lossy().as_bytes());
    hasher.update(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true).as_bytes());
    hasher.update(NAME_SEQUENCE.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}{}", LOGICAL_NAME_PREFIX, &digest[..LOGICAL_NAME_HASH_CHARS])
}

fn read_source(path: &Path) -> Result<String, PicoError> {
    std::fs::read_to_string(path).map_err(|e| PicoError::SourceRead {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes datafiles. Shares its registry with a [`Loader`] used in reuse mode.
#[derive(Debug, Clone)]
pub struct Creator {
    loader: Loader,
    factory_entry: String,
}

impl Creator {
    pub fn new(catalog: Arc<KindCatalog>, registry: Arc<NamespaceRegistry>) -> Self {
        Self::from_loader(Loader::new(catalog, registry))
    }

    pub fn from_loader(loader: Loader) -> Self {
        Self {
            loader,
            factory_entry: DEFAULT_ENTRY_POINT.to_string(),
        }
    }

    /// Entry point invoked to construct fresh models.
    pub fn with_factory_entry(mut self, entry: impl Into<String>) -> Self {
        self.factory_entry = entry.into();
        self
    }

    /// Stamp (and check reused datafiles against) `version`.
    pub fn with_running_version(mut self, version: FormatVersion) -> Self {
        self.loader = self.loader.with_running_version(version);
        self
    }

    pub fn factory_entry(&self) -> &str {
        &self.factory_entry
    }

    /// Create a datafile at `output_path` from the module at `code_source_path`.
    ///
    /// Without `reuse_from`, the code is materialized under a fresh logical
    /// name and its factory entry is called with `args`. With `reuse_from`,
    /// the model and logical name come from that datafile and `args` are
    /// ignored. Either way the stored code is the current contents of
    /// `code_source_path`. Nothing is written unless every step succeeds.
    pub fn create(
        &self,
        code_source_path: &Path,
        output_path: &Path,
        args: &[serde_json::Value],
        reuse_from: Option<&Path>,
    ) -> Result<CreateReport, PicoError> {
        let span = DatafileSpan::new("create", output_path);
        let _enter = span.enter();

        let result = self.create_inner(code_source_path, output_path, args, reuse_from, &span);
        span.record_result(&result);
        telemetry::record_create(match &result {
            Ok(_) => "ok",
            Err(e) => e.category(),
        });
        result
    }

    fn create_inner(
        &self,
        code_source_path: &Path,
        output_path: &Path,
        args: &[serde_json::Value],
        reuse_from: Option<&Path>,
        span: &tracing::Span,
    ) -> Result<CreateReport, PicoError> {
        info!(code = %code_source_path.display(), "Creating PICO datafile");

        let (model, logical_name, code) = match reuse_from {
            Some(existing) => {
                if !args.is_empty() {
                    warn!(count = args.len(), "Ignoring constructor arguments when reusing a model");
                }
                let loaded = self.loader.load(existing, &LoadOptions::default())?;
                let (model, provenance, _) = loaded.into_parts();
                (model, provenance.logical_name, read_source(code_source_path)?)
            }
            None => {
                let code = read_source(code_source_path)?;
                let logical_name = generate_logical_name(code_source_path);
                let model = self.construct(code_source_path, &logical_name, &code, args)?;
                (model, logical_name, code)
            }
        };
        span.record("logical_name", logical_name.as_str());

        let payload = payload::encode_model(model.as_ref()).map_err(|e| {
            PicoError::PayloadSerialization {
                path: code_source_path.to_path_buf(),
                logical_name: logical_name.clone(),
                source: e,
            }
        })?;

        let format_version = self.loader.running_version().to_string();
        let container = Container::new(code, logical_name, Some(format_version.clone()), payload);
        let bytes = container::encode(&container)?;

        info!(output = %output_path.display(), bytes = bytes.len(), "Saving PICO datafile");
        write_atomic(output_path, &bytes).map_err(|e| PicoError::ContainerWrite {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        Ok(CreateReport {
            output_path: output_path.to_path_buf(),
            logical_name: container.logical_name,
            format_version,
            reused: reuse_from.is_some(),
            bytes_written: bytes.len(),
        })
    }

    fn construct(
        &self,
        code_source_path: &Path,
        logical_name: &str,
        code: &str,
        args: &[serde_json::Value],
    ) -> Result<Box<dyn PicoModel>, PicoError> {
        let unit = self
            .loader
            .materializer()
            .materialize(logical_name, CodeSource::Embedded(code), self.loader.registry())
            .map_err(|e| PicoError::CodeMaterialization {
                path: code_source_path.to_path_buf(),
                logical_name: logical_name.to_string(),
                source: e,
            })?;
        unit.call_entry(&self.factory_entry, args)
            .map_err(|e| PicoError::ModelConstruction {
                path: code_source_path.to_path_buf(),
                logical_name: logical_name.to_string(),
                source: e,
            })
    }
}
