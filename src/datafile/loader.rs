//! Datafile loading: open, decode, materialize, version-check, restore.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn, Span};

use crate::container::{self, version, Container, FormatVersion, MappedContainer, VersionCheck};
use crate::error::{ContainerReadError, PicoError};
use crate::models::{
    payload, CantCompute, CodeSource, Inputs, KindCatalog, Materializer, NamespaceRegistry,
    Outputs, PicoModel, Provenance,
};
use crate::telemetry::{self, DatafileSpan, SpanExt};

/// Options for a single [`Loader::load`] call.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Log load steps and successful version checks at info level.
    pub verbose: bool,
    /// Module source to use instead of the code embedded in the datafile.
    pub override_code_path: Option<PathBuf>,
    /// Reject datafiles written by an incompatible library version.
    pub check_version: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            override_code_path: None,
            check_version: true,
        }
    }
}

impl LoadOptions {
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_code_path = Some(path.into());
        self
    }

    pub fn without_version_check(mut self) -> Self {
        self.check_version = false;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Non-fatal conditions observed while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// The datafile records no library version (legacy container).
    MissingVersion,
    /// The recorded version could not be parsed.
    UnparsableVersion(String),
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVersion => write!(
                f,
                "datafile does not record a PICO version; compatibility cannot be checked"
            ),
            Self::UnparsableVersion(raw) => write!(
                f,
                "datafile records an unreadable PICO version '{}'; compatibility cannot be checked",
                raw
            ),
        }
    }
}

/// A restored model together with where it came from.
pub struct LoadedModel {
    model: Box<dyn PicoModel>,
    provenance: Provenance,
    warnings: Vec<LoadWarning>,
}

impl LoadedModel {
    pub fn model(&self) -> &dyn PicoModel {
        self.model.as_ref()
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn into_model(self) -> Box<dyn PicoModel> {
        self.model
    }

    pub fn into_parts(self) -> (Box<dyn PicoModel>, Provenance, Vec<LoadWarning>) {
        (self.model, self.provenance, self.warnings)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.model.inputs()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.model.outputs()
    }

    /// Evaluate the restored model. [`CantCompute`] is passed through as is.
    pub fn evaluate(
        &self,
        outputs: Option<&[String]>,
        inputs: &Inputs,
    ) -> Result<Outputs, CantCompute> {
        self.model.evaluate(outputs, inputs)
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model", &self.model)
            .field("logical_name", &self.provenance.logical_name)
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Loads datafiles into models, materializing code into a shared registry.
#[derive(Debug, Clone)]
pub struct Loader {
    materializer: Materializer,
    registry: Arc<NamespaceRegistry>,
    running_version: FormatVersion,
}

impl Loader {
    pub fn new(catalog: Arc<KindCatalog>, registry: Arc<NamespaceRegistry>) -> Self {
        Self {
            materializer: Materializer::new(catalog),
            registry,
            running_version: FormatVersion::current(),
        }
    }

    /// Compare datafiles against `version` instead of this library's version.
    pub fn with_running_version(mut self, version: FormatVersion) -> Self {
        self.running_version = version;
        self
    }

    pub fn running_version(&self) -> &FormatVersion {
        &self.running_version
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// Load the datafile at `path`.
    pub fn load(&self, path: &Path, options: &LoadOptions) -> Result<LoadedModel, PicoError> {
        let span = DatafileSpan::new("load", path);
        let _enter = span.enter();

        let result = self.load_inner(path, options, &span);
        span.record_result(&result);
        telemetry::record_load(match &result {
            Ok(_) => "ok",
            Err(e) => e.category(),
        });
        result
    }

    fn load_inner(
        &self,
        path: &Path,
        options: &LoadOptions,
        span: &Span,
    ) -> Result<LoadedModel, PicoError> {
        if options.verbose {
            info!("Loading PICO datafile");
        }

        let (revision, container) = read_container(path)?;
        span.record("logical_name", container.logical_name.as_str());
        debug!(
            revision,
            code_bytes = container.code.len(),
            payload_bytes = container.payload_len(),
            "Decoded container"
        );

        let source = match &options.override_code_path {
            Some(override_path) => {
                if options.verbose {
                    info!(code = %override_path.display(), "Using override model code");
                }
                CodeSource::OverridePath(override_path)
            }
            None => CodeSource::Embedded(&container.code),
        };
        let unit = self
            .materializer
            .materialize(&container.logical_name, source, &self.registry)
            .map_err(|e| PicoError::CodeMaterialization {
                path: path.to_path_buf(),
                logical_name: container.logical_name.clone(),
                source: e,
            })?;

        let warnings = if options.check_version {
            self.check_version(path, &container, options.verbose)?
        } else {
            Vec::new()
        };

        let model = payload::restore_model(&unit, &container.payload).map_err(|e| {
            PicoError::PayloadSerialization {
                path: path.to_path_buf(),
                logical_name: container.logical_name.clone(),
                source: e,
            }
        })?;

        let provenance = Provenance {
            payload_bytes: container.payload_len(),
            logical_name: container.logical_name,
            format_version: container.format_version,
            container_revision: revision,
            code: container.code,
            code_origin: unit.origin().clone(),
            datafile: path.to_path_buf(),
            loaded_at: Utc::now(),
        };

        Ok(LoadedModel {
            model,
            provenance,
            warnings,
        })
    }

    fn check_version(
        &self,
        path: &Path,
        container: &Container,
        verbose: bool,
    ) -> Result<Vec<LoadWarning>, PicoError> {
        let warning = match version::check(&self.running_version, container.format_version.as_deref()) {
            VersionCheck::Compatible => {
                if verbose {
                    info!(
                        running = %self.running_version,
                        bundle = container.format_version.as_deref().unwrap_or_default(),
                        "PICO versions are compatible"
                    );
                }
                return Ok(Vec::new());
            }
            VersionCheck::Incompatible { running, bundle } => {
                return Err(PicoError::VersionIncompatible {
                    path: path.to_path_buf(),
                    running,
                    bundle,
                });
            }
            VersionCheck::Missing => LoadWarning::MissingVersion,
            VersionCheck::Unparsable(raw) => LoadWarning::UnparsableVersion(raw),
        };
        warn!(running = %self.running_version, "{}", warning);
        telemetry::record_version_warning();
        Ok(vec![warning])
    }
}

/// Map and decode the container at `path`, returning its layout revision.
pub(crate) fn read_container(path: &Path) -> Result<(u16, Container), PicoError> {
    let load_error = |source: ContainerReadError| PicoError::ContainerLoad {
        path: path.to_path_buf(),
        source,
    };
    let mapped = MappedContainer::open(path).map_err(|e| load_error(e.into()))?;
    container::decode_with_revision(mapped.as_bytes()).map_err(|e| load_error(e.into()))
}
