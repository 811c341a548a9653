//! Rewriting datafiles into the current container layout.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use super::loader::read_container;
use crate::config::DEFAULT_CONVERTED_SUFFIX;
use crate::container::{self, write_atomic, Container, FormatVersion, CURRENT_REVISION};
use crate::error::PicoError;
use crate::telemetry::{self, DatafileSpan, SpanExt};

/// Summary of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertReport {
    pub source: PathBuf,
    pub output_path: PathBuf,
    pub logical_name: String,
    pub from_revision: u16,
    pub to_revision: u16,
    pub format_version: String,
    /// The source recorded no version and the running one was stamped.
    pub version_stamped: bool,
    pub code_replaced: bool,
}

/// `<stem><suffix>.<ext>` next to `datafile`.
pub fn converted_path(datafile: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(datafile.file_stem().unwrap_or_default());
    name.push(suffix);
    if let Some(ext) = datafile.extension() {
        name.push(".");
        name.push(ext);
    }
    datafile.with_file_name(name)
}

/// Re-encodes datafiles with the current container revision.
///
/// The logical name and payload are carried over byte for byte. The payload
/// is never deserialized, so conversion needs no code catalog.
#[derive(Debug, Clone)]
pub struct Converter {
    suffix: String,
    running_version: FormatVersion,
}

impl Default for Converter {
    fn default() -> Self {
        Self {
            suffix: DEFAULT_CONVERTED_SUFFIX.to_string(),
            running_version: FormatVersion::current(),
        }
    }
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Version stamped into datafiles that record none.
    pub fn with_running_version(mut self, version: FormatVersion) -> Self {
        self.running_version = version;
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Convert `datafile`, optionally replacing its code with the module
    /// source at `code_override`.
    pub fn convert(
        &self,
        datafile: &Path,
        code_override: Option<&Path>,
    ) -> Result<ConvertReport, PicoError> {
        let span = DatafileSpan::new("convert", datafile);
        let _enter = span.enter();

        let result = self.convert_inner(datafile, code_override, &span);
        span.record_result(&result);
        telemetry::record_convert(match &result {
            Ok(_) => "ok",
            Err(e) => e.category(),
        });
        result
    }

    fn convert_inner(
        &self,
        datafile: &Path,
        code_override: Option<&Path>,
        span: &tracing::Span,
    ) -> Result<ConvertReport, PicoError> {
        if self.suffix.is_empty() {
            return Err(PicoError::InvalidArgument(
                "converted suffix must not be empty".to_string(),
            ));
        }
        let output_path = converted_path(datafile, &self.suffix);

        let (from_revision, original) = read_container(datafile)?;
        span.record("logical_name", original.logical_name.as_str());

        let code = match code_override {
            Some(path) => std::fs::read_to_string(path).map_err(|e| PicoError::SourceRead {
                path: path.to_path_buf(),
                source: e,
            })?,
            None => original.code,
        };
        let version_stamped = original.format_version.is_none();
        let format_version = original
            .format_version
            .unwrap_or_else(|| self.running_version.to_string());

        let converted = Container::new(
            code,
            original.logical_name,
            Some(format_version.clone()),
            original.payload,
        );
        let bytes = container::encode(&converted)?;

        info!(
            output = %output_path.display(),
            from_revision,
            to_revision = CURRENT_REVISION,
            "Writing converted PICO datafile"
        );
        write_atomic(&output_path, &bytes).map_err(|e| PicoError::ContainerWrite {
            path: output_path.clone(),
            source: e,
        })?;

        Ok(ConvertReport {
            source: datafile.to_path_buf(),
            output_path,
            logical_name: converted.logical_name,
            from_revision,
            to_revision: CURRENT_REVISION,
            format_version,
            version_stamped,
            code_replaced: code_override.is_some(),
        })
    }
}
