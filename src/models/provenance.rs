//! Provenance records attached to loaded models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use super::registry::CodeOrigin;

/// Container metadata (everything but the payload) for a loaded model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub logical_name: String,
    /// Version recorded in the datafile, if any.
    pub format_version: Option<String>,
    /// Container layout revision the datafile was stored with.
    pub container_revision: u16,
    /// Module source recorded in the datafile.
    pub code: String,
    pub code_origin: CodeOrigin,
    pub datafile: PathBuf,
    pub payload_bytes: usize,
    pub loaded_at: DateTime<Utc>,
}
