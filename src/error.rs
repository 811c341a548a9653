//! Error types for PICO datafile operations.
//!
//! Every failure is fatal to the single call that produced it. The only
//! non-fatal condition (a datafile without a usable version) is reported as a
//! [`LoadWarning`](crate::datafile::LoadWarning), never as an error.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::container::FormatError;
use crate::models::{ModuleError, PayloadError};

/// Errors raised by the loader, creator and converter.
#[derive(Debug, Error)]
pub enum PicoError {
    #[error("Failed to open PICO datafile '{}': {source}", path.display())]
    ContainerLoad {
        path: PathBuf,
        #[source]
        source: ContainerReadError,
    },

    #[error("Malformed PICO container: {0}")]
    ContainerFormat(#[from] FormatError),

    #[error(
        "Error materializing PICO code '{logical_name}' for '{}': {source}",
        path.display()
    )]
    CodeMaterialization {
        path: PathBuf,
        logical_name: String,
        #[source]
        source: ModuleError,
    },

    #[error(
        "Your PICO version ({running}) and the PICO version used to create the datafile '{}' ({bundle}) are incompatible. Rerun with check_version=false to ignore this message.",
        path.display()
    )]
    VersionIncompatible {
        path: PathBuf,
        running: String,
        bundle: String,
    },

    #[error(
        "Failed to construct model '{logical_name}' from '{}': {source}",
        path.display()
    )]
    ModelConstruction {
        path: PathBuf,
        logical_name: String,
        #[source]
        source: ModuleError,
    },

    #[error(
        "Payload of '{logical_name}' in '{}' could not be (de)serialized: {source}",
        path.display()
    )]
    PayloadSerialization {
        path: PathBuf,
        logical_name: String,
        #[source]
        source: PayloadError,
    },

    #[error("Failed to read model source '{}': {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write PICO datafile '{}': {source}", path.display())]
    ContainerWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Underlying cause of a [`PicoError::ContainerLoad`].
#[derive(Debug, Error)]
pub enum ContainerReadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Format(#[from] FormatError),
}

impl PicoError {
    /// Short category label used in metrics and log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ContainerLoad { .. } => "container_load",
            Self::ContainerFormat(_) => "container_format",
            Self::CodeMaterialization { .. } => "code_materialization",
            Self::VersionIncompatible { .. } => "version_incompatible",
            Self::ModelConstruction { .. } => "model_construction",
            Self::PayloadSerialization { .. } => "payload_serialization",
            Self::SourceRead { .. } => "source_read",
            Self::ContainerWrite { .. } => "container_write",
            Self::InvalidArgument(_) => "invalid_argument",
        }
    }

    /// File involved in the failure: the datafile, or the model source
    /// being written into one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::ContainerLoad { path, .. }
            | Self::CodeMaterialization { path, .. }
            | Self::VersionIncompatible { path, .. }
            | Self::ModelConstruction { path, .. }
            | Self::PayloadSerialization { path, .. }
            | Self::SourceRead { path, .. }
            | Self::ContainerWrite { path, .. } => Some(path),
            Self::ContainerFormat(_) | Self::InvalidArgument(_) => None,
        }
    }

    /// Logical name involved in the failure, if known.
    pub fn logical_name(&self) -> Option<&str> {
        match self {
            Self::CodeMaterialization { logical_name, .. }
            | Self::ModelConstruction { logical_name, .. }
            | Self::PayloadSerialization { logical_name, .. } => Some(logical_name),
            _ => None,
        }
    }
}
