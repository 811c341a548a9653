//! Model module sources and the plugin seam that compiles them.
//!
//! Datafiles embed module source rather than native code. A module source is
//! a TOML document naming the model *kind* that implements it:
//!
//! ```toml
//! [module]
//! kind = "linear"
//! description = "toy CMB emulator"
//! entry_points = ["get_pico"]
//!
//! [params]
//! inputs = ["omega_b", "omega_c"]
//! ```
//!
//! A module exposes a single factory; `entry_points` names it and may not
//! list more than one.
//!
//! Kinds are statically registered [`ModelKind`] plugins. Compiling a source
//! yields a [`ModelModule`], the invocable unit that owns factory entry points
//! and knows how to restore its own payloads.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use super::contract::PicoModel;

/// Factory entry point used when a module does not list its own.
pub const DEFAULT_ENTRY_POINT: &str = "get_pico";

#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("cannot read module source '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid module source: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown model kind '{0}'")]
    UnknownKind(String),

    #[error("invalid module header: {0}")]
    InvalidHeader(String),

    #[error("invalid module params: {0}")]
    InvalidParams(String),

    #[error("module has no entry point '{0}'")]
    UnknownEntry(String),

    #[error("invalid construction arguments: {0}")]
    InvalidArgs(String),

    #[error("module cannot restore payload type '{0}'")]
    UnknownType(String),

    #[error("invalid model state: {0}")]
    InvalidState(String),

    #[error("model state (de)serialization failed: {0}")]
    State(#[from] serde_json::Error),
}

/// Parsed module source.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSource {
    pub module: ModuleHeader,
    #[serde(default)]
    pub params: toml::Table,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleHeader {
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_entry_points")]
    pub entry_points: Vec<String>,
}

fn default_entry_points() -> Vec<String> {
    vec![DEFAULT_ENTRY_POINT.to_string()]
}

impl ModuleSource {
    pub fn parse(text: &str) -> Result<Self, ModuleError> {
        let source: Self = toml::from_str(text)?;
        if source.module.entry_points.len() != 1 {
            return Err(ModuleError::InvalidHeader(format!(
                "exactly one entry point is required, got {:?}",
                source.module.entry_points
            )));
        }
        Ok(source)
    }

    /// Name of the module's factory.
    pub fn entry_point(&self) -> &str {
        self.module
            .entry_points
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ENTRY_POINT)
    }

    /// Deserialize the `[params]` table into a kind-specific type.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, ModuleError> {
        toml::Value::Table(self.params.clone())
            .try_into()
            .map_err(|e: toml::de::Error| ModuleError::InvalidParams(e.to_string()))
    }

    pub fn has_entry_point(&self, name: &str) -> bool {
        self.entry_point() == name
    }
}

/// A compiled module: the runtime unit behind a logical name.
pub trait ModelModule: Send + Sync {
    /// Build a fresh model from positional construction arguments.
    fn construct(&self, args: &[serde_json::Value]) -> Result<Box<dyn PicoModel>, ModuleError>;

    /// Rebuild a model from state previously produced by [`PicoModel::state`].
    fn restore(&self, type_tag: &str, state: serde_json::Value) -> Result<Box<dyn PicoModel>, ModuleError>;
}

/// A statically registered model implementation.
pub trait ModelKind: Send + Sync {
    /// Name referenced by `module.kind`.
    fn name(&self) -> &str;

    /// Validate a module source and produce its runtime unit.
    fn compile(&self, source: &ModuleSource) -> Result<Arc<dyn ModelModule>, ModuleError>;
}
