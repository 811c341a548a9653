//! PICO datafile runtime
//!
//! Bundles a model module together with a serialized instance of its state in
//! a single portable file (a "datafile"), and restores a live model from it
//! later without the original source files.
//!
//! # Layers
//!
//! - [`container`]: byte layout, version compatibility, atomic writes
//! - [`models`]: model contract, module kinds, materialization, payloads
//! - [`datafile`]: load, create and convert operations
//! - [`telemetry`]: structured logging, spans and counters
//!
//! # Trust
//!
//! Embedded module sources are declarative and only ever compiled by kinds
//! registered in a [`KindCatalog`]. A datafile can never introduce new
//! executable behavior, but its parameters are otherwise trusted.

pub mod cli;
pub mod config;
pub mod container;
pub mod datafile;
pub mod error;
pub mod models;
pub mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use datafile::{
    ConvertReport, Converter, CreateReport, Creator, LoadOptions, LoadWarning, LoadedModel, Loader,
};
pub use error::PicoError;
pub use models::{CantCompute, Inputs, KindCatalog, NamespaceRegistry, Outputs, PicoModel};

/// Version of this library, stamped into every datafile it writes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct PicoConfig {
    /// Default for [`LoadOptions::check_version`].
    pub check_version: bool,
    /// Default for [`LoadOptions::verbose`].
    pub verbose: bool,
    /// Entry point called to construct fresh models.
    pub factory_entry: String,
    /// Suffix appended to converted datafile names.
    pub converted_suffix: String,
}

impl Default for PicoConfig {
    fn default() -> Self {
        Self {
            check_version: true,
            verbose: false,
            factory_entry: models::DEFAULT_ENTRY_POINT.to_string(),
            converted_suffix: config::DEFAULT_CONVERTED_SUFFIX.to_string(),
        }
    }
}

impl From<&config::EnvConfig> for PicoConfig {
    fn from(env: &config::EnvConfig) -> Self {
        Self {
            check_version: env.check_version,
            verbose: env.verbose,
            factory_entry: env.factory_entry.clone(),
            converted_suffix: env.converted_suffix.clone(),
        }
    }
}

/// A PICO runtime: one kind catalog, one namespace registry.
///
/// Loads and creates through the same instance share materialized code.
pub struct Pico {
    pub config: PicoConfig,
    pub catalog: Arc<KindCatalog>,
    pub registry: Arc<NamespaceRegistry>,
    loader: Loader,
    creator: Creator,
    converter: Converter,
}

impl Pico {
    /// Create a runtime with the built-in model kinds.
    pub fn new(config: PicoConfig) -> Self {
        Self::with_catalog(config, KindCatalog::with_builtin())
    }

    /// Create a runtime resolving module kinds in `catalog`.
    pub fn with_catalog(config: PicoConfig, catalog: KindCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let registry = Arc::new(NamespaceRegistry::new());
        let loader = Loader::new(catalog.clone(), registry.clone());
        let creator =
            Creator::from_loader(loader.clone()).with_factory_entry(config.factory_entry.clone());
        let converter = Converter::new().with_suffix(config.converted_suffix.clone());

        Self {
            config,
            catalog,
            registry,
            loader,
            creator,
            converter,
        }
    }

    /// Load options seeded from this runtime's configuration.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            verbose: self.config.verbose,
            override_code_path: None,
            check_version: self.config.check_version,
        }
    }

    /// Load `path` with the configured defaults.
    pub fn load(&self, path: &Path) -> Result<LoadedModel, PicoError> {
        self.loader.load(path, &self.load_options())
    }

    pub fn load_with(&self, path: &Path, options: &LoadOptions) -> Result<LoadedModel, PicoError> {
        self.loader.load(path, options)
    }

    pub fn create(
        &self,
        code_source_path: &Path,
        output_path: &Path,
        args: &[serde_json::Value],
        reuse_from: Option<&Path>,
    ) -> Result<CreateReport, PicoError> {
        self.creator
            .create(code_source_path, output_path, args, reuse_from)
    }

    /// Convert `datafile` to the current layout, returning the new file's path.
    pub fn convert(&self, datafile: &Path, code_override: Option<&Path>) -> Result<PathBuf, PicoError> {
        self.converter
            .convert(datafile, code_override)
            .map(|report| report.output_path)
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn creator(&self) -> &Creator {
        &self.creator
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }
}

impl Default for Pico {
    fn default() -> Self {
        Self::new(PicoConfig::default())
    }
}
