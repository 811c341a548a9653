//! Catalog of model kinds available to module sources.

use std::collections::HashMap;
use std::sync::Arc;

use super::builtin::{InterpolatedKind, LinearKind};
use super::module::{ModelKind, ModelModule, ModuleError, ModuleSource};

/// Statically registered model kinds, keyed by name.
#[derive(Default)]
pub struct KindCatalog {
    kinds: HashMap<String, Arc<dyn ModelKind>>,
}

impl KindCatalog {
    /// Empty catalog. Most callers want [`KindCatalog::with_builtin`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the kinds shipped in this crate.
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(LinearKind);
        catalog.register(InterpolatedKind);
        catalog
    }

    /// Register a kind, returning the one it replaced.
    pub fn register<K: ModelKind + 'static>(&mut self, kind: K) -> Option<Arc<dyn ModelKind>> {
        self.kinds.insert(kind.name().to_string(), Arc::new(kind))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelKind>> {
        self.kinds.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Registered kind names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kinds.keys().cloned().collect();
        names.sort();
        names
    }

    /// Parse and compile module source text.
    pub fn compile(&self, text: &str) -> Result<(ModuleSource, Arc<dyn ModelModule>), ModuleError> {
        let source = ModuleSource::parse(text)?;
        let kind = self
            .get(&source.module.kind)
            .ok_or_else(|| ModuleError::UnknownKind(source.module.kind.clone()))?;
        let module = kind.compile(&source)?;
        Ok((source, module))
    }
}

impl std::fmt::Debug for KindCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KindCatalog").field("kinds", &self.names()).finish()
    }
}
