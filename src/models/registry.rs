//! Namespace registry of materialized code units.
//!
//! The registry is an explicit object owned by the caller rather than
//! process-global state. Entries are never evicted: repeated loads of
//! datafiles sharing a logical name reuse a single materialization.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::contract::PicoModel;
use super::module::{ModelModule, ModuleError, ModuleSource};

/// Where a code unit's source text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum CodeOrigin {
    /// Code embedded in a datafile, or read for a freshly created one.
    Embedded,
    /// Code supplied through an explicit override path.
    Override(PathBuf),
}

/// A materialized module registered under a logical name.
pub struct CodeUnit {
    logical_name: String,
    source_text: String,
    source: ModuleSource,
    origin: CodeOrigin,
    module: Arc<dyn ModelModule>,
    materialized_at: DateTime<Utc>,
}

impl CodeUnit {
    pub(crate) fn new(
        logical_name: String,
        source_text: String,
        source: ModuleSource,
        origin: CodeOrigin,
        module: Arc<dyn ModelModule>,
    ) -> Self {
        Self {
            logical_name,
            source_text,
            source,
            origin,
            module,
            materialized_at: Utc::now(),
        }
    }

    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn source(&self) -> &ModuleSource {
        &self.source
    }

    pub fn kind(&self) -> &str {
        &self.source.module.kind
    }

    pub fn origin(&self) -> &CodeOrigin {
        &self.origin
    }

    pub fn materialized_at(&self) -> DateTime<Utc> {
        self.materialized_at
    }

    /// Invoke a declared factory entry point.
    pub fn call_entry(
        &self,
        entry: &str,
        args: &[serde_json::Value],
    ) -> Result<Box<dyn PicoModel>, ModuleError> {
        if !self.source.has_entry_point(entry) {
            return Err(ModuleError::UnknownEntry(entry.to_string()));
        }
        self.module.construct(args)
    }

    /// Restore a model of `type_tag` from its serialized state.
    pub fn restore(
        &self,
        type_tag: &str,
        state: serde_json::Value,
    ) -> Result<Box<dyn PicoModel>, ModuleError> {
        self.module.restore(type_tag, state)
    }
}

impl std::fmt::Debug for CodeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeUnit")
            .field("logical_name", &self.logical_name)
            .field("kind", &self.kind())
            .field("origin", &self.origin)
            .field("materialized_at", &self.materialized_at)
            .finish()
    }
}

/// Thread-safe mapping from logical name to code unit.
#[derive(Default)]
pub struct NamespaceRegistry {
    units: Mutex<HashMap<String, Arc<CodeUnit>>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, logical_name: &str) -> Option<Arc<CodeUnit>> {
        self.units.lock().get(logical_name).cloned()
    }

    pub fn contains(&self, logical_name: &str) -> bool {
        self.units.lock().contains_key(logical_name)
    }

    /// Number of registered units.
    pub fn count(&self) -> usize {
        self.units.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.lock().is_empty()
    }

    /// Registered logical names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.units.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Hold the registry lock for a check-then-insert sequence.
    pub(crate) fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<CodeUnit>>> {
        self.units.lock()
    }
}

impl std::fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceRegistry").field("names", &self.names()).finish()
    }
}
