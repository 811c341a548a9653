//! Code materialization: module source in, registered code unit out.

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::catalog::KindCatalog;
use super::module::ModuleError;
use super::registry::{CodeOrigin, CodeUnit, NamespaceRegistry};
use crate::telemetry;

/// Where to take module source from.
#[derive(Debug, Clone, Copy)]
pub enum CodeSource<'a> {
    /// Source text carried by a datafile. Reuses an existing registration.
    Embedded(&'a str),
    /// Source file supplied by the caller. Always compiled fresh and replaces
    /// any existing registration.
    OverridePath(&'a Path),
}

/// Compiles module sources against a kind catalog.
#[derive(Debug, Clone)]
pub struct Materializer {
    catalog: Arc<KindCatalog>,
}

impl Materializer {
    pub fn new(catalog: Arc<KindCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &KindCatalog {
        &self.catalog
    }

    /// Materialize `source` under `logical_name` in `registry`.
    ///
    /// The registry lock is held from lookup to insert, so concurrent callers
    /// never compile the same embedded name twice. On failure the registry is
    /// left exactly as it was. Callers attach the datafile path to the error.
    pub fn materialize(
        &self,
        logical_name: &str,
        source: CodeSource<'_>,
        registry: &NamespaceRegistry,
    ) -> Result<Arc<CodeUnit>, ModuleError> {
        let mut units = registry.lock();

        let (text, origin) = match source {
            CodeSource::Embedded(text) => {
                if let Some(existing) = units.get(logical_name) {
                    debug!(logical_name = %logical_name, "Reusing materialized code unit");
                    telemetry::record_materialization("hit");
                    return Ok(existing.clone());
                }
                (text.to_string(), CodeOrigin::Embedded)
            }
            CodeSource::OverridePath(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ModuleError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                (text, CodeOrigin::Override(path.to_path_buf()))
            }
        };

        let (parsed, module) = self.catalog.compile(&text)?;

        let outcome = match origin {
            CodeOrigin::Embedded => "miss",
            CodeOrigin::Override(_) => "override",
        };
        let unit = Arc::new(CodeUnit::new(
            logical_name.to_string(),
            text,
            parsed,
            origin,
            module,
        ));
        if units.insert(logical_name.to_string(), unit.clone()).is_some() {
            info!(logical_name = %logical_name, "Replaced code unit from override source");
        } else {
            debug!(logical_name = %logical_name, kind = %unit.kind(), "Materialized code unit");
        }
        telemetry::record_materialization(outcome);
        Ok(unit)
    }
}
