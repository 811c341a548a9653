//! Model management for PICO datafiles.
//!
//! Covers the model contract, module sources and the kinds that compile them,
//! the namespace registry, code materialization and the payload codec.

pub mod builtin;
pub mod payload;

mod catalog;
mod contract;
mod materialize;
mod module;
mod provenance;
mod registry;

pub use catalog::KindCatalog;
pub use contract::{select_outputs, require_input, CantCompute, Inputs, Outputs, PicoModel};
pub use materialize::{CodeSource, Materializer};
pub use module::{ModelKind, ModelModule, ModuleError, ModuleHeader, ModuleSource, DEFAULT_ENTRY_POINT};
pub use payload::{PayloadEnvelope, PayloadError, PAYLOAD_SCHEMA};
pub use provenance::Provenance;
pub use registry::{CodeOrigin, CodeUnit, NamespaceRegistry};
