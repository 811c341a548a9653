//! Telemetry for PICO.
//!
//! Provides structured logging, operation spans and metrics counters.
//! All output is local (stderr or file); nothing is exported over the network.

mod counters;
mod logging;
mod spans;

pub use counters::{
    record_convert, record_create, record_load, record_materialization, record_version_warning,
};
pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use spans::{DatafileSpan, SpanExt};
