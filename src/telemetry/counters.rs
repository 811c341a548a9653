//! Metrics facade for datafile operations.
//!
//! Counters go through the `metrics` crate; without an installed recorder
//! they are no-ops.

use metrics::counter;

/// Record a finished load, tagged `ok` or with the error category.
pub fn record_load(outcome: &'static str) {
    counter!("pico_datafile_loads_total", "outcome" => outcome).increment(1);
}

/// Record a finished create.
pub fn record_create(outcome: &'static str) {
    counter!("pico_datafile_creates_total", "outcome" => outcome).increment(1);
}

/// Record a finished conversion.
pub fn record_convert(outcome: &'static str) {
    counter!("pico_datafile_conversions_total", "outcome" => outcome).increment(1);
}

/// Record a materialization: `hit`, `miss` or `override`.
pub fn record_materialization(result: &'static str) {
    counter!("pico_materializations_total", "result" => result).increment(1);
}

/// Record a datafile loaded without a usable version.
pub fn record_version_warning() {
    counter!("pico_version_warnings_total").increment(1);
}
