//! Span utilities and extension traits for datafile operations.

use std::path::Path;
use tracing::{info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for standardized datafile operation spans.
pub struct DatafileSpan;

impl DatafileSpan {
    /// Span for one datafile operation (`load`, `create`, `convert`).
    ///
    /// `logical_name` is recorded once known; `status` and `error.message`
    /// are filled in by [`SpanExt::record_result`].
    pub fn new(operation: &'static str, path: &Path) -> Span {
        info_span!(
            "datafile",
            operation = operation,
            path = %path.display(),
            logical_name = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
