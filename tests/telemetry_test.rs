//! Telemetry module tests for PICO.

use pico_core::telemetry::{
    record_convert, record_create, record_load, record_materialization, record_version_warning,
    DatafileSpan, LogConfig, LogError, LogFormat, SpanExt,
};
use metrics::{
    Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::Span;

// =============================================================================
// LogConfig Tests
// =============================================================================

#[test]
fn log_config_default_is_pretty_warn() {
    let config = LogConfig::default();
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.level, "warn");
    assert!(config.output_path.is_none());
}

#[test]
fn log_config_with_output_path() {
    let config = LogConfig {
        format: LogFormat::Json,
        level: "pico_core=debug".to_string(),
        output_path: Some(PathBuf::from("/tmp/pico.log")),
    };
    assert_eq!(config.output_path, Some(PathBuf::from("/tmp/pico.log")));
    assert_eq!(config.format.as_str(), "json");
}

// =============================================================================
// LogError Tests
// =============================================================================

#[test]
fn log_error_display() {
    let error = LogError::InvalidFilter("bad filter".to_string());
    assert!(error.to_string().contains("Invalid log filter"));
    assert!(error.to_string().contains("bad filter"));

    let error = LogError::FileOpen("permission denied".to_string());
    assert!(error.to_string().contains("permission denied"));

    assert!(LogError::AlreadyInitialized
        .to_string()
        .contains("already initialized"));
}

// =============================================================================
// Span Tests
// =============================================================================

#[test]
fn span_ext_record_result() {
    let span = Span::none();
    span.record_result(&Ok::<i32, &str>(42));
    span.record_result(&Err::<i32, &str>("test error"));
}

#[test]
fn datafile_span_enters_without_subscriber() {
    let span = DatafileSpan::new("load", Path::new("/data/cl.dat"));
    let _guard = span.enter();
    span.record("logical_name", "pico.datafiles.abc");
    span.record_result(&Ok::<(), String>(()));
}

// =============================================================================
// Counter Tests
// =============================================================================

/// Recorder that tallies counter increments by `name{label=value,...}`.
#[derive(Default)]
struct TallyRecorder {
    counts: Mutex<HashMap<String, Arc<Tally>>>,
}

#[derive(Default)]
struct Tally(AtomicU64);

impl CounterFn for Tally {
    fn increment(&self, value: u64) {
        self.0.fetch_add(value, Ordering::Relaxed);
    }

    fn absolute(&self, value: u64) {
        self.0.fetch_max(value, Ordering::Relaxed);
    }
}

impl TallyRecorder {
    fn get(&self, key: &str) -> u64 {
        self.counts
            .lock()
            .unwrap()
            .get(key)
            .map_or(0, |t| t.0.load(Ordering::Relaxed))
    }
}

impl Recorder for TallyRecorder {
    fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
    fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        let labels: Vec<String> = key
            .labels()
            .map(|l| format!("{}={}", l.key(), l.value()))
            .collect();
        let id = if labels.is_empty() {
            key.name().to_string()
        } else {
            format!("{}{{{}}}", key.name(), labels.join(","))
        };
        let tally = self.counts.lock().unwrap().entry(id).or_default().clone();
        Counter::from_arc(tally)
    }

    fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
        Gauge::noop()
    }

    fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

#[test]
fn counters_without_recorder_are_noops() {
    record_load("ok");
    record_version_warning();
}

#[test]
fn counters_are_labelled_by_outcome() {
    let recorder = TallyRecorder::default();
    metrics::with_local_recorder(&recorder, || {
        record_load("ok");
        record_load("ok");
        record_load("container_load");
        record_create("ok");
        record_convert("invalid_argument");
        for result in ["hit", "miss", "override", "hit"] {
            record_materialization(result);
        }
        record_version_warning();
    });

    assert_eq!(recorder.get("pico_datafile_loads_total{outcome=ok}"), 2);
    assert_eq!(recorder.get("pico_datafile_loads_total{outcome=container_load}"), 1);
    assert_eq!(recorder.get("pico_datafile_creates_total{outcome=ok}"), 1);
    assert_eq!(recorder.get("pico_datafile_conversions_total{outcome=invalid_argument}"), 1);
    assert_eq!(recorder.get("pico_materializations_total{result=hit}"), 2);
    assert_eq!(recorder.get("pico_materializations_total{result=override}"), 1);
    assert_eq!(recorder.get("pico_version_warnings_total"), 1);
}

#[test]
fn failed_load_is_counted_under_its_category() {
    let dir = tempfile::TempDir::new().unwrap();
    let missing = dir.path().join("absent.dat");
    let recorder = TallyRecorder::default();

    let result = metrics::with_local_recorder(&recorder, || pico_core::Pico::default().load(&missing));

    assert!(result.is_err());
    assert_eq!(recorder.get("pico_datafile_loads_total{outcome=container_load}"), 1);
    assert_eq!(recorder.get("pico_datafile_loads_total{outcome=ok}"), 0);
}
