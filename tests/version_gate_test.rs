//! Version compatibility gate applied while loading datafiles.

use pico_core::container::{encode, encode_with, version, Container, FormatVersion, V1Codec};
use pico_core::models::{payload, KindCatalog, NamespaceRegistry};
use pico_core::{LoadOptions, LoadWarning, Loader, PicoError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const MODULE: &str = r#"
[module]
kind = "interpolated"

[params]
input = "t"
grid = [0.0, 1.0, 2.0]

[params.outputs]
flux = [[0.0], [10.0], [20.0]]
"#;

fn loader(running: &str) -> Loader {
    Loader::new(
        Arc::new(KindCatalog::with_builtin()),
        Arc::new(NamespaceRegistry::new()),
    )
    .with_running_version(running.parse().unwrap())
}

fn payload() -> Vec<u8> {
    let (_, module) = KindCatalog::with_builtin().compile(MODULE).unwrap();
    let model = module.construct(&[]).unwrap();
    payload::encode_model(model.as_ref()).unwrap()
}

fn write_bundle(dir: &Path, name: &str, bundle_version: Option<&str>) -> PathBuf {
    let container = Container::new(
        MODULE,
        format!("pico.datafiles.{}", name),
        bundle_version.map(String::from),
        payload(),
    );
    let bytes = match bundle_version {
        Some(_) => encode(&container).unwrap(),
        None => encode_with(&V1Codec, &container).unwrap(),
    };
    let path = dir.join(format!("{}.dat", name));
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn older_minor_bundle_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "v15", Some("1.5"));
    let loaded = loader("1.9").load(&path, &LoadOptions::default()).unwrap();
    assert!(loaded.warnings().is_empty());
    assert_eq!(loaded.provenance().format_version.as_deref(), Some("1.5"));
}

#[test]
fn newer_minor_bundle_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "v15", Some("1.5"));
    let err = loader("1.3").load(&path, &LoadOptions::default()).unwrap_err();
    match err {
        PicoError::VersionIncompatible { path: p, running, bundle } => {
            assert_eq!(p, path);
            assert_eq!(running, "1.3");
            assert_eq!(bundle, "1.5");
        }
        other => panic!("expected VersionIncompatible, got {other:?}"),
    }
}

#[test]
fn different_major_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "v15", Some("1.5"));
    let err = loader("2.0").load(&path, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, PicoError::VersionIncompatible { .. }));
    assert!(err.to_string().contains("check_version=false"));
}

#[test]
fn disabled_check_loads_anything() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "v15", Some("1.5"));
    let options = LoadOptions::default().without_version_check();
    let loaded = loader("2.0").load(&path, &options).unwrap();
    let out = loaded
        .evaluate(None, &[("t".to_string(), 0.5)].into_iter().collect())
        .unwrap();
    assert_eq!(out["flux"], vec![5.0]);
}

#[test]
fn missing_version_warns_and_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "legacy", None);
    let loaded = loader("1.9").load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.warnings(), &[LoadWarning::MissingVersion]);
    assert_eq!(loaded.provenance().format_version, None);
}

#[test]
fn unparsable_version_warns_and_loads() {
    let dir = TempDir::new().unwrap();
    let path = write_bundle(dir.path(), "odd", Some("1.x-beta"));
    let loaded = loader("1.9").load(&path, &LoadOptions::default()).unwrap();
    assert_eq!(
        loaded.warnings(),
        &[LoadWarning::UnparsableVersion("1.x-beta".to_string())]
    );
}

#[test]
fn comparator_rules() {
    let v = |s: &str| s.parse::<FormatVersion>().unwrap();
    assert!(version::is_compatible(&v("1.9"), &v("1.5")));
    assert!(version::is_compatible(&v("1.5.7"), &v("1.5.0")));
    assert!(!version::is_compatible(&v("1.3"), &v("1.5")));
    assert!(!version::is_compatible(&v("2.0"), &v("1.5")));
    assert!(version::is_compatible(&v("3"), &v("3.0")));
}
