//! Converting legacy datafiles to the current container layout.

use pico_core::container::{decode_with_revision, encode, encode_with, Container, V1Codec};
use pico_core::models::{payload, KindCatalog};
use pico_core::{Converter, Pico, PicoError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MODULE: &str = r#"
[module]
kind = "linear"

[params]
inputs = ["a"]

[params.outputs.b]
weights = [[2.0]]
"#;

fn legacy_datafile(dir: &Path) -> (PathBuf, Container) {
    let (_, module) = KindCatalog::with_builtin().compile(MODULE).unwrap();
    let model = module.construct(&[]).unwrap();
    let container = Container::new(
        MODULE,
        "pico.datafiles.legacy0001",
        None,
        payload::encode_model(model.as_ref()).unwrap(),
    );
    let path = dir.join("cl.dat");
    std::fs::write(&path, encode_with(&V1Codec, &container).unwrap()).unwrap();
    (path, container)
}

#[test]
fn legacy_file_converted_next_to_original() {
    let dir = TempDir::new().unwrap();
    let (path, original) = legacy_datafile(dir.path());
    let original_bytes = std::fs::read(&path).unwrap();

    let converter = Converter::new().with_running_version("3.3.0".parse().unwrap());
    let report = converter.convert(&path, None).unwrap();

    assert_eq!(report.output_path, dir.path().join("cl_converted.dat"));
    assert_eq!(report.from_revision, 1);
    assert_eq!(report.to_revision, 2);
    assert!(report.version_stamped);
    assert!(!report.code_replaced);

    let (revision, converted) =
        decode_with_revision(&std::fs::read(&report.output_path).unwrap()).unwrap();
    assert_eq!(revision, 2);
    assert_eq!(converted.code, original.code);
    assert_eq!(converted.logical_name, original.logical_name);
    assert_eq!(converted.payload, original.payload);
    assert_eq!(converted.format_version.as_deref(), Some("3.3.0"));

    assert_eq!(std::fs::read(&path).unwrap(), original_bytes);
}

#[test]
fn converted_file_loads_without_warning() {
    let dir = TempDir::new().unwrap();
    let (path, _) = legacy_datafile(dir.path());
    let pico = Pico::default();

    let legacy = pico.load(&path).unwrap();
    assert_eq!(legacy.warnings().len(), 1);

    let converted = pico.convert(&path, None).unwrap();
    let loaded = pico.load(&converted).unwrap();
    assert!(loaded.warnings().is_empty());
    let out = loaded
        .evaluate(None, &[("a".to_string(), 1.5)].into_iter().collect())
        .unwrap();
    assert_eq!(out["b"], vec![3.0]);
}

#[test]
fn existing_version_is_preserved() {
    let dir = TempDir::new().unwrap();
    let container = Container::new(MODULE, "pico.datafiles.v", Some("3.1.4".into()), b"{}".to_vec());
    let path = dir.path().join("v.pico");
    std::fs::write(&path, encode(&container).unwrap()).unwrap();

    let report = Converter::new().with_suffix("_py3").convert(&path, None).unwrap();
    assert_eq!(report.output_path, dir.path().join("v_py3.pico"));
    assert!(!report.version_stamped);
    assert_eq!(report.format_version, "3.1.4");
}

#[test]
fn code_override_replaces_stored_code() {
    let dir = TempDir::new().unwrap();
    let (path, original) = legacy_datafile(dir.path());
    let replacement = MODULE.replace("weights = [[2.0]]", "weights = [[5.0]]");
    let code = dir.path().join("new.toml");
    std::fs::write(&code, &replacement).unwrap();

    let report = Converter::new().convert(&path, Some(&code)).unwrap();
    assert!(report.code_replaced);

    let (_, converted) = decode_with_revision(&std::fs::read(&report.output_path).unwrap()).unwrap();
    assert_eq!(converted.code, replacement);
    assert_eq!(converted.payload, original.payload);
}

#[test]
fn unreadable_inputs_fail_without_output() {
    let dir = TempDir::new().unwrap();
    let junk = dir.path().join("junk.dat");
    std::fs::write(&junk, b"PICO\x09\x00").unwrap();

    let err = Converter::new().convert(&junk, None).unwrap_err();
    assert!(matches!(err, PicoError::ContainerLoad { .. }));
    assert!(!dir.path().join("junk_converted.dat").exists());

    let (path, _) = legacy_datafile(dir.path());
    let err = Converter::new()
        .convert(&path, Some(Path::new("/nonexistent/code.toml")))
        .unwrap_err();
    assert!(matches!(err, PicoError::SourceRead { .. }));
    assert!(!dir.path().join("cl_converted.dat").exists());
}
