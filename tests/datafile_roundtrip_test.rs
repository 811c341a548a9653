//! Create → load round trips, reuse, override precedence and write atomicity.

use pico_core::container::decode;
use pico_core::models::{
    CantCompute, CodeOrigin, Inputs, KindCatalog, ModelKind, ModelModule, ModuleError,
    ModuleSource, Outputs, PicoModel,
};
use pico_core::{LoadOptions, Pico, PicoConfig, PicoError};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const LENS: &str = r#"
[module]
kind = "linear"
description = "toy lensing response"

[params]
inputs = ["z", "mass"]

[params.bounds]
z = [0.0, 5.0]

[params.outputs.shear]
weights = [[1.0, 0.5], [0.0, 2.0]]
bias = [0.1, 0.0]

[params.outputs.flux]
weights = [[3.0, 0.0]]
"#;

/// Same weights, tighter bounds on `z`.
const LENS_TIGHT: &str = r#"
[module]
kind = "linear"

[params]
inputs = ["z", "mass"]

[params.bounds]
z = [0.0, 1.0]

[params.outputs.shear]
weights = [[1.0, 0.5], [0.0, 2.0]]
bias = [0.1, 0.0]

[params.outputs.flux]
weights = [[3.0, 0.0]]
"#;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn inputs(z: f64, mass: f64) -> Inputs {
    Inputs::from([("z".to_string(), z), ("mass".to_string(), mass)])
}

#[test]
fn create_then_load_preserves_behavior() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let out = dir.path().join("lens.dat");

    // Construct the expected model directly from the module.
    let (_, module) = KindCatalog::with_builtin().compile(LENS).unwrap();
    let expected = module.construct(&[json!(2.0)]).unwrap();

    let creator = Pico::default();
    let report = creator.create(&code, &out, &[json!(2.0)], None).unwrap();

    // A fresh runtime has never seen the code; it must come from the datafile.
    std::fs::remove_file(&code).unwrap();
    let loader = Pico::default();
    let loaded = loader.load(&out).unwrap();

    assert_eq!(loaded.inputs(), expected.inputs());
    assert_eq!(loaded.outputs(), expected.outputs());
    for (z, mass) in [(0.0, 0.0), (1.0, 2.0), (4.5, -3.0)] {
        assert_eq!(
            loaded.evaluate(None, &inputs(z, mass)).unwrap(),
            expected.evaluate(None, &inputs(z, mass)).unwrap()
        );
    }

    let p = loaded.provenance();
    assert_eq!(p.logical_name, report.logical_name);
    assert_eq!(p.format_version.as_deref(), Some(pico_core::VERSION));
    assert_eq!(p.code, LENS);
    assert_eq!(p.code_origin, CodeOrigin::Embedded);
    assert!(loaded.warnings().is_empty());
}

#[test]
fn output_selection_and_cant_compute_propagate() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let out = dir.path().join("lens.dat");
    let pico = Pico::default();
    pico.create(&code, &out, &[], None).unwrap();
    let loaded = pico.load(&out).unwrap();

    let flux_only = vec!["flux".to_string()];
    let result: Outputs = loaded.evaluate(Some(flux_only.as_slice()), &inputs(1.0, 1.0)).unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["flux"]);
    assert_eq!(result["flux"], vec![3.0]);

    let err = loaded.evaluate(None, &inputs(9.0, 1.0)).unwrap_err();
    assert!(matches!(err, CantCompute::OutOfBounds { ref name, .. } if name == "z"));

    let missing = Inputs::from([("z".to_string(), 1.0)]);
    assert_eq!(
        loaded.evaluate(None, &missing).unwrap_err(),
        CantCompute::MissingInput("mass".to_string())
    );

    let unknown = vec!["nope".to_string()];
    assert!(matches!(
        loaded.evaluate(Some(unknown.as_slice()), &inputs(1.0, 1.0)),
        Err(CantCompute::UnknownOutput(_))
    ));
}

#[test]
fn override_code_wins_over_registered_embedded_code() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let tight = write(dir.path(), "tight.toml", LENS_TIGHT);
    let out = dir.path().join("lens.dat");

    let pico = Pico::default();
    pico.create(&code, &out, &[], None).unwrap();

    // Register the embedded code first.
    let embedded = pico.load(&out).unwrap();
    assert!(embedded.evaluate(None, &inputs(3.0, 0.0)).is_ok());

    let options = pico.load_options().with_override(&tight);
    let overridden = pico.load_with(&out, &options).unwrap();
    assert_eq!(
        overridden.provenance().code_origin,
        CodeOrigin::Override(tight.clone())
    );
    assert!(matches!(
        overridden.evaluate(None, &inputs(3.0, 0.0)),
        Err(CantCompute::OutOfBounds { .. })
    ));

    // The override replaced the registration for that logical name.
    let name = &overridden.provenance().logical_name;
    let unit = pico.registry.get(name).unwrap();
    assert_eq!(unit.source_text(), LENS_TIGHT);
}

#[test]
fn reuse_keeps_model_and_name_but_refreshes_code() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let first = dir.path().join("v1.dat");
    let second = dir.path().join("v2.dat");

    let pico = Pico::default();
    let original = pico.create(&code, &first, &[json!(4.0)], None).unwrap();

    std::fs::write(&code, LENS_TIGHT).unwrap();
    let reused = pico
        .create(&code, &second, &[json!(100.0)], Some(&first))
        .unwrap();
    assert!(reused.reused);
    assert_eq!(reused.logical_name, original.logical_name);

    let stored = decode(&std::fs::read(&second).unwrap()).unwrap();
    assert_eq!(stored.code, LENS_TIGHT);
    assert_eq!(stored.logical_name, original.logical_name);

    // Scale 4.0 survived; the ignored argument did not apply.
    let loaded = Pico::default().load(&second).unwrap();
    assert_eq!(loaded.evaluate(None, &inputs(0.5, 0.0)).unwrap()["flux"], vec![6.0]);
}

#[test]
fn configured_factory_entry_is_used() {
    let dir = TempDir::new().unwrap();
    let code = write(
        dir.path(),
        "entry.toml",
        &LENS.replace(
            "description = \"toy lensing response\"",
            "entry_points = [\"build_lens\"]",
        ),
    );
    let out = dir.path().join("entry.dat");

    let default_entry = Pico::default();
    let err = default_entry.create(&code, &out, &[], None).unwrap_err();
    assert!(matches!(
        err,
        PicoError::ModelConstruction { source: ModuleError::UnknownEntry(_), .. }
    ));

    let custom = Pico::new(PicoConfig {
        factory_entry: "build_lens".to_string(),
        ..PicoConfig::default()
    });
    custom.create(&code, &out, &[], None).unwrap();
    assert!(out.exists());
}

/// A model whose state cannot be serialized.
#[derive(Debug)]
struct Unserializable;

impl PicoModel for Unserializable {
    fn inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn outputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn evaluate(&self, _: Option<&[String]>, _: &Inputs) -> Result<Outputs, CantCompute> {
        Ok(Outputs::new())
    }

    fn type_tag(&self) -> &str {
        "broken.Unserializable"
    }

    fn state(&self) -> Result<serde_json::Value, serde_json::Error> {
        Err(<serde_json::Error as serde::ser::Error>::custom("holds a live handle"))
    }
}

struct BrokenModule;

impl ModelModule for BrokenModule {
    fn construct(&self, _: &[serde_json::Value]) -> Result<Box<dyn PicoModel>, ModuleError> {
        Ok(Box::new(Unserializable))
    }

    fn restore(&self, type_tag: &str, _: serde_json::Value) -> Result<Box<dyn PicoModel>, ModuleError> {
        Err(ModuleError::UnknownType(type_tag.to_string()))
    }
}

struct BrokenKind;

impl ModelKind for BrokenKind {
    fn name(&self) -> &str {
        "broken"
    }

    fn compile(&self, _: &ModuleSource) -> Result<Arc<dyn ModelModule>, ModuleError> {
        Ok(Arc::new(BrokenModule))
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn failed_create_leaves_previous_datafile_intact() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "lens.toml", LENS);
    let broken = write(dir.path(), "broken.toml", "[module]\nkind = \"broken\"\n");
    let out = dir.path().join("lens.dat");

    let mut catalog = KindCatalog::with_builtin();
    catalog.register(BrokenKind);
    let pico = Pico::with_catalog(PicoConfig::default(), catalog);

    pico.create(&good, &out, &[], None).unwrap();
    let before = std::fs::read(&out).unwrap();
    let listing = entries(dir.path());

    let err = pico.create(&broken, &out, &[], None).unwrap_err();
    assert!(matches!(err, PicoError::PayloadSerialization { .. }));

    assert_eq!(std::fs::read(&out).unwrap(), before);
    assert_eq!(entries(dir.path()), listing, "no temp file may be left behind");
    assert!(Pico::default().load(&out).is_ok());
}

#[test]
fn failed_write_reports_path() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let target = dir.path().join("missing-dir").join("lens.dat");

    let err = Pico::default().create(&code, &target, &[], None).unwrap_err();
    match err {
        PicoError::ContainerWrite { path, .. } => assert_eq!(path, target),
        other => panic!("expected ContainerWrite, got {other:?}"),
    }
}

#[test]
fn loads_share_one_registration() {
    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let out = dir.path().join("lens.dat");
    let pico = Pico::default();
    let report = pico.create(&code, &out, &[], None).unwrap();

    for _ in 0..3 {
        pico.load_with(&out, &LoadOptions::default()).unwrap();
    }
    assert_eq!(pico.registry.names(), vec![report.logical_name]);
}

#[test]
fn non_finite_module_values_fail_create() {
    let dir = TempDir::new().unwrap();
    let code = write(
        dir.path(),
        "inf.toml",
        &LENS
            .replace("weights = [[3.0, 0.0]]", "weights = [[inf, 0.0]]")
            .replace("bias = [0.1, 0.0]", "bias = [nan, 0.0]"),
    );
    let out = dir.path().join("inf.dat");

    let err = Pico::default().create(&code, &out, &[], None).unwrap_err();
    assert!(matches!(
        err,
        PicoError::CodeMaterialization { source: ModuleError::InvalidParams(_), .. }
    ));
    assert_eq!(err.path(), Some(code.as_path()));
    assert!(!out.exists());
}

#[cfg(unix)]
#[test]
fn recreate_keeps_datafile_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let code = write(dir.path(), "lens.toml", LENS);
    let out = dir.path().join("lens.dat");
    std::fs::write(&out, b"placeholder").unwrap();
    std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o644)).unwrap();

    Pico::default().create(&code, &out, &[], None).unwrap();
    let mode = std::fs::metadata(&out).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}
