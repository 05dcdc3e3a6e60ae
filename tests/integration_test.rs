//! End-to-end pipeline tests: parse → analyze → generate, writing real
//! files to a temp output directory.

use openabl::backend::BackendKind;
use openabl::compile;
use std::collections::HashMap;
use tempfile::tempdir;

const BOIDS_SRC: &str = r#"
    agent Boid { position vec2 p; vec2 v; }
    const float RADIUS = 1.0;
    step boid_step(Boid self) {
        for (Boid o in near(self, RADIUS)) {
            self.v = self.v + (o.p - self.p);
        }
        self.p = self.p + self.v;
    }
"#;

#[test]
fn c_backend_writes_model_file() {
    let output = tempdir().unwrap();
    let asset = tempdir().unwrap();

    let script = compile(
        BOIDS_SRC,
        BackendKind::C,
        HashMap::new(),
        output.path(),
        asset.path(),
    )
    .expect("compilation should succeed");

    assert!(script.functions[0].is_step);
    let model_path = output.path().join("model.c");
    assert!(model_path.exists());
    let contents = std::fs::read_to_string(model_path).unwrap();
    assert!(contents.contains("boid_step"));
}

#[test]
fn asset_template_tree_is_copied_alongside_generated_source() {
    let output = tempdir().unwrap();
    let asset = tempdir().unwrap();
    let c_template_dir = asset.path().join("c");
    std::fs::create_dir_all(&c_template_dir).unwrap();
    std::fs::write(c_template_dir.join("Makefile"), "all:\n\tgcc model.c\n").unwrap();

    compile(
        BOIDS_SRC,
        BackendKind::C,
        HashMap::new(),
        output.path(),
        asset.path(),
    )
    .unwrap();

    assert!(output.path().join("Makefile").exists());
    assert!(output.path().join("model.c").exists());
}

#[test]
fn analysis_errors_prevent_any_output_from_being_written() {
    let output = tempdir().unwrap();
    let asset = tempdir().unwrap();

    let result = compile(
        "void f() { int x = true; }",
        BackendKind::C,
        HashMap::new(),
        output.path(),
        asset.path(),
    );

    assert!(result.is_err());
    assert!(!output.path().join("model.c").exists());
}

#[test]
fn const_override_reaches_generated_source() {
    let output = tempdir().unwrap();
    let asset = tempdir().unwrap();
    let mut overrides = HashMap::new();
    overrides.insert("RADIUS".to_string(), "4.5".to_string());

    compile(BOIDS_SRC, BackendKind::C, overrides, output.path(), asset.path()).unwrap();

    let contents = std::fs::read_to_string(output.path().join("model.c")).unwrap();
    assert!(contents.contains("4.5"));
}

#[test]
fn unsupported_backend_construct_is_rejected_before_any_file_is_written() {
    let output = tempdir().unwrap();
    let asset = tempdir().unwrap();

    let result = compile(
        BOIDS_SRC,
        BackendKind::Mason,
        HashMap::new(),
        output.path(),
        asset.path(),
    );

    assert!(result.is_err());
    assert!(!output.path().join("Sim.java").exists());
}
