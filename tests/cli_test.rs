use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_writes_module_and_schema() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("generated");

    Command::cargo_bin("datamodel-gen")
        .expect("binary exists")
        .arg("tests/grammars/drawing.ebnf")
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("drawing.rs"))
        .stdout(predicate::str::contains("drawing.schema.json"));

    let source = std::fs::read_to_string(out.join("drawing.rs")).expect("module written");
    assert!(source.contains("pub mod drawing {"));
    assert!(source.contains("pub trait DrawingVisitor<'ast, T>"));
    assert!(!source.contains("pub offset: i64"));
    let schema = std::fs::read_to_string(out.join("drawing.schema.json")).expect("schema written");
    assert!(schema.contains("\"title\": \"Drawing\""));
}

#[test]
fn test_generate_locations_flag() {
    let dir = tempfile::tempdir().expect("temp dir");
    Command::cargo_bin("datamodel-gen")
        .expect("binary exists")
        .args(["tests/grammars/drawing.ebnf", "--generate-locations", "-o"])
        .arg(dir.path())
        .assert()
        .success();

    let source = std::fs::read_to_string(dir.path().join("drawing.rs")).expect("module written");
    assert!(source.contains("pub offset: i64"));
}

#[test]
fn test_reports_compile_errors() {
    let dir = tempfile::tempdir().expect("temp dir");
    let grammar = dir.path().join("broken.ebnf");
    std::fs::write(&grammar, "grammar Broken; A : 'a' | B ; B : 'b' NUMBER ;").expect("write grammar");

    Command::cargo_bin("datamodel-gen")
        .expect("binary exists")
        .arg(&grammar)
        .arg("-o")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to compile"))
        .stderr(predicate::str::contains("mixes literals and non-terminals"));
    assert!(!dir.path().join("broken.rs").exists());
}

#[test]
fn test_missing_grammar() {
    Command::cargo_bin("datamodel-gen")
        .expect("binary exists")
        .arg("does/not/exist.ebnf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot access"));
}
