//! Runs the `implementor` binary against files in a temporary directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

const SHAPES: &str = include_str!("../../../tests/cpp/shapes.hpp");

const INTERFACE: &str =
    "struct I {\n    [[nodiscard]] virtual int f() const = 0;\n};\n\nclass D {\n};\n";

fn implementor(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_implementor"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("IMPLEMENTOR_LOG")
        .output()
        .expect("failed to run implementor")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "implementor failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn write_source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_overrides_text() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "shapes.hpp", SHAPES);
    let output = implementor(
        dir.path(),
        &["overrides", file.to_str().unwrap(), "--class", "geo::Shape"],
    );
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[0], "double area() const override;");
    assert_eq!(
        lines[6],
        "bool intersects(const geo::Shape & other) const override;"
    );
}

#[test]
fn test_overrides_json_with_flags() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let output = implementor(
        dir.path(),
        &[
            "overrides",
            file.to_str().unwrap(),
            "--class",
            "I",
            "--format",
            "json",
            "--ignore-attributes",
        ],
    );
    let declarations: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(declarations, vec!["int f() const override;"]);
}

#[test]
fn test_config_file_in_current_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let args = ["overrides", file.to_str().unwrap(), "--class", "I"];

    let output = implementor(dir.path(), &args);
    assert_eq!(stdout(&output), "[[nodiscard]] int f() const override;\n");

    std::fs::write(
        dir.path().join("implementor.toml"),
        "[expander]\nignore_attribute_specifiers = true\n\n[output]\nformat = \"json\"\n",
    )
    .unwrap();
    let output = implementor(dir.path(), &args);
    let declarations: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(declarations, vec!["int f() const override;"]);

    let mut with_flag = args.to_vec();
    with_flag.extend(["--format", "text"]);
    let output = implementor(dir.path(), &with_flag);
    assert_eq!(stdout(&output), "int f() const override;\n");
}

#[test]
fn test_implement_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let output = implementor(
        dir.path(),
        &[
            "implement",
            file.to_str().unwrap(),
            "--class",
            "D",
            "--interface",
            "I",
            "--in-place",
        ],
    );
    assert_eq!(stdout(&output), "");
    assert_eq!(
        std::fs::read_to_string(&file).unwrap(),
        "struct I {\n    [[nodiscard]] virtual int f() const = 0;\n};\n\n\
         class D : public I {\npublic:\n[[nodiscard]] int f() const override;\n};\n"
    );
}

#[test]
fn test_implement_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let output = implementor(
        dir.path(),
        &[
            "implement",
            file.to_str().unwrap(),
            "--class",
            "D",
            "--interface",
            "I",
            "--format",
            "json",
        ],
    );
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["is_public_section_needed"], true);
    assert_eq!(json["base_specifier"]["text"], " : public I");
    assert_eq!(json["declarations"][0], "[[nodiscard]] int f() const override;");
    assert_eq!(std::fs::read_to_string(&file).unwrap(), INTERFACE);
}

#[test]
fn test_place_and_base() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "d.hpp", "struct I {};\nclass D {\n};\n");
    let path = file.to_str().unwrap();

    let output = implementor(dir.path(), &["place", path, "--class", "D"]);
    assert_eq!(
        stdout(&output),
        "offset: 23 (line 3, column 1)\npublic section needed: true\n"
    );

    let output = implementor(dir.path(), &["base", path, "--class", "D", "--base", "I"]);
    assert_eq!(
        stdout(&output),
        "offset: 20 (line 2, column 8)\ninsert: \" : public I\"\n"
    );
}

#[test]
fn test_unknown_class_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let output = implementor(
        dir.path(),
        &["overrides", file.to_str().unwrap(), "--class", "Nope"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nope"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_source(&dir, "i.hpp", INTERFACE);
    let output = implementor(
        dir.path(),
        &[
            "--config",
            "missing.toml",
            "overrides",
            file.to_str().unwrap(),
            "--class",
            "I",
        ],
    );
    assert!(!output.status.success());
}
