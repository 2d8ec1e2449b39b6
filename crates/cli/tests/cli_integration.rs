//! CLI integration tests for all implemented subcommands.
//!
//! Uses `assert_cmd` to spawn the `typeshift` binary against trees built
//! in temporary directories, and verifies exit codes, stdout content,
//! stderr content and the files written.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn typeshift() -> Command {
    cargo_bin_cmd!("typeshift")
}

const SHAPES: &str = r#"package shapes

import "fmt"

type Rect struct {
	w, h int
}

func (r Rect) Area() int {
	return r.w * r.h
}

func Describe(r Rect, cells []string) string {
	for i := 0; i < len(cells); i++ {
		cells[i] = fmt.Sprintf("%d", i)
	}
	return fmt.Sprintf("%dx%d", r.w, r.h)
}
"#;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn config(root: &Path, repos: &str, extra: &str) -> std::path::PathBuf {
    let path = root.join("typeshift.json");
    let text = format!(
        r#"{{"Repos": {}, "Config": {{"From": "src", "To": "out"{}}}}}"#,
        repos, extra
    );
    fs::write(&path, text).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    typeshift()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Migrate Go-subset source trees"));
}

#[test]
fn version_exits_0() {
    typeshift()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("typeshift"));
}

// ──────────────────────────────────────────────
// 2. Run subcommand
// ──────────────────────────────────────────────

#[test]
fn run_migrates_and_reports_ok() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/shapes.go", SHAPES);
    write(root, "src/README.md", "# Shapes\n");
    write(root, "src/.notes", "hidden\n");
    let cfg = config(
        root,
        r#"[{"Name": "shapesf"}]"#,
        r#", "ReadMe": ["Float version.", ""], "Header": ["// Migrated.", ""]"#,
    );

    typeshift()
        .args(["run", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Migrate type from \"int\" to \"float64\" ..."))
        .stdout(predicate::str::contains("- OK"))
        .stdout(predicate::str::contains("Done without errors."));

    let out = fs::read_to_string(root.join("out/shapesf/shapes.go")).unwrap();
    assert!(out.starts_with("// Migrated.\npackage shapes\n"), "{}", out);
    assert!(out.contains("\tw, h float64\n"), "{}", out);
    assert!(out.contains("func (r Rect) Area() float64 {"), "{}", out);
    assert!(out.contains("fmt.Sprintf(\"%fx%f\", r.w, r.h)"), "{}", out);
    let readme = fs::read_to_string(root.join("out/shapesf/README.md")).unwrap();
    assert_eq!(readme, "Float version.\n# Shapes\n");
    assert!(!root.join("out/shapesf/.notes").exists());
}

#[test]
fn run_json_output_lists_outcomes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/shapes.go", SHAPES);
    let cfg = config(root, r#"[{"Name": "shapesf"}]"#, "");

    let output = typeshift()
        .args(["--output", "json", "run", cfg.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v[0]["status"], "ok");
    assert_eq!(v[0]["report"]["units"][0], "shapes");
    assert_eq!(v[0]["report"]["formatted"], 2);
}

#[test]
fn run_recurses_into_visible_subdirectories() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/shapes.go", SHAPES);
    write(root, "src/sub/count.go", "package sub\n\nvar Count int = 3\n");
    write(root, "src/.cache/skip.go", "package cache\n\nvar X int\n");
    let cfg = config(root, r#"[{"Name": "shapesf", "Recurse": true}]"#, "");

    typeshift()
        .args(["--quiet", "run", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let sub = fs::read_to_string(root.join("out/shapesf/sub/count.go")).unwrap();
    assert!(sub.contains("var Count float64 = 3.0"), "{}", sub);
    assert!(!root.join("out/shapesf/.cache").exists());
}

#[test]
fn run_skips_disabled_repositories() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/shapes.go", SHAPES);
    let cfg = config(
        root,
        r#"[{"Name": "off", "Disabled": true}, {"Name": "on"}]"#,
        "",
    );

    typeshift()
        .args(["run", cfg.to_str().unwrap()])
        .assert()
        .success();
    assert!(!root.join("out/off").exists());
    assert!(root.join("out/on/shapes.go").exists());
}

#[test]
fn run_skips_directory_with_non_constant_format() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(
        root,
        "src/report.go",
        "package report\n\nimport \"fmt\"\n\nfunc Show(format string, n int) {\n\tfmt.Printf(format, n)\n}\n",
    );
    let cfg = config(root, r#"[{"Name": "reportf"}]"#, "");

    typeshift()
        .args(["run", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please fix:"))
        .stdout(predicate::str::contains("can't check non-constant format"))
        .stdout(predicate::str::contains("- SKIP"));
    assert!(!root.join("out/reportf").exists());
}

#[test]
fn run_applies_patches_and_footer() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/shapes.go", SHAPES);
    let cfg = config(
        root,
        r#"[{"Name": "shapesf"}]"#,
        r#", "Patches": {"shapes.go": [{"Old": "Rect", "New": "RectF", "N": 0}]},
           "Footer": {"shapes.go": ["var Unit = RectF{1, 1}"]}"#,
    );

    typeshift()
        .args(["run", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Applied one patch to"));

    let out = fs::read_to_string(root.join("out/shapesf/shapes.go")).unwrap();
    assert!(out.contains("type RectF struct"), "{}", out);
    assert!(out.ends_with(
        "\n// Automatically appended by typeshift\n\nvar Unit = RectF{1, 1}\n"
    ));
}

#[test]
fn run_rejects_source_with_type_errors() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write(root, "src/bad.go", "package bad\n\nvar X int = missing\n");
    let cfg = config(root, r#"[{"Name": "badf"}]"#, "");

    typeshift()
        .args(["run", cfg.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("undefined: missing"));
}

#[test]
fn run_reports_missing_from_as_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("typeshift.json");
    fs::write(&path, r#"{"Repos": [], "Config": {"To": "out"}}"#).unwrap();

    typeshift()
        .args(["--output", "json", "run", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config 'From' is not set"));
}

// ──────────────────────────────────────────────
// 3. Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_clean_dir_exits_0() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "shapes.go", SHAPES);
    typeshift()
        .args(["check", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("no type errors"));
}

#[test]
fn check_reports_diagnostics_and_exits_1() {
    let tmp = TempDir::new().unwrap();
    write(
        tmp.path(),
        "loop.go",
        "package loop\n\nfunc f(xs []int) {\n\tfor i := 0.0; i < len(xs); i++ {\n\t}\n}\n",
    );
    typeshift()
        .args(["check", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("loop.go:4:"))
        .stdout(predicate::str::contains(
            "invalid operation: i < len(xs) (mismatched types float64 and int)",
        ))
        .stdout(predicate::str::contains("1 type error"));
}

#[test]
fn check_json_lists_units() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "shapes.go", SHAPES);
    let output = typeshift()
        .args(["--output", "json", "check", tmp.path().to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["units"][0], "shapes");
    assert_eq!(v["diagnostics"].as_array().unwrap().len(), 0);
}

// ──────────────────────────────────────────────
// 4. Print subcommand
// ──────────────────────────────────────────────

#[test]
fn print_dumps_tree() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "shapes.go", SHAPES);
    typeshift()
        .args(["print", tmp.path().join("shapes.go").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("File #"))
        .stdout(predicate::str::contains("FuncDecl #"))
        .stdout(predicate::str::contains(" Area\n"));
}

#[test]
fn print_source_round_trips() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "shapes.go", SHAPES);
    typeshift()
        .args(["print", "--source", tmp.path().join("shapes.go").to_str().unwrap()])
        .assert()
        .success()
        .stdout(SHAPES);
}

#[test]
fn print_syntax_error_exits_1() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "bad.go", "package bad\n\nfunc (\n");
    typeshift()
        .args(["print", tmp.path().join("bad.go").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.go:"));
}
