//! End-to-end migrations of small packages through the in-memory provider.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use typeshift_core::{
    migrate_dir, Directive, Frontend, GoFrontend, InMemoryProvider, MigrateError, SkipSet,
};

const GEOM: &str = r#"package geom

import "fmt"

// Grid is a row-major grid of cells.
type Grid struct {
	id, w, h int
	cells    []int
}

func NewGrid(id, w, h int) *Grid {
	return &Grid{id: id, w: w, h: h, cells: make([]int, w*h)}
}

func (g *Grid) At(x, y int) int {
	return g.cells[y*g.w+x]
}

func (g *Grid) Wrap(i, n int) int {
	c := i % n
	return c
}

func (g *Grid) Sum() int {
	total := 0
	for i := 0; i < len(g.cells); i++ {
		total += g.cells[i]
	}
	return total
}

func (g *Grid) String() string {
	return fmt.Sprintf("grid %d: %dx%d", g.id, g.w, g.h)
}
"#;

fn skip(file: &str, names: &[&str]) -> SkipSet {
    let mut data = BTreeMap::new();
    data.insert(
        file.to_owned(),
        names.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    );
    SkipSet::new(data)
}

fn geom_directive() -> Directive {
    Directive {
        skip: skip("geom", &["id|field", "id|var"]),
        ..Directive::default()
    }
}

fn read(provider: &InMemoryProvider, path: &str) -> String {
    provider.files()[Path::new(path)].clone()
}

fn written_under(provider: &InMemoryProvider, dir: &str) -> Vec<PathBuf> {
    provider
        .files()
        .into_keys()
        .filter(|p| p.starts_with(dir))
        .collect()
}

#[test]
fn migrated_package_type_checks() {
    let provider = InMemoryProvider::new([("/src/geom.go", GEOM)]);
    let report = migrate_dir(
        &provider,
        Path::new("/src"),
        Path::new("/out"),
        &geom_directive(),
    )
    .unwrap();
    assert_eq!(report.units, vec!["geom"]);
    assert!(report.converted > 0);
    assert!(report.fixed > 0);
    assert_eq!(report.formatted, 1);

    let coll = GoFrontend::new(&provider).load(Path::new("/out")).unwrap();
    assert_eq!(coll.diagnostic_count(), 0, "{:?}", coll.first_diagnostic());

    let out = read(&provider, "/out/geom.go");
    assert!(out.contains("\tid int\n\tw, h float64\n"), "{}", out);
    assert!(out.contains("cells []float64"), "{}", out);
    assert!(out.contains("make([]float64, int(w*h))"), "{}", out);
    assert!(out.contains("func (g *Grid) At(x, y float64) float64 {"), "{}", out);
    assert!(out.contains("g.cells[int(y*g.w+x)]"), "{}", out);
    assert!(out.contains("\tc := float64(int(i) % int(n))\n"), "{}", out);
    assert!(out.contains("i < float64(len(g.cells))"), "{}", out);
    assert!(out.contains("fmt.Sprintf(\"grid %d: %fx%f\", g.id, g.w, g.h)"), "{}", out);
}

#[test]
fn rerunning_on_migrated_tree_is_a_fixpoint() {
    let provider = InMemoryProvider::new([("/src/geom.go", GEOM)]);
    let directive = geom_directive();
    migrate_dir(&provider, Path::new("/src"), Path::new("/once"), &directive).unwrap();
    let report =
        migrate_dir(&provider, Path::new("/once"), Path::new("/twice"), &directive).unwrap();
    assert_eq!(report.formatted, 0);
    assert_eq!(
        read(&provider, "/once/geom.go"),
        read(&provider, "/twice/geom.go")
    );
}

#[test]
fn truncation_helper_is_emitted_once() {
    let src = r#"package calc

func half(n int) int {
	return n / 2
}

func Run() {
	const scale = 5
	a := half(scale / 2)
	b := half(scale/2 + 1)
	println(a, b)
}
"#;
    let provider = InMemoryProvider::new([("/src/calc.go", src)]);
    let directive = Directive {
        skip: skip("calc", &["half|func"]),
        ..Directive::default()
    };
    let report = migrate_dir(&provider, Path::new("/src"), Path::new("/out"), &directive).unwrap();
    assert_eq!(report.snippets, vec!["i64"]);

    let calc = read(&provider, "/out/calc.go");
    assert!(calc.contains("func half(n int) int {"), "{}", calc);
    assert_eq!(calc.matches("half(i64(").count(), 2, "{}", calc);
    let snippets = read(&provider, "/out/snippets.go");
    assert!(snippets.starts_with("// Code generated by typeshift. DO NOT EDIT."));
    assert!(snippets.contains("package calc\n"));
    assert_eq!(snippets.matches("func i64(").count(), 1);
    assert_eq!(written_under(&provider, "/out").len(), 2);
}

#[test]
fn non_constant_format_leaves_no_output() {
    let src = r#"package report

import "fmt"

func Show(format string, n int) {
	fmt.Printf(format, n)
}
"#;
    let provider = InMemoryProvider::new([("/src/report.go", src)]);
    let err = migrate_dir(
        &provider,
        Path::new("/src"),
        Path::new("/out"),
        &Directive::default(),
    )
    .unwrap_err();
    assert!(err.is_recoverable(), "{}", err);
    assert!(written_under(&provider, "/out").is_empty());
}

#[test]
fn exempt_file_keeps_non_constant_format() {
    let src = r#"package report

import "fmt"

func Show(format string, n int) {
	fmt.Printf(format, n)
}
"#;
    let provider = InMemoryProvider::new([("/src/report.go", src)]);
    let mut directive = Directive::default();
    directive.format_exempt.insert("report".to_owned());
    migrate_dir(&provider, Path::new("/src"), Path::new("/out"), &directive).unwrap();
    assert!(read(&provider, "/out/report.go").contains("func Show(format string, n float64) {"));
}

#[test]
fn shim_rewrites_directive_to_string() {
    let src = r#"package report

import "fmt"

func Show(n int) string {
	return fmt.Sprintf("val=%d", n)
}
"#;
    let provider = InMemoryProvider::new([("/src/report.go", src)]);
    let mut directive = Directive::default();
    directive
        .format_shims
        .insert("report".to_owned(), "toI".to_owned());
    migrate_dir(&provider, Path::new("/src"), Path::new("/out"), &directive).unwrap();
    let out = read(&provider, "/out/report.go");
    assert!(out.contains("fmt.Sprintf(\"val=%s\", toI(n))"), "{}", out);
}

#[test]
fn broken_sources_are_refused_untouched() {
    let src = "package p\n\nfunc f() int {\n\treturn missing\n}\n";
    let provider = InMemoryProvider::new([("/src/p.go", src)]);
    let err = migrate_dir(
        &provider,
        Path::new("/src"),
        Path::new("/out"),
        &Directive::default(),
    )
    .unwrap_err();
    match err {
        MigrateError::PreexistingTypeError { phase, first, count } => {
            assert_eq!(phase, "convert");
            assert_eq!(count, 1);
            assert_eq!(first, "/src/p.go:4:9: undefined: missing");
        }
        other => panic!("expected pre-existing type error, got {:?}", other),
    }
    assert!(written_under(&provider, "/out").is_empty());
}

#[test]
fn return_conflicts_stop_the_fix_loop_with_context() {
    let src = "package p\n\nfunc size(xs []string) int {\n\treturn len(xs)\n}\n";
    let provider = InMemoryProvider::new([("/src/p.go", src)]);
    let err = migrate_dir(
        &provider,
        Path::new("/src"),
        Path::new("/out"),
        &Directive::default(),
    )
    .unwrap_err();
    match err {
        MigrateError::FixHandler {
            handler, location, ..
        } => {
            assert_eq!(handler, "fix_return");
            assert_eq!(location.position, "/out/p.go:4:9");
        }
        other => panic!("expected handler failure, got {:?}", other),
    }
    // Convert output stays for inspection.
    assert!(read(&provider, "/out/p.go").contains("func size(xs []string) float64 {"));
}

#[test]
fn stalled_fix_loop_reports_remaining_diagnostics() {
    // `half/2` folds to 2.5 once `half` is a float64 constant; converting
    // it to int only moves the error.
    let src = "package p\n\nconst half int = 5\n\nfunc pick(xs []string) string {\n\treturn xs[half/2]\n}\n";
    let provider = InMemoryProvider::new([("/src/p.go", src)]);
    let err = migrate_dir(
        &provider,
        Path::new("/src"),
        Path::new("/out"),
        &Directive::default(),
    )
    .unwrap_err();
    match err {
        MigrateError::NoProgress {
            count,
            first,
            remaining,
        } => {
            assert_eq!(count, 1);
            assert_eq!(remaining, vec![first.clone()]);
            assert!(first.starts_with("/out/p.go:6:"), "{}", first);
            assert!(first.ends_with("to type int (truncated)"), "{}", first);
        }
        other => panic!("expected no progress, got {:?}", other),
    }
    // The edits of the completed iteration stay.
    let out = read(&provider, "/out/p.go");
    assert!(out.contains("const half float64 = 5.0"), "{}", out);
    assert!(out.contains("xs[int(half"), "{}", out);
}
