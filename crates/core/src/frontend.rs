//! Parse/typecheck adapter.
//!
//! A [`Frontend`] turns a directory into a [`Collection`] of type-checked
//! units. Loading the same directory again after the pipeline wrote it
//! reflects those writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{MigrateError, SyntaxError};
use crate::lexer::{lex, Token};
use crate::source::SourceProvider;
use crate::unit::{Collection, Unit};

pub trait Frontend {
    fn load(&self, dir: &Path) -> Result<Collection, MigrateError>;
}

/// Frontend for the Go subset, reading through a [`SourceProvider`].
pub struct GoFrontend<'a> {
    provider: &'a dyn SourceProvider,
}

impl<'a> GoFrontend<'a> {
    pub fn new(provider: &'a dyn SourceProvider) -> Self {
        GoFrontend { provider }
    }
}

/// Source files a directory contributes: `*.go`, hidden files excluded.
pub fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    !name.starts_with('.') && name.ends_with(".go")
}

impl Frontend for GoFrontend<'_> {
    fn load(&self, dir: &Path) -> Result<Collection, MigrateError> {
        let listed = self
            .provider
            .list_dir(dir)
            .map_err(|e| MigrateError::io(dir, e))?;
        let mut by_package: BTreeMap<String, Vec<(PathBuf, String)>> = BTreeMap::new();
        for path in listed.into_iter().filter(|p| is_source_file(p)) {
            let src = self
                .provider
                .read_source(&path)
                .map_err(|e| MigrateError::io(&path, e))?;
            let package = package_clause(&src, &path.display().to_string())?;
            by_package.entry(package).or_default().push((path, src));
        }
        let mut units = Vec::new();
        for (name, sources) in by_package {
            let mut unit = Unit::parse(&name, &sources)?;
            unit.check();
            tracing::debug!(
                unit = %name,
                files = sources.len(),
                diagnostics = unit.diagnostics.len(),
                "loaded unit"
            );
            units.push(unit);
        }
        Ok(Collection {
            dir: dir.to_path_buf(),
            units,
        })
    }
}

/// Package name of a source file, read from its first tokens.
fn package_clause(src: &str, filename: &str) -> Result<String, SyntaxError> {
    let lexed = lex(src, filename)?;
    let mut tokens = lexed.tokens.iter();
    match (tokens.next(), tokens.next()) {
        (Some(kw), Some(name)) if kw.token == Token::Word("package".into()) => match &name.token {
            Token::Word(n) => Ok(n.clone()),
            _ => Err(SyntaxError::parse(filename, name.line, "expected package name")),
        },
        (Some(first), _) => Err(SyntaxError::parse(
            filename,
            first.line,
            "expected 'package' clause",
        )),
        _ => Err(SyntaxError::parse(filename, 1, "expected 'package' clause")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryProvider;

    #[test]
    fn groups_files_by_package_clause() {
        let provider = InMemoryProvider::new([
            ("/p/b.go", "package geom\n\nvar B = A\n"),
            ("/p/a.go", "// Package geom.\npackage geom\n\nvar A = 1\n"),
            ("/p/a_test.go", "package geom_test\n\nvar T = 2\n"),
            ("/p/.hidden.go", "package hidden\n"),
            ("/p/README.md", "not go"),
        ]);
        let coll = GoFrontend::new(&provider).load(Path::new("/p")).unwrap();
        let names: Vec<_> = coll.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["geom", "geom_test"]);
        let files: Vec<_> = coll.units[0].files.iter().map(|f| f.name()).collect();
        assert_eq!(files, vec!["a.go", "b.go"]);
        assert_eq!(coll.diagnostic_count(), 0);
    }

    #[test]
    fn syntax_errors_carry_file_and_line() {
        let provider = InMemoryProvider::new([("/p/a.go", "package p\n\nfunc (\n")]);
        let err = GoFrontend::new(&provider).load(Path::new("/p")).unwrap_err();
        match err {
            MigrateError::Syntax(e) => assert_eq!(e.file, "/p/a.go"),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn missing_package_clause_is_a_syntax_error() {
        let provider = InMemoryProvider::new([("/p/a.go", "var x = 1\n")]);
        let err = GoFrontend::new(&provider).load(Path::new("/p")).unwrap_err();
        assert_eq!(err.kind(), "syntax");
    }

    #[test]
    fn reload_reflects_writes() {
        let provider = InMemoryProvider::new([("/p/a.go", "package p\n\nvar x = 1\n")]);
        let fe = GoFrontend::new(&provider);
        assert_eq!(fe.load(Path::new("/p")).unwrap().diagnostic_count(), 0);
        provider
            .write_source(Path::new("/p/a.go"), "package p\n\nvar x = y\n")
            .unwrap();
        let coll = fe.load(Path::new("/p")).unwrap();
        assert_eq!(coll.diagnostic_count(), 1);
        assert_eq!(coll.first_diagnostic().unwrap().message, "undefined: y");
    }
}
