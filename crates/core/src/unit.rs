//! Units of compilation and their type-check results.
//!
//! A [`Unit`] is every file of one package clause in one directory,
//! parsed into a shared [`Forest`]. A [`Collection`] holds the sibling
//! units of a directory (`geom` and `geom_test`).

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ast::{Forest, NodeId, NodeKind};
use crate::check::{check_unit, TypeInfo};
use crate::error::{Location, MigrateError};
use crate::parser::parse_file;
use crate::printer::print_file;
use crate::snippets::{SnippetSet, GENERATED_MARKER};
use crate::source::SourceProvider;
use crate::walk::{enclosing_path, trim_path};

/// One parsed file of a unit.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub root: NodeId,
    /// Written by this tool; never converted and rewritten from the
    /// unit's snippet set on save.
    pub generated: bool,
    line_starts: Vec<u32>,
}

impl SourceFile {
    /// 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&s| s <= offset).max(1);
        let col = offset - self.line_starts[line - 1] + 1;
        (line as u32, col)
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn line_starts(src: &str) -> Vec<u32> {
    std::iter::once(0)
        .chain(src.match_indices('\n').map(|(i, _)| i as u32 + 1))
        .collect()
}

/// A type-check diagnostic mapped to its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: usize,
    pub path: PathBuf,
    pub offset: u32,
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn position(&self) -> String {
        format!("{}:{}:{}", self.path.display(), self.line, self.col)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position(), self.message)
    }
}

#[derive(Debug, Clone)]
pub struct Unit {
    pub name: String,
    pub forest: Forest,
    pub files: Vec<SourceFile>,
    pub info: TypeInfo,
    pub diagnostics: Vec<Diagnostic>,
    pub snippets: SnippetSet,
}

impl Unit {
    /// Parse the given files into one unit. Nothing is type-checked yet.
    pub fn parse(name: &str, sources: &[(PathBuf, String)]) -> Result<Unit, MigrateError> {
        let mut forest = Forest::new();
        let mut files = Vec::new();
        let mut snippets = SnippetSet::default();
        for (path, src) in sources {
            let filename = path.display().to_string();
            let root = parse_file(src, &filename, &mut forest)?;
            let generated = is_generated(&forest, root);
            if generated {
                for name in declared_funcs(&forest, root) {
                    snippets.add(&name);
                }
            }
            files.push(SourceFile {
                path: path.clone(),
                root,
                generated,
                line_starts: line_starts(src),
            });
        }
        Ok(Unit {
            name: name.to_owned(),
            forest,
            files,
            info: TypeInfo::default(),
            diagnostics: Vec::new(),
            snippets,
        })
    }

    /// Type-check the unit, replacing its type information and
    /// diagnostics.
    pub fn check(&mut self) {
        let roots: Vec<NodeId> = self.files.iter().map(|f| f.root).collect();
        let (info, raw) = check_unit(&self.forest, &roots);
        self.info = info;
        self.diagnostics = raw
            .into_iter()
            .map(|d| {
                let file = &self.files[d.file];
                let (line, col) = file.line_col(d.offset);
                Diagnostic {
                    file: d.file,
                    path: file.path.clone(),
                    offset: d.offset,
                    line,
                    col,
                    message: d.message,
                }
            })
            .collect();
    }

    /// True once the forest has changed since the last check.
    pub fn is_stale(&self) -> bool {
        self.info.revision() != self.forest.revision()
    }

    pub fn ensure_fresh(&self) -> Result<(), MigrateError> {
        if self.is_stale() {
            return Err(MigrateError::StaleTypeInfo {
                unit: self.name.clone(),
            });
        }
        Ok(())
    }

    /// `file:line:col` of an offset in one of the unit's files.
    pub fn position(&self, file: usize, offset: u32) -> String {
        let f = &self.files[file];
        let (line, col) = f.line_col(offset);
        format!("{}:{}:{}", f.path.display(), line, col)
    }

    /// Position of a node; synthetic nodes have none.
    pub fn node_position(&self, file: usize, id: NodeId) -> String {
        let span = self.forest.span(id);
        if span.is_synthetic() {
            return format!("{}", self.files[file].path.display());
        }
        self.position(file, span.start)
    }

    /// Trimmed enclosing path of a diagnostic, narrowest first.
    pub fn conflict_path(&self, diag: &Diagnostic) -> Vec<NodeId> {
        let root = self.files[diag.file].root;
        let path = enclosing_path(&self.forest, root, diag.offset);
        trim_path(&self.forest, &path)
    }

    pub fn render_path(&self, path: &[NodeId]) -> Vec<String> {
        path.iter()
            .map(|&id| self.forest.kind(id).name().to_owned())
            .collect()
    }

    pub fn location(&self, diag: &Diagnostic, path: &[NodeId]) -> Location {
        Location {
            position: diag.position(),
            path: self.render_path(path),
        }
    }

    /// Print every hand-written file into `dir`, plus the snippet file
    /// when helpers were requested.
    pub fn save(
        &self,
        provider: &dyn SourceProvider,
        dir: &Path,
        snippet_file: &str,
    ) -> Result<(), MigrateError> {
        for file in self.files.iter().filter(|f| !f.generated) {
            let target = dir.join(file.name());
            let text = print_file(&self.forest, file.root);
            provider
                .write_source(&target, &text)
                .map_err(|e| MigrateError::io(&target, e))?;
        }
        if !self.snippets.is_empty() {
            let target = dir.join(snippet_file);
            provider
                .write_source(&target, &self.snippets.render(&self.name))
                .map_err(|e| MigrateError::io(&target, e))?;
        }
        Ok(())
    }
}

fn is_generated(forest: &Forest, root: NodeId) -> bool {
    forest
        .trivia(root)
        .leading
        .iter()
        .any(|c| c.trim() == GENERATED_MARKER)
}

fn declared_funcs(forest: &Forest, root: NodeId) -> Vec<String> {
    let NodeKind::File { decls, .. } = forest.kind(root) else {
        return Vec::new();
    };
    decls
        .iter()
        .filter_map(|&d| match forest.kind(d) {
            NodeKind::FuncDecl { recv: None, name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

/// Sibling units parsed from one directory.
#[derive(Debug, Clone)]
pub struct Collection {
    pub dir: PathBuf,
    pub units: Vec<Unit>,
}

impl Collection {
    pub fn diagnostic_count(&self) -> usize {
        self.units.iter().map(|u| u.diagnostics.len()).sum()
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.units.iter().flat_map(|u| u.diagnostics.iter())
    }

    pub fn first_diagnostic(&self) -> Option<&Diagnostic> {
        self.diagnostics().next()
    }

    /// Refuse to run `phase` on a collection that does not type-check.
    pub fn require_clean(&self, phase: &'static str) -> Result<(), MigrateError> {
        match self.first_diagnostic() {
            None => Ok(()),
            Some(first) => Err(MigrateError::PreexistingTypeError {
                phase,
                first: first.to_string(),
                count: self.diagnostic_count(),
            }),
        }
    }

    /// Name of the snippet file for the unit at `index`: the first
    /// non-test unit gets `snippets.go`, the others a suffixed name.
    pub fn snippet_file(&self, index: usize) -> String {
        let primary = self
            .units
            .iter()
            .position(|u| !u.name.ends_with("_test"))
            .unwrap_or(0);
        if index == primary {
            "snippets.go".to_owned()
        } else {
            format!("snippets_{}.go", self.units[index].name)
        }
    }

    pub fn save(&self, provider: &dyn SourceProvider, dir: &Path) -> Result<(), MigrateError> {
        for (i, unit) in self.units.iter().enumerate() {
            unit.save(provider, dir, &self.snippet_file(i))?;
        }
        Ok(())
    }

    /// Snippet sets by unit name, carried across reloads.
    pub fn snippets(&self) -> BTreeMap<String, SnippetSet> {
        self.units
            .iter()
            .map(|u| (u.name.clone(), u.snippets.clone()))
            .collect()
    }

    pub fn merge_snippets(&mut self, carried: &BTreeMap<String, SnippetSet>) {
        for unit in &mut self.units {
            if let Some(set) = carried.get(&unit.name) {
                for name in set.names() {
                    unit.snippets.add(name);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(src: &str) -> Unit {
        let mut u = Unit::parse("main", &[(PathBuf::from("/w/main.go"), src.to_owned())]).unwrap();
        u.check();
        u
    }

    #[test]
    fn line_col_is_one_based() {
        let u = unit("package main\n\nvar x = 1\n");
        let f = &u.files[0];
        assert_eq!(f.line_col(0), (1, 1));
        assert_eq!(f.line_col(14), (3, 1));
        assert_eq!(f.line_col(18), (3, 5));
    }

    #[test]
    fn diagnostics_carry_positions() {
        let u = unit("package main\n\nfunc f() {\n\t_ = y\n}\n");
        assert_eq!(u.diagnostics.len(), 1);
        assert_eq!(u.diagnostics[0].to_string(), "/w/main.go:4:6: undefined: y");
    }

    #[test]
    fn edits_make_type_information_stale() {
        let mut u = unit("package main\n\nvar x = 1\n");
        assert!(u.ensure_fresh().is_ok());
        let id = u.forest.ident("z");
        let _ = u.forest.kind_mut(id);
        assert!(matches!(
            u.ensure_fresh(),
            Err(MigrateError::StaleTypeInfo { .. })
        ));
        u.check();
        assert!(!u.is_stale());
    }

    #[test]
    fn generated_files_restore_their_snippets() {
        let mut set = SnippetSet::default();
        set.add("i64");
        let generated = set.render("main");
        let u = Unit::parse(
            "main",
            &[
                (PathBuf::from("/w/main.go"), "package main\n".to_owned()),
                (PathBuf::from("/w/snippets.go"), generated),
            ],
        )
        .unwrap();
        assert!(!u.files[0].generated);
        assert!(u.files[1].generated);
        assert!(u.snippets.contains("i64"));
    }

    #[test]
    fn save_skips_generated_files_and_writes_snippets_once() {
        let provider = crate::source::InMemoryProvider::default();
        let mut u = unit("package main\n\nfunc main() {\n}\n");
        u.snippets.add("i64");
        u.snippets.add("i64");
        u.save(&provider, Path::new("/out"), "snippets.go").unwrap();
        let files = provider.files();
        assert_eq!(files.len(), 2);
        let snippets = &files[Path::new("/out/snippets.go")];
        assert_eq!(snippets.matches("func i64").count(), 1);
    }
}
