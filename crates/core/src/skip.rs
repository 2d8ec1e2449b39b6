//! Per-file skip rules for the type converter.
//!
//! Entries are plain names (`width`) or names qualified with the kind of
//! entity they apply to (`width|field`, `scale|var`, `draw|func`,
//! `Point|type`). The `*` entry applies to every file and is merged into
//! each file-specific entry.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct SkipSet {
    files: BTreeMap<String, BTreeSet<String>>,
}

impl SkipSet {
    pub fn new(data: BTreeMap<String, Vec<String>>) -> Self {
        let wildcard: Vec<String> = data.get(WILDCARD).cloned().unwrap_or_default();
        let files = data
            .into_iter()
            .map(|(file, names)| {
                let set: BTreeSet<String> = names.into_iter().chain(wildcard.clone()).collect();
                (file, set)
            })
            .collect();
        SkipSet { files }
    }

    /// Rules that apply to `path`, keyed by its base name without the
    /// extension; files without their own entry use the wildcard.
    pub fn for_file(&self, path: &Path) -> FileSkip<'_> {
        let base = file_key(path);
        let names = self
            .files
            .get(&base)
            .or_else(|| self.files.get(WILDCARD));
        FileSkip { names }
    }

    pub fn is_empty(&self) -> bool {
        self.files.values().all(BTreeSet::is_empty)
    }
}

impl From<BTreeMap<String, Vec<String>>> for SkipSet {
    fn from(data: BTreeMap<String, Vec<String>>) -> Self {
        SkipSet::new(data)
    }
}

impl From<SkipSet> for BTreeMap<String, Vec<String>> {
    fn from(skip: SkipSet) -> Self {
        skip.files
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect()
    }
}

/// Base name of `path` without its extension.
pub fn file_key(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Skip rules resolved for one file.
#[derive(Debug, Clone, Copy)]
pub struct FileSkip<'a> {
    names: Option<&'a BTreeSet<String>>,
}

impl FileSkip<'_> {
    /// Exact entry lookup: `check("draw|func")`.
    pub fn check(&self, entry: &str) -> bool {
        self.names.is_some_and(|n| n.contains(entry))
    }

    /// Plain or qualified lookup: `check_suffix("w", "|var")` matches
    /// both `w` and `w|var`.
    pub fn check_suffix(&self, name: &str, suffix: &str) -> bool {
        self.check(name) || self.check(&format!("{}{}", name, suffix))
    }

    pub fn var(&self, name: &str) -> bool {
        self.check_suffix(name, "|var")
    }

    pub fn field(&self, name: &str) -> bool {
        self.check_suffix(name, "|field")
    }

    pub fn func(&self, name: &str) -> bool {
        self.check(&format!("{}|func", name))
    }

    pub fn type_name(&self, name: &str) -> bool {
        self.check(&format!("{}|type", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skip(entries: &[(&str, &[&str])]) -> SkipSet {
        SkipSet::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }

    #[test]
    fn wildcard_is_merged_into_file_entries() {
        let s = skip(&[("*", &["id|field"]), ("shapes", &["width"])]);
        let f = s.for_file(Path::new("/src/shapes.go"));
        assert!(f.field("id"));
        assert!(f.var("width"));
        assert!(f.field("width"));
        assert!(!f.var("height"));
    }

    #[test]
    fn files_without_entry_use_wildcard() {
        let s = skip(&[("*", &["draw|func"]), ("shapes", &["width"])]);
        let f = s.for_file(Path::new("other.go"));
        assert!(f.func("draw"));
        assert!(!f.var("width"));
    }

    #[test]
    fn qualified_entries_do_not_match_other_kinds() {
        let s = skip(&[("*", &["Point|type", "n|var"])]);
        let f = s.for_file(Path::new("a.go"));
        assert!(f.type_name("Point"));
        assert!(!f.func("Point"));
        assert!(f.var("n"));
        assert!(!f.field("n"));
    }

    #[test]
    fn empty_set_skips_nothing() {
        let s = SkipSet::default();
        assert!(s.is_empty());
        assert!(!s.for_file(Path::new("a.go")).var("x"));
    }

    #[test]
    fn deserializes_from_json_map() {
        let s: SkipSet = serde_json::from_str(r#"{"*": ["x"], "a": ["y|var"]}"#).unwrap();
        let f = s.for_file(Path::new("a.go"));
        assert!(f.var("x"));
        assert!(f.var("y"));
    }
}
