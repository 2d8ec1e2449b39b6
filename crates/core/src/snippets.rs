//! Helper functions that fixes inject into a unit.
//!
//! A unit keeps a [`SnippetSet`] of helper names. Saving the unit emits
//! one generated file holding every requested helper, so a helper is
//! written once no matter how many call sites use it.

use std::collections::BTreeSet;

/// Marker carried by every file this crate generates. The frontend
/// recognises it and the converter leaves such files alone.
pub const GENERATED_MARKER: &str = "// Code generated by typeshift. DO NOT EDIT.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet {
    pub name: &'static str,
    pub imports: &'static [&'static str],
    pub source: &'static str,
}

const I32: Snippet = Snippet {
    name: "i32",
    imports: &[],
    source: "// i32 converts float32 constants to int
func i32(x float32) int {
	return int(x)
}
",
};

const I64: Snippet = Snippet {
    name: "i64",
    imports: &[],
    source: "// i64 converts float64 constants to int
func i64(x float64) int {
	return int(x)
}
",
};

const CATALOGUE: &[Snippet] = &[I32, I64];

pub fn lookup(name: &str) -> Option<&'static Snippet> {
    CATALOGUE.iter().find(|s| s.name == name)
}

/// Truncating helper for a float type, if one exists.
pub fn truncation_helper(float_type: &str) -> Option<&'static str> {
    match float_type {
        "float32" => Some(I32.name),
        "float64" => Some(I64.name),
        _ => None,
    }
}

/// Names of the helpers a unit needs, kept in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetSet {
    names: BTreeSet<&'static str>,
}

impl SnippetSet {
    /// Request a helper. Returns false if the name is unknown; requesting
    /// a helper twice is a no-op.
    pub fn add(&mut self, name: &str) -> bool {
        match lookup(name) {
            Some(s) => {
                self.names.insert(s.name);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Source of the generated helper file for `package`.
    pub fn render(&self, package: &str) -> String {
        let snippets: Vec<&Snippet> = self.names.iter().filter_map(|n| lookup(n)).collect();
        let imports: BTreeSet<&str> = snippets
            .iter()
            .flat_map(|s| s.imports.iter().copied())
            .collect();
        let mut out = format!("{}\n\npackage {}\n", GENERATED_MARKER, package);
        if !imports.is_empty() {
            out.push_str("\nimport (\n");
            for imp in imports {
                out.push_str(&format!("\t{:?}\n", imp));
            }
            out.push_str(")\n");
        }
        for s in snippets {
            out.push('\n');
            out.push_str(s.source);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adding_twice_keeps_one_entry() {
        let mut set = SnippetSet::default();
        assert!(set.add("i64"));
        assert!(set.add("i64"));
        assert_eq!(set.len(), 1);
        assert!(!set.add("nope"));
    }

    #[test]
    fn render_emits_helpers_in_name_order() {
        let mut set = SnippetSet::default();
        set.add("i64");
        set.add("i32");
        let out = set.render("geom");
        assert!(out.starts_with(GENERATED_MARKER));
        assert!(out.contains("package geom\n"));
        let a = out.find("func i32").unwrap();
        let b = out.find("func i64").unwrap();
        assert!(a < b);
        assert!(!out.contains("import"));
    }

    #[test]
    fn helper_by_width() {
        assert_eq!(truncation_helper("float32"), Some("i32"));
        assert_eq!(truncation_helper("float64"), Some("i64"));
        assert_eq!(truncation_helper("int"), None);
    }
}
