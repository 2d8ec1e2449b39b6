//! Header, patches and footer applied to migrated `.go` files.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

/// Textual replacement in one file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Patch {
    pub old: String,
    pub new: String,
    /// Replacements to make; zero or less means all
    #[serde(default)]
    pub n: i64,
    /// Byte offset where the search starts
    #[serde(default)]
    pub start: usize,
}

impl Patch {
    pub fn apply(&self, source: &str) -> String {
        let start = floor_char_boundary(source, self.start);
        let (head, tail) = source.split_at(start);
        let replaced = if self.n > 0 {
            tail.replacen(&self.old, &self.new, self.n as usize)
        } else {
            tail.replace(&self.old, &self.new)
        };
        format!("{}{}", head, replaced)
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Prefix `header`, apply the file's patches and append its footer, for
/// every `.go` file directly in `dir`. Returns the number of patches
/// applied.
pub fn patch_dir(
    dir: &Path,
    header: &str,
    patches: &BTreeMap<String, Vec<Patch>>,
    footer: &BTreeMap<String, String>,
) -> std::io::Result<usize> {
    let mut count = 0;
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_go = Path::new(&name)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("go"));
        if !is_go {
            continue;
        }
        let path = entry.path();
        let original = std::fs::read_to_string(&path)?;
        let mut source = original.clone();
        if let Some(list) = patches.get(&name) {
            for p in list {
                source = p.apply(&source);
            }
            count += list.len();
        }
        let text = format!(
            "{}{}{}",
            header,
            source,
            footer.get(&name).map(String::as_str).unwrap_or("")
        );
        if text != original {
            tracing::debug!(file = %path.display(), "patched");
            std::fs::write(&path, text)?;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(old: &str, new: &str, n: i64, start: usize) -> Patch {
        Patch {
            old: old.into(),
            new: new.into(),
            n,
            start,
        }
    }

    #[test]
    fn replaces_all_when_n_is_not_positive() {
        assert_eq!(patch("a", "b", 0, 0).apply("a-a-a"), "b-b-b");
        assert_eq!(patch("a", "b", -1, 0).apply("a-a-a"), "b-b-b");
    }

    #[test]
    fn replaces_first_n_after_start() {
        assert_eq!(patch("a", "b", 1, 0).apply("a-a-a"), "b-a-a");
        assert_eq!(patch("a", "b", 1, 1).apply("a-a-a"), "a-b-a");
        assert_eq!(patch("a", "b", 0, 99).apply("a-a"), "a-a");
    }

    #[test]
    fn header_patches_and_footer_apply_to_go_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("geom.go"), "package geom\n\nvar x = 1.0\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "var x = 1.0\n").unwrap();
        let mut patches = BTreeMap::new();
        patches.insert("geom.go".to_owned(), vec![patch("1.0", "2.0", 0, 0)]);
        let mut footer = BTreeMap::new();
        footer.insert("geom.go".to_owned(), "// end\n".to_owned());

        let count = patch_dir(dir.path(), "// header\n", &patches, &footer).unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("geom.go")).unwrap(),
            "// header\npackage geom\n\nvar x = 2.0\n// end\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("notes.txt")).unwrap(),
            "var x = 1.0\n"
        );
    }
}
