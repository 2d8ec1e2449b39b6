//! Target directory housekeeping.

use std::path::Path;

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Remove everything in `dir` except hidden entries (`.git` and the
/// like). A missing directory is created.
pub fn empty_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Copy the non-source files of `from` into `to`. README files get
/// `readme` prepended. Hidden files, `.go` files and editor backups
/// (`~`) are left out; subdirectories are not descended into.
pub fn copy_files(from: &Path, to: &Path, readme: &str) -> std::io::Result<usize> {
    let mut copied = 0;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden(&name) || name.ends_with(".go") || name.ends_with('~') {
            continue;
        }
        let target = to.join(&name);
        if name.to_lowercase().starts_with("readme") {
            let body = std::fs::read_to_string(entry.path())?;
            std::fs::write(&target, format!("{}{}", readme, body))?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_keeps_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("old/deep")).unwrap();
        std::fs::write(root.join("a.go"), "package a\n").unwrap();
        std::fs::write(root.join(".keep"), "").unwrap();

        empty_dir(root).unwrap();
        let mut names: Vec<String> = std::fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![".git", ".keep"]);
    }

    #[test]
    fn empty_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("new/target");
        empty_dir(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn copy_skips_sources_and_prefixes_readme() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("a.go"), "package a\n").unwrap();
        std::fs::write(src.path().join("a.go~"), "backup").unwrap();
        std::fs::write(src.path().join(".hidden"), "x").unwrap();
        std::fs::write(src.path().join("logo.svg"), "<svg/>").unwrap();
        std::fs::write(src.path().join("README.md"), "# Geom\n").unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();

        let copied = copy_files(src.path(), dst.path(), "Migrated copy.\n").unwrap();
        assert_eq!(copied, 2);
        assert_eq!(
            std::fs::read_to_string(dst.path().join("README.md")).unwrap(),
            "Migrated copy.\n# Geom\n"
        );
        assert_eq!(
            std::fs::read_to_string(dst.path().join("logo.svg")).unwrap(),
            "<svg/>"
        );
        assert!(!dst.path().join("a.go").exists());
        assert!(!dst.path().join("sub").exists());
    }
}
