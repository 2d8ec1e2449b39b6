//! Source provider abstraction for filesystem-independent migration.
//!
//! The [`SourceProvider`] trait abstracts file I/O so the pipeline can run
//! against a real directory tree or entirely in memory (tests).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// Trait that abstracts file I/O for the migration pipeline.
///
/// The default [`FileSystemProvider`] delegates to `std::fs`;
/// [`InMemoryProvider`] keeps a map of paths to text.
pub trait SourceProvider {
    /// Read the source text for a given path.
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error>;

    /// Create or overwrite a file, creating parent directories as needed.
    fn write_source(&self, path: &Path, text: &str) -> Result<(), std::io::Error>;

    /// Regular files directly inside `dir`, sorted by name.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, std::io::Error>;

    /// Remove a single file. Removing a missing file is not an error.
    fn remove_file(&self, path: &Path) -> Result<(), std::io::Error>;
}

/// Default filesystem-backed source provider.
pub struct FileSystemProvider;

impl SourceProvider for FileSystemProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        std::fs::read_to_string(path)
    }

    fn write_source(&self, path: &Path, text: &str) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, text)
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                out.push(entry.path());
            }
        }
        out.sort();
        Ok(out)
    }

    fn remove_file(&self, path: &Path) -> Result<(), std::io::Error> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-memory source provider for tests.
///
/// Maps normalized paths to source text. Writes go through a `RefCell`
/// so the provider can be shared by reference across pipeline phases.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    files: RefCell<BTreeMap<PathBuf, String>>,
}

impl InMemoryProvider {
    pub fn new<I, P, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(p, s)| (Self::normalize_path(p.as_ref()), s.into()))
            .collect();
        InMemoryProvider {
            files: RefCell::new(files),
        }
    }

    /// Snapshot of every stored file.
    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        self.files.borrow().clone()
    }

    /// Normalize a path by resolving `.` and `..` components without
    /// touching the filesystem.
    fn normalize_path(path: &Path) -> PathBuf {
        let mut components = Vec::new();
        for component in path.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !components.is_empty() {
                        components.pop();
                    }
                }
                other => components.push(other),
            }
        }
        components.iter().collect()
    }
}

impl SourceProvider for InMemoryProvider {
    fn read_source(&self, path: &Path) -> Result<String, std::io::Error> {
        let normalized = Self::normalize_path(path);
        self.files.borrow().get(&normalized).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file not found in memory: {}", normalized.display()),
            )
        })
    }

    fn write_source(&self, path: &Path, text: &str) -> Result<(), std::io::Error> {
        self.files
            .borrow_mut()
            .insert(Self::normalize_path(path), text.to_owned());
        Ok(())
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, std::io::Error> {
        let dir = Self::normalize_path(dir);
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()))
            .cloned()
            .collect())
    }

    fn remove_file(&self, path: &Path) -> Result<(), std::io::Error> {
        self.files.borrow_mut().remove(&Self::normalize_path(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_path_resolves_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        let normalized = InMemoryProvider::normalize_path(p);
        assert_eq!(normalized, PathBuf::from("/a/c/d"));
    }

    #[test]
    fn in_memory_read_source_found() {
        let provider = InMemoryProvider::new([("/src/main.go", "package main\n")]);
        let content = provider.read_source(Path::new("/src/main.go")).unwrap();
        assert_eq!(content, "package main\n");
    }

    #[test]
    fn in_memory_read_source_not_found() {
        let provider = InMemoryProvider::default();
        let err = provider.read_source(Path::new("/missing.go")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn in_memory_list_dir_is_shallow_and_sorted() {
        let provider = InMemoryProvider::new([
            ("/src/b.go", ""),
            ("/src/a.go", ""),
            ("/src/sub/c.go", ""),
            ("/other/d.go", ""),
        ]);
        let listed = provider.list_dir(Path::new("/src/./")).unwrap();
        assert_eq!(
            listed,
            vec![PathBuf::from("/src/a.go"), PathBuf::from("/src/b.go")]
        );
    }

    #[test]
    fn in_memory_write_then_remove() {
        let provider = InMemoryProvider::default();
        provider
            .write_source(Path::new("/out/../out/x.go"), "package x\n")
            .unwrap();
        assert_eq!(
            provider.read_source(Path::new("/out/x.go")).unwrap(),
            "package x\n"
        );
        provider.remove_file(Path::new("/out/x.go")).unwrap();
        provider.remove_file(Path::new("/out/x.go")).unwrap();
        assert!(provider.files().is_empty());
    }

    #[test]
    fn filesystem_provider_round_trips_through_a_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("a.go");
        FileSystemProvider.write_source(&path, "package a\n").unwrap();
        let listed = FileSystemProvider
            .list_dir(&dir.path().join("nested"))
            .unwrap();
        assert_eq!(listed, vec![path.clone()]);
        assert_eq!(FileSystemProvider.read_source(&path).unwrap(), "package a\n");
        FileSystemProvider.remove_file(&path).unwrap();
        FileSystemProvider.remove_file(&path).unwrap();
    }
}
