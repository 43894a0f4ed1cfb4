//! Read-only filesystem abstraction supplied per configuration source.
//!
//! The collector only needs three operations: read a file, ask whether a
//! path is a directory, and enumerate the files under a directory. `DirFs`
//! adapts a directory on the real filesystem; `MemFs` is an in-memory
//! implementation used for testing and embedded configuration.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

/// Hierarchical read-only filesystem.
pub trait Filesystem: Send + Sync {
    /// Read the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying I/O error; the collector recovers from
    /// not-found and permission errors and treats the rest as fatal.
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>>;

    /// Whether `path` names a directory.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when the path does not exist.
    fn is_dir(&self, path: &Utf8Path) -> io::Result<bool>;

    /// List the files (never directories) under `dir`, optionally
    /// recursively, as paths usable with [`Self::read`]. The result is
    /// sorted.
    ///
    /// # Errors
    ///
    /// Returns a not-found error when `dir` does not exist; unreadable
    /// entries within an existing directory are skipped.
    fn enumerate(&self, dir: &Utf8Path, recurse: bool) -> io::Result<Vec<Utf8PathBuf>>;
}

/// A directory on the local filesystem, addressed with UTF-8 paths relative
/// to its root.
#[derive(Debug, Clone)]
pub struct DirFs {
    root: Utf8PathBuf,
}

impl DirFs {
    /// Create a filesystem rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn walk(
        &self,
        rel: &Utf8Path,
        recurse: bool,
        top: bool,
        out: &mut Vec<Utf8PathBuf>,
    ) -> io::Result<()> {
        let entries = match std::fs::read_dir(self.root.join(rel)) {
            Ok(entries) => entries,
            // Subdirectories that vanish or deny access are skipped; the
            // top-level directory must be readable.
            Err(e) if !top && recoverable(&e) => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let child = join_rel(rel, name);
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    if recurse {
                        self.walk(&child, recurse, false, out)?;
                    }
                }
                Ok(ft) if ft.is_file() => out.push(child),
                _ => {}
            }
        }
        Ok(())
    }
}

fn join_rel(rel: &Utf8Path, name: &str) -> Utf8PathBuf {
    if rel.as_str().is_empty() || rel == Utf8Path::new(".") {
        Utf8PathBuf::from(name)
    } else {
        rel.join(name)
    }
}

fn recoverable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

impl Filesystem for DirFs {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }

    fn is_dir(&self, path: &Utf8Path) -> io::Result<bool> {
        Ok(std::fs::metadata(self.root.join(path))?.is_dir())
    }

    fn enumerate(&self, dir: &Utf8Path, recurse: bool) -> io::Result<Vec<Utf8PathBuf>> {
        let mut files = Vec::new();
        self.walk(dir, recurse, true, &mut files)?;
        files.sort();
        Ok(files)
    }
}

/// An in-memory filesystem: a map from path to contents.
#[derive(Debug, Default, Clone)]
pub struct MemFs {
    files: BTreeMap<Utf8PathBuf, Vec<u8>>,
}

impl MemFs {
    /// Create an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous contents at `path`.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, data: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), data.into());
    }

    /// Builder-style [`Self::insert`].
    #[must_use]
    pub fn with(mut self, path: impl Into<Utf8PathBuf>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, data);
        self
    }
}

impl Filesystem for MemFs {
    fn read(&self, path: &Utf8Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn is_dir(&self, path: &Utf8Path) -> io::Result<bool> {
        if self.files.contains_key(path) {
            return Ok(false);
        }
        if path == Utf8Path::new(".") && !self.files.is_empty() {
            return Ok(true);
        }
        let prefix = format!("{path}/");
        if self.files.keys().any(|k| k.as_str().starts_with(&prefix)) {
            return Ok(true);
        }
        Err(io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }

    fn enumerate(&self, dir: &Utf8Path, recurse: bool) -> io::Result<Vec<Utf8PathBuf>> {
        let prefix = if dir == Utf8Path::new(".") || dir.as_str().is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        Ok(self
            .files
            .keys()
            .filter(|k| {
                let Some(rest) = k.as_str().strip_prefix(&prefix) else {
                    return false;
                };
                recurse || !rest.contains('/')
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use camino::{Utf8Path, Utf8PathBuf};

    use super::{DirFs, Filesystem, MemFs};

    #[test]
    fn memfs_single_level_enumeration_skips_subdirectories() {
        let fs = MemFs::new()
            .with("a.json", "{}")
            .with("conf.d/b.json", "{}");

        let found = fs
            .enumerate(Utf8Path::new("."), false)
            .unwrap_or_else(|e| panic!("enumerate failed: {e}"));
        assert_eq!(found, vec![Utf8PathBuf::from("a.json")]);

        let found = fs
            .enumerate(Utf8Path::new("."), true)
            .unwrap_or_else(|e| panic!("enumerate failed: {e}"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn memfs_reports_directories() {
        let fs = MemFs::new().with("conf.d/b.json", "{}");
        assert!(matches!(fs.is_dir(Utf8Path::new("conf.d")), Ok(true)));
        assert!(matches!(fs.is_dir(Utf8Path::new("conf.d/b.json")), Ok(false)));
        assert!(fs.is_dir(Utf8Path::new("missing")).is_err());
    }

    #[test]
    fn dirfs_enumerates_relative_to_its_root() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("one.json"), "{}")?;
        std::fs::create_dir(dir.path().join("sub"))?;
        std::fs::write(dir.path().join("sub").join("two.json"), "{}")?;

        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow::anyhow!("non-utf8 tempdir: {}", p.display()))?;
        let fs = DirFs::new(root);

        let flat = fs.enumerate(Utf8Path::new("."), false)?;
        assert_eq!(flat, vec![Utf8PathBuf::from("one.json")]);

        let deep = fs.enumerate(Utf8Path::new("."), true)?;
        assert_eq!(
            deep,
            vec![
                Utf8PathBuf::from("one.json"),
                Utf8PathBuf::from("sub/two.json")
            ]
        );

        assert_eq!(fs.read(Utf8Path::new("one.json"))?, b"{}");
        Ok(())
    }
}
