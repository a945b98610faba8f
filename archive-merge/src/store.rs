//! File store abstraction
//!
//! Paths handed to a [`FileStore`] are store-relative and forward-slash
//! separated. [`LocalFileStore`] maps them below a root directory on disk and
//! refuses anything that would leave it.

use std::io;
use std::path::{Path, PathBuf};

/// The four file operations the merge step needs
pub trait FileStore {
    fn exists(&self, path: &str) -> io::Result<bool>;
    /// Creates the directory and every missing ancestor
    fn create_dir_all(&self, path: &str) -> io::Result<()>;
    fn read_to_string(&self, path: &str) -> io::Result<String>;
    /// Replaces the file content
    fn write(&self, path: &str, content: &str) -> io::Result<()>;
}

/// File store backed by a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a store-relative path to an absolute one below the root
    pub fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        if path.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty path",
            ));
        }
        if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("absolute path not allowed: {}", path),
            ));
        }

        let mut resolved = self.root.clone();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("path leaves the store root: {}", path),
                    ))
                }
                other => resolved.push(other),
            }
        }
        Ok(resolved)
    }
}

impl FileStore for LocalFileStore {
    fn exists(&self, path: &str) -> io::Result<bool> {
        self.resolve(path)?.try_exists()
    }

    fn create_dir_all(&self, path: &str) -> io::Result<()> {
        std::fs::create_dir_all(self.resolve(path)?)
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path)?)
    }

    fn write(&self, path: &str, content: &str) -> io::Result<()> {
        std::fs::write(self.resolve(path)?, content)
    }
}
