//! Append-on-write merging of a single entry

use crate::paths::parent_dir;
use crate::store::FileStore;

/// What happened to the destination file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Appended { previous_len: usize },
}

/// Step of the write sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStage {
    InvalidPath,
    CreateDir,
    Read,
    Write,
}

impl std::fmt::Display for MergeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStage::InvalidPath => write!(f, "invalid path"),
            MergeStage::CreateDir => write!(f, "creating directory"),
            MergeStage::Read => write!(f, "reading existing file"),
            MergeStage::Write => write!(f, "writing file"),
        }
    }
}

/// Failure while merging one entry
#[derive(Debug)]
pub struct MergeError {
    pub path: String,
    pub stage: MergeStage,
    pub source: std::io::Error,
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Error writing {} ({}): {}",
            self.path, self.stage, self.source
        )
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Writes entries into a store, appending to files that already exist
pub struct MergeWriter<'a, S: FileStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: FileStore + ?Sized> MergeWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Writes `content` to `path`
    ///
    /// Existing content is kept and `content` is concatenated to it without
    /// any separator. Repeating a write therefore duplicates the text.
    pub fn write(&self, path: &str, content: &str) -> Result<WriteOutcome, MergeError> {
        let fail = |stage: MergeStage, source: std::io::Error| MergeError {
            path: path.to_string(),
            stage,
            source,
        };

        if path.trim_matches('/').is_empty() {
            return Err(fail(
                MergeStage::InvalidPath,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty path"),
            ));
        }

        if let Some(dir) = parent_dir(path) {
            let dir_exists = self
                .store
                .exists(dir)
                .map_err(|e| fail(MergeStage::CreateDir, e))?;
            if !dir_exists {
                log::debug!("Creating directory {}", dir);
                self.store
                    .create_dir_all(dir)
                    .map_err(|e| fail(MergeStage::CreateDir, e))?;
            }
        }

        let file_exists = self
            .store
            .exists(path)
            .map_err(|e| fail(MergeStage::Read, e))?;

        if file_exists {
            let existing = self
                .store
                .read_to_string(path)
                .map_err(|e| fail(MergeStage::Read, e))?;
            let previous_len = existing.len();
            let merged = existing + content;
            self.store
                .write(path, &merged)
                .map_err(|e| fail(MergeStage::Write, e))?;
            log::debug!("Appended {} bytes to {}", content.len(), path);
            Ok(WriteOutcome::Appended { previous_len })
        } else {
            self.store
                .write(path, content)
                .map_err(|e| fail(MergeStage::Write, e))?;
            log::debug!("Created {}", path);
            Ok(WriteOutcome::Created)
        }
    }
}
