//! Archive extraction
//!
//! The export endpoint delivers a zip container holding markdown files. The
//! whole container is read into memory and every file entry is decoded as
//! UTF-8 text. A broken container fails the whole extraction, a broken entry
//! only drops that entry.

use std::io::{Cursor, Read};

/// A single decoded file from the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Archive-relative path, forward-slash separated
    pub filename: String,
    pub content: String,
}

/// The container itself could not be opened
#[derive(Debug)]
pub enum ArchiveError {
    Corrupt(String),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Corrupt(msg) => write!(f, "Corrupt archive: {}", msg),
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Corrupt(err.to_string())
    }
}

/// An entry that was skipped during extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryError {
    pub filename: String,
    pub reason: String,
}

impl std::fmt::Display for EntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Could not read {}: {}", self.filename, self.reason)
    }
}

impl std::error::Error for EntryError {}

/// Result of reading an archive: decoded entries in archive order plus the
/// entries that had to be skipped
#[derive(Debug, Default)]
pub struct Extraction {
    pub entries: Vec<ArchiveEntry>,
    pub skipped: Vec<EntryError>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.skipped.is_empty()
    }
}

/// Extracts all text entries from an in-memory zip archive
pub fn extract(bytes: &[u8]) -> Result<Extraction, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut extraction = Extraction::default();

    for i in 0..archive.len() {
        let mut file = match archive.by_index(i) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Skipping archive entry #{}: {}", i, e);
                extraction.skipped.push(EntryError {
                    filename: format!("#{}", i),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if file.is_dir() {
            log::debug!("Skipping directory entry {}", file.name());
            continue;
        }

        let filename = file.name().to_string();
        let mut raw = Vec::new();
        if let Err(e) = file.read_to_end(&mut raw) {
            log::warn!("Failed to read archive entry {}: {}", filename, e);
            extraction.skipped.push(EntryError {
                filename,
                reason: e.to_string(),
            });
            continue;
        }

        match String::from_utf8(raw) {
            Ok(content) => extraction.entries.push(ArchiveEntry { filename, content }),
            Err(e) => {
                log::warn!("Archive entry {} is not valid UTF-8: {}", filename, e);
                extraction.skipped.push(EntryError {
                    filename,
                    reason: format!("not valid UTF-8 text ({})", e.utf8_error()),
                });
            }
        }
    }

    log::debug!(
        "Extracted {} entries ({} skipped)",
        extraction.entries.len(),
        extraction.skipped.len()
    );
    Ok(extraction)
}
