//! # Archive Merge
//!
//! Turns a downloaded export archive into files inside a local notes tree.
//!
//! This crate provides:
//! - In-memory extraction of zip archives into text entries
//! - Translation of archive paths onto a configurable local root folder
//! - Append-on-write merging into a sandboxed file store
//!
//! ## Separation of Concerns
//!
//! This crate knows nothing about sync state. It does **not**:
//! - Talk to the export server (handled by the application)
//! - Persist settings or watermarks (handled by the application)
//! - Decide which entries to skip on repeated syncs (handled by the application)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use archive_merge::{extract, translate, LocalFileStore, MergeWriter};
//!
//! let extraction = extract(&archive_bytes)?;
//! let store = LocalFileStore::new("/path/to/vault");
//! let writer = MergeWriter::new(&store);
//!
//! for entry in &extraction.entries {
//!     let local_path = translate(&entry.filename, "Notes");
//!     if let Err(e) = writer.write(&local_path, &entry.content) {
//!         log::error!("{}", e);
//!     }
//! }
//! ```

pub mod extract;
pub mod paths;
pub mod store;
pub mod writer;

pub use extract::{extract, ArchiveEntry, ArchiveError, EntryError, Extraction};
pub use paths::{normalize_path, parent_dir, translate, ARCHIVE_ROOT};
pub use store::{FileStore, LocalFileStore};
pub use writer::{MergeError, MergeStage, MergeWriter, WriteOutcome};
