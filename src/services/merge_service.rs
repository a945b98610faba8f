use crate::database::{self, SharedConnection};
use crate::error::AppError;
use crate::models::{FailedEntry, MergePolicy, SyncReport};
use crate::services::notifier::Notifier;
use archive_merge::{translate, ArchiveEntry, FileStore, MergeWriter, WriteOutcome};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};

/// Content hash that, together with the destination path, identifies an entry
pub fn entry_digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Checks whether this exact entry was merged before
pub fn is_applied(conn: &Connection, path: &str, digest: &str) -> Result<bool, AppError> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM merge_ledger WHERE path = ?1 AND digest = ?2",
            (path, digest),
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Records a merged entry
pub fn mark_applied(conn: &Connection, path: &str, digest: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR IGNORE INTO merge_ledger (path, digest, applied_at) VALUES (?1, ?2, ?3)",
        (path, digest, Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

/// Merges extracted entries into the store one after another
///
/// A failing entry is reported and skipped; the remaining entries are still
/// written. Ledger problems are logged and never block a write.
pub fn merge_entries<S: FileStore + ?Sized>(
    db: &SharedConnection,
    store: &S,
    entries: &[ArchiveEntry],
    root_dir: &str,
    policy: MergePolicy,
    notifier: &dyn Notifier,
) -> SyncReport {
    let writer = MergeWriter::new(store);
    let mut report = SyncReport::default();

    for entry in entries {
        let local_path = translate(&entry.filename, root_dir);
        let digest = entry_digest(&entry.content);

        if policy == MergePolicy::SkipApplied && ledger_contains(db, &local_path, &digest) {
            log::debug!("Skipping {}, already merged", local_path);
            report.already_applied += 1;
            continue;
        }

        match writer.write(&local_path, &entry.content) {
            Ok(WriteOutcome::Created) => report.created += 1,
            Ok(WriteOutcome::Appended { .. }) => report.appended += 1,
            Err(e) => {
                log::error!("rrread: error writing {}: {}", local_path, e);
                notifier.notify(&format!("rrread: error writing {}", local_path));
                report.failed.push(FailedEntry {
                    path: local_path,
                    reason: e.to_string(),
                });
                continue;
            }
        }

        if let Err(e) = database::lock(db).and_then(|conn| mark_applied(&conn, &local_path, &digest))
        {
            log::warn!("Failed to record {} in merge ledger: {}", local_path, e);
        }
    }

    log::info!(
        "Merged {} entries ({} created, {} appended, {} already applied, {} failed)",
        entries.len(),
        report.created,
        report.appended,
        report.already_applied,
        report.failed.len()
    );
    report
}

fn ledger_contains(db: &SharedConnection, path: &str, digest: &str) -> bool {
    match database::lock(db).and_then(|conn| is_applied(&conn, path, digest)) {
        Ok(found) => found,
        Err(e) => {
            log::warn!("Merge ledger lookup failed for {}: {}", path, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::RecordingNotifier;
    use archive_merge::LocalFileStore;
    use std::io;

    /// Store that refuses to write one specific path
    struct FailingStore {
        inner: LocalFileStore,
        broken_path: String,
    }

    impl FileStore for FailingStore {
        fn exists(&self, path: &str) -> io::Result<bool> {
            self.inner.exists(path)
        }

        fn create_dir_all(&self, path: &str) -> io::Result<()> {
            self.inner.create_dir_all(path)
        }

        fn read_to_string(&self, path: &str) -> io::Result<String> {
            self.inner.read_to_string(path)
        }

        fn write(&self, path: &str, content: &str) -> io::Result<()> {
            if path == self.broken_path {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "simulated permission error",
                ));
            }
            self.inner.write(path, content)
        }
    }

    fn entry(filename: &str, content: &str) -> ArchiveEntry {
        ArchiveEntry {
            filename: filename.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_failing_entry_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let store = FailingStore {
            inner: LocalFileStore::new(dir.path()),
            broken_path: "Notes/b.md".to_string(),
        };
        store.inner.create_dir_all("Notes").unwrap();
        store.inner.write("Notes/c.md", "old ").unwrap();

        let db = database::open_in_memory();
        let notifier = RecordingNotifier::default();
        let entries = vec![
            entry("rrread/a.md", "first"),
            entry("rrread/b.md", "second"),
            entry("rrread/c.md", "third"),
        ];

        let report = merge_entries(
            &db,
            &store,
            &entries,
            "Notes",
            MergePolicy::Append,
            &notifier,
        );

        assert_eq!(report.created, 1);
        assert_eq!(report.appended, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, "Notes/b.md");
        assert_eq!(store.inner.read_to_string("Notes/a.md").unwrap(), "first");
        assert_eq!(store.inner.read_to_string("Notes/c.md").unwrap(), "old third");
        assert!(!store.inner.exists("Notes/b.md").unwrap());
        assert_eq!(
            notifier.messages(),
            vec!["rrread: error writing Notes/b.md".to_string()]
        );
    }

    #[test]
    fn test_append_policy_duplicates_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        let db = database::open_in_memory();
        let notifier = RecordingNotifier::default();
        let entries = vec![entry("rrread/a.md", "hello ")];

        merge_entries(&db, &store, &entries, "Notes", MergePolicy::Append, &notifier);
        let report = merge_entries(&db, &store, &entries, "Notes", MergePolicy::Append, &notifier);

        assert_eq!(report.appended, 1);
        assert_eq!(store.read_to_string("Notes/a.md").unwrap(), "hello hello ");
    }

    #[test]
    fn test_skip_applied_policy_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        let db = database::open_in_memory();
        let notifier = RecordingNotifier::default();
        let entries = vec![entry("rrread/a.md", "hello ")];

        merge_entries(&db, &store, &entries, "Notes", MergePolicy::SkipApplied, &notifier);
        let report = merge_entries(
            &db,
            &store,
            &entries,
            "Notes",
            MergePolicy::SkipApplied,
            &notifier,
        );

        assert_eq!(report.already_applied, 1);
        assert_eq!(report.written(), 0);
        assert_eq!(store.read_to_string("Notes/a.md").unwrap(), "hello ");

        // New content for the same file is still appended
        let next = vec![entry("rrread/a.md", "world")];
        let report = merge_entries(&db, &store, &next, "Notes", MergePolicy::SkipApplied, &notifier);
        assert_eq!(report.appended, 1);
        assert_eq!(store.read_to_string("Notes/a.md").unwrap(), "hello world");
    }

    #[test]
    fn test_ledger_roundtrip() {
        let db = database::open_in_memory();
        let conn = database::lock(&db).unwrap();
        let digest = entry_digest("content");

        assert_eq!(digest.len(), 64);
        assert!(!is_applied(&conn, "Notes/a.md", &digest).unwrap());
        mark_applied(&conn, "Notes/a.md", &digest).unwrap();
        mark_applied(&conn, "Notes/a.md", &digest).unwrap();
        assert!(is_applied(&conn, "Notes/a.md", &digest).unwrap());
        assert!(!is_applied(&conn, "Notes/b.md", &digest).unwrap());
    }
}
