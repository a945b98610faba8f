use crate::error::AppError;
use crate::models::{RunOutcome, SyncRun};
use rusqlite::Connection;

/// Stores a finished sync attempt
pub fn record_run(conn: &Connection, run: &SyncRun) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR REPLACE INTO sync_runs
            (id, started_at, finished_at, outcome, entries_written, entries_skipped, entries_failed, watermark, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            run.id,
            run.started_at,
            run.finished_at,
            run.outcome.as_str(),
            run.entries_written,
            run.entries_skipped,
            run.entries_failed,
            run.watermark,
            run.message,
        ],
    )?;
    Ok(())
}

/// Lists the most recent attempts, newest first
pub fn list_runs(conn: &Connection, limit: usize) -> Result<Vec<SyncRun>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, started_at, finished_at, outcome, entries_written, entries_skipped, entries_failed, watermark, message
         FROM sync_runs
         ORDER BY started_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit as i64], |row| {
        let outcome: String = row.get(3)?;
        Ok(SyncRun {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            outcome: RunOutcome::parse(&outcome),
            entries_written: row.get(4)?,
            entries_skipped: row.get(5)?,
            entries_failed: row.get(6)?,
            watermark: row.get(7)?,
            message: row.get(8)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::models::SyncReport;

    #[test]
    fn test_record_and_list() {
        let db = database::open_in_memory();
        let conn = database::lock(&db).unwrap();

        let mut failed = SyncRun::start();
        failed.finish(RunOutcome::Failed, None, Some("Sync job failed".to_string()));
        record_run(&conn, &failed).unwrap();

        let mut succeeded = SyncRun::start();
        let report = SyncReport {
            created: 2,
            appended: 1,
            already_applied: 1,
            watermark: Some(1_700_000_000),
            ..SyncReport::default()
        };
        succeeded.finish(RunOutcome::Succeeded, Some(&report), None);
        record_run(&conn, &succeeded).unwrap();

        let runs = list_runs(&conn, 10).unwrap();
        assert_eq!(runs.len(), 2);
        let latest = runs.iter().find(|r| r.id == succeeded.id).unwrap();
        assert_eq!(latest.outcome, RunOutcome::Succeeded);
        assert_eq!(latest.entries_written, 3);
        assert_eq!(latest.entries_skipped, 1);
        assert_eq!(latest.watermark, Some(1_700_000_000));

        assert_eq!(list_runs(&conn, 1).unwrap().len(), 1);
    }
}
