use rusqlite::{Connection, Result};

/// Initialize the database schema for the sync client
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Schema version table for future migrations
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_schema(conn)?;
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create the schema (version 1)
fn create_schema(conn: &Connection) -> Result<()> {
    // Table: settings (flat key-value record, values are JSON)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Table: merge_ledger (entries already merged into the vault)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS merge_ledger (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            path TEXT NOT NULL,
            digest TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            UNIQUE(path, digest)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_merge_ledger_path ON merge_ledger(path)",
        [],
    )?;

    // Table: sync_runs (history of sync attempts)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sync_runs (
            id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            outcome TEXT CHECK(outcome IN ('succeeded', 'failed', 'cancelled')) NOT NULL,
            entries_written INTEGER NOT NULL DEFAULT 0,
            entries_skipped INTEGER NOT NULL DEFAULT 0,
            entries_failed INTEGER NOT NULL DEFAULT 0,
            watermark INTEGER,
            message TEXT
        )",
        [],
    )?;

    Ok(())
}
