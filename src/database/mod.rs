pub mod schema;

use crate::error::AppError;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection shared between the settings store, the merge ledger and the
/// sync history
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Returns the path of the database file inside the data directory
pub fn get_database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("rrread-sync.db")
}

/// Opens the database and brings the schema up to date
pub fn init_database(data_dir: &Path) -> Result<Connection, AppError> {
    let db_path = get_database_path(data_dir);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&db_path)?;
    // Concurrent runs share this file; wait for their write locks
    conn.busy_timeout(BUSY_TIMEOUT)?;
    schema::init_schema(&conn)?;

    log::debug!("Database ready at {}", db_path.display());
    Ok(conn)
}

/// Wraps a connection for sharing
pub fn shared(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Locks the shared connection
pub fn lock(conn: &SharedConnection) -> Result<MutexGuard<'_, Connection>, AppError> {
    conn.lock()
        .map_err(|_| AppError::Other("Database connection lock poisoned".to_string()))
}

/// In-memory database with the full schema
#[cfg(test)]
pub fn open_in_memory() -> SharedConnection {
    let conn = Connection::open_in_memory().unwrap();
    schema::init_schema(&conn).unwrap();
    shared(conn)
}
