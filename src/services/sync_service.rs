use crate::database::{self, SharedConnection};
use crate::error::AppError;
use crate::models::sync_settings::generate_api_key;
use crate::models::{MergePolicy, SyncSettings};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const KEY_API_KEY: &str = "api_key";
pub const KEY_ROOT_DIR: &str = "rrreadDir";
pub const KEY_AUTHORIZED: &str = "authorized";
pub const KEY_SYNCING: &str = "syncing";
pub const KEY_LAST_SYNC: &str = "lastSync";
pub const KEY_MERGE_POLICY: &str = "mergePolicy";

/// Narrow persistence port for the client settings
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<SyncSettings, AppError>;
    fn save(&self, settings: &SyncSettings) -> Result<(), AppError>;

    /// Sets `syncing` if it is clear; returns `false` when it was already set
    fn try_begin_sync(&self) -> Result<bool, AppError>;

    /// Clears `syncing` without touching the other keys
    fn end_sync(&self) -> Result<(), AppError>;

    /// Stores the watermark of a successful sync
    fn record_last_sync(&self, watermark: i64) -> Result<(), AppError>;
}

/// Settings store backed by the `settings` table
#[derive(Clone)]
pub struct SqliteSettingsStore {
    conn: SharedConnection,
}

impl SqliteSettingsStore {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn load(&self) -> Result<SyncSettings, AppError> {
        let conn = database::lock(&self.conn)?;
        load_sync_settings(&conn)
    }

    fn save(&self, settings: &SyncSettings) -> Result<(), AppError> {
        let conn = database::lock(&self.conn)?;
        save_sync_settings(&conn, settings)
    }

    fn try_begin_sync(&self) -> Result<bool, AppError> {
        let mut conn = database::lock(&self.conn)?;
        try_begin_sync(&mut conn)
    }

    fn end_sync(&self) -> Result<(), AppError> {
        let conn = database::lock(&self.conn)?;
        write_value(&conn, KEY_SYNCING, &false)
    }

    fn record_last_sync(&self, watermark: i64) -> Result<(), AppError> {
        let conn = database::lock(&self.conn)?;
        write_value(&conn, KEY_LAST_SYNC, &watermark)
    }
}

/// Test-and-set of the `syncing` flag
///
/// Runs in an immediate transaction, so the write lock is taken before the
/// flag is read and a second process sharing the database file waits until
/// the first one has committed.
pub fn try_begin_sync(conn: &mut Connection) -> Result<bool, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let syncing: bool = read_value(&tx, KEY_SYNCING)?.unwrap_or(false);
    if syncing {
        return Ok(false);
    }
    write_value(&tx, KEY_SYNCING, &true)?;
    tx.commit()?;
    Ok(true)
}

/// Loads the settings, filling in defaults for missing keys
///
/// The API key is generated on first load and stored right away so the
/// client keeps the same identity across restarts.
pub fn load_sync_settings(conn: &Connection) -> Result<SyncSettings, AppError> {
    let api_key = match read_value::<String>(conn, KEY_API_KEY)? {
        Some(key) if !key.is_empty() => key,
        _ => {
            let key = generate_api_key();
            write_value(conn, KEY_API_KEY, &key)?;
            log::info!("Generated new API key for this client");
            key
        }
    };

    let defaults = SyncSettings::default();
    Ok(SyncSettings {
        api_key,
        rrread_dir: read_value(conn, KEY_ROOT_DIR)?.unwrap_or(defaults.rrread_dir),
        authorized: read_value(conn, KEY_AUTHORIZED)?.unwrap_or(defaults.authorized),
        syncing: read_value(conn, KEY_SYNCING)?.unwrap_or(defaults.syncing),
        last_sync: read_value(conn, KEY_LAST_SYNC)?.unwrap_or(defaults.last_sync),
        merge_policy: read_value::<MergePolicy>(conn, KEY_MERGE_POLICY)?
            .unwrap_or(defaults.merge_policy),
    })
}

/// Saves every settings field
pub fn save_sync_settings(conn: &Connection, settings: &SyncSettings) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;
    write_value(&tx, KEY_API_KEY, &settings.api_key)?;
    write_value(&tx, KEY_ROOT_DIR, &settings.rrread_dir)?;
    write_value(&tx, KEY_AUTHORIZED, &settings.authorized)?;
    write_value(&tx, KEY_SYNCING, &settings.syncing)?;
    write_value(&tx, KEY_LAST_SYNC, &settings.last_sync)?;
    write_value(&tx, KEY_MERGE_POLICY, &settings.merge_policy)?;
    tx.commit()?;
    Ok(())
}

/// Reads one value; unparseable values are treated as missing
fn read_value<T: DeserializeOwned>(conn: &Connection, key: &str) -> Result<Option<T>, AppError> {
    let raw: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()?;

    match raw {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                log::warn!("Ignoring unreadable setting {}: {}", key, e);
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

fn write_value<T: Serialize>(conn: &Connection, key: &str, value: &T) -> Result<(), AppError> {
    let raw = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        (key, raw),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let store = SqliteSettingsStore::new(database::open_in_memory());

        let settings = store.load().unwrap();
        assert_eq!(settings.rrread_dir, "rrread");
        assert!(!settings.syncing);
        assert!(!settings.authorized);
        assert_eq!(settings.last_sync, 0);
        assert!(!settings.api_key.is_empty());
    }

    #[test]
    fn test_api_key_is_stable() {
        let store = SqliteSettingsStore::new(database::open_in_memory());

        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert_eq!(first.api_key, second.api_key);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = SqliteSettingsStore::new(database::open_in_memory());

        let mut settings = store.load().unwrap();
        settings.set_root_dir("Notes");
        settings.authorized = true;
        settings.syncing = true;
        settings.last_sync = 1_700_000_000;
        settings.merge_policy = MergePolicy::SkipApplied;
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_missing_keys_get_defaults() {
        let conn = database::open_in_memory();
        {
            let conn = database::lock(&conn).unwrap();
            write_value(&conn, KEY_ROOT_DIR, &"Highlights").unwrap();
            conn.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)",
                (KEY_LAST_SYNC, "not json"),
            )
            .unwrap();
        }

        let settings = SqliteSettingsStore::new(conn).load().unwrap();
        assert_eq!(settings.rrread_dir, "Highlights");
        assert_eq!(settings.last_sync, 0);
        assert_eq!(settings.merge_policy, MergePolicy::Append);
    }

    #[test]
    fn test_begin_and_end_sync() {
        let store = SqliteSettingsStore::new(database::open_in_memory());
        let mut settings = store.load().unwrap();
        settings.set_root_dir("Notes");
        store.save(&settings).unwrap();

        assert!(store.try_begin_sync().unwrap());
        assert!(!store.try_begin_sync().unwrap());
        assert!(store.load().unwrap().syncing);

        store.end_sync().unwrap();
        let after = store.load().unwrap();
        assert!(!after.syncing);
        assert_eq!(after.rrread_dir, "Notes");
        assert!(store.try_begin_sync().unwrap());
    }

    #[test]
    fn test_record_last_sync_keeps_other_keys() {
        let store = SqliteSettingsStore::new(database::open_in_memory());
        let mut settings = store.load().unwrap();
        settings.merge_policy = MergePolicy::SkipApplied;
        store.save(&settings).unwrap();

        store.record_last_sync(1_700_000_000).unwrap();

        let after = store.load().unwrap();
        assert_eq!(after.last_sync, 1_700_000_000);
        assert_eq!(after.merge_policy, MergePolicy::SkipApplied);
        assert_eq!(after.api_key, settings.api_key);
    }
}
