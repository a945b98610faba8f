use std::path::PathBuf;

/// Overrides the data directory holding the database and `config.toml`
pub const DATA_DIR_ENV: &str = "RRREAD_DATA_DIR";

/// Get the app data directory
pub fn get_app_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("./data"),
    }
}

/// Resolves the data directory, preferring an explicit command line value
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(get_app_data_dir)
}
