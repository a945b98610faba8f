use std::fmt;

/// Central error types for the rrread sync client
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Export server unreachable or answered with a non-OK status
    Transport(String),
    /// Server reported a terminal status other than `done`
    JobFailed(String),
    /// Downloaded archive could not be opened
    ArchiveCorrupt(String),
    /// Job still pending after the configured number of polls
    PollLimitReached(u32),
    /// Sync attempt cancelled while waiting for the server
    Cancelled,
    /// Another sync attempt holds the `syncing` flag
    SyncInProgress,
    /// Invalid client configuration
    Config(String),
    /// General error
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Transport(msg) => write!(f, "Transport error: {}", msg),
            AppError::JobFailed(status) => write!(f, "Sync job failed with status '{}'", status),
            AppError::ArchiveCorrupt(msg) => write!(f, "Corrupt archive: {}", msg),
            AppError::PollLimitReached(polls) => {
                write!(f, "Sync job still running after {} status checks", polls)
            }
            AppError::Cancelled => write!(f, "Sync cancelled"),
            AppError::SyncInProgress => write!(f, "A sync is already running"),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Other(format!("JSON error: {}", e))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<archive_merge::ArchiveError> for AppError {
    fn from(e: archive_merge::ArchiveError) -> Self {
        match e {
            archive_merge::ArchiveError::Corrupt(msg) => AppError::ArchiveCorrupt(msg),
        }
    }
}

/// User-facing messages for notifications
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A database error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check folder permissions.".to_string()
            }
            AppError::Transport(_) => {
                "Could not reach rrread. Please check your connection and try again.".to_string()
            }
            AppError::JobFailed(_) => "Syncing rrread data failed".to_string(),
            AppError::ArchiveCorrupt(_) => "The downloaded rrread export was damaged.".to_string(),
            AppError::PollLimitReached(_) => {
                "rrread is taking too long to prepare your export. Please try again later."
                    .to_string()
            }
            AppError::Cancelled => "rrread sync cancelled.".to_string(),
            AppError::SyncInProgress => "rrread sync already running.".to_string(),
            AppError::Config(msg) => format!("Invalid configuration: {}", msg),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
