pub mod download_service;
pub mod merge_service;
pub mod notifier;
pub mod sync_api;
pub mod sync_history;
pub mod sync_orchestrator;
pub mod sync_service;

pub use notifier::ConsoleNotifier;
pub use sync_api::HttpSyncApi;
pub use sync_orchestrator::{CancelHandle, PollPolicy, SyncOrchestrator};
pub use sync_service::{SettingsStore, SqliteSettingsStore};
