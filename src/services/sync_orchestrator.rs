//! Poll-wait-download-merge flow
//!
//! One call to [`SyncOrchestrator::run_sync`] is one sync attempt:
//! ```text
//! acquire `syncing` ──► status ──► started/running ──► wait ──► status ...
//!                          │
//!                          ├─► done ──► download ──► extract ──► merge ──► ack ──► watermark
//!                          └─► anything else ──► failed
//! ```
//! The `syncing` flag is held by a [`SyncGuard`] for the whole attempt and
//! released on every exit path.

use crate::config::ClientConfig;
use crate::database::{self, SharedConnection};
use crate::error::AppError;
use crate::models::{JobStatus, RunOutcome, SyncReport, SyncRun};
use crate::services::download_service;
use crate::services::notifier::Notifier;
use crate::services::sync_api::SyncApi;
use crate::services::sync_history;
use crate::services::sync_service::SettingsStore;
use archive_merge::FileStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// How often and how long to poll a pending job
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the server reaches a terminal state
    pub max_polls: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_polls: Some(360),
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_polls: config.max_polls(),
        }
    }
}

/// Cancels the network waits of a running attempt
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Runs `fut` unless the handle is cancelled first
    ///
    /// A cancelled future is dropped at its next await point.
    pub async fn run_until_cancelled<T, F>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let mut rx = self.tx.subscribe();
        if self.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        tokio::select! {
            result = fut => result,
            Ok(_) = rx.wait_for(|cancelled| *cancelled) => Err(AppError::Cancelled),
        }
    }
}

/// Holds the persisted `syncing` flag for the lifetime of an attempt
pub struct SyncGuard {
    settings: Arc<dyn SettingsStore>,
}

impl SyncGuard {
    /// Sets `syncing`, failing if another attempt already holds it
    pub fn acquire(settings: Arc<dyn SettingsStore>) -> Result<Self, AppError> {
        if !settings.try_begin_sync()? {
            return Err(AppError::SyncInProgress);
        }
        Ok(Self { settings })
    }
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        if let Err(e) = self.settings.end_sync() {
            log::error!("Failed to clear syncing flag: {}", e);
        }
    }
}

/// Drives one sync attempt from job start to merged files
pub struct SyncOrchestrator<A: SyncApi> {
    api: A,
    settings: Arc<dyn SettingsStore>,
    db: SharedConnection,
    store: Arc<dyn FileStore + Send + Sync>,
    notifier: Arc<dyn Notifier>,
    policy: PollPolicy,
    cancel: CancelHandle,
}

impl<A: SyncApi> SyncOrchestrator<A> {
    pub fn new(
        api: A,
        settings: Arc<dyn SettingsStore>,
        db: SharedConnection,
        store: Arc<dyn FileStore + Send + Sync>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            settings,
            db,
            store,
            notifier,
            policy: PollPolicy::default(),
            cancel: CancelHandle::new(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one sync attempt
    ///
    /// Returns [`AppError::SyncInProgress`] without touching anything when
    /// another attempt holds the `syncing` flag.
    pub async fn run_sync(&self) -> Result<SyncReport, AppError> {
        let guard = match SyncGuard::acquire(self.settings.clone()) {
            Ok(guard) => guard,
            Err(AppError::SyncInProgress) => {
                log::warn!("Sync requested while another sync is running");
                self.notifier.notify(&AppError::SyncInProgress.user_message());
                return Err(AppError::SyncInProgress);
            }
            Err(e) => return Err(e),
        };

        let mut run = SyncRun::start();
        let result = self.run_attempt().await;

        match &result {
            Ok(report) => {
                log::info!("Sync {} finished: {:?}", run.id, report);
                run.finish(RunOutcome::Succeeded, Some(report), None);
            }
            Err(AppError::Cancelled) => {
                log::info!("Sync {} cancelled", run.id);
                self.notifier.notify(&AppError::Cancelled.user_message());
                run.finish(RunOutcome::Cancelled, None, Some(AppError::Cancelled.to_string()));
            }
            Err(e) => {
                log::error!("Sync {} failed: {}", run.id, e);
                self.notifier.notify(&e.user_message());
                run.finish(RunOutcome::Failed, None, Some(e.to_string()));
            }
        }

        if let Err(e) = database::lock(&self.db).and_then(|conn| sync_history::record_run(&conn, &run))
        {
            log::warn!("Failed to record sync history: {}", e);
        }

        drop(guard);
        result
    }

    async fn run_attempt(&self) -> Result<SyncReport, AppError> {
        let settings = self.settings.load()?;
        if !settings.authorized {
            log::warn!("Client is not marked as authorized; the server may reject the sync");
        }

        self.notifier.notify("Syncing rrread...");
        let mut response = self
            .cancel
            .run_until_cancelled(self.api.fetch_status(&settings.api_key))
            .await
            .map_err(|e| {
                log::error!("rrread: sync fetch failed: {}", e);
                e
            })?;
        self.notifier.notify("Syncing rrread data");
        let mut polls: u32 = 1;

        loop {
            let status = response.job_status();
            match status {
                JobStatus::Done => {
                    self.notifier.notify("Syncing rrread data completed");
                    log::info!("Sync job done after {} status checks", polls);

                    let bytes = self
                        .cancel
                        .run_until_cancelled(download_service::download_archive(
                            &self.api,
                            &settings.api_key,
                        ))
                        .await?;
                    let mut report = download_service::merge_archive(
                        &self.api,
                        &settings.api_key,
                        &bytes,
                        &self.db,
                        self.store.as_ref(),
                        &settings.rrread_dir,
                        settings.merge_policy,
                        self.notifier.as_ref(),
                    )
                    .await?;
                    report.polls = polls;
                    report.watermark = response.watermark();
                    self.record_watermark(report.watermark)?;
                    return Ok(report);
                }
                pending if pending.is_pending() => {
                    if let Some(max) = self.policy.max_polls {
                        if polls >= max {
                            return Err(AppError::PollLimitReached(polls));
                        }
                    }
                    log::debug!(
                        "Sync job still {}, checking again in {:?}",
                        pending.as_str(),
                        self.policy.interval
                    );
                    self.cancel
                        .run_until_cancelled(async {
                            tokio::time::sleep(self.policy.interval).await;
                            Ok::<_, AppError>(())
                        })
                        .await?;
                    response = self
                        .cancel
                        .run_until_cancelled(self.api.fetch_status(&settings.api_key))
                        .await?;
                    polls += 1;
                }
                other => {
                    log::error!("rrread: sync job ended with status {}", other.as_str());
                    return Err(AppError::JobFailed(other.as_str().to_string()));
                }
            }
        }
    }

    fn record_watermark(&self, watermark: Option<i64>) -> Result<(), AppError> {
        let Some(watermark) = watermark else {
            log::warn!("Server finished the sync without a last_sync value, keeping the old one");
            return Ok(());
        };
        self.settings.record_last_sync(watermark)?;
        log::info!("Recorded sync watermark {}", watermark);
        Ok(())
    }
}
