use crate::database::SharedConnection;
use crate::error::AppError;
use crate::models::{MergePolicy, SyncReport};
use crate::services::merge_service;
use crate::services::notifier::Notifier;
use crate::services::sync_api::SyncApi;
use archive_merge::FileStore;

/// Downloads the finished export archive
pub async fn download_archive<A: SyncApi>(api: &A, api_key: &str) -> Result<Vec<u8>, AppError> {
    api.download_archive(api_key).await.map_err(|e| {
        log::error!("rrread: download failed: {}", e);
        e
    })
}

/// Merges a downloaded export into the vault
///
/// An archive that cannot be opened aborts the pass. Single entries that
/// cannot be decoded or written are reported and skipped. The acknowledgment
/// sent to the server afterwards is best-effort.
pub async fn merge_archive<A, S>(
    api: &A,
    api_key: &str,
    bytes: &[u8],
    db: &SharedConnection,
    store: &S,
    root_dir: &str,
    policy: MergePolicy,
    notifier: &dyn Notifier,
) -> Result<SyncReport, AppError>
where
    A: SyncApi,
    S: FileStore + ?Sized,
{
    let extraction = archive_merge::extract(bytes).map_err(|e| {
        log::error!("rrread: could not open export archive: {}", e);
        AppError::from(e)
    })?;

    for skipped in &extraction.skipped {
        log::warn!("rrread: {}", skipped);
        notifier.notify(&format!("rrread: could not read {}", skipped.filename));
    }

    notifier.notify("Saving files...");
    let mut report = merge_service::merge_entries(
        db,
        store,
        &extraction.entries,
        root_dir,
        policy,
        notifier,
    );
    report.unreadable = extraction.skipped.len();
    drop(extraction);

    if let Err(e) = api.acknowledge_download(api_key).await {
        log::warn!("rrread: download acknowledgment failed: {}", e);
    }

    notifier.notify("rrread sync completed");
    Ok(report)
}
