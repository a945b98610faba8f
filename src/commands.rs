use crate::cli::GlobalArgs;
use crate::config::ClientConfig;
use crate::database::{self, SharedConnection};
use crate::error::AppError;
use crate::filesystem;
use crate::models::{MergePolicy, SyncReport};
use crate::services::sync_history;
use crate::services::{
    CancelHandle, ConsoleNotifier, HttpSyncApi, PollPolicy, SettingsStore, SqliteSettingsStore,
    SyncOrchestrator,
};
use archive_merge::LocalFileStore;
use chrono::DateTime;
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a command needs: resolved config and the open database
pub struct Context {
    pub data_dir: PathBuf,
    pub config: ClientConfig,
    pub db: SharedConnection,
}

impl Context {
    pub fn open(global: &GlobalArgs) -> Result<Self, AppError> {
        let data_dir = filesystem::resolve_data_dir(global.data_dir.clone());
        let mut config = ClientConfig::load(&data_dir)?;
        if let Some(base_url) = &global.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(vault) = &global.vault {
            config.vault_dir = Some(vault.clone());
        }
        config.validate()?;

        let conn = database::init_database(&data_dir)?;
        Ok(Self {
            data_dir,
            config,
            db: database::shared(conn),
        })
    }

    fn settings(&self) -> SqliteSettingsStore {
        SqliteSettingsStore::new(self.db.clone())
    }
}

pub async fn run_sync(ctx: &Context, cancel: CancelHandle) -> Result<(), AppError> {
    let vault = ctx.config.vault_root()?;
    std::fs::create_dir_all(&vault)?;
    log::info!(
        "Syncing from {} into {}",
        ctx.config.base_url,
        vault.display()
    );

    let orchestrator = SyncOrchestrator::new(
        HttpSyncApi::new(&ctx.config)?,
        Arc::new(ctx.settings()),
        ctx.db.clone(),
        Arc::new(LocalFileStore::new(vault)),
        Arc::new(ConsoleNotifier),
    )
    .with_policy(PollPolicy::from_config(&ctx.config))
    .with_cancel_handle(cancel);

    let report = orchestrator.run_sync().await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!(
        "created: {}, appended: {}, skipped: {}, failed: {}",
        report.created,
        report.appended,
        report.skipped(),
        report.failed.len()
    );
    for failed in &report.failed {
        println!("  failed: {} ({})", failed.path, failed.reason);
    }
}

pub fn run_status(ctx: &Context) -> Result<(), AppError> {
    let settings = ctx.settings().load()?;
    println!("data dir:      {}", ctx.data_dir.display());
    println!("server:        {}", ctx.config.base_url);
    println!("vault:         {}", ctx.config.vault_root()?.display());
    println!("root folder:   {}", settings.rrread_dir);
    println!("api key:       {}", settings.api_key);
    println!("authorized:    {}", settings.authorized);
    println!("syncing:       {}", settings.syncing);
    println!("last sync:     {}", format_watermark(settings.last_sync));
    println!("merge policy:  {}", settings.merge_policy.as_str());
    Ok(())
}

fn format_watermark(last_sync: i64) -> String {
    if last_sync <= 0 {
        return "never".to_string();
    }
    match DateTime::from_timestamp(last_sync, 0) {
        Some(at) => format!("{} ({})", at.to_rfc3339(), last_sync),
        None => last_sync.to_string(),
    }
}

pub fn run_set_root(ctx: &Context, dir: &str) -> Result<(), AppError> {
    let store = ctx.settings();
    let mut settings = store.load()?;
    settings.set_root_dir(dir);
    store.save(&settings)?;
    println!("root folder set to {}", settings.rrread_dir);
    Ok(())
}

pub fn run_set_merge_policy(ctx: &Context, policy: MergePolicy) -> Result<(), AppError> {
    let store = ctx.settings();
    let mut settings = store.load()?;
    settings.merge_policy = policy;
    store.save(&settings)?;
    println!("merge policy set to {}", policy.as_str());
    Ok(())
}

pub fn run_unlock(ctx: &Context) -> Result<(), AppError> {
    let store = ctx.settings();
    if !store.load()?.syncing {
        println!("no sync in progress");
        return Ok(());
    }
    store.end_sync()?;
    log::warn!("Cleared syncing flag by request");
    println!("syncing flag cleared");
    Ok(())
}

pub fn run_history(ctx: &Context, limit: usize) -> Result<(), AppError> {
    let conn = database::lock(&ctx.db)?;
    let runs = sync_history::list_runs(&conn, limit)?;
    if runs.is_empty() {
        println!("no sync attempts recorded");
        return Ok(());
    }
    for run in runs {
        println!(
            "{}  {}  {:<9}  written {}  skipped {}  failed {}{}",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.outcome.as_str(),
            run.entries_written,
            run.entries_skipped,
            run.entries_failed,
            run.message
                .map(|message| format!("  ({})", message))
                .unwrap_or_default()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let global = GlobalArgs {
            data_dir: Some(dir.path().to_path_buf()),
            vault: Some(dir.path().join("vault")),
            base_url: Some("https://rrread.me".to_string()),
        };
        let ctx = Context::open(&global).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_open_applies_overrides() {
        let (dir, ctx) = context();
        assert_eq!(ctx.config.base_url, "https://rrread.me");
        assert_eq!(ctx.config.vault_root().unwrap(), dir.path().join("vault"));
        assert!(database::get_database_path(dir.path()).exists());
    }

    #[test]
    fn test_setters_persist() {
        let (_dir, ctx) = context();
        run_set_root(&ctx, "/Inbox/rrread/").unwrap();
        run_set_merge_policy(&ctx, MergePolicy::SkipApplied).unwrap();

        let settings = ctx.settings().load().unwrap();
        assert_eq!(settings.rrread_dir, "Inbox/rrread");
        assert_eq!(settings.merge_policy, MergePolicy::SkipApplied);
    }

    #[test]
    fn test_unlock_clears_stale_flag() {
        let (_dir, ctx) = context();
        let store = ctx.settings();
        let mut settings = store.load().unwrap();
        settings.syncing = true;
        store.save(&settings).unwrap();

        run_unlock(&ctx).unwrap();
        assert!(!store.load().unwrap().syncing);
    }

    #[test]
    fn test_format_watermark() {
        assert_eq!(format_watermark(0), "never");
        assert_eq!(
            format_watermark(1_700_000_000),
            "2023-11-14T22:13:20+00:00 (1700000000)"
        );
    }
}
