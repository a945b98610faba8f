mod cli;
mod commands;
mod config;
mod database;
mod error;
mod filesystem;
mod models;
mod services;

use clap::Parser;
use cli::{Cli, Command};
use error::AppError;
use services::CancelHandle;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    let result = runtime.block_on(run(cli));

    if let Err(err) = result {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let ctx = commands::Context::open(&cli.global)?;
    match cli.cmd {
        Command::Sync => {
            let cancel = CancelHandle::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                log::info!("Interrupt received, cancelling sync");
                on_ctrl_c.cancel();
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Second interrupt, exiting without cleanup");
                    std::process::exit(130);
                }
            });
            commands::run_sync(&ctx, cancel).await
        }
        Command::Status => commands::run_status(&ctx),
        Command::SetRoot { dir } => commands::run_set_root(&ctx, &dir),
        Command::SetMergePolicy { policy } => commands::run_set_merge_policy(&ctx, policy),
        Command::Unlock => commands::run_unlock(&ctx),
        Command::History { limit } => commands::run_history(&ctx, limit),
    }
}
