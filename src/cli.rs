use crate::models::MergePolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rrread-sync")]
#[command(about = "Pulls rrread exports into a local notes vault")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding the database and config.toml
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
    /// Vault the export is merged into
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,
    /// Export server, e.g. https://rrread.me
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one sync attempt
    ///
    /// Ctrl-C cancels while waiting on the server. Once the export has been
    /// downloaded the merge runs to completion.
    Sync,
    /// Show the stored client settings
    Status,
    /// Set the vault folder the export lands in
    SetRoot { dir: String },
    /// Choose how already merged entries are treated
    SetMergePolicy { policy: MergePolicy },
    /// Clear a syncing flag left behind by an interrupted run
    Unlock,
    /// List recent sync attempts
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rrread-sync",
            "sync",
            "--data-dir",
            "/tmp/data",
            "--base-url",
            "https://rrread.me",
        ])
        .unwrap();

        assert!(matches!(cli.cmd, Command::Sync));
        assert_eq!(cli.global.data_dir, Some(PathBuf::from("/tmp/data")));
        assert_eq!(cli.global.base_url.as_deref(), Some("https://rrread.me"));
        assert_eq!(cli.global.vault, None);
    }

    #[test]
    fn test_parse_merge_policy() {
        let cli = Cli::try_parse_from(["rrread-sync", "set-merge-policy", "skip-applied"]).unwrap();
        assert!(matches!(
            cli.cmd,
            Command::SetMergePolicy {
                policy: MergePolicy::SkipApplied
            }
        ));

        assert!(Cli::try_parse_from(["rrread-sync", "set-merge-policy", "overwrite"]).is_err());
    }

    #[test]
    fn test_history_limit_default() {
        let cli = Cli::try_parse_from(["rrread-sync", "history"]).unwrap();
        assert!(matches!(cli.cmd, Command::History { limit: 10 }));
    }
}
