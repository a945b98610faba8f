use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Folder name used when the user has not chosen one
pub const DEFAULT_ROOT_DIR: &str = "rrread";

const API_KEY_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const API_KEY_LEN: usize = 11;

/// How entries that were already merged once are treated on later syncs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Always append, even if the same entry was merged before
    #[default]
    Append,
    /// Skip entries whose path and content were already merged
    SkipApplied,
}

impl MergePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicy::Append => "append",
            MergePolicy::SkipApplied => "skip-applied",
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "append" => Ok(MergePolicy::Append),
            "skip-applied" => Ok(MergePolicy::SkipApplied),
            other => Err(format!(
                "unknown merge policy '{}', expected 'append' or 'skip-applied'",
                other
            )),
        }
    }
}

/// Persisted client state
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Opaque credential identifying this client towards the server
    pub api_key: String,
    /// Local root folder for merged files
    pub rrread_dir: String,
    pub authorized: bool,
    /// True while a sync attempt is in flight
    pub syncing: bool,
    /// Server-issued watermark of the last successful sync
    pub last_sync: i64,
    pub merge_policy: MergePolicy,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            api_key: generate_api_key(),
            rrread_dir: DEFAULT_ROOT_DIR.to_string(),
            authorized: false,
            syncing: false,
            last_sync: 0,
            merge_policy: MergePolicy::default(),
        }
    }
}

impl SyncSettings {
    /// Sets the output root, falling back to the default for blank input
    pub fn set_root_dir(&mut self, value: &str) {
        let normalized = archive_merge::normalize_path(value.trim());
        self.rrread_dir = if normalized.is_empty() {
            DEFAULT_ROOT_DIR.to_string()
        } else {
            normalized
        };
    }
}

/// Generates a random lowercase base-36 credential
pub fn generate_api_key() -> String {
    let mut rng = rand::rng();
    (0..API_KEY_LEN)
        .map(|_| API_KEY_ALPHABET[rng.random_range(0..API_KEY_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_api_key() {
        let key = generate_api_key();
        assert_eq!(key.len(), API_KEY_LEN);
        assert!(key
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(key, generate_api_key());
    }

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.rrread_dir, "rrread");
        assert!(!settings.authorized);
        assert!(!settings.syncing);
        assert_eq!(settings.last_sync, 0);
        assert_eq!(settings.merge_policy, MergePolicy::Append);
    }

    #[test]
    fn test_set_root_dir() {
        let mut settings = SyncSettings::default();

        settings.set_root_dir("Reading//Highlights/");
        assert_eq!(settings.rrread_dir, "Reading/Highlights");

        settings.set_root_dir("   ");
        assert_eq!(settings.rrread_dir, DEFAULT_ROOT_DIR);
    }

    #[test]
    fn test_merge_policy_parse() {
        assert_eq!("append".parse::<MergePolicy>(), Ok(MergePolicy::Append));
        assert_eq!(
            "skip-applied".parse::<MergePolicy>(),
            Ok(MergePolicy::SkipApplied)
        );
        assert!("overwrite".parse::<MergePolicy>().is_err());
        assert_eq!(
            serde_json::to_string(&MergePolicy::SkipApplied).unwrap(),
            "\"skip-applied\""
        );
    }
}
