//! Command line arguments.
//!
//! Everything the client can be configured with maps onto
//! [`entropy_app::Settings`]; the prefill credentials may also come from the
//! environment so they stay out of shell history.

use std::path::PathBuf;

use clap::Parser;
use entropy_app::{LoginPrefill, Settings};
use entropy_store::DEFAULT_FEED_CAPACITY;

/// Entropy terminal chat client
#[derive(Parser, Debug, Clone)]
#[command(name = "entropy")]
#[command(about = "Terminal chat client with live room and message lists")]
#[command(version)]
pub struct Args {
    /// Database file. Without it everything is kept in memory.
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Username filled into the login form
    #[arg(long, env = "ENTROPY_USERNAME")]
    pub username: Option<String>,

    /// Password filled into the login form
    #[arg(long, env = "ENTROPY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Homeserver filled into the login form
    #[arg(long, env = "ENTROPY_HOMESERVER")]
    pub homeserver: Option<String>,

    /// Offset from UTC for message times, in seconds
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub utc_offset: i32,

    /// Longest emoji-only message (in graphemes) drawn large
    #[arg(long, default_value_t = 5)]
    pub big_emoji_max_len: usize,

    /// Changes above which a list reloads instead of updating row by row
    #[arg(long, default_value_t = 256)]
    pub max_diff_changes: usize,

    /// Capacity of the change notification channel
    #[arg(long, default_value_t = DEFAULT_FEED_CAPACITY)]
    pub feed_capacity: usize,

    /// Log file. The terminal belongs to the UI, so logs never go to stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Client settings for these arguments.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings {
            utc_offset_seconds: self.utc_offset,
            big_emoji_max_len: self.big_emoji_max_len,
            store_path: self.store.clone(),
            prefill: LoginPrefill {
                username: self.username.clone(),
                password: self.password.clone(),
                homeserver: self.homeserver.clone(),
            },
            ..Settings::default()
        };
        settings.diff.max_changes = self.max_diff_changes;
        settings
    }

    /// Where logs go: `--log-file`, else `entropy.log` in the temp directory.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| std::env::temp_dir().join("entropy.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_everything_in_memory() {
        let args = Args::try_parse_from(["entropy"]).expect("parse");
        let settings = args.settings();

        assert_eq!(settings.store_path, None);
        assert_eq!(settings.big_emoji_max_len, 5);
        assert_eq!(settings.diff.max_changes, 256);
        assert!(args.log_path().ends_with("entropy.log"));
    }

    #[test]
    fn arguments_map_onto_settings() {
        let args = Args::try_parse_from([
            "entropy",
            "--store",
            "/tmp/entropy.redb",
            "--username",
            "alice",
            "--homeserver",
            "example.org",
            "--utc-offset",
            "-3600",
            "--max-diff-changes",
            "8",
        ])
        .expect("parse");
        let settings = args.settings();

        assert_eq!(settings.store_path, Some(PathBuf::from("/tmp/entropy.redb")));
        assert_eq!(settings.prefill.username.as_deref(), Some("alice"));
        assert_eq!(settings.prefill.homeserver.as_deref(), Some("example.org"));
        assert_eq!(settings.utc_offset_seconds, -3600);
        assert_eq!(settings.diff.max_changes, 8);
    }
}
