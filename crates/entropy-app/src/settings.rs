//! Client settings.
//!
//! Built once at start-up (by the binary from CLI arguments) and shared
//! read-only afterwards.

use std::path::PathBuf;

use entropy_core::DiffConfig;

/// Credentials filled into the login form at start-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginPrefill {
    /// Username
    pub username: Option<String>,
    /// Password
    pub password: Option<String>,
    /// Homeserver URL
    pub homeserver: Option<String>,
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Application name, used in the window title and info line.
    pub app_name: String,
    /// Version shown in the info line.
    pub version: String,
    /// Copyright notice shown in the info line.
    pub copyright: String,
    /// `chrono` format for the time next to a message.
    pub short_time_format: String,
    /// `chrono` format for the detailed message time.
    pub detail_time_format: String,
    /// Offset from UTC for displayed times, in seconds.
    pub utc_offset_seconds: i32,
    /// Longest body (in graphemes) still shown as big emoji.
    pub big_emoji_max_len: usize,
    /// Limits for granular list diffs.
    pub diff: DiffConfig,
    /// Database location. `None` keeps everything in memory.
    pub store_path: Option<PathBuf>,
    /// Login form prefill.
    pub prefill: LoginPrefill,
}

impl Settings {
    /// "{app} {version} - {copyright}"
    pub fn info_line(&self) -> String {
        format!("{} {} - {}", self.app_name, self.version, self.copyright)
    }

    /// Window title for an open room.
    pub fn room_title(&self, smart_name: &str) -> String {
        format!("{} - #{smart_name}", self.app_name)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Entropy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            copyright: "Copyright (c) Entropy contributors".to_string(),
            short_time_format: "%H:%M".to_string(),
            detail_time_format: "%b %e, %Y at %H:%M:%S".to_string(),
            utc_offset_seconds: 0,
            big_emoji_max_len: 5,
            diff: DiffConfig::default(),
            store_path: None,
            prefill: LoginPrefill::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_line_and_title() {
        let settings = Settings {
            app_name: "Entropy".into(),
            version: "1.2.3".into(),
            copyright: "(c) Kodeshack".into(),
            ..Settings::default()
        };

        assert_eq!(settings.info_line(), "Entropy 1.2.3 - (c) Kodeshack");
        assert_eq!(settings.room_title("general"), "Entropy - #general");
    }
}
