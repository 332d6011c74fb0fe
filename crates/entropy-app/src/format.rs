//! Time and text formatting for rows.
//!
//! [`Formatters`] is built once from [`Settings`] and shared by every binding
//! through an `Arc`.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use unicode_segmentation::UnicodeSegmentation;

use crate::Settings;

/// Shared row formatters.
#[derive(Debug, Clone)]
pub struct Formatters {
    short_time: String,
    detail_time: String,
    offset: FixedOffset,
    big_emoji_max_len: usize,
}

impl Formatters {
    /// Build formatters from settings.
    ///
    /// An out-of-range UTC offset falls back to UTC.
    pub fn new(settings: &Settings) -> Self {
        let offset = FixedOffset::east_opt(settings.utc_offset_seconds).unwrap_or_else(|| {
            tracing::warn!(seconds = settings.utc_offset_seconds, "invalid UTC offset, using UTC");
            Utc.fix()
        });

        Self {
            short_time: settings.short_time_format.clone(),
            detail_time: settings.detail_time_format.clone(),
            offset,
            big_emoji_max_len: settings.big_emoji_max_len,
        }
    }

    /// Time shown next to a message.
    pub fn short_time(&self, timestamp_ms: i64) -> String {
        self.format(timestamp_ms, &self.short_time)
    }

    /// Detailed time (date and seconds).
    pub fn detail_time(&self, timestamp_ms: i64) -> String {
        self.format(timestamp_ms, &self.detail_time)
    }

    /// Whether `body` gets big-emoji styling.
    pub fn is_big_emoji(&self, body: &str) -> bool {
        grapheme_len(body) <= self.big_emoji_max_len && is_emoji_only(body)
    }

    fn format(&self, timestamp_ms: i64, pattern: &str) -> String {
        match DateTime::from_timestamp_millis(timestamp_ms) {
            Some(time) => time.with_timezone(&self.offset).format(pattern).to_string(),
            None => String::new(),
        }
    }
}

impl Default for Formatters {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

/// Number of user-perceived characters.
pub fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Whether `text` consists of emoji only (whitespace aside).
///
/// Empty and whitespace-only text is not emoji-only.
pub fn is_emoji_only(text: &str) -> bool {
    let mut clusters = text.graphemes(true).filter(|g| !g.trim().is_empty()).peekable();
    if clusters.peek().is_none() {
        return false;
    }
    clusters.all(is_emoji_cluster)
}

fn is_emoji_cluster(cluster: &str) -> bool {
    let Some(base) = cluster.chars().next() else {
        return false;
    };
    if is_emoji_presentation(base) {
        return true;
    }
    // Text-default symbols are emoji only with variation selector 16 or as keycaps
    if cluster.contains('\u{20E3}') {
        return matches!(base, '0'..='9' | '#' | '*');
    }
    cluster.contains('\u{FE0F}') && is_text_default_emoji(base)
}

/// Characters drawn as emoji without a variation selector.
fn is_emoji_presentation(c: char) -> bool {
    matches!(c as u32,
        0x1F004
            | 0x1F0CF
            | 0x1F18E
            | 0x1F191..=0x1F19A
            | 0x1F1E6..=0x1F1FF
            | 0x1F201
            | 0x1F21A
            | 0x1F22F
            | 0x1F232..=0x1F236
            | 0x1F238..=0x1F23A
            | 0x1F250..=0x1F251
            | 0x1F300..=0x1F64F
            | 0x1F680..=0x1F6FF
            | 0x1F7E0..=0x1F7EB
            | 0x1F90C..=0x1F9FF
            | 0x1FA70..=0x1FAFF
            | 0x231A..=0x231B
            | 0x23E9..=0x23EC
            | 0x23F0
            | 0x23F3
            | 0x25FD..=0x25FE
            | 0x2614..=0x2615
            | 0x2648..=0x2653
            | 0x267F
            | 0x2693
            | 0x26A1
            | 0x26AA..=0x26AB
            | 0x26BD..=0x26BE
            | 0x26C4..=0x26C5
            | 0x26CE
            | 0x26D4
            | 0x26EA
            | 0x26F2..=0x26F3
            | 0x26F5
            | 0x26FA
            | 0x26FD
            | 0x2705
            | 0x270A..=0x270B
            | 0x2728
            | 0x274C
            | 0x274E
            | 0x2753..=0x2755
            | 0x2757
            | 0x2795..=0x2797
            | 0x27B0
            | 0x27BF
            | 0x2B1B..=0x2B1C
            | 0x2B50
            | 0x2B55)
}

/// Emoji that render as text unless followed by U+FE0F.
fn is_text_default_emoji(c: char) -> bool {
    matches!(c as u32,
        0x00A9
            | 0x00AE
            | 0x203C
            | 0x2049
            | 0x2122
            | 0x2139
            | 0x2194..=0x2199
            | 0x21A9..=0x21AA
            | 0x2328
            | 0x23CF
            | 0x23ED..=0x23EF
            | 0x23F1..=0x23F2
            | 0x23F8..=0x23FA
            | 0x24C2
            | 0x25AA..=0x25AB
            | 0x25B6
            | 0x25C0
            | 0x25FB..=0x25FC
            | 0x2600..=0x27BF
            | 0x2934..=0x2935
            | 0x2B05..=0x2B07
            | 0x3030
            | 0x303D
            | 0x3297
            | 0x3299
            | 0x1F000..=0x1FAFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emoji_only() {
        assert!(is_emoji_only("😀"));
        assert!(is_emoji_only("👍 🎉"));
        assert!(is_emoji_only("👨‍👩‍👧"));
        assert!(is_emoji_only("1️⃣"));
        assert!(is_emoji_only("🇩🇪"));

        assert!(!is_emoji_only(""));
        assert!(!is_emoji_only("   "));
        assert!(!is_emoji_only("hi 😀"));
        assert!(!is_emoji_only("1"));
        assert!(!is_emoji_only("#"));
    }

    #[test]
    fn text_symbols_are_not_emoji() {
        assert!(!is_emoji_only("→"));
        assert!(!is_emoji_only("⌀"));
        assert!(!is_emoji_only("©"));
        assert!(!is_emoji_only("☺"));
        assert!(!is_emoji_only("→\u{FE0F}"));

        assert!(is_emoji_only("©\u{FE0F}"));
        assert!(is_emoji_only("☺\u{FE0F}"));
        assert!(is_emoji_only("⌚"));
        assert!(is_emoji_only("⭐"));

        let formatters = Formatters::default();
        assert!(!formatters.is_big_emoji("→"));
        assert!(!formatters.is_big_emoji("⌀"));
        assert!(!formatters.is_big_emoji("©"));
    }

    #[test]
    fn big_emoji_respects_length() {
        let formatters =
            Formatters::new(&Settings { big_emoji_max_len: 3, ..Settings::default() });

        assert!(formatters.is_big_emoji("😀😀😀"));
        assert!(!formatters.is_big_emoji("😀😀😀😀"));
        // ZWJ sequences count as one
        assert!(formatters.is_big_emoji("👨‍👩‍👧👨‍👩‍👧"));
    }

    #[test]
    fn times_use_the_configured_offset() {
        let settings = Settings {
            short_time_format: "%H:%M".into(),
            detail_time_format: "%Y-%m-%d %H:%M:%S".into(),
            utc_offset_seconds: 2 * 3600,
            ..Settings::default()
        };
        let formatters = Formatters::new(&settings);
        // 2019-01-13 10:30:15 UTC
        let ts = 1_547_375_415_000;

        assert_eq!(formatters.short_time(ts), "12:30");
        assert_eq!(formatters.detail_time(ts), "2019-01-13 12:30:15");
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let formatters =
            Formatters::new(&Settings { utc_offset_seconds: 99 * 3600, ..Settings::default() });
        assert_eq!(formatters.short_time(0), "00:00");
    }
}
