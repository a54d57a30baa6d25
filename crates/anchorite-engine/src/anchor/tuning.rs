use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Characters of surrounding text stored on each side of a captured
/// selection.
pub const DEFAULT_CONTEXT_WINDOW_CHARS: usize = 100;

/// Shortest selection the text-only fallback tier will search for.
/// Anything shorter matches everywhere and anchors nothing.
pub const DEFAULT_MIN_TEXT_MATCH_CHARS: usize = 3;

/// Relocation attempts per request, the first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Settle delay before the first attempt in the primary document.
pub const DEFAULT_PRIMARY_SETTLE_MS: u64 = 500;

/// Settle delay before the first attempt in a nested context, which has
/// usually finished rendering by the time a request reaches it.
pub const DEFAULT_NESTED_SETTLE_MS: u64 = 150;

/// Pause between retries in the primary document.
pub const DEFAULT_PRIMARY_RETRY_MS: u64 = 800;

/// Pause between retries in a nested context.
pub const DEFAULT_NESTED_RETRY_MS: u64 = 300;

/// How long a fresh highlight stays fully visible.
pub const DEFAULT_HIGHLIGHT_DWELL_MS: u64 = 2_000;

/// How long the fading state lasts before the markers are unwrapped.
pub const DEFAULT_HIGHLIGHT_FADE_MS: u64 = 400;

/// How many ancestors the context extractor climbs looking for a
/// block-level element before settling for what it has.
pub const DEFAULT_CONTEXT_CLIMB_LIMIT: usize = 5;

/// Elements treated as block-level boundaries for context extraction.
pub const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
    "ul",
];

/// Tuned constants for the whole relocation pipeline.
///
/// Every threshold the engine applies is a field here with the default
/// above, so deployments can override any of them (the config crate loads
/// partial TOML over `Tuning::default()`). Tests shrink the delays to keep
/// timing-sensitive cases fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub context_window_chars: usize,
    pub min_text_match_chars: usize,
    pub max_attempts: u32,
    pub primary_settle_ms: u64,
    pub nested_settle_ms: u64,
    pub primary_retry_ms: u64,
    pub nested_retry_ms: u64,
    pub highlight_dwell_ms: u64,
    pub highlight_fade_ms: u64,
    pub context_climb_limit: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            context_window_chars: DEFAULT_CONTEXT_WINDOW_CHARS,
            min_text_match_chars: DEFAULT_MIN_TEXT_MATCH_CHARS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            primary_settle_ms: DEFAULT_PRIMARY_SETTLE_MS,
            nested_settle_ms: DEFAULT_NESTED_SETTLE_MS,
            primary_retry_ms: DEFAULT_PRIMARY_RETRY_MS,
            nested_retry_ms: DEFAULT_NESTED_RETRY_MS,
            highlight_dwell_ms: DEFAULT_HIGHLIGHT_DWELL_MS,
            highlight_fade_ms: DEFAULT_HIGHLIGHT_FADE_MS,
            context_climb_limit: DEFAULT_CONTEXT_CLIMB_LIMIT,
        }
    }
}

impl Tuning {
    /// Delay before the first relocation attempt.
    #[must_use]
    pub fn settle_delay(&self, primary_context: bool) -> Duration {
        if primary_context {
            Duration::from_millis(self.primary_settle_ms)
        } else {
            Duration::from_millis(self.nested_settle_ms)
        }
    }

    /// Delay between relocation attempts.
    #[must_use]
    pub fn retry_delay(&self, primary_context: bool) -> Duration {
        if primary_context {
            Duration::from_millis(self.primary_retry_ms)
        } else {
            Duration::from_millis(self.nested_retry_ms)
        }
    }

    #[must_use]
    pub fn highlight_dwell(&self) -> Duration {
        Duration::from_millis(self.highlight_dwell_ms)
    }

    #[must_use]
    pub fn highlight_fade(&self) -> Duration {
        Duration::from_millis(self.highlight_fade_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_named_constants() {
        let tuning = Tuning::default();
        assert_eq!(tuning.context_window_chars, DEFAULT_CONTEXT_WINDOW_CHARS);
        assert_eq!(tuning.min_text_match_chars, DEFAULT_MIN_TEXT_MATCH_CHARS);
        assert_eq!(tuning.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn primary_context_waits_longer() {
        let tuning = Tuning::default();
        assert!(tuning.settle_delay(true) > tuning.settle_delay(false));
        assert!(tuning.retry_delay(true) > tuning.retry_delay(false));
    }

    #[test]
    fn partial_override_keeps_remaining_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"max_attempts": 5}"#).unwrap();
        assert_eq!(tuning.max_attempts, 5);
        assert_eq!(tuning.context_window_chars, DEFAULT_CONTEXT_WINDOW_CHARS);
    }
}
