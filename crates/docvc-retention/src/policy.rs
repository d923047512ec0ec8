use std::time::Duration;

use serde::{Deserialize, Serialize};

use docvc_types::DocumentVersion;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Tags that protect a version from retention under every policy.
pub const ALWAYS_PROTECTED_TAGS: [&str; 2] = ["final", "approved"];

/// Which old versions may be deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionPolicy {
    /// Among versions past the keep window, this many of the newest survive.
    pub keep_count: usize,
    /// Versions younger than this are never candidates.
    pub keep_days: u64,
    /// Tags protected in addition to [`ALWAYS_PROTECTED_TAGS`].
    pub protected_tags: Vec<String>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_count: 10,
            keep_days: 30,
            protected_tags: vec!["final".to_string(), "approved".to_string()],
        }
    }
}

impl RetentionPolicy {
    pub fn with_window(mut self, keep_count: usize, keep_days: u64) -> Self {
        self.keep_count = keep_count;
        self.keep_days = keep_days;
        self
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.keep_days.saturating_mul(SECS_PER_DAY))
    }

    /// Returns `true` if `tag` is always protected or configured as such.
    pub fn protects_tag(&self, tag: &str) -> bool {
        ALWAYS_PROTECTED_TAGS.contains(&tag) || self.protected_tags.iter().any(|t| t == tag)
    }

    pub fn is_protected(&self, version: &DocumentVersion) -> bool {
        version.tags.iter().any(|tag| self.protects_tag(tag))
    }
}
