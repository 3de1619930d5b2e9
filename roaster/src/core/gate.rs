//! Gate predicate and recency window.
//!
//! The verdict for a single entry is a pure function of its frontmatter, its
//! modification time, and the instant the scan started.

use std::time::{Duration, SystemTime};

use crate::core::frontmatter::Frontmatter;

/// Default lookback: one week.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Lookback window anchored at a single `now`, sampled once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    cutoff: Option<SystemTime>,
}

impl RecencyWindow {
    pub fn ending_at(now: SystemTime, window: Duration) -> Self {
        Self {
            cutoff: now.checked_sub(window),
        }
    }

    /// True when `modified` is strictly newer than `now - window`.
    ///
    /// Timestamps in the future count as recent.
    pub fn contains(&self, modified: SystemTime) -> bool {
        match self.cutoff {
            Some(cutoff) => modified > cutoff,
            None => true,
        }
    }
}

/// An entry counts for `handle` when it is published and attributed to them.
pub fn entry_qualifies(frontmatter: &Frontmatter, handle: &str) -> bool {
    !frontmatter.draft && frontmatter.author == handle
}
