//! Shared types for pipeline outcomes.

use std::fmt;
use std::path::PathBuf;

/// Stages of a single roast run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Mirrored,
    Gated,
    Generated,
    Published,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Mirrored => "mirrored",
            Stage::Gated => "gated",
            Stage::Generated => "generated",
            Stage::Published => "published",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A qualifying entry already exists; nothing was generated or pushed.
    Skipped { workdir: PathBuf },
    /// A roast was generated and pushed.
    Published {
        workdir: PathBuf,
        /// New entries found after generation, relative to the working copy.
        /// Empty when output verification is disabled.
        entries: Vec<PathBuf>,
    },
}

impl RunOutcome {
    pub fn workdir(&self) -> &PathBuf {
        match self {
            RunOutcome::Skipped { workdir } | RunOutcome::Published { workdir, .. } => workdir,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped { .. })
    }
}
