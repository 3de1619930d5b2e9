//! Stable exit codes for roaster CLI commands.

/// Run published or skipped; `check` found a recent entry.
pub const OK: i32 = 0;
/// Invalid config, exhausted retries, or any other error.
pub const FAILED: i32 = 1;
/// `roaster check` found no recent entry for the handle.
pub const NO_RECENT_ENTRY: i32 = 2;
/// Interrupted by Ctrl-C; in-flight child processes were killed.
pub const INTERRUPTED: i32 = 130;
