//! Agent-facing roast logic: request construction and output checks.

pub mod roast;
