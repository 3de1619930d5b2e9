//! I/O helpers for roaster commands.

pub mod agent_stream;
pub mod config;
pub mod entries;
pub mod generator;
pub mod git;
pub mod process;
pub mod prompt;
pub mod remote;
pub mod workdir;
