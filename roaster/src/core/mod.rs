//! Deterministic, pure logic shared by the roaster.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod frontmatter;
pub mod gate;
pub mod retry;
pub mod types;
