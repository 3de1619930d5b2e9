//! Dev-log roaster.
//!
//! Checks whether a contributor has published a recent entry in a shared
//! dev-log repository and, if not, has an agent write a roast of their recent
//! upstream work and pushes it. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (frontmatter parsing, recency window, retry
//!   policy). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, git, agent process).
//!   Behind traits where tests substitute scripted collaborators.
//!
//! [`pipeline`] coordinates both to implement `roaster run`.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod retry;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
