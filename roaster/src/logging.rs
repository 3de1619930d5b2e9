//! Log output for unattended runs.
//!
//! A scheduled `roaster run` has no one watching, so the log is the record of
//! what happened: which working copy was used, which stage was reached, each
//! retry, and the agent's narration (target `roaster::agent`). All of it goes
//! to stderr; stdout carries only the answer of `roaster check`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Level used when `RUST_LOG` is unset. Stage transitions and agent narration
/// are logged at `info`.
const DEFAULT_FILTER: &str = "info";

/// Install the stderr subscriber. Call once, before the first run.
///
/// Quiet the agent while keeping pipeline progress:
/// ```bash
/// RUST_LOG=info,roaster::agent=warn roaster run --handle alice
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();
}
