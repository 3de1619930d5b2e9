//! Orchestration for a single `roaster run`.
//!
//! The run is strictly linear: mirror the dev log, gate on recent entries,
//! generate a roast, verify it, publish. Every step runs once per run; the
//! retryable ones go through [`retry`] with the configured policy.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument};

use crate::agents::roast::RoastAgent;
use crate::core::types::{RunOutcome, Stage};
use crate::io::config::RoasterConfig;
use crate::io::entries::RecencyGate;
use crate::io::generator::Generator;
use crate::io::remote::{ContentRepo, PublishError};
use crate::io::workdir::Workdirs;
use crate::retry::{StepError, retry};

/// Run the roast pipeline for `handle`.
///
/// Returns [`RunOutcome::Skipped`] when the gate finds a qualifying entry.
/// Errors carry the failing stage as context. The working copy is kept in
/// both cases.
#[instrument(skip_all, fields(handle = %handle))]
pub async fn run_pipeline<R: ContentRepo, G: Generator>(
    handle: &str,
    repo: &R,
    generator: &G,
    config: &RoasterConfig,
) -> Result<RunOutcome> {
    let policy = config.retry_policy();
    let workdirs = Workdirs::new(config.workdir.root.clone(), config.retention());
    let lease = workdirs
        .allocate()
        .await
        .context("allocate working copy")?;
    let workdir = lease.path().to_path_buf();
    transition(Stage::Start, &workdir);

    let dest = workdir.as_path();
    retry(policy, "clone", || async move {
        Workdirs::reset(dest).await?;
        repo.mirror(dest).await.map_err(StepError::from)
    })
    .await
    .context("mirror dev log")?;
    transition(Stage::Mirrored, dest);

    let gate = RecencyGate::from_config(config);
    let recent = gate
        .has_recent_entry(handle, dest)
        .await
        .context("check recent entries")?;
    transition(Stage::Gated, dest);
    if recent {
        info!("Recent entries found. Next time, {handle}!");
        return Ok(RunOutcome::Skipped { workdir });
    }
    info!("No recent entries found for {handle}. Time to roast!");

    let agent = RoastAgent::new(config);
    let before = agent.snapshot(dest).await.context("generate roast")?;
    let request = agent.request(handle, dest).context("generate roast")?;
    {
        let (agent, before, request) = (&agent, &before, &request);
        retry(policy, "generation", || async move {
            agent.discard_new(dest, before).await?;
            generator.generate(request).await.map_err(StepError::from)
        })
        .await
        .context("generate roast")?;
    }
    transition(Stage::Generated, dest);

    let entries = if agent.verifies_output() {
        vec![
            agent
                .verify(handle, dest, &before)
                .await
                .context("verify roast")?,
        ]
    } else {
        Vec::new()
    };

    retry(policy, "push", || async move {
        repo.publish(dest, handle).await.map_err(classify_publish)
    })
    .await
    .context("publish roast")?;
    transition(Stage::Published, dest);

    transition(Stage::Done, dest);
    Ok(RunOutcome::Published { workdir, entries })
}

fn classify_publish(err: anyhow::Error) -> StepError {
    if err.is::<PublishError>() {
        StepError::Permanent(err)
    } else {
        StepError::Transient(err)
    }
}

fn transition(stage: Stage, workdir: &Path) {
    info!(stage = %stage, workdir = %workdir.display(), "stage reached");
}
