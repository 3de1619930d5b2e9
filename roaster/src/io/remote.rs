//! Content repository access: mirroring the dev log and publishing to it.

use std::path::Path;

use anyhow::Result;
use thiserror::Error;
use tracing::{info, instrument};

use crate::io::config::RoasterConfig;
use crate::io::git::{Git, Identity};

/// Publish failures that another attempt cannot fix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("nothing to commit in {0}")]
    NothingToCommit(String),
}

/// Commit message used when publishing a roast of `handle`.
pub fn commit_message(handle: &str) -> String {
    format!("Update dev log with roast of {handle}")
}

/// The shared repository entries are read from and published to.
#[allow(async_fn_in_trait)]
pub trait ContentRepo {
    /// Materialize a working copy at `dest` (missing or empty).
    async fn mirror(&self, dest: &Path) -> Result<()>;

    /// Stage everything in `workdir`, commit it for `handle`, and push.
    async fn publish(&self, workdir: &Path, handle: &str) -> Result<()>;
}

/// [`ContentRepo`] backed by the `git` CLI.
#[derive(Debug, Clone)]
pub struct GitContentRepo {
    url: String,
    identity: Identity,
}

impl GitContentRepo {
    pub fn new(url: impl Into<String>, identity: Identity) -> Self {
        Self {
            url: url.into(),
            identity,
        }
    }

    pub fn from_config(cfg: &RoasterConfig) -> Self {
        Self::new(cfg.repo.url.clone(), cfg.identity())
    }
}

impl ContentRepo for GitContentRepo {
    #[instrument(skip_all, fields(url = %self.url, dest = %dest.display()))]
    async fn mirror(&self, dest: &Path) -> Result<()> {
        info!("cloning dev log");
        Git::clone_into(&self.url, dest).await?;
        info!("dev log cloned");
        Ok(())
    }

    #[instrument(skip_all, fields(handle = %handle, workdir = %workdir.display()))]
    async fn publish(&self, workdir: &Path, handle: &str) -> Result<()> {
        info!("pushing roast to dev log");
        let git = Git::new(workdir).with_identity(self.identity.clone());
        git.add_all().await?;
        if !git.has_staged_changes().await? {
            return Err(PublishError::NothingToCommit(workdir.display().to_string()).into());
        }
        git.commit(&commit_message(handle)).await?;
        let sha = git.head_short_sha(8).await?;
        git.push().await?;
        info!(commit = %sha, "pushed roast to dev log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_message_embeds_handle() {
        assert_eq!(commit_message("alice"), "Update dev log with roast of alice");
    }
}
