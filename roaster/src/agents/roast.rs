//! Roast agent: prompt construction and output verification.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::core::frontmatter::parse_frontmatter;
use crate::io::config::RoasterConfig;
use crate::io::entries::snapshot_names;
use crate::io::generator::GenerationRequest;
use crate::io::prompt::{RoastPromptInputs, render_roast_prompt};

/// Generation outcomes that are logical failures rather than transient faults.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("agent wrote no new {prefix}*.{extension} entry in {dir}")]
    NoEntryWritten {
        dir: String,
        prefix: String,
        extension: String,
    },
    #[error("agent wrote {} new entries in {dir}, expected one: {}", .names.len(), .names.join(", "))]
    MultipleEntries { dir: String, names: Vec<String> },
    #[error("generated entry {path} is invalid: {reason}")]
    InvalidEntry { path: String, reason: String },
}

/// Settings for roast generation and its output contract.
#[derive(Debug, Clone)]
pub struct RoastAgent {
    config: RoasterConfig,
}

impl RoastAgent {
    pub fn new(config: &RoasterConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn verifies_output(&self) -> bool {
        self.config.agent.verify_output
    }

    fn content_dir(&self) -> &Path {
        &self.config.repo.content_dir
    }

    /// Build the generator request for `handle` in `workdir`.
    pub fn request(&self, handle: &str, workdir: &Path) -> Result<GenerationRequest> {
        let prompt = render_roast_prompt(&RoastPromptInputs::from_config(handle, &self.config))
            .context("render roast prompt")?;
        Ok(GenerationRequest {
            handle: handle.to_string(),
            workdir: workdir.to_path_buf(),
            system_prompt: prompt.system,
            prompt: prompt.user,
        })
    }

    /// Entry names present before generation.
    pub async fn snapshot(&self, workdir: &Path) -> Result<BTreeSet<String>> {
        snapshot_names(&workdir.join(self.content_dir()), &self.config.repo.extension).await
    }

    /// Remove entries that are not in `before`, left over from a failed
    /// generation attempt. Returns the removed file names.
    pub async fn discard_new(&self, workdir: &Path, before: &BTreeSet<String>) -> Result<Vec<String>> {
        let dir = workdir.join(self.content_dir());
        let after = snapshot_names(&dir, &self.config.repo.extension).await?;
        let mut discarded = Vec::new();
        for name in after.difference(before) {
            let path = dir.join(name);
            fs::remove_file(&path)
                .await
                .with_context(|| format!("remove {}", path.display()))?;
            warn!(entry = %name, "discarded entry from a failed attempt");
            discarded.push(name.clone());
        }
        Ok(discarded)
    }

    /// Check that generation added exactly one well-formed roast of `handle`.
    ///
    /// Returns the new entry relative to `workdir`. Contract violations are
    /// reported as [`GenerationError`].
    pub async fn verify(
        &self,
        handle: &str,
        workdir: &Path,
        before: &BTreeSet<String>,
    ) -> Result<PathBuf> {
        let prefix = &self.config.agent.file_prefix;
        let extension = &self.config.repo.extension;
        let dir = workdir.join(self.content_dir());
        let after = snapshot_names(&dir, extension).await?;
        let new_entries: Vec<&String> = after
            .difference(before)
            .filter(|name| name.starts_with(prefix.as_str()))
            .collect();
        let name = match new_entries.as_slice() {
            [] => {
                return Err(GenerationError::NoEntryWritten {
                    dir: self.content_dir().display().to_string(),
                    prefix: prefix.clone(),
                    extension: extension.clone(),
                }
                .into());
            }
            [name] => *name,
            names => {
                return Err(GenerationError::MultipleEntries {
                    dir: self.content_dir().display().to_string(),
                    names: names.iter().map(|name| name.to_string()).collect(),
                }
                .into());
            }
        };
        let relative = self.content_dir().join(name);
        let content = fs::read_to_string(dir.join(name))
            .await
            .with_context(|| format!("read {}", relative.display()))?;
        let invalid = |reason: String| GenerationError::InvalidEntry {
            path: relative.display().to_string(),
            reason,
        };
        let frontmatter = parse_frontmatter(&content).map_err(|err| invalid(err.to_string()))?;
        if frontmatter.is_empty() {
            return Err(invalid("missing frontmatter".to_string()).into());
        }
        if frontmatter.draft {
            return Err(invalid("entry is a draft".to_string()).into());
        }
        if frontmatter.author != handle {
            return Err(invalid(format!(
                "params.authorGitHubHandle is {:?}, expected {handle:?}",
                frontmatter.author
            ))
            .into());
        }
        let tag = &self.config.agent.tag;
        if !frontmatter.tags().contains(&tag.as_str()) {
            return Err(invalid(format!("missing {tag:?} tag")).into());
        }
        info!(entry = %relative.display(), "verified generated entry");
        Ok(relative)
    }
}
