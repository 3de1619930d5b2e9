//! Dev-log entry scanning: the recency gate and entry snapshots.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::core::frontmatter::parse_frontmatter;
use crate::core::gate::{RecencyWindow, entry_qualifies};
use crate::io::config::RoasterConfig;

/// Decides whether a handle already has a recent published entry.
#[derive(Debug, Clone)]
pub struct RecencyGate {
    content_dir: PathBuf,
    extension: String,
    window: Duration,
}

impl RecencyGate {
    pub fn new(content_dir: impl Into<PathBuf>, extension: impl Into<String>, window: Duration) -> Self {
        Self {
            content_dir: content_dir.into(),
            extension: extension.into(),
            window,
        }
    }

    pub fn from_config(cfg: &RoasterConfig) -> Self {
        Self::new(
            cfg.repo.content_dir.clone(),
            cfg.repo.extension.clone(),
            cfg.window(),
        )
    }

    /// Entry directory inside `workdir`.
    pub fn entries_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.content_dir)
    }

    /// Check the entry directory of a working copy against the current time.
    pub async fn has_recent_entry(&self, handle: &str, workdir: &Path) -> Result<bool> {
        self.has_recent_entry_at(handle, &self.entries_dir(workdir), SystemTime::now())
            .await
    }

    /// Check `dir` for an entry modified after `now - window` that is
    /// published and attributed to `handle`.
    ///
    /// Files outside the window are skipped without being read. A missing
    /// directory holds no entries. A malformed header aborts the scan.
    #[instrument(skip_all, fields(handle = %handle, dir = %dir.display()))]
    pub async fn has_recent_entry_at(
        &self,
        handle: &str,
        dir: &Path,
        now: SystemTime,
    ) -> Result<bool> {
        info!("checking for recent entries");
        let window = RecencyWindow::ending_at(now, self.window);
        for path in list_entries(dir, &self.extension).await? {
            let modified = fs::metadata(&path)
                .await
                .and_then(|meta| meta.modified())
                .with_context(|| format!("stat {}", path.display()))?;
            if !window.contains(modified) {
                continue;
            }
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("read {}", path.display()))?;
            let frontmatter = parse_frontmatter(&content)
                .with_context(|| format!("parse frontmatter of {}", path.display()))?;
            if entry_qualifies(&frontmatter, handle) {
                info!(entry = %path.display(), "found recent entry");
                return Ok(true);
            }
        }
        debug!("no qualifying entry");
        Ok(false)
    }
}

/// Regular files directly inside `dir` with the given extension, sorted by
/// path. A missing directory yields an empty list.
pub async fn list_entries(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("list {}", dir.display())),
    };
    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .with_context(|| format!("list {}", dir.display()))?
    {
        let path = entry.path();
        if path.extension() != Some(OsStr::new(extension)) {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("stat {}", path.display()))?;
        if file_type.is_file() {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// File names currently present in an entry directory.
pub async fn snapshot_names(dir: &Path, extension: &str) -> Result<BTreeSet<String>> {
    Ok(list_entries(dir, extension)
        .await?
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect())
}
