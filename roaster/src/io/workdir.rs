//! Per-run working copy directories.
//!
//! Each run gets a fresh, exclusive directory that outlives the process so a
//! failed run can be inspected. Retention is opt-in: with a maximum age set,
//! older working copies are removed before a new one is allocated.
//!
//! A run holds a [`WorkdirLease`] for as long as it uses its directory. The
//! lease is a `<dir>.active` marker next to the directory; pruning never
//! touches a directory whose marker exists. A run that crashes leaves its
//! marker behind, so its directory is kept until the marker is removed by hand.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

/// Name prefix of every working copy directory.
pub const WORKDIR_PREFIX: &str = "devlog-roast-";

/// Suffix of the marker file that flags a working copy as in use.
pub const ACTIVE_SUFFIX: &str = ".active";

/// Allocates and prunes working copies under a root directory.
#[derive(Debug, Clone)]
pub struct Workdirs {
    root: PathBuf,
    retention: Option<Duration>,
}

/// Exclusive use of one working copy. Dropping the lease releases the
/// directory to pruning; the directory itself is kept.
#[derive(Debug)]
pub struct WorkdirLease {
    path: PathBuf,
    marker: PathBuf,
}

impl WorkdirLease {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkdirLease {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.marker) {
            Ok(()) => debug!(workdir = %self.path.display(), "released working copy"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(marker = %self.marker.display(), err = %err, "failed to release working copy"),
        }
    }
}

fn marker_for(dir: &Path) -> PathBuf {
    let mut name = dir.file_name().map(OsString::from).unwrap_or_default();
    name.push(ACTIVE_SUFFIX);
    dir.with_file_name(name)
}

impl Workdirs {
    pub fn new(root: Option<PathBuf>, retention: Option<Duration>) -> Self {
        Self {
            root: root.unwrap_or_else(std::env::temp_dir),
            retention,
        }
    }

    /// Prune stale working copies (if retention is set) and lease a new,
    /// empty one. The directory is not removed when the run ends.
    pub async fn allocate(&self) -> Result<WorkdirLease> {
        if let Some(max_age) = self.retention {
            self.prune(max_age, SystemTime::now()).await?;
        }
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("create workdir root {}", self.root.display()))?;
        let path = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(&self.root)
            .with_context(|| format!("create working copy in {}", self.root.display()))?
            .keep();
        let marker = marker_for(&path);
        fs::write(&marker, std::process::id().to_string())
            .await
            .with_context(|| format!("write {}", marker.display()))?;
        info!(workdir = %path.display(), "allocated working copy");
        Ok(WorkdirLease { path, marker })
    }

    /// Empty `dir` so a mirror attempt starts from a clean directory.
    pub async fn reset(dir: &Path) -> Result<()> {
        match fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err).with_context(|| format!("clear {}", dir.display())),
        }
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("recreate {}", dir.display()))
    }

    /// Remove released working copies last modified more than `max_age`
    /// before `now`.
    ///
    /// Returns the removed directories. Failures to remove a single directory
    /// are logged and skipped.
    pub async fn prune(&self, max_age: Duration, now: SystemTime) -> Result<Vec<PathBuf>> {
        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err).with_context(|| format!("list {}", self.root.display()));
            }
        };
        let cutoff = now.checked_sub(max_age);
        let mut removed = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .with_context(|| format!("list {}", self.root.display()))?
        {
            let path = entry.path();
            let is_workdir = entry
                .file_name()
                .to_string_lossy()
                .starts_with(WORKDIR_PREFIX);
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_workdir || !is_dir {
                continue;
            }
            if fs::try_exists(marker_for(&path)).await.unwrap_or(true) {
                debug!(workdir = %path.display(), "working copy in use, keeping");
                continue;
            }
            let modified = entry.metadata().await.and_then(|meta| meta.modified());
            let stale = match (modified, cutoff) {
                (Ok(modified), Some(cutoff)) => modified < cutoff,
                _ => false,
            };
            if !stale {
                continue;
            }
            match fs::remove_dir_all(&path).await {
                Ok(()) => {
                    debug!(workdir = %path.display(), "removed stale working copy");
                    removed.push(path);
                }
                Err(err) => warn!(workdir = %path.display(), err = %err, "failed to remove stale working copy"),
            }
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "pruned stale working copies");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{FileTime, set_file_mtime};
    use std::fs as std_fs;

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn age(path: &Path, by: Duration) {
        set_file_mtime(path, FileTime::from_system_time(SystemTime::now() - by)).expect("age");
    }

    #[tokio::test]
    async fn allocate_creates_distinct_empty_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let workdirs = Workdirs::new(Some(temp.path().join("runs")), None);
        let a = workdirs.allocate().await.expect("first");
        let b = workdirs.allocate().await.expect("second");
        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir() && b.path().is_dir());
        assert_eq!(std_fs::read_dir(a.path()).expect("read").count(), 0);
        assert!(
            a.path()
                .file_name()
                .expect("name")
                .to_string_lossy()
                .starts_with(WORKDIR_PREFIX)
        );
    }

    #[tokio::test]
    async fn dropping_the_lease_keeps_the_directory_and_clears_the_marker() {
        let temp = tempfile::tempdir().expect("tempdir");
        let workdirs = Workdirs::new(Some(temp.path().to_path_buf()), None);
        let lease = workdirs.allocate().await.expect("allocate");
        let dir = lease.path().to_path_buf();
        let marker = marker_for(&dir);
        assert!(marker.is_file());

        drop(lease);
        assert!(dir.is_dir());
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn prune_removes_only_stale_released_workdirs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        let stale = root.join(format!("{WORKDIR_PREFIX}old"));
        let fresh = root.join(format!("{WORKDIR_PREFIX}new"));
        let unrelated = root.join("keep-me");
        for dir in [&stale, &fresh, &unrelated] {
            std_fs::create_dir_all(dir).expect("mkdir");
        }
        age(&stale, HOUR * 48);
        age(&unrelated, HOUR * 48);

        let workdirs = Workdirs::new(Some(root.to_path_buf()), Some(HOUR * 24));
        let removed = workdirs.prune(HOUR * 24, SystemTime::now()).await.expect("prune");

        assert_eq!(removed, vec![stale.clone()]);
        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(unrelated.exists());
    }

    #[tokio::test]
    async fn live_workdir_survives_another_runs_allocation() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().to_path_buf();
        let first = Workdirs::new(Some(root.clone()), Some(HOUR));
        let second = Workdirs::new(Some(root), Some(HOUR));

        let lease = first.allocate().await.expect("first run");
        let dir = lease.path().to_path_buf();
        std_fs::create_dir_all(dir.join("content/blog")).expect("mkdir");
        std_fs::write(dir.join("content/blog/roast-bob.md"), "+++\n+++\n").expect("write");
        age(&dir, HOUR * 3);

        let other = second.allocate().await.expect("second run");
        assert!(dir.join("content/blog/roast-bob.md").exists());
        assert_ne!(other.path(), dir.as_path());

        drop(lease);
        let removed = second.prune(HOUR, SystemTime::now()).await.expect("prune");
        assert_eq!(removed, vec![dir.clone()]);
        assert!(other.path().is_dir());
    }

    #[tokio::test]
    async fn reset_leaves_an_empty_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join(format!("{WORKDIR_PREFIX}partial"));
        std_fs::create_dir_all(dir.join(".git")).expect("mkdir");
        std_fs::write(dir.join("README.md"), "half a clone").expect("write");

        Workdirs::reset(&dir).await.expect("reset");
        assert!(dir.is_dir());
        assert_eq!(std_fs::read_dir(&dir).expect("read").count(), 0);
    }

    #[tokio::test]
    async fn prune_of_missing_root_is_a_no_op() {
        let temp = tempfile::tempdir().expect("tempdir");
        let workdirs = Workdirs::new(Some(temp.path().join("absent")), Some(HOUR));
        assert!(
            workdirs
                .prune(HOUR, SystemTime::now())
                .await
                .expect("prune")
                .is_empty()
        );
    }
}
