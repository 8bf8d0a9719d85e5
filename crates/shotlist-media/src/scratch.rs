//! Per-run scratch storage.
//!
//! Every pipeline run owns one uniquely named directory under the configured
//! work directory. The directory is removed when the [`ScratchDir`] is
//! dropped, so cleanup happens on every exit path including early returns
//! and panics that unwind.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::MediaResult;

const CUTS_DIR: &str = "cuts";
const STILLS_DIR: &str = "stills";

/// Uniquely named scratch directory owned by a single run.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
    cuts_dir: PathBuf,
    stills_dir: PathBuf,
}

impl ScratchDir {
    /// Create `<work_dir>/shotlist-<run_id>-<random>/` with `cuts/` and
    /// `stills/` subdirectories.
    ///
    /// # Errors
    ///
    /// Returns an error if the work directory or the scratch directory
    /// cannot be created.
    pub async fn create(work_dir: impl AsRef<Path>, run_id: &str) -> MediaResult<Self> {
        let work_dir = work_dir.as_ref();
        fs::create_dir_all(work_dir).await?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("shotlist-{}-", run_id))
            .tempdir_in(work_dir)?;

        let cuts_dir = dir.path().join(CUTS_DIR);
        let stills_dir = dir.path().join(STILLS_DIR);
        fs::create_dir_all(&cuts_dir).await?;
        fs::create_dir_all(&stills_dir).await?;

        debug!(path = %dir.path().display(), "Created scratch directory");

        Ok(Self {
            dir,
            cuts_dir,
            stills_dir,
        })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory receiving frames emitted by the scene detector.
    pub fn cuts_dir(&self) -> &Path {
        &self.cuts_dir
    }

    /// Directory receiving keyframe stills.
    pub fn stills_dir(&self) -> &Path {
        &self.stills_dir
    }

    /// Path of the keyframe still for a shot.
    pub fn still_path(&self, shot_index: usize) -> PathBuf {
        self.stills_dir.join(format!("shot_{:04}.jpg", shot_index))
    }

    /// Remove every frame a previous detection pass left in `cuts/`.
    ///
    /// Returns the number of files removed. Individual removal failures are
    /// logged and skipped.
    pub async fn clear_cut_frames(&self) -> MediaResult<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.cuts_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cut frame"),
            }
        }
        Ok(removed)
    }

    /// Remove the scratch directory now, reporting any failure.
    ///
    /// Dropping the value also removes it, silently.
    pub fn close(self) -> MediaResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Removed scratch directory");
        Ok(())
    }
}
