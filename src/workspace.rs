//! Working directories and their guaranteed cleanup.
//!
//! A [`Workspace`] is two directories: the intake area, which receives the
//! submitted file and the finished archive, and the scratch area, which holds
//! partition files. Both are drained after every request cycle.
//!
//! # Usage
//!
//! ```no_run
//! use csv_partitioner::workspace::Workspace;
//!
//! # fn main() -> csv_partitioner::Result<()> {
//! let ws = Workspace::new("./work");
//! ws.ensure_dirs()?;
//!
//! let guard = ws.cleanup_guard();
//! // ... produce and deliver the archive ...
//! let report = guard.finish();
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, SplitError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LOG_TARGET: &str = "workspace";

/// Default intake directory name under the workspace root.
pub const INTAKE_DIR: &str = "uploads";
/// Default scratch directory name under the workspace root.
pub const SCRATCH_DIR: &str = "partitions";

/// Deletes a single file. The seam exists so teardown can run against a
/// remover that refuses some paths.
pub trait FileRemover {
    /// Remove the file at `path`.
    ///
    /// # Errors
    /// Any I/O error from the underlying deletion.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`FileRemover`] backed by [`std::fs::remove_file`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FsRemover;

impl FileRemover for FsRemover {
    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// The intake and scratch directories of one process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    intake: PathBuf,
    scratch: PathBuf,
}

impl Workspace {
    /// Workspace with the default `uploads/` and `partitions/` under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::with_dirs(root.join(INTAKE_DIR), root.join(SCRATCH_DIR))
    }

    pub fn with_dirs(intake: impl Into<PathBuf>, scratch: impl Into<PathBuf>) -> Self {
        Self {
            intake: intake.into(),
            scratch: scratch.into(),
        }
    }

    #[must_use]
    pub fn intake_dir(&self) -> &Path {
        &self.intake
    }

    #[must_use]
    pub fn scratch_dir(&self) -> &Path {
        &self.scratch
    }

    /// Create both directories. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns [`SplitError::Workspace`] if a directory cannot be created, for
    /// instance because a regular file already occupies the path.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.intake, &self.scratch] {
            fs::create_dir_all(dir).map_err(|source| SplitError::Workspace {
                path: dir.clone(),
                source,
            })?;
        }
        log::debug!(
            target: LOG_TARGET,
            "Workspace ready: intake {}, scratch {}",
            self.intake.display(),
            self.scratch.display()
        );
        Ok(())
    }

    /// Copy the submitted file into the intake area, keeping only its file name.
    ///
    /// A source that already is the intake file, under whatever spelling of
    /// its path, is left untouched.
    ///
    /// # Errors
    /// * [`SplitError::Read`] if `source` has no file name or cannot be resolved.
    /// * [`SplitError::Workspace`] if the copy into the intake area fails.
    pub fn stage(&self, source: impl AsRef<Path>) -> Result<PathBuf> {
        let source = source.as_ref();
        let read_err = |e: io::Error| SplitError::Read {
            path: source.to_path_buf(),
            source: e,
        };
        let name = source
            .file_name()
            .ok_or_else(|| read_err(io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")))?;
        let resolved = fs::canonicalize(source).map_err(read_err)?;
        let intake = fs::canonicalize(&self.intake).map_err(|e| SplitError::Workspace {
            path: self.intake.clone(),
            source: e,
        })?;

        let staged = self.intake.join(name);
        // fs::copy onto itself truncates the file before reading it.
        if resolved == intake.join(name) {
            log::debug!(target: LOG_TARGET, "{} is already in the intake area", source.display());
            return Ok(staged);
        }
        fs::copy(&resolved, &staged).map_err(|e| SplitError::Workspace {
            path: staged.clone(),
            source: e,
        })?;
        Ok(staged)
    }

    /// Location of the archive named `name` inside the intake area.
    #[must_use]
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.intake.join(name)
    }

    /// Remove every file in both areas with [`FsRemover`].
    pub fn teardown(&self) -> TeardownReport {
        self.teardown_with(&FsRemover)
    }

    /// Remove every file in both areas, recursing into subdirectories.
    ///
    /// Best effort: a file that cannot be removed is logged and recorded in the
    /// report, and the walk carries on. Nothing here returns an error.
    pub fn teardown_with(&self, remover: &dyn FileRemover) -> TeardownReport {
        let mut report = TeardownReport::default();
        for dir in [&self.scratch, &self.intake] {
            if !dir.exists() {
                continue;
            }
            for entry in WalkDir::new(dir).min_depth(1) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e.path().map_or_else(|| dir.clone(), Path::to_path_buf);
                        log::error!(target: LOG_TARGET, "Failed to list {}: {e}", path.display());
                        report.failed.push((path, e.into()));
                        continue;
                    }
                };
                if entry.file_type().is_dir() {
                    continue;
                }
                match remover.remove(entry.path()) {
                    Ok(()) => report.removed.push(entry.into_path()),
                    Err(e) => {
                        log::error!(target: LOG_TARGET, "Failed to delete {}: {e}", entry.path().display());
                        report.failed.push((entry.into_path(), e));
                    }
                }
            }
        }
        log::debug!(
            target: LOG_TARGET,
            "Teardown removed {} files, {} failures",
            report.removed.len(),
            report.failed.len()
        );
        report
    }

    /// Guard that tears the workspace down when dropped, including on early
    /// return and unwinding.
    #[must_use]
    pub fn cleanup_guard(&self) -> CleanupGuard<'_> {
        CleanupGuard::new(self, Box::new(FsRemover))
    }
}

/// What a teardown pass did.
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl TeardownReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Scoped teardown of a [`Workspace`].
///
/// Call [`CleanupGuard::finish`] to run teardown and inspect the report;
/// otherwise teardown runs on drop.
pub struct CleanupGuard<'a> {
    workspace: &'a Workspace,
    remover: Box<dyn FileRemover + 'a>,
    armed: bool,
}

impl<'a> CleanupGuard<'a> {
    pub fn new(workspace: &'a Workspace, remover: Box<dyn FileRemover + 'a>) -> Self {
        Self {
            workspace,
            remover,
            armed: true,
        }
    }

    /// Run teardown now and disarm the guard.
    pub fn finish(mut self) -> TeardownReport {
        self.armed = false;
        self.workspace.teardown_with(self.remover.as_ref())
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let report = self.workspace.teardown_with(self.remover.as_ref());
            if !report.is_clean() {
                log::warn!(
                    target: LOG_TARGET,
                    "{} files left behind in the workspace",
                    report.failed.len()
                );
            }
        }
    }
}

impl std::fmt::Debug for CleanupGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("workspace", self.workspace)
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}
