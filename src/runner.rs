//! End-to-end request cycle.
//!
//! [`Runner`] stages the submitted file, loads and splits it, writes the
//! partitions according to its [`ExecMode`], archives them, and hands the
//! archive to a caller-supplied delivery closure. A [`CleanupGuard`] armed
//! before staging drains the workspace whatever the outcome.

use crate::config::SplitterConfig;
use crate::error::{Result, SplitError};
use crate::io::archive::{Archive, create_archive};
use crate::io::csv::{LoadedTable, WorkItem, load_table, write_partitions};
use crate::io::encoding::Encoding;
use crate::partition::{Partition, split};
use crate::workspace::{CleanupGuard, FileRemover, FsRemover, TeardownReport, Workspace};
use serde::Serialize;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

const LOG_TARGET: &str = "runner";

/// How partition files are written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ExecMode {
    Sequential,
    /// Fan writes out over a rayon pool; `threads` defaults to the CPU count.
    Parallel { threads: Option<usize> },
}

impl Default for ExecMode {
    fn default() -> Self {
        if cfg!(feature = "parallel-io") {
            Self::Parallel { threads: None }
        } else {
            Self::Sequential
        }
    }
}

/// What one request cycle produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// Stem of the submitted file, shared by every partition name.
    pub base_name: String,
    pub encoding: Encoding,
    pub total_rows: usize,
    pub partition_sizes: Vec<usize>,
    /// Archive entry names, in partition order.
    pub entries: Vec<String>,
}

/// Result of a successful cycle.
#[derive(Debug)]
pub struct Outcome<T> {
    pub summary: SplitSummary,
    /// Whatever the delivery callback returned.
    pub delivered: T,
    pub teardown: TeardownReport,
}

/// Drives read → split → write → archive → deliver → teardown for one file.
#[derive(Debug)]
pub struct Runner {
    config: SplitterConfig,
    workspace: Workspace,
}

impl Runner {
    /// Build a runner on the configured workspace, creating its directories.
    ///
    /// # Errors
    /// Returns [`SplitError::Workspace`] if the directories cannot be created.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        let workspace = config.workspace();
        Self::with_workspace(config, workspace)
    }

    /// Build a runner on an explicit workspace, creating its directories.
    ///
    /// # Errors
    /// Returns [`SplitError::Workspace`] if the directories cannot be created.
    pub fn with_workspace(config: SplitterConfig, workspace: Workspace) -> Result<Self> {
        workspace.ensure_dirs()?;
        Ok(Self { config, workspace })
    }

    #[must_use]
    pub const fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub const fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Process `source` into an archive of partitions of at most `max_rows`
    /// rows and hand the archive to `deliver`.
    ///
    /// The workspace is torn down before this returns, whether the pipeline
    /// or the delivery succeeded or not.
    ///
    /// # Errors
    /// The first pipeline error, or [`SplitError::Delivery`] if `deliver` fails.
    pub fn run<T, F>(&self, source: impl AsRef<Path>, max_rows: NonZeroUsize, deliver: F) -> Result<Outcome<T>>
    where
        F: FnOnce(&Archive) -> io::Result<T>,
    {
        self.run_with_remover(source, max_rows, Box::new(FsRemover), deliver)
    }

    /// [`Runner::run`] with a custom [`FileRemover`] for teardown.
    ///
    /// # Errors
    /// See [`Runner::run`].
    pub fn run_with_remover<'a, T, F>(
        &'a self,
        source: impl AsRef<Path>,
        max_rows: NonZeroUsize,
        remover: Box<dyn FileRemover + 'a>,
        deliver: F,
    ) -> Result<Outcome<T>>
    where
        F: FnOnce(&Archive) -> io::Result<T>,
    {
        let guard = CleanupGuard::new(&self.workspace, remover);
        let result = self.cycle(source.as_ref(), max_rows, deliver);
        let teardown = guard.finish();
        if !teardown.is_clean() {
            log::warn!(
                target: LOG_TARGET,
                "Teardown could not remove {} files",
                teardown.failed.len()
            );
        }

        let (summary, delivered) = result?;
        Ok(Outcome {
            summary,
            delivered,
            teardown,
        })
    }

    fn cycle<T, F>(&self, source: &Path, max_rows: NonZeroUsize, deliver: F) -> Result<(SplitSummary, T)>
    where
        F: FnOnce(&Archive) -> io::Result<T>,
    {
        let staged = self.workspace.stage(source)?;
        let base_name = staged
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!(target: LOG_TARGET, "Partitioning {} into chunks of at most {max_rows} rows", staged.display());

        let LoadedTable { table, encoding } = load_table(&staged, &self.config.encoding_chain())?;
        let partitions = split(&table, max_rows);
        let items = self.write(&partitions, &base_name)?;
        let archive = create_archive(&items, self.workspace.archive_path(&self.config.archive_name))?;

        let summary = SplitSummary {
            base_name,
            encoding,
            total_rows: table.len(),
            partition_sizes: partitions.iter().map(Partition::len).collect(),
            entries: archive.entries.clone(),
        };
        log::info!(
            target: LOG_TARGET,
            "Split {} rows into {} partitions",
            summary.total_rows,
            summary.partition_sizes.len()
        );

        let delivered = deliver(&archive).map_err(|source| SplitError::Delivery {
            path: archive.path.clone(),
            source,
        })?;
        Ok((summary, delivered))
    }

    fn write(&self, partitions: &[Partition<'_>], base_name: &str) -> Result<Vec<WorkItem>> {
        let scratch = self.workspace.scratch_dir();
        match self.config.mode {
            ExecMode::Sequential => write_partitions(partitions, base_name, scratch),
            ExecMode::Parallel { threads } => write_parallel(partitions, base_name, scratch, threads),
        }
    }
}

#[cfg(feature = "parallel-io")]
fn write_parallel(
    partitions: &[Partition<'_>],
    base_name: &str,
    scratch: &Path,
    threads: Option<usize>,
) -> Result<Vec<WorkItem>> {
    let width = threads
        .unwrap_or_else(num_cpus::get)
        .clamp(1, partitions.len().max(1));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(width)
        .build()
        .map_err(|e| SplitError::write(scratch, io::Error::other(e)))?;
    log::debug!(target: LOG_TARGET, "Writing {} partitions on {width} threads", partitions.len());
    pool.install(|| crate::io::csv::write_partitions_par(partitions, base_name, scratch))
}

#[cfg(not(feature = "parallel-io"))]
fn write_parallel(
    partitions: &[Partition<'_>],
    base_name: &str,
    scratch: &Path,
    _threads: Option<usize>,
) -> Result<Vec<WorkItem>> {
    log::debug!(target: LOG_TARGET, "parallel-io is disabled, writing sequentially");
    write_partitions(partitions, base_name, scratch)
}
