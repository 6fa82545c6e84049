//! # csv-partitioner
//!
//! Split a CSV file into several smaller files of bounded row count, bundle them
//! into one zip archive, hand the archive to the caller, and remove every
//! intermediate file afterwards.
//!
//! ## Key Features
//!
//! - **Encoding-resilient loading** - UTF-8 first, then exactly one legacy
//!   single-byte fallback (Latin-1 by default)
//! - **Balanced split** - partition sizes differ by at most one row, order preserved
//! - **Deterministic output** - `{name}_parte_{n}.csv`, `n` from 1, in row order,
//!   even when partitions are written in parallel
//! - **Flat archives** - entries carry only the partition file name
//! - **Guaranteed cleanup** - the workspace is drained on every exit path, and a
//!   file that cannot be deleted never turns a delivered archive into an error
//!
//! ## Quick Start
//!
//! ```no_run
//! use csv_partitioner::*;
//! use std::num::NonZeroUsize;
//!
//! # fn main() -> csv_partitioner::Result<()> {
//! let runner = Runner::new(SplitterConfig::default())?;
//! let rows = NonZeroUsize::new(100).unwrap();
//!
//! let outcome = runner.run("input.csv", rows, |archive| {
//!     std::fs::copy(&archive.path, "particoes.zip")
//! })?;
//! println!("{:?}", outcome.summary.partition_sizes);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! One request flows through:
//! 1. [`io::csv::load_table`] - decode and parse into a [`Table`]
//! 2. [`partition::split`] - balanced, contiguous [`Partition`]s
//! 3. [`io::csv::write_partitions`] - one [`WorkItem`] per partition in the scratch area
//! 4. [`io::archive::create_archive`] - zip in the intake area
//! 5. the caller's delivery callback
//! 6. [`Workspace::teardown`] via a [`workspace::CleanupGuard`]
//!
//! [`Runner`] wires the stages together.
//!
//! ## Feature Flags
//!
//! - `parallel-io` - write partitions on a rayon pool (on by default)
//!
//! ## Module Overview
//!
//! - [`table`] - in-memory table
//! - [`partition`] - partition count and balanced split
//! - [`io`] - encodings, CSV reading and writing, archiving
//! - [`workspace`] - intake/scratch directories and teardown
//! - [`runner`] - end-to-end request cycle
//! - [`config`] - runner settings
//! - [`testing`] - fixtures for tests

pub mod config;
pub mod error;
pub mod io;
pub mod partition;
pub mod runner;
pub mod table;
pub mod testing;
pub mod workspace;

pub use config::SplitterConfig;
pub use error::{Result, SplitError};
pub use io::archive::{Archive, DEFAULT_ARCHIVE_NAME, create_archive};
pub use io::csv::{LoadedTable, WorkItem, load_table, partition_file_name, write_partitions};
pub use io::encoding::{Encoding, EncodingChain};
pub use partition::{Partition, partition_count, split};
pub use runner::{ExecMode, Outcome, Runner, SplitSummary};
pub use table::{Row, Table};
pub use workspace::{FileRemover, TeardownReport, Workspace};

#[cfg(feature = "parallel-io")]
pub use io::csv::write_partitions_par;
