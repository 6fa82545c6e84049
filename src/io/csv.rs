//! CSV loading and partition writing.
//!
//! This module provides:
//! - **Encoding-resilient loading**: [`load_table`] decodes the file through an
//!   [`EncodingChain`] and parses it into a rectangular [`Table`]
//! - **Partition writing**: [`write_partitions`] materializes each [`Partition`]
//!   as a [`WorkItem`] in the scratch directory
//! - **Deterministic parallel writer**: [`write_partitions_par`] (feature `parallel-io`)
//!
//! # Design notes
//! - Cells are kept as text; nothing is coerced, so output values match input values.
//! - Output is always UTF-8, comma-delimited, `\n`-terminated, header first,
//!   whatever encoding the input was decoded with.
//! - Work item indices come from partition position, never from completion order.

use crate::error::{Result, SplitError};
use crate::io::encoding::{Decoded, Encoding, EncodingChain};
use crate::partition::Partition;
use crate::table::{Row, Table};
use csv::{ReaderBuilder, Terminator, WriterBuilder};
#[cfg(feature = "parallel-io")]
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "csv";

/// A table together with the encoding it was decoded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedTable {
    pub table: Table,
    pub encoding: Encoding,
}

/// Read `path` fully and parse it as a headed CSV table.
///
/// The chain's primary encoding is tried first, then its single fallback.
/// Blank lines are skipped and a leading UTF-8 BOM is ignored.
///
/// # Errors
/// * [`SplitError::Read`] if the file cannot be read.
/// * [`SplitError::Decode`] if no candidate encoding decodes the bytes.
/// * [`SplitError::Malformed`] if a record's width differs from the header's.
pub fn load_table(path: impl AsRef<Path>, chain: &EncodingChain) -> Result<LoadedTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SplitError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (text, encoding) = match chain.decode(&bytes) {
        Decoded::Text { text, encoding } => (text, encoding),
        Decoded::Undecodable { tried } => {
            let tried = tried.map(Encoding::name).join(", ");
            return Err(SplitError::Decode { path: path.to_path_buf(), tried });
        }
    };
    if encoding != chain.primary {
        log::info!(target: LOG_TARGET, "{} is not valid {}, decoded as {encoding}", path.display(), chain.primary);
    }

    let table = parse_table(path, &text)?;
    log::debug!(
        target: LOG_TARGET,
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(LoadedTable { table, encoding })
}

fn parse_table(path: &Path, text: &str) -> Result<Table> {
    let malformed = |source: Box<dyn std::error::Error + Send + Sync>| SplitError::Malformed {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| malformed(e.into()))?
        .iter()
        .map(str::to_owned)
        .collect();

    let mut rows: Vec<Row> = Vec::new();
    for rec in rdr.records() {
        let rec = rec.map_err(|e| malformed(e.into()))?;
        rows.push(rec.iter().map(str::to_owned).collect());
    }
    Table::new(columns, rows).map_err(|e| malformed(e.into()))
}

/// File name of the `index`-th (1-based) partition of `base_name`.
#[must_use]
pub fn partition_file_name(base_name: &str, index: usize) -> String {
    format!("{base_name}_parte_{index}.csv")
}

/// A partition materialized on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    pub path: PathBuf,
    /// Stem of the submitted file the partition came from.
    pub base_name: String,
    /// 1-based sequence number.
    pub index: usize,
}

impl WorkItem {
    /// Base file name, used verbatim as the archive entry name.
    #[must_use]
    pub fn file_name(&self) -> String {
        partition_file_name(&self.base_name, self.index)
    }
}

/// Write one partition into `scratch_dir` as `{base_name}_parte_{index + 1}.csv`.
///
/// # Errors
/// Returns [`SplitError::Write`] if the file cannot be created or written.
pub fn write_partition(
    partition: &Partition<'_>,
    base_name: &str,
    scratch_dir: impl AsRef<Path>,
) -> Result<WorkItem> {
    let index = partition.index + 1;
    let path = scratch_dir.as_ref().join(partition_file_name(base_name, index));

    let f = File::create(&path).map_err(|e| SplitError::write(&path, e))?;
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(f);
    if !partition.columns.is_empty() {
        wtr.write_record(partition.columns)
            .map_err(|e| SplitError::write(&path, e))?;
    }
    for row in partition.rows {
        wtr.write_record(row).map_err(|e| SplitError::write(&path, e))?;
    }
    wtr.flush().map_err(|e| SplitError::write(&path, e))?;

    log::debug!(target: LOG_TARGET, "Wrote {} rows to {}", partition.len(), path.display());
    Ok(WorkItem {
        path,
        base_name: base_name.to_string(),
        index,
    })
}

/// Write every partition in order, stopping at the first failure.
///
/// Creates `scratch_dir` if it does not exist.
///
/// # Errors
/// Returns the first [`SplitError::Write`]; later partitions are not written.
pub fn write_partitions(
    partitions: &[Partition<'_>],
    base_name: &str,
    scratch_dir: impl AsRef<Path>,
) -> Result<Vec<WorkItem>> {
    let scratch_dir = scratch_dir.as_ref();
    prepare_dir(scratch_dir)?;
    partitions
        .iter()
        .map(|p| write_partition(p, base_name, scratch_dir))
        .collect()
}

/// Parallel partition writer with **deterministic result order**.
///
/// Each partition is serialized on the current rayon pool; the returned work
/// items are in partition order regardless of which write finishes first.
/// The first error aborts the remaining writes.
///
/// # Errors
/// Returns a [`SplitError::Write`] from one of the failed partitions.
///
/// # Feature
/// Requires the `parallel-io` feature.
#[cfg(feature = "parallel-io")]
pub fn write_partitions_par(
    partitions: &[Partition<'_>],
    base_name: &str,
    scratch_dir: impl AsRef<Path>,
) -> Result<Vec<WorkItem>> {
    let scratch_dir = scratch_dir.as_ref();
    prepare_dir(scratch_dir)?;
    partitions
        .par_iter()
        .map(|p| write_partition(p, base_name, scratch_dir))
        .collect()
}

fn prepare_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| SplitError::write(dir, e))
}
