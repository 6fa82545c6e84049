//! Fixtures and inspectors for tests of partitioning runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use csv_partitioner::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let table = numbered_table(250, &["id", "name"]);
//! let input = write_fixture(dir.path(), "input.csv", table_to_csv(&table).as_bytes())?;
//! # let _ = input;
//! # Ok(())
//! # }
//! ```

use crate::table::{Row, Table};
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// A table of `rows` rows where cell `(r, c)` is `"{column}-{r}"`.
#[must_use]
pub fn numbered_table(rows: usize, columns: &[&str]) -> Table {
    let header: Vec<String> = columns.iter().map(ToString::to_string).collect();
    let data: Vec<Row> = (0..rows)
        .map(|r| columns.iter().map(|c| format!("{c}-{r}")).collect())
        .collect();
    Table::new(header, data).expect("numbered rows match the header")
}

/// Render `table` as comma-separated text with a header line.
#[must_use]
pub fn table_to_csv(table: &Table) -> String {
    let mut out = String::new();
    if !table.columns().is_empty() {
        out.push_str(&table.columns().join(","));
        out.push('\n');
    }
    for row in table.rows() {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write `bytes` to `dir/name` and return the path.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_fixture(dir: impl AsRef<Path>, name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let path = dir.as_ref().join(name);
    fs::write(&path, bytes).with_context(|| format!("write fixture {}", path.display()))?;
    Ok(path)
}

/// Regular files directly or indirectly under `dir`, sorted.
#[must_use]
pub fn files_in(dir: impl AsRef<Path>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .flatten()
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .collect();
    out.sort();
    out
}

/// Entry names and decompressed UTF-8 contents of a zip archive, in archive order.
///
/// # Errors
/// Returns an error if the archive cannot be opened or an entry is not UTF-8.
pub fn read_archive(path: impl AsRef<Path>) -> Result<Vec<(String, String)>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut zip = zip::ZipArchive::new(f).with_context(|| format!("read zip {}", path.display()))?;
    let mut out = Vec::with_capacity(zip.len());
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let mut body = String::new();
        entry
            .read_to_string(&mut body)
            .with_context(|| format!("read entry #{i}"))?;
        out.push((entry.name().to_string(), body));
    }
    Ok(out)
}
