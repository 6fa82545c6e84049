//! Zip packaging of written partitions.
//!
//! Entries are flat: each work item is stored under its base file name, so the
//! archive never reveals where the scratch directory lives.

use crate::error::{Result, SplitError};
use crate::io::csv::WorkItem;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const LOG_TARGET: &str = "archive";

/// Default file name of the archive handed back to the caller.
pub const DEFAULT_ARCHIVE_NAME: &str = "particoes.zip";

/// A finished archive on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    pub path: PathBuf,
    /// Entry names, in the order they were added.
    pub entries: Vec<String>,
}

/// Create a Deflate-compressed zip at `dest` containing every work item.
///
/// # Errors
/// Returns [`SplitError::Archive`] if `dest` cannot be created or any work
/// item cannot be read.
pub fn create_archive(items: &[WorkItem], dest: impl AsRef<Path>) -> Result<Archive> {
    let dest = dest.as_ref();
    let file = File::create(dest).map_err(|e| SplitError::archive(dest, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let name = item.file_name();
        let src = File::open(&item.path).map_err(|e| SplitError::archive(&item.path, e))?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| SplitError::archive(dest, e))?;
        io::copy(&mut BufReader::new(src), &mut zip)
            .map_err(|e| SplitError::archive(&item.path, e))?;
        entries.push(name);
    }
    let mut out = zip.finish().map_err(|e| SplitError::archive(dest, e))?;
    io::Write::flush(&mut out).map_err(|e| SplitError::archive(dest, e))?;

    log::info!(target: LOG_TARGET, "Archived {} partitions into {}", entries.len(), dest.display());
    Ok(Archive {
        path: dest.to_path_buf(),
        entries,
    })
}
