//! Error taxonomy for a request cycle.
//!
//! Every failure carries the path it concerns. Decode and structural errors are
//! the caller's fault and get a descriptive message; everything else is reported
//! generically and logged in full.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = SplitError> = std::result::Result<T, E>;

/// Message shown to the caller when no candidate encoding decodes the input.
pub const DECODE_MESSAGE: &str =
    "Error: could not decode the CSV file. Please check the file's text encoding.";

/// Message shown to the caller for any failure that is not their input's fault.
pub const GENERIC_MESSAGE: &str = "Error: the file could not be partitioned. Please try again.";

#[derive(Debug, Error)]
pub enum SplitError {
    /// No encoding in the chain could decode the file.
    #[error("{}: none of the candidate encodings ({tried}) could decode the file", .path.display())]
    Decode { path: PathBuf, tried: String },

    /// The file decoded but is not a rectangular CSV table.
    #[error("{}: malformed CSV: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The file could not be opened or read.
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A partition file could not be written.
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The archive could not be assembled.
    #[error("archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The working directories could not be established.
    #[error("workspace {}: {source}", .path.display())]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The caller's delivery of the finished archive failed.
    #[error("deliver {}: {source}", .path.display())]
    Delivery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SplitError {
    /// Whether the failure stems from the submitted file itself.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Malformed { .. })
    }

    /// Text suitable for the end user; never leaks workspace paths for
    /// internal failures.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Decode { .. } => DECODE_MESSAGE.to_string(),
            Self::Malformed { source, .. } => format!("Error: the CSV file is malformed ({source})."),
            _ => GENERIC_MESSAGE.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        Self::Write { path: path.into(), source: source.into() }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, source: impl Into<zip::result::ZipError>) -> Self {
        Self::Archive { path: path.into(), source: source.into() }
    }
}
