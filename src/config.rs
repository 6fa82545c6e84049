//! Process-wide settings for the partitioner.

use crate::io::archive::DEFAULT_ARCHIVE_NAME;
use crate::io::encoding::{Encoding, EncodingChain};
use crate::runner::ExecMode;
use crate::workspace::Workspace;
use std::path::PathBuf;

/// Configuration for a [`Runner`](crate::Runner).
///
/// # Example
///
/// ```
/// use csv_partitioner::{ExecMode, SplitterConfig};
///
/// let config = SplitterConfig {
///     mode: ExecMode::Sequential,
///     ..Default::default()
/// };
/// assert_eq!(config.archive_name, "particoes.zip");
/// ```
#[derive(Clone, Debug)]
pub struct SplitterConfig {
    /// Root under which the intake and scratch directories live.
    pub workspace_root: PathBuf,
    /// File name of the archive produced in the intake area.
    pub archive_name: String,
    /// Legacy encoding tried when the input is not valid UTF-8.
    pub fallback_encoding: Encoding,
    /// How partition files are written.
    pub mode: ExecMode,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("./work"),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            fallback_encoding: Encoding::Latin1,
            mode: ExecMode::default(),
        }
    }
}

impl SplitterConfig {
    #[must_use]
    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.workspace_root)
    }

    #[must_use]
    pub const fn encoding_chain(&self) -> EncodingChain {
        EncodingChain::with_fallback(self.fallback_encoding)
    }
}
