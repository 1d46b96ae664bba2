use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lds_types::TypeError;

/// Errors that abort a load attempt.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A directory could not be listed, or an entry could not be inspected or read.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The entry is neither a regular file, a directory, nor a symlink.
    #[error("unknown entry kind at {}", path.display())]
    UnknownEntryKind { path: PathBuf },

    /// A user record could not be decoded.
    #[error("malformed record {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: TypeError,
    },

    /// The load did not finish within the configured deadline.
    #[error("loading {} timed out after {after:?}", dir.display())]
    Timeout { dir: PathBuf, after: Duration },
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result alias for load operations.
pub type StoreResult<T> = Result<T, StoreError>;
