//! Single-level directory scan.
//!
//! [`scan_dir`] is the only place that touches the filesystem while building
//! a store. Every entry is classified without following symlinks, regular
//! files are optionally read, and the caller's transform decides what each
//! entry becomes.

use std::future::Future;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// One classified directory entry handed to a scan transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Entry {
    /// A regular file. `contents` is `None` when the scan was run with
    /// [`Contents::Skip`].
    File {
        name: String,
        contents: Option<String>,
    },
    Dir {
        name: String,
    },
    /// A symbolic link. Its target is never followed or read.
    Symlink {
        name: String,
    },
}

impl Entry {
    /// The entry's file name within the scanned directory.
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Dir { name } | Self::Symlink { name } => name,
        }
    }
}

/// Whether regular files are read during a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Contents {
    Read,
    Skip,
}

/// List the immediate entries of `dir` and map each one through `transform`.
///
/// Entries are inspected and read concurrently. Returning `Ok(None)` from the
/// transform skips an entry; returning `Err` aborts the scan. A failure to list
/// the directory, inspect an entry, or read a file aborts the scan as well, and
/// no partial result is returned. Hidden (dot-prefixed) entries are ignored.
///
/// The order of the returned values is unspecified.
pub async fn scan_dir<T, F>(dir: &Path, contents: Contents, transform: F) -> StoreResult<Vec<T>>
where
    F: Fn(Entry) -> StoreResult<Option<T>>,
{
    let mut reader = fs::read_dir(dir)
        .await
        .map_err(|e| StoreError::io(dir, e))?;

    let mut pending = Vec::new();
    while let Some(dirent) = reader
        .next_entry()
        .await
        .map_err(|e| StoreError::io(dir, e))?
    {
        let name = dirent.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            debug!(dir = %dir.display(), %name, "ignoring hidden entry");
            continue;
        }
        pending.push(classify(dirent.path(), name, contents));
    }

    let entries = join_reporting(pending).await?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(value) = transform(entry)? {
            out.push(value);
        }
    }
    Ok(out)
}

/// Drive every future to completion and return the first failure, in input
/// order. Each failure is logged, so errors after the first are not lost.
pub(crate) async fn join_reporting<I, T>(futures: I) -> StoreResult<Vec<T>>
where
    I: IntoIterator,
    I::Item: Future<Output = StoreResult<T>>,
{
    let mut first = None;
    let mut out = Vec::new();
    for result in join_all(futures).await {
        match result {
            Ok(value) => out.push(value),
            Err(e) => {
                warn!(error = %e, "concurrent load step failed");
                first.get_or_insert(e);
            }
        }
    }
    match first {
        Some(e) => Err(e),
        None => Ok(out),
    }
}

async fn classify(path: PathBuf, name: String, contents: Contents) -> StoreResult<Entry> {
    let file_type = fs::symlink_metadata(&path)
        .await
        .map_err(|e| StoreError::io(&path, e))?
        .file_type();

    if file_type.is_symlink() {
        Ok(Entry::Symlink { name })
    } else if file_type.is_dir() {
        Ok(Entry::Dir { name })
    } else if file_type.is_file() {
        let contents = match contents {
            Contents::Read => Some(
                fs::read_to_string(&path)
                    .await
                    .map_err(|e| StoreError::io(&path, e))?,
            ),
            Contents::Skip => None,
        };
        Ok(Entry::File { name, contents })
    } else {
        Err(StoreError::UnknownEntryKind { path })
    }
}
