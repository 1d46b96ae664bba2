//! Recursive filesystem watching.

use std::path::{Component, Path, PathBuf};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::DirectoryResult;

/// A live recursive watch on a directory tree.
///
/// Every relevant change is forwarded as the changed path. Dropping the
/// watcher stops the watch and closes the channel.
pub(crate) struct DirWatcher {
    _watcher: RecommendedWatcher,
}

impl DirWatcher {
    /// Start watching `dir`. Returns once the watch is registered, which is
    /// the point from which changes are reported.
    pub(crate) fn start(dir: &Path, changes: UnboundedSender<PathBuf>) -> DirectoryResult<Self> {
        let root = dir.canonicalize()?;
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_change(&event.kind) {
                    return;
                }
                for path in event.paths {
                    if is_hidden(&filter_root, &path) {
                        debug!(path = %path.display(), "ignoring hidden path");
                        continue;
                    }
                    // The receiver is gone once the controller shuts down.
                    let _ = changes.send(path);
                }
            }
            Err(e) => warn!(error = %e, "filesystem watch error"),
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        info!(dir = %root.display(), "watching directory tree");
        Ok(Self { _watcher: watcher })
    }
}

/// Creates, modifications and removals trigger reloads; plain access does not.
pub(crate) fn is_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any | EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Whether any component of `path` below `root` is a dotfile or dot-directory.
pub(crate) fn is_hidden(root: &Path, path: &Path) -> bool {
    match path.strip_prefix(root) {
        Ok(relative) => relative.components().any(|c| match c {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        }),
        Err(_) => path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.')),
    }
}
