//! Fixture helpers for building directory trees in tests.

use std::path::Path;

pub(crate) fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

/// Create the three top-level directories of an empty tree.
pub(crate) fn empty_tree(root: &Path) {
    for dir in ["users", "groups", "layers"] {
        std::fs::create_dir_all(root.join(dir)).unwrap();
    }
}

/// Add a membership entry for `uid` to `layer`, creating the layer if needed.
pub(crate) fn add_member(root: &Path, layer: &str, uid: &str) {
    let layer_dir = root.join("layers").join(layer);
    std::fs::create_dir_all(&layer_dir).unwrap();
    #[cfg(unix)]
    std::os::unix::fs::symlink(
        root.join("users").join(format!("{uid}.yaml")),
        layer_dir.join(format!("{uid}.yaml")),
    )
    .unwrap();
    #[cfg(not(unix))]
    write_file(&layer_dir.join(format!("{uid}.yaml")), "");
}
