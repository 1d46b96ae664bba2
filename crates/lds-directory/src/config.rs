use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Runtime settings for a [`Directory`](crate::Directory).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Root of the `users/`, `groups/`, `layers/` tree.
    pub root: PathBuf,
    /// Quiet window used to coalesce a burst of filesystem events into a
    /// single reload.
    pub debounce_ms: u64,
    /// Deadline for one load pass. `None` waits indefinitely.
    pub load_timeout_ms: Option<u64>,
    /// Layer secrets are read from `<prefix><LAYER><suffix>`.
    pub secret_prefix: String,
    pub secret_suffix: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            debounce_ms: 100,
            load_timeout_ms: None,
            secret_prefix: "LDAP_LAYER_".into(),
            secret_suffix: "_PASSWORD".into(),
        }
    }
}

impl DirectoryConfig {
    /// Default settings for the tree at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> DirectoryResult<Self> {
        toml::from_str(text).map_err(|e| DirectoryError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> DirectoryResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DirectoryConfig::default();
        assert_eq!(c.root, PathBuf::from("."));
        assert_eq!(c.debounce(), Duration::from_millis(100));
        assert!(c.load_timeout().is_none());
        assert_eq!(c.secret_prefix, "LDAP_LAYER_");
        assert_eq!(c.secret_suffix, "_PASSWORD");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = DirectoryConfig::from_toml_str("root = \"/srv/ldap\"\nload_timeout_ms = 5000\n").unwrap();
        assert_eq!(c.root, PathBuf::from("/srv/ldap"));
        assert_eq!(c.load_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(c.debounce_ms, 100);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = DirectoryConfig::from_toml_str("debounce_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, DirectoryError::Config(_)));
    }

    #[test]
    fn for_root_sets_root_only() {
        let c = DirectoryConfig::for_root("/data");
        assert_eq!(c.root, PathBuf::from("/data"));
        assert_eq!(c.debounce_ms, DirectoryConfig::default().debounce_ms);
    }
}
