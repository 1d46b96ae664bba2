//! End-to-end tests of the watch-and-reload controller against real
//! directories.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lds_directory::{
    Directory, DirectoryConfig, DirectoryError, ReloadStatus, State, StaticSecrets,
};
use tempfile::TempDir;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(10);

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Replace a file in one step so a reload never sees it half-written. The
/// staging file is hidden, so the watcher ignores it.
fn replace(path: &Path, contents: &str) {
    let staging = path
        .parent()
        .unwrap()
        .join(format!(".{}.tmp", path.file_name().unwrap().to_string_lossy()));
    std::fs::write(&staging, contents).unwrap();
    std::fs::rename(&staging, path).unwrap();
}

fn sample_tree(root: &Path) {
    write(
        &root.join("users/alice.yaml"),
        "publicKeys: [ssh-ed25519 AAAA]\nprimaryGroup: staff\ngroups: [staff]\n",
    );
    write(&root.join("users/bob.yaml"), "groups: [staff]\n");
    write(&root.join("groups/staff.yaml"), "gidNumber: 100\n");
    write(&root.join("layers/prod/alice.yaml"), "");
}

fn directory() -> Directory {
    let config = DirectoryConfig {
        debounce_ms: 50,
        ..DirectoryConfig::default()
    };
    let secrets = StaticSecrets::new().with("LDAP_LAYER_PROD_PASSWORD", "right-secret");
    Directory::with_secrets(config, Arc::new(secrets))
}

async fn wait_for(
    rx: &mut watch::Receiver<ReloadStatus>,
    pred: impl FnMut(&ReloadStatus) -> bool,
) -> ReloadStatus {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for reload")
        .expect("directory dropped")
        .clone()
}

#[tokio::test]
async fn initialize_loads_and_becomes_ready() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    assert_eq!(dir.state(), State::Uninitialized);
    dir.initialize(tmp.path()).await.unwrap();
    assert_eq!(dir.state(), State::Ready);
    assert_eq!(dir.status().generation, 1);

    let q = dir.query();
    assert_eq!(q.public_keys("alice").unwrap(), Some(vec!["ssh-ed25519 AAAA".to_string()]));
    assert_eq!(q.public_keys("bob").unwrap(), Some(vec![]));
    assert_eq!(q.public_keys("nonexistent").unwrap(), None);

    let members: Vec<String> = q.layer_users("prod").unwrap().map(|u| u.uid).collect();
    assert_eq!(members, vec!["alice"]);
    assert_eq!(q.layer_users("no-such-layer").unwrap().count(), 0);

    let staff = q.groups().unwrap().next().unwrap();
    assert_eq!(staff.members, vec!["alice", "bob"]);

    assert_eq!(q.authenticate("prod", "right-secret").unwrap(), "right-secret");
}

#[tokio::test]
async fn double_initialize_is_rejected() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    let err = dir.initialize(tmp.path()).await.unwrap_err();
    assert!(matches!(err, DirectoryError::AlreadyInitialized));
    assert_eq!(dir.state(), State::Ready);
    assert!(dir.query().find_user("alice").unwrap().is_some());
}

#[tokio::test]
async fn failed_initial_load_never_becomes_ready() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());
    write(&tmp.path().join("users/broken.yaml"), "publicKeys: [oops\n");

    let dir = directory();
    let err = dir.initialize(tmp.path()).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Store(_)));
    assert_eq!(dir.state(), State::WatchingPendingReady);
    assert!(matches!(
        dir.query().public_keys("alice"),
        Err(DirectoryError::NotReady)
    ));
    assert!(matches!(
        dir.initialize(tmp.path()).await,
        Err(DirectoryError::AlreadyInitialized)
    ));
}

#[tokio::test]
async fn change_triggers_reload() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    let mut rx = dir.subscribe();

    replace(
        &tmp.path().join("users/alice.yaml"),
        "publicKeys: [ssh-ed25519 BBBB]\ngroups: [staff]\n",
    );
    wait_for(&mut rx, |s| s.generation >= 2).await;

    assert_eq!(
        dir.query().public_keys("alice").unwrap(),
        Some(vec!["ssh-ed25519 BBBB".to_string()])
    );
    assert_eq!(dir.state(), State::Ready);
}

#[tokio::test]
async fn new_layer_member_is_picked_up() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    let mut rx = dir.subscribe();

    write(&tmp.path().join("layers/prod/bob.yaml"), "");
    wait_for(&mut rx, |s| s.generation >= 2).await;

    let members: Vec<String> = dir
        .query()
        .layer_users("prod")
        .unwrap()
        .map(|u| u.uid)
        .collect();
    assert_eq!(members, vec!["alice", "bob"]);
}

#[tokio::test]
async fn malformed_reload_keeps_previous_store() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    let before = dir.query().store().unwrap();
    let mut rx = dir.subscribe();

    replace(&tmp.path().join("users/mallory.yaml"), "publicKeys: [oops\n");
    let status = wait_for(&mut rx, |s| s.failures >= 1).await;

    assert_eq!(status.generation, 1);
    assert!(status.last_error.unwrap().contains("mallory.yaml"));
    assert_eq!(dir.state(), State::Ready);

    let after = dir.query().store().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(dir.query().find_user("mallory").unwrap().is_none());
    assert_eq!(
        dir.query().public_keys("alice").unwrap(),
        Some(vec!["ssh-ed25519 AAAA".to_string()])
    );

    // Fixing the file recovers on the next reload.
    replace(&tmp.path().join("users/mallory.yaml"), "publicKeys: []\n");
    let status = wait_for(&mut rx, |s| s.generation >= 2).await;
    assert!(dir.query().find_user("mallory").unwrap().is_some());
    assert_eq!(status.failures, 1);
    assert_eq!(status.last_error, None);
}

#[tokio::test]
async fn missing_root_can_be_retried() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("ldap");

    let dir = directory();
    let err = dir.initialize(&root).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Io(_) | DirectoryError::Watch(_)));
    assert_eq!(dir.state(), State::Uninitialized);

    sample_tree(&root);
    dir.initialize(&root).await.unwrap();
    assert_eq!(dir.state(), State::Ready);
    assert!(dir.query().find_user("alice").unwrap().is_some());
}

#[tokio::test]
async fn hidden_files_do_not_trigger_reloads() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    let mut rx = dir.subscribe();

    write(&tmp.path().join("users/.alice.yaml.swp"), "\0garbage");
    write(&tmp.path().join(".git/HEAD"), "ref: refs/heads/main\n");
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(dir.status(), ReloadStatus { generation: 1, ..ReloadStatus::default() });

    // A visible change still gets through afterwards.
    replace(&tmp.path().join("groups/admins.yaml"), "gidNumber: 101\n");
    wait_for(&mut rx, |s| s.generation >= 2).await;
    assert_eq!(dir.query().groups().unwrap().count(), 2);
}

#[tokio::test]
async fn shutdown_keeps_last_generation() {
    let tmp = TempDir::new().unwrap();
    sample_tree(tmp.path());

    let dir = directory();
    dir.initialize(tmp.path()).await.unwrap();
    dir.shutdown();

    replace(&tmp.path().join("users/alice.yaml"), "publicKeys: [changed]\n");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        dir.query().public_keys("alice").unwrap(),
        Some(vec!["ssh-ed25519 AAAA".to_string()])
    );
    assert_eq!(dir.status().generation, 1);
}
