//! Change detection against a real filesystem.

use std::fs;
use std::time::Duration;

use automation_helper::clock::Stamp;
use automation_helper::config::{WatchSchedule, WatchScheduleRegistry};
use automation_helper::lifecycle::Shutdown;
use automation_helper::staleness::{ChangeTracker, StalenessCache};

mod common;
use common::eventually;

fn schedule(path: &std::path::Path, recursive: bool, patterns: &[&str]) -> WatchSchedule {
    WatchSchedule {
        path: path.to_path_buf(),
        recursive,
        ignore_directories: true,
        patterns: Some(patterns.iter().map(|p| p.to_string()).collect()),
    }
}

#[tokio::test]
async fn modified_file_marks_state_stale() {
    let dir = tempfile::tempdir().unwrap();
    let main_mk = dir.path().join("main.mk");
    fs::write(&main_mk, "all_hosts = []\n").unwrap();

    let shutdown = Shutdown::new();
    let registry = WatchScheduleRegistry::new(vec![schedule(dir.path(), false, &["main.mk"])]);
    let cache = StalenessCache::start(&registry, Duration::from_millis(100), shutdown.subscribe()).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let built_at = Stamp::now();
    assert!(!cache.reload_required(built_at));

    fs::write(&main_mk, "all_hosts = ['web01']\n").unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.reload_required(built_at)).await);
    shutdown.trigger();
}

#[tokio::test]
async fn unrelated_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let shutdown = Shutdown::new();
    let registry = WatchScheduleRegistry::new(vec![schedule(dir.path(), true, &["*.mk"])]);
    let cache = StalenessCache::start(&registry, Duration::from_millis(100), shutdown.subscribe()).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    let built_at = Stamp::now();
    fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    fs::create_dir(dir.path().join("backup.mk")).unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!cache.reload_required(built_at));

    fs::write(dir.path().join("hosts.mk"), "hosts = []").unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.reload_required(built_at)).await);
    shutdown.trigger();
}

#[tokio::test]
async fn missing_directory_is_retried_until_it_appears() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");

    let shutdown = Shutdown::new();
    let registry = WatchScheduleRegistry::new(vec![schedule(&conf_d, true, &["*.mk"])]);
    let cache = StalenessCache::start(&registry, Duration::from_millis(100), shutdown.subscribe()).unwrap();
    assert_eq!(cache.pending_paths(), vec![conf_d.clone()]);

    let built_at = Stamp::now();
    fs::create_dir(&conf_d).unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.pending_paths().is_empty()).await);
    // Content that appeared while unwatched was never built from.
    assert!(cache.reload_required(built_at));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let rebuilt_at = Stamp::now();
    fs::write(conf_d.join("rules.mk"), "rules = []").unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.reload_required(rebuilt_at)).await);
    shutdown.trigger();
}

#[tokio::test]
async fn recreated_directory_is_watched_again() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();

    let shutdown = Shutdown::new();
    let registry = WatchScheduleRegistry::new(vec![schedule(&conf_d, true, &["*.mk"])]);
    let cache = StalenessCache::start(&registry, Duration::from_millis(100), shutdown.subscribe()).unwrap();
    assert!(cache.pending_paths().is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let before_removal = Stamp::now();
    fs::remove_dir_all(&conf_d).unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.pending_paths() == vec![conf_d.clone()]).await);
    assert!(cache.reload_required(before_removal));

    fs::create_dir(&conf_d).unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.pending_paths().is_empty()).await);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let built_at = Stamp::now();
    fs::write(conf_d.join("hosts.mk"), "hosts = []").unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.reload_required(built_at)).await);
    shutdown.trigger();
}

#[tokio::test]
async fn directory_recreated_before_retry_is_still_reattached() {
    let dir = tempfile::tempdir().unwrap();
    let conf_d = dir.path().join("conf.d");
    fs::create_dir(&conf_d).unwrap();

    let shutdown = Shutdown::new();
    let registry = WatchScheduleRegistry::new(vec![schedule(&conf_d, true, &["*.mk"])]);
    let cache = StalenessCache::start(&registry, Duration::from_millis(100), shutdown.subscribe()).unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::remove_dir_all(&conf_d).unwrap();
    fs::create_dir(&conf_d).unwrap();

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(eventually(Duration::from_secs(5), || cache.pending_paths().is_empty()).await);

    let built_at = Stamp::now();
    fs::write(conf_d.join("hosts.mk"), "hosts = []").unwrap();
    assert!(eventually(Duration::from_secs(5), || cache.reload_required(built_at)).await);
    shutdown.trigger();
}
