//! Tests for StorageManager
//!
//! These tests verify:
//! - Opening/creating storage directories
//! - Atomic publication (temp file → rename)
//! - Discovery order and file-name filtering
//! - Strict vs lenient handling of corrupt tables
//! - Retiring superseded tables

use std::fs;
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use stratakv::storage::{SSTableBuilder, StorageManager, TableSummary};
use stratakv::{Config, Entry, OpenMode, StrataError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn config_for(path: &Path, mode: OpenMode) -> Config {
    Config::builder().data_dir(path).open_mode(mode).build()
}

fn setup_temp_storage() -> (TempDir, StorageManager) {
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open(&config_for(temp_dir.path(), OpenMode::Strict)).unwrap();
    (temp_dir, manager)
}

/// Writer closure body: one live entry
fn write_one<W: Write>(sink: W, key: &str, value: &str) -> stratakv::Result<TableSummary> {
    let mut builder = SSTableBuilder::new(sink);
    builder.add(&Entry::live(
        Bytes::copy_from_slice(key.as_bytes()),
        Bytes::copy_from_slice(value.as_bytes()),
        1,
    ))?;
    builder.finish()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("new_storage");

    assert!(!path.exists());

    let manager = StorageManager::open(&config_for(&path, OpenMode::Strict)).unwrap();

    assert!(path.is_dir());
    assert_eq!(manager.data_dir(), path.as_path());
}

#[test]
fn test_discover_empty_directory() {
    let (_temp, manager) = setup_temp_storage();
    assert!(manager.discover().unwrap().is_empty());
}

// =============================================================================
// Publish Tests
// =============================================================================

#[test]
fn test_publish_creates_final_file_only() {
    let (temp, manager) = setup_temp_storage();

    let table = manager.publish(42, |file| write_one(file, "k", "v")).unwrap();

    assert_eq!(table.generation(), 42);
    assert_eq!(table.path(), Some(manager.table_path(42).as_path()));
    assert_eq!(file_names(temp.path()), vec!["00000000000000000042.db".to_string()]);
    assert_eq!(
        table.get(b"k").unwrap().unwrap().value,
        Some(Bytes::from_static(b"v"))
    );
}

#[test]
fn test_failed_publish_leaves_no_files() {
    let (temp, manager) = setup_temp_storage();

    let result = manager.publish(7, |file| {
        file.write_all(b"half a table")?;
        Err(StrataError::Io(std::io::Error::other("writer gave up")))
    });

    assert!(result.is_err());
    assert!(file_names(temp.path()).is_empty());
}

#[test]
fn test_publish_refuses_existing_temp_file() {
    let (temp, manager) = setup_temp_storage();
    fs::write(temp.path().join("00000000000000000007.tmp"), b"other writer").unwrap();

    let result = manager.publish(7, |file| write_one(file, "k", "v"));

    assert!(matches!(result, Err(StrataError::Io(_))));
    assert!(!manager.table_path(7).exists());
}

// =============================================================================
// Discovery Tests
// =============================================================================

#[test]
fn test_discover_orders_by_generation() {
    let (_temp, manager) = setup_temp_storage();
    manager.publish(300, |f| write_one(f, "c", "3")).unwrap();
    manager.publish(100, |f| write_one(f, "a", "1")).unwrap();
    manager.publish(200, |f| write_one(f, "b", "2")).unwrap();

    let generations: Vec<u64> = manager.discover().unwrap().iter().map(|t| t.generation()).collect();

    assert_eq!(generations, vec![100, 200, 300]);
}

#[test]
fn test_discover_ignores_unrelated_files() {
    let (temp, manager) = setup_temp_storage();
    manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    fs::write(temp.path().join("notes.txt"), b"hello").unwrap();
    fs::write(temp.path().join("abc.db"), b"not a generation").unwrap();
    fs::create_dir(temp.path().join("00000000000000000009.db")).unwrap();

    assert_eq!(manager.discover().unwrap().len(), 1);
}

#[test]
fn test_discover_removes_stale_temp_files() {
    let (temp, manager) = setup_temp_storage();
    manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    let stale = temp.path().join("00000000000000000002.tmp");
    fs::write(&stale, b"interrupted flush").unwrap();

    let tables = manager.discover().unwrap();

    assert_eq!(tables.len(), 1);
    assert!(!stale.exists());
}

#[test]
fn test_strict_discover_reports_every_corrupt_file() {
    let (temp, manager) = setup_temp_storage();
    manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    fs::write(temp.path().join("00000000000000000002.db"), b"garbage!garbage!").unwrap();
    fs::write(temp.path().join("00000000000000000003.db"), b"").unwrap();

    match manager.discover() {
        Err(StrataError::OpenFailed(failures)) => {
            assert_eq!(failures.len(), 2);
            assert!(failures
                .iter()
                .all(|f| matches!(*f.error, StrataError::CorruptFormat(_))));
        }
        other => panic!("expected OpenFailed, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_lenient_discover_skips_corrupt_file() {
    let temp_dir = TempDir::new().unwrap();
    let manager = StorageManager::open(&config_for(temp_dir.path(), OpenMode::Lenient)).unwrap();
    manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    fs::write(temp_dir.path().join("00000000000000000002.db"), b"garbage!garbage!").unwrap();

    let tables = manager.discover().unwrap();

    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].generation(), 1);
}

// =============================================================================
// Retire / Usage Tests
// =============================================================================

#[test]
fn test_retire_deletes_files() {
    let (temp, manager) = setup_temp_storage();
    let first = manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    let second = manager.publish(2, |f| write_one(f, "b", "2")).unwrap();
    manager.publish(3, |f| write_one(f, "c", "3")).unwrap();

    manager.retire(&[first, second]).unwrap();

    assert_eq!(file_names(temp.path()), vec!["00000000000000000003.db".to_string()]);
}

#[test]
fn test_disk_usage_sums_table_files() {
    let (temp, manager) = setup_temp_storage();
    let a = manager.publish(1, |f| write_one(f, "a", "1")).unwrap();
    let b = manager.publish(2, |f| write_one(f, "bb", "22")).unwrap();
    fs::write(temp.path().join("notes.txt"), b"ignored").unwrap();

    assert_eq!(manager.disk_usage().unwrap(), a.file_size() + b.file_size());
}

#[test]
fn test_newest_generation_counts_unreadable_tables() {
    let (temp, manager) = setup_temp_storage();
    assert_eq!(manager.newest_generation().unwrap(), None);

    manager.publish(5, |f| write_one(f, "a", "1")).unwrap();
    fs::write(temp.path().join("00000000000000000009.db"), b"garbage!garbage!").unwrap();
    fs::write(temp.path().join("00000000000000000012.tmp"), b"partial").unwrap();

    assert_eq!(manager.newest_generation().unwrap(), Some(9));
}
