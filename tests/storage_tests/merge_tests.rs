//! Tests for MergeIterator
//!
//! These tests verify:
//! - Newest timestamp wins regardless of source order
//! - One output per key, ascending
//! - Tombstones hide keys (or surface them on request)
//! - Error propagation from sources
//! - Merging live memtable and SSTable sources

use std::sync::Arc;

use bytes::Bytes;
use stratakv::memtable::MemTable;
use stratakv::storage::{MergeIterator, SSTable, SSTableBuilder};
use stratakv::table::EntryIter;
use stratakv::{Entry, LogicalClock, Record, StrataError, Table};

// =============================================================================
// Helper Functions
// =============================================================================

fn b(s: &str) -> Bytes {
    Bytes::copy_from_slice(s.as_bytes())
}

fn live(key: &str, value: &str, ts: u64) -> Entry {
    Entry::live(b(key), b(value), ts)
}

fn dead(key: &str, ts: u64) -> Entry {
    Entry::tombstone(b(key), ts)
}

fn source(entries: Vec<Entry>) -> EntryIter {
    Box::new(entries.into_iter().map(Ok))
}

fn records(sources: Vec<EntryIter>) -> Vec<(Bytes, Bytes)> {
    MergeIterator::new(sources)
        .unwrap()
        .into_records()
        .map(|r| {
            let Record { key, value } = r.unwrap();
            (key, value)
        })
        .collect()
}

fn pair(key: &str, value: &str) -> (Bytes, Bytes) {
    (b(key), b(value))
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_newest_version_wins() {
    let older = source(vec![live("a", "old", 1), live("b", "old", 2)]);
    let newer = source(vec![live("a", "new", 5)]);

    assert_eq!(records(vec![older, newer]), vec![pair("a", "new"), pair("b", "old")]);
}

#[test]
fn test_source_order_is_irrelevant() {
    let newer = source(vec![live("a", "new", 5)]);
    let older = source(vec![live("a", "old", 1)]);

    assert_eq!(records(vec![newer, older]), vec![pair("a", "new")]);
}

#[test]
fn test_duplicates_collapse_across_many_sources() {
    let sources: Vec<EntryIter> = (1..=5)
        .map(|generation| {
            source(vec![
                live("k1", &format!("v{}", generation), generation * 10),
                live("k2", &format!("v{}", generation), generation * 10 + 1),
            ])
        })
        .collect();

    assert_eq!(records(sources), vec![pair("k1", "v5"), pair("k2", "v5")]);
}

#[test]
fn test_output_is_strictly_ascending() {
    let sources = vec![
        source(vec![live("a", "1", 1), live("d", "1", 2), live("g", "1", 3)]),
        source(vec![live("b", "2", 4), live("d", "2", 5), live("h", "2", 6)]),
        source(vec![live("c", "3", 7), live("g", "3", 8)]),
    ];

    let keys: Vec<Bytes> = records(sources).into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b("a"), b("b"), b("c"), b("d"), b("g"), b("h")]);
}

#[test]
fn test_empty_sources() {
    assert!(records(vec![]).is_empty());
    assert!(records(vec![source(vec![]), source(vec![])]).is_empty());
}

// =============================================================================
// Tombstone Tests
// =============================================================================

#[test]
fn test_newer_tombstone_hides_value() {
    let sources = vec![
        source(vec![live("a", "x", 1), live("b", "y", 2)]),
        source(vec![dead("a", 3)]),
    ];

    assert_eq!(records(sources), vec![pair("b", "y")]);
}

#[test]
fn test_older_tombstone_does_not_hide_newer_value() {
    let sources = vec![
        source(vec![dead("a", 1)]),
        source(vec![live("a", "back", 2)]),
    ];

    assert_eq!(records(sources), vec![pair("a", "back")]);
}

#[test]
fn test_with_tombstones_surfaces_winning_tombstone() {
    let sources = vec![
        source(vec![live("a", "x", 1), live("b", "y", 2)]),
        source(vec![dead("a", 3)]),
    ];

    let entries: Vec<Entry> = MergeIterator::new(sources)
        .unwrap()
        .with_tombstones()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(entries, vec![dead("a", 3), live("b", "y", 2)]);
}

#[test]
fn test_records_skip_tombstones_even_when_requested() {
    let sources = vec![source(vec![dead("a", 3), live("b", "y", 2)])];

    let records: Vec<Record> = MergeIterator::new(sources)
        .unwrap()
        .with_tombstones()
        .into_records()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(records, vec![Record::new(b("b"), b("y"))]);
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_source_error_is_yielded_then_fused() {
    let failing: EntryIter = Box::new(
        vec![
            Ok(live("a", "1", 1)),
            Err(StrataError::CorruptFormat("bad entry".to_string())),
            Ok(live("c", "3", 3)),
        ]
        .into_iter(),
    );
    let healthy = source(vec![live("b", "2", 2), live("d", "4", 4)]);

    let mut merge = MergeIterator::new(vec![failing, healthy]).unwrap();

    assert_eq!(merge.next().unwrap().unwrap(), live("a", "1", 1));
    assert!(matches!(merge.next(), Some(Err(StrataError::CorruptFormat(_)))));
    assert!(merge.next().is_none());
}

#[test]
fn test_error_on_first_entry_fails_construction() {
    let failing: EntryIter = Box::new(std::iter::once(Err(StrataError::CorruptFormat(
        "bad entry".to_string(),
    ))));

    assert!(MergeIterator::new(vec![failing]).is_err());
}

// =============================================================================
// Mixed Table Tests
// =============================================================================

#[test]
fn test_merge_memtable_over_sstable() {
    let clock = Arc::new(LogicalClock::new());

    let mut flushed = MemTable::new(Arc::clone(&clock));
    flushed.upsert(b("a"), b("1"));
    flushed.upsert(b("b"), b("1"));
    flushed.upsert(b("c"), b("1"));
    let mut image = Vec::new();
    let mut builder = SSTableBuilder::new(&mut image);
    for entry in flushed.range_from(b"") {
        builder.add(&entry).unwrap();
    }
    builder.finish().unwrap();
    let table = SSTable::from_region(Bytes::from(image)).unwrap();

    let mut memtable = MemTable::new(clock);
    memtable.upsert(b("a"), b("2"));
    memtable.remove(b("b"));

    let sources = vec![
        table.iterate_from(b"").unwrap(),
        memtable.iterate_from(b"").unwrap(),
    ];
    assert_eq!(records(sources), vec![pair("a", "2"), pair("c", "1")]);
}

#[test]
fn test_merge_from_start_key() {
    let clock = Arc::new(LogicalClock::new());
    let mut memtable = MemTable::new(clock);
    for key in ["a", "b", "c", "d"] {
        memtable.upsert(b(key), b(key));
    }

    let sources = vec![memtable.iterate_from(b"c").unwrap()];
    assert_eq!(records(sources), vec![pair("c", "c"), pair("d", "d")]);
}
