//! Tests for the storage engine
//!
//! These tests verify:
//! - Round-trips through write/read and the Storage trait
//! - Block rollover with small block sizes
//! - Crash recovery purely from the index log
//! - Corruption tolerance at replay
//! - Unsupported operations fail loudly but cleanly
//! - Idle eviction does not lose data
//! - Concurrent writers

use std::fs;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blockvault::{Config, Engine, Storage, VaultError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().base_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn setup_engine_with_block_size(block_size: u64) -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .base_dir(temp_dir.path())
        .block_size(block_size)
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_layout() {
    let temp_dir = TempDir::new().unwrap();
    let base_dir = temp_dir.path().join("mystore");

    let config = Config::builder().base_dir(&base_dir).build();
    let _engine = Engine::open(config).unwrap();

    assert!(base_dir.exists());
    assert!(base_dir.join("block_idx").exists());
}

#[test]
fn test_write_read_round_trip() {
    let (_temp, engine) = setup_engine();

    engine.write_with_id("doc", b"hello blocks").unwrap();

    assert_eq!(engine.read("doc").unwrap().as_ref(), b"hello blocks");
}

#[test]
fn test_write_generates_readable_id() {
    let (_temp, engine) = setup_engine();

    let id = engine.write(b"anonymous payload").unwrap();

    assert!(!id.is_empty());
    assert_eq!(engine.read(&id).unwrap().as_ref(), b"anonymous payload");
}

#[test]
fn test_generated_ids_differ() {
    let (_temp, engine) = setup_engine();

    let a = engine.write(b"one").unwrap();
    let b = engine.write(b"two").unwrap();

    assert_ne!(a, b);
    assert_eq!(engine.read(&a).unwrap().as_ref(), b"one");
    assert_eq!(engine.read(&b).unwrap().as_ref(), b"two");
}

#[test]
fn test_read_missing_id_is_not_found() {
    let (_temp, engine) = setup_engine();

    let err = engine.read("missing").unwrap_err();
    assert!(matches!(err, VaultError::NotFound));
}

#[test]
fn test_binary_payload_round_trip() {
    let (_temp, engine) = setup_engine();

    let payload = b"\x00\x01\xFF\xFE\x00binary\x00";
    engine.write_with_id("bin", payload).unwrap();

    assert_eq!(engine.read("bin").unwrap().as_ref(), payload);
}

// =============================================================================
// Write Validation Tests
// =============================================================================

#[test]
fn test_empty_payload_rejected() {
    let (_temp, engine) = setup_engine();

    let err = engine.write_with_id("empty", b"").unwrap_err();
    assert!(matches!(err, VaultError::EmptyPayload));
}

#[test]
fn test_oversized_payload_rejected() {
    let (_temp, engine) = setup_engine_with_block_size(16);

    let err = engine.write_with_id("big", &[0u8; 17]).unwrap_err();
    assert!(matches!(err, VaultError::PayloadTooLarge { len: 17, max: 16 }));
}

// =============================================================================
// Block Rollover Tests
// =============================================================================

#[test]
fn test_rollover_with_16_byte_blocks() {
    let (temp, engine) = setup_engine_with_block_size(16);

    engine.write_with_id("a", &[b'a'; 10]).unwrap();
    // 10 more bytes do not fit behind cursor 9: "b" rolls to block 1
    engine.write_with_id("b", &[b'b'; 10]).unwrap();

    assert_eq!(engine.read("a").unwrap().as_ref(), &[b'a'; 10]);
    assert_eq!(engine.read("b").unwrap().as_ref(), &[b'b'; 10]);

    assert_eq!(fs::metadata(temp.path().join("block_0")).unwrap().len(), 10);
    assert_eq!(fs::metadata(temp.path().join("block_1")).unwrap().len(), 10);
    assert_eq!(engine.allocator_position(), (1, 9));

    let log = fs::read_to_string(temp.path().join("block_idx")).unwrap();
    assert_eq!(log, "a:0:0:10\nb:1:0:10\n");
}

#[test]
fn test_payloads_pack_into_one_block() {
    let (temp, engine) = setup_engine();

    engine.write_with_id("a", b"aaaa").unwrap();
    engine.write_with_id("b", b"bb").unwrap();
    engine.write_with_id("c", b"cccccc").unwrap();

    // All three landed in block_0 back to back
    assert_eq!(fs::metadata(temp.path().join("block_0")).unwrap().len(), 12);
    assert!(!temp.path().join("block_1").exists());

    assert_eq!(engine.read("b").unwrap().as_ref(), b"bb");
}

// =============================================================================
// Crash Recovery Tests
// =============================================================================

#[test]
fn test_recovery_from_index_log() {
    let temp_dir = TempDir::new().unwrap();

    // First engine: write across blocks, then drop without ceremony
    {
        let config = Config::builder()
            .base_dir(temp_dir.path())
            .block_size(16)
            .build();
        let engine = Engine::open(config).unwrap();

        engine.write_with_id("a", &[b'a'; 10]).unwrap();
        engine.write_with_id("b", &[b'b'; 10]).unwrap();
        engine.write_with_id("c", &[b'c'; 4]).unwrap();
        drop(engine);
    }

    // Second engine: state comes purely from the log replay
    {
        let config = Config::builder()
            .base_dir(temp_dir.path())
            .block_size(16)
            .build();
        let engine = Engine::open(config).unwrap();

        assert_eq!(engine.indexed_ids(), 3);
        assert_eq!(engine.read("a").unwrap().as_ref(), &[b'a'; 10]);
        assert_eq!(engine.read("b").unwrap().as_ref(), &[b'b'; 10]);
        assert_eq!(engine.read("c").unwrap().as_ref(), &[b'c'; 4]);

        // "c" ended at (1, 14): the allocator resumes behind it
        assert_eq!(engine.allocator_position(), (1, 13));

        // New writes continue without clobbering recovered data
        engine.write_with_id("d", b"dd").unwrap();
        assert_eq!(engine.read("d").unwrap().as_ref(), b"dd");
        assert_eq!(engine.read("b").unwrap().as_ref(), &[b'b'; 10]);
    }
}

#[test]
fn test_recovery_tolerates_malformed_line() {
    let temp_dir = TempDir::new().unwrap();

    {
        let config = Config::builder().base_dir(temp_dir.path()).build();
        let engine = Engine::open(config).unwrap();
        engine.write_with_id("keep", b"payload").unwrap();
    }

    // Simulate a line torn mid-write
    let log_path = temp_dir.path().join("block_idx");
    let mut log = fs::read_to_string(&log_path).unwrap();
    log.push_str("torn:0:7");
    fs::write(&log_path, log).unwrap();

    let config = Config::builder().base_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.indexed_ids(), 1);
    assert_eq!(engine.read("keep").unwrap().as_ref(), b"payload");
}

#[test]
fn test_rewritten_id_last_wins_across_restart() {
    let temp_dir = TempDir::new().unwrap();

    {
        let config = Config::builder().base_dir(temp_dir.path()).build();
        let engine = Engine::open(config).unwrap();

        engine.write_with_id("doc", b"first").unwrap();
        engine.write_with_id("doc", b"second").unwrap();

        assert_eq!(engine.read("doc").unwrap().as_ref(), b"second");
        assert_eq!(engine.indexed_ids(), 1);
    }

    let config = Config::builder().base_dir(temp_dir.path()).build();
    let engine = Engine::open(config).unwrap();

    assert_eq!(engine.read("doc").unwrap().as_ref(), b"second");
}

// =============================================================================
// Storage Trait Tests
// =============================================================================

#[test]
fn test_save_derives_id_from_key() {
    let (_temp, engine) = setup_engine();

    let mut data = Cursor::new(b"uploaded bytes".to_vec());
    let id = engine.save("20240102/report.png", &mut data).unwrap();

    assert_eq!(id, "20240102_report.png");

    let mut reader = engine.open(&id).unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"uploaded bytes");
}

#[test]
fn test_open_missing_id_is_not_found() {
    let (_temp, engine) = setup_engine();

    let err = engine.open("nope").err().unwrap();
    assert!(matches!(err, VaultError::NotFound));
}

#[test]
fn test_delete_and_exists_are_unsupported() {
    let (_temp, engine) = setup_engine();
    engine.write_with_id("doc", b"data").unwrap();

    assert!(matches!(
        engine.delete("doc").unwrap_err(),
        VaultError::Unsupported("delete")
    ));
    assert!(matches!(
        engine.exists("doc").unwrap_err(),
        VaultError::Unsupported("exists")
    ));

    // The payload is untouched by the failed calls
    assert_eq!(engine.read("doc").unwrap().as_ref(), b"data");
}

// =============================================================================
// Handle Lifecycle Tests
// =============================================================================

#[test]
fn test_idle_eviction_is_transparent() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .base_dir(temp_dir.path())
        .idle_timeout(Duration::from_millis(50))
        .sweep_interval(Duration::from_millis(20))
        .build();
    let engine = Engine::open(config).unwrap();

    engine.write_with_id("doc", b"survives eviction").unwrap();
    assert!(engine.open_handles() > 0);

    thread::sleep(Duration::from_millis(300));
    assert_eq!(engine.open_handles(), 0);

    // Reads after eviction reopen the block file transparently
    assert_eq!(engine.read("doc").unwrap().as_ref(), b"survives eviction");
}

#[test]
fn test_release_handles() {
    let (_temp, engine) = setup_engine();

    engine.write_with_id("doc", b"data").unwrap();
    assert!(engine.open_handles() > 0);

    engine.release_handles();
    assert_eq!(engine.open_handles(), 0);

    assert_eq!(engine.read("doc").unwrap().as_ref(), b"data");
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .base_dir(temp_dir.path())
        .block_size(256)
        .build();
    let engine = Arc::new(Engine::open(config).unwrap());

    let mut handles = vec![];
    for t in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..25 {
                let id = format!("thread{}_doc{}", t, i);
                let payload = format!("thread{}_payload{}", t, i);
                engine.write_with_id(&id, payload.as_bytes()).unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    // Every payload reads back exactly, despite interleaved reservations
    for t in 0..4 {
        for i in 0..25 {
            let id = format!("thread{}_doc{}", t, i);
            let expected = format!("thread{}_payload{}", t, i);
            assert_eq!(engine.read(&id).unwrap().as_ref(), expected.as_bytes());
        }
    }
}

#[test]
fn test_concurrent_readers() {
    let (_temp, engine) = setup_engine();
    let engine = Arc::new(engine);

    for i in 0..50 {
        engine
            .write_with_id(&format!("doc{}", i), format!("payload{}", i).as_bytes())
            .unwrap();
    }

    let mut handles = vec![];
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for i in 0..50 {
                let expected = format!("payload{}", i);
                let data = engine.read(&format!("doc{}", i)).unwrap();
                assert_eq!(data.as_ref(), expected.as_bytes());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
