//! End-to-end tests against local compressed databases

mod common;

use std::fs;

use rand::Rng;
use rusqlite::{Connection, OpenFlags};
use sqlite_zstd_vfs::{open_databases, register, vfs_name, ZstdFile};
use tempfile::TempDir;

fn open_readonly(path: &str) -> Connection {
    let conn = Connection::open_with_flags_and_vfs(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        vfs_name(),
    )
    .unwrap();
    conn.execute_batch("PRAGMA temp_store = memory;").unwrap();
    conn
}

#[test]
fn count_matches_inserted_rows() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());

    let conn = open_readonly(zst_path.to_str().unwrap());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, common::ROW_COUNT);
}

#[test]
fn point_lookup_returns_the_right_row() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());

    let conn = open_readonly(zst_path.to_str().unwrap());
    let payload: String = conn
        .query_row(
            "SELECT payload FROM entries WHERE id = ?1",
            [12_345i64],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(payload, "payload-12345");
}

#[test]
fn logical_size_matches_uncompressed_database() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (db_path, zst_path) = common::compressed_fixture(dir.path());

    let raw_len = fs::metadata(&db_path).unwrap().len();
    let file = ZstdFile::open(zst_path.to_str().unwrap()).unwrap();
    assert_eq!(file.len(), raw_len);

    // SQLite agrees on the decompressed size via its own page accounting.
    let conn = open_readonly(zst_path.to_str().unwrap());
    let page_count: i64 = conn
        .query_row("PRAGMA page_count", [], |row| row.get(0))
        .unwrap();
    let page_size: i64 = conn
        .query_row("PRAGMA page_size", [], |row| row.get(0))
        .unwrap();
    assert_eq!((page_count * page_size) as u64, raw_len);
}

#[test]
fn read_at_matches_raw_database_bytes() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (db_path, zst_path) = common::compressed_fixture(dir.path());

    let raw = fs::read(&db_path).unwrap();
    let file = ZstdFile::open(zst_path.to_str().unwrap()).unwrap();

    for (offset, len) in [
        (0usize, 100usize),
        (4096, 4096),
        (100_000, 512),
        (raw.len() - 64, 64),
        (raw.len() - 10, 100), // clamped at the end
    ] {
        let mut buf = vec![0u8; len];
        let n = file.read_at(&mut buf, offset as u64).unwrap();
        assert_eq!(n, len.min(raw.len() - offset));
        assert_eq!(&buf[..n], &raw[offset..offset + n]);
    }
}

#[test]
fn writes_are_rejected() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());

    let conn = open_readonly(zst_path.to_str().unwrap());
    let result = conn.execute("INSERT INTO entries (id, payload) VALUES (0, 'nope')", []);
    assert!(result.is_err());

    let result = conn.execute("DELETE FROM entries WHERE id = 1", []);
    assert!(result.is_err());
}

#[test]
fn no_journal_or_wal_files_appear() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());

    let conn = open_readonly(zst_path.to_str().unwrap());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM entries WHERE id < 100", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 99);

    let zst = zst_path.to_str().unwrap();
    assert!(!std::path::Path::new(&format!("{zst}-journal")).exists());
    assert!(!std::path::Path::new(&format!("{zst}-wal")).exists());
}

#[test]
fn open_handles_are_tracked_by_name() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());
    let name = zst_path.to_str().unwrap().to_string();

    let conn = open_readonly(&name);
    assert!(open_databases().contains(&name));

    drop(conn);
    assert!(!open_databases().contains(&name));
}

#[test]
fn missing_file_fails_to_open() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.sqlite.zst");

    let result = Connection::open_with_flags_and_vfs(
        &missing,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        vfs_name(),
    );
    assert!(result.is_err());
}

#[test]
fn plain_uncompressed_database_fails_to_open() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let db_path = common::create_database(dir.path());

    // A valid database that is not a seekable Zstandard container must be
    // refused at open, not misread.
    let result = Connection::open_with_flags_and_vfs(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        vfs_name(),
    );
    assert!(result.is_err());
}

#[test]
fn concurrent_connections_serve_random_reads() {
    register().unwrap();
    let dir = TempDir::new().unwrap();
    let (_, zst_path) = common::compressed_fixture(dir.path());
    let name = zst_path.to_str().unwrap().to_string();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let name = name.clone();
            std::thread::spawn(move || {
                let conn = open_readonly(&name);
                let mut rng = rand::thread_rng();

                for _ in 0..1000 {
                    let id = rng.gen_range(1..=common::ROW_COUNT);
                    let payload: String = conn
                        .query_row(
                            "SELECT payload FROM entries WHERE id = ?1",
                            [id],
                            |row| row.get(0),
                        )
                        .unwrap();
                    assert_eq!(payload, format!("payload-{id}"));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
