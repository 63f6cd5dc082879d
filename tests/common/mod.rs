//! Shared fixtures: build a real SQLite database, then compress it into the
//! seekable Zstandard container with small frames so random access stays
//! cheap.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use zstd_seekable::SeekableCStream;

/// Rows inserted into the fixture database.
pub const ROW_COUNT: i64 = 20_000;

/// Uncompressed bytes per seekable frame.
pub const FRAME_SIZE: usize = 16 * 1024;

/// Create a database with `ROW_COUNT` rows in a single table.
pub fn create_database(dir: &Path) -> PathBuf {
    let db_path = dir.join("test.sqlite");
    let mut conn = Connection::open(&db_path).unwrap();

    conn.execute(
        "CREATE TABLE entries (
            id INTEGER PRIMARY KEY,
            payload TEXT NOT NULL
        )",
        [],
    )
    .unwrap();

    let tx = conn.transaction().unwrap();
    {
        let mut stmt = tx
            .prepare("INSERT INTO entries (id, payload) VALUES (?1, ?2)")
            .unwrap();
        for id in 1..=ROW_COUNT {
            stmt.execute(rusqlite::params![id, format!("payload-{id}")])
                .unwrap();
        }
    }
    tx.commit().unwrap();
    conn.close().map_err(|(_, e)| e).unwrap();

    db_path
}

/// Compress `input` into a seekable Zstandard container.
pub fn seekable_compress(input: &[u8], frame_size: usize) -> Vec<u8> {
    let mut cstream = SeekableCStream::new(3, frame_size).unwrap();
    let mut out = vec![0u8; input.len() + input.len() / 2 + 4096];
    let mut in_pos = 0;
    let mut out_pos = 0;

    while in_pos < input.len() {
        let (written, consumed) = cstream
            .compress(&mut out[out_pos..], &input[in_pos..])
            .unwrap();
        out_pos += written;
        in_pos += consumed;
    }
    loop {
        let n = cstream.end_stream(&mut out[out_pos..]).unwrap();
        if n == 0 {
            break;
        }
        out_pos += n;
    }

    out.truncate(out_pos);
    out
}

/// Seekable-compress the database at `db_path` next to itself.
pub fn compress_database(db_path: &Path) -> PathBuf {
    let raw = fs::read(db_path).unwrap();
    let compressed = seekable_compress(&raw, FRAME_SIZE);

    let zst_path = db_path.with_extension("sqlite.zst");
    fs::write(&zst_path, compressed).unwrap();
    zst_path
}

/// Build the full fixture: returns (uncompressed path, compressed path).
pub fn compressed_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let db_path = create_database(dir);
    let zst_path = compress_database(&db_path);
    (db_path, zst_path)
}
