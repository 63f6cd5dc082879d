//! # sqlite-zstd-vfs — read compressed SQLite databases in place
//!
//! A read-only SQLite virtual file system for databases compressed with the
//! seekable Zstandard container. The compressed file is never modified and
//! never fully decompressed: the container's frame index allows random
//! access, so SQLite's page reads decode only the frames they touch.
//!
//! Databases can live on the local filesystem or behind any HTTP(S) server
//! that honors `Range` requests; in the remote case a point query transfers
//! a small fraction of the file.
//!
//! ## Usage
//!
//! Register the VFS once at startup, then name it in the connection string:
//!
//! ```ignore
//! sqlite_zstd_vfs::register()?;
//!
//! let conn = rusqlite::Connection::open_with_flags_and_vfs(
//!     "/data/telemetry.sqlite.zst",
//!     rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
//!     sqlite_zstd_vfs::vfs_name(),
//! )?;
//!
//! // A read-only VFS cannot host spill files: keep temp storage in memory.
//! conn.execute_batch("PRAGMA temp_store = memory;")?;
//! ```
//!
//! URI form works the same way: `file:/data/telemetry.sqlite.zst?vfs=zstd`,
//! or `https://cdn.example.com/telemetry.sqlite.zst` as the path.
//!
//! ## Layers
//!
//! - [`vfs`] — the SQLite-facing adapter and registration
//! - [`file`] — [`ZstdFile`], one open database with positioned reads
//! - [`stream`] — [`ZstdStream`], the same content as `Read + Seek`
//! - [`seekable`] — the random-access decompression seam
//! - [`source`] / [`cursor`] — local/HTTP resolution and the range cursor
//!
//! Journal and WAL files are refused, every write path fails with a
//! read-only error, and content is reported immutable so SQLite skips
//! change detection and locking.

pub mod cursor;
pub mod error;
pub mod file;
pub mod seekable;
pub mod source;
pub mod stream;
pub mod vfs;

pub use cursor::RangeCursor;
pub use error::{ErrorKind, Result, ZstdVfsError};
pub use file::ZstdFile;
pub use seekable::{SeekableReader, ZstdSeekableReader};
pub use source::{HttpConfig, HttpError, HttpRangeSource, RangeSource, StreamSource};
pub use stream::ZstdStream;
pub use vfs::{open_databases, register, vfs_name, VFS_NAME};
