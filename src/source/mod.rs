//! Data sources for compressed databases
//!
//! A database name is either a local filesystem path or an `http://` /
//! `https://` URL. Local files already provide the `Read + Seek` stream the
//! decompression codec wants; remote resources only provide range reads, so
//! they are wrapped in a [`RangeCursor`](crate::cursor::RangeCursor) after
//! their total size has been discovered.

mod http;

pub use http::{HttpConfig, HttpError, HttpRangeSource};

use std::fs::File;
use std::io::{self, Read, Seek};

use reqwest::Url;

use crate::cursor::RangeCursor;
use crate::error::{Result, ZstdVfsError};

/// A source supporting "read N bytes starting at offset K" without
/// sequential state.
pub trait RangeSource {
    /// Read into `buf` starting at `offset`, returning the number of bytes
    /// actually read. Reads past the end of the resource return `Ok(0)`;
    /// short reads are permitted.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize>;
}

/// In-memory byte slices are trivially range-addressable.
impl RangeSource for &[u8] {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if offset >= self.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(self.len() - start);
        buf[..n].copy_from_slice(&self[start..start + n]);
        Ok(n)
    }
}

/// Stream shape the decompression codec consumes.
pub trait StreamSource: Read + Seek {}

impl<T: Read + Seek> StreamSource for T {}

impl std::fmt::Debug for dyn StreamSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StreamSource")
    }
}

/// Decide local-vs-network by literal scheme prefix and open the stream.
///
/// For a network resource the total size is queried synchronously before any
/// read happens; failing to learn the size fails the open. No scheme other
/// than `http` / `https` is recognized, and no redirect or protocol
/// negotiation happens at this layer.
pub fn resolve(name: &str) -> Result<Box<dyn StreamSource>> {
    if name.starts_with("http://") || name.starts_with("https://") {
        let url = Url::parse(name).map_err(|e| ZstdVfsError::InvalidUrl {
            url: name.to_string(),
            reason: e.to_string(),
        })?;

        let source = HttpRangeSource::new(url, HttpConfig::default())?;
        let size = source.size()?;
        tracing::debug!(name, size, "resolved remote database");

        Ok(Box::new(RangeCursor::new(source, size as i64)))
    } else {
        let file = File::open(name)?;
        tracing::debug!(name, "resolved local database");
        Ok(Box::new(file))
    }
}
