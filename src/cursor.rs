//! Stream cursor over a range-addressable source
//!
//! The seekable Zstandard codec consumes a `Read + Seek` stream, while an
//! HTTP range client only offers "read N bytes at offset K" plus a total
//! size known up front. `RangeCursor` reconciles the two by tracking a
//! logical offset and clamping every read to the fixed size.

use std::io::{self, Read, Seek, SeekFrom};

use crate::source::RangeSource;

/// Cursor over a fixed-size, randomly addressable resource.
///
/// The size is fixed at construction. Seeking past the end is allowed and
/// simply makes the next read report end-of-stream; seeking to a negative
/// position is an error and leaves the cursor untouched.
#[derive(Debug)]
pub struct RangeCursor<R> {
    source: R,
    size: i64,
    offset: i64,
}

impl<R: RangeSource> RangeCursor<R> {
    /// Wrap `source`, treating it as exactly `size` bytes long.
    ///
    /// A negative `size` is accepted but poisons the cursor: every
    /// subsequent read or seek fails with `InvalidInput`.
    pub fn new(source: R, size: i64) -> Self {
        RangeCursor {
            source,
            size,
            offset: 0,
        }
    }

    /// Total size the cursor was constructed with.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Current logical offset.
    pub fn position(&self) -> i64 {
        self.offset
    }

    /// Consume the cursor and return the wrapped source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: RangeSource> Read for RangeCursor<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.size < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid size"));
        }
        if self.offset >= self.size {
            return Ok(0);
        }

        // Never request bytes past the configured size.
        let remaining = (self.size - self.offset) as u64;
        let len = (buf.len() as u64).min(remaining) as usize;
        if len == 0 {
            return Ok(0);
        }

        let n = self.source.read_at(&mut buf[..len], self.offset as u64)?;
        self.offset += n as i64;
        Ok(n)
    }
}

impl<R: RangeSource> Seek for RangeCursor<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if self.size < 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "invalid size"));
        }

        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(delta) => self.offset + delta,
            SeekFrom::End(delta) => self.size + delta,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }

        self.offset = target;
        Ok(self.offset as u64)
    }
}
