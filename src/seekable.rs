//! Seekable random-access decompression
//!
//! The crate does not implement the seekable Zstandard container; it
//! consumes it through [`SeekableReader`], with [`ZstdSeekableReader`]
//! binding that capability to the `zstd-seekable` codec. Anything that can
//! answer random-access reads over decompressed content (a test fake, an
//! alternative codec) can stand in behind the same trait.

use zstd_seekable::Seekable;

use crate::error::{Result, ZstdVfsError};
use crate::source::StreamSource;

/// Random-access reads over decompressed content.
pub trait SeekableReader {
    /// Read decompressed bytes starting at `offset` into `buf`, returning
    /// how many were produced. Reads past the end return `Ok(0)`; reads
    /// crossing the end are clamped.
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Total decompressed size.
    fn len(&self) -> u64;

    /// Whether the decompressed content is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`SeekableReader`] over a seekable Zstandard stream.
pub struct ZstdSeekableReader {
    inner: Seekable<'static, Box<dyn StreamSource>>,
    size: u64,
}

impl ZstdSeekableReader {
    /// Initialize the codec over `stream` and derive the decompressed size
    /// from the container's frame table.
    pub fn new(stream: Box<dyn StreamSource>) -> Result<Self> {
        let mut inner = Seekable::init(Box::new(stream))
            .map_err(|e| ZstdVfsError::Decoder(format!("{e:?}")))?;

        let mut size = 0u64;
        for frame in 0..inner.get_num_frames() {
            size += inner.get_frame_decompressed_size(frame) as u64;
        }

        Ok(ZstdSeekableReader { inner, size })
    }
}

impl SeekableReader for ZstdSeekableReader {
    fn read_at(&mut self, buf: &mut [u8], offset: u64) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64).min(self.size);
        let len = (end - offset) as usize;
        if len == 0 {
            return Ok(0);
        }

        self.inner
            .decompress(&mut buf[..len], offset)
            .map_err(|e| ZstdVfsError::Decoder(format!("{e:?}")))
    }

    fn len(&self) -> u64 {
        self.size
    }
}
