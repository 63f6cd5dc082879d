//! Stream-style view of a compressed database
//!
//! Some hosts want an ordinary file object — sequential reads plus seeking —
//! rather than positioned reads. `ZstdStream` layers an explicit offset over
//! a [`ZstdFile`] to provide exactly that.

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::Result;
use crate::file::ZstdFile;

/// `Read + Seek` over decompressed database content.
pub struct ZstdStream {
    file: ZstdFile,
    offset: u64,
}

impl ZstdStream {
    /// Open `name` (local path or HTTP(S) URL) as a stream positioned at 0.
    pub fn open(name: &str) -> Result<Self> {
        Ok(ZstdStream {
            file: ZstdFile::open(name)?,
            offset: 0,
        })
    }

    /// Wrap an existing handle, starting at offset 0.
    pub fn from_file(file: ZstdFile) -> Self {
        ZstdStream { file, offset: 0 }
    }

    /// Decompressed size. Never perturbs the stream position.
    pub fn len(&self) -> u64 {
        self.file.len()
    }

    /// Whether the decompressed content is empty.
    pub fn is_empty(&self) -> bool {
        self.file.is_empty()
    }

    /// The underlying positioned-read handle.
    pub fn get_ref(&self) -> &ZstdFile {
        &self.file
    }

    /// Consume the stream and return the handle.
    pub fn into_inner(self) -> ZstdFile {
        self.file
    }
}

impl Read for ZstdStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self
            .file
            .read_at(buf, self.offset)
            .map_err(io::Error::other)?;
        self.offset += n as u64;
        Ok(n)
    }
}

impl Seek for ZstdStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i64,
            SeekFrom::Current(delta) => self.offset as i64 + delta,
            SeekFrom::End(delta) => self.file.len() as i64 + delta,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            ));
        }

        self.offset = target as u64;
        Ok(self.offset)
    }
}
