//! Open compressed database handles

use parking_lot::Mutex;

use crate::error::Result;
use crate::seekable::{SeekableReader, ZstdSeekableReader};
use crate::source;

/// One open, immutable compressed database.
///
/// The handle owns its whole pipeline: the seekable reader, which in turn
/// owns the decoder state and the resolved data source (local file or HTTP
/// cursor). Dropping the handle releases everything; cleanup cannot fail.
///
/// Reads on a single handle are serialized internally, because the seekable
/// codec needs exclusive access while decompressing. Handles opened for the
/// same name are fully independent and never share state, so concurrency
/// across connections comes from opening one handle per connection.
pub struct ZstdFile {
    reader: Mutex<Box<dyn SeekableReader>>,
    size: u64,
}

impl std::fmt::Debug for ZstdFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZstdFile")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ZstdFile {
    /// Open `name` — a local path or an `http://` / `https://` URL — and
    /// build the decompression pipeline over it.
    pub fn open(name: &str) -> Result<Self> {
        let stream = source::resolve(name)?;
        let reader = ZstdSeekableReader::new(stream)?;
        tracing::debug!(name, size = reader.len(), "opened compressed database");
        Ok(Self::from_seekable(Box::new(reader)))
    }

    /// Wrap an already-built seekable reader.
    ///
    /// This is the seam for alternative decompression pipelines; `open` is
    /// this plus the standard resolver and codec.
    pub fn from_seekable(reader: Box<dyn SeekableReader>) -> Self {
        let size = reader.len();
        ZstdFile {
            reader: Mutex::new(reader),
            size,
        }
    }

    /// Read decompressed bytes at `offset`. Returns how many bytes were
    /// produced; reads past the logical end return `Ok(0)`.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.reader.lock().read_at(buf, offset)
    }

    /// Decompressed logical size of the database.
    ///
    /// Computed once when the pipeline is built, so querying it has no
    /// observable effect on reads.
    pub fn len(&self) -> u64 {
        self.size
    }

    /// Whether the decompressed database is empty.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
