//! Range readers over local files and already-open streams.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use super::range_reader::{check_range, RangeReader};
use crate::error::IoError;

/// A readable, seekable byte stream that can move between threads.
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Range reader backed by a local file or an open stream.
///
/// Each read is a seek followed by `read_exact` under one lock, so
/// concurrent readers never observe each other's cursor.
pub struct LocalReader {
    stream: Mutex<Box<dyn ReadSeek>>,
    size: u64,
    identifier: String,
}

impl LocalReader {
    /// Open a file on disk.
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let identifier = path.display().to_string();
        let file = File::open(path).map_err(|e| IoError::os(&identifier, e))?;
        let size = file
            .metadata()
            .map_err(|e| IoError::os(&identifier, e))?
            .len();

        debug!(path = %identifier, size, "opened file");

        Ok(Self {
            stream: Mutex::new(Box::new(file)),
            size,
            identifier,
        })
    }

    /// Wrap an already-open stream.
    ///
    /// The stream's length is found by seeking to its end.
    pub fn from_stream(
        mut stream: Box<dyn ReadSeek>,
        identifier: impl Into<String>,
    ) -> Result<Self, IoError> {
        let identifier = identifier.into();
        let size = stream
            .seek(SeekFrom::End(0))
            .map_err(|e| IoError::os(&identifier, e))?;

        debug!(handle = %identifier, size, "wrapped stream");

        Ok(Self {
            stream: Mutex::new(stream),
            size,
            identifier,
        })
    }
}

impl RangeReader for LocalReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size)?;
        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = vec![0u8; len];
        let mut stream = self.stream.lock();
        stream
            .seek(SeekFrom::Start(offset))
            .map_err(|e| IoError::os(&self.identifier, e))?;
        stream
            .read_exact(&mut buf)
            .map_err(|e| IoError::os(&self.identifier, e))?;

        Ok(Bytes::from(buf))
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl std::fmt::Debug for LocalReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalReader")
            .field("identifier", &self.identifier)
            .field("size", &self.size)
            .finish()
    }
}
