use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::types::ChunkPayload;
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads a file handle in fixed-size chunks starting at a given offset.
///
/// The reader owns its handle and moves the handle's read position as it
/// goes. A new reader can be created at any offset to restart.
pub struct ChunkReader<R = File> {
    inner: R,
    chunk_size: usize,
    offset: u64,
    done: bool,
}

impl ChunkReader<File> {
    /// Opens `path` for chunked reading from `offset`.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] (5 MiB) is used.
    pub fn open(path: &Path, offset: u64, chunk_size: usize) -> Result<Self, TransferError> {
        let file = File::open(path)?;
        Self::new(file, offset, chunk_size)
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> Result<u64, TransferError> {
        Ok(self.inner.metadata()?.len())
    }
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Wraps an open handle, seeking it to `offset`.
    pub fn new(mut inner: R, offset: u64, chunk_size: usize) -> Result<Self, TransferError> {
        inner.seek(SeekFrom::Start(offset))?;
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Ok(Self {
            inner,
            chunk_size,
            offset,
            done: false,
        })
    }

    /// Reads the next chunk. Returns `None` at EOF, never an empty chunk.
    pub fn next_chunk(&mut self) -> Result<Option<ChunkPayload>, TransferError> {
        if self.done {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;
        // Fill the buffer across short reads until full or EOF.
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let chunk = ChunkPayload::new(self.offset, buf);
        self.offset += filled as u64;
        Ok(Some(chunk))
    }

    /// Offset of the next chunk to be read.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

impl<R: Read + Seek> Iterator for ChunkReader<R> {
    type Item = Result<ChunkPayload, TransferError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

// ---------------------------------------------------------------------------
// ChunkWriter
// ---------------------------------------------------------------------------

/// Writes downloaded chunks to a local file at explicit offsets.
pub struct ChunkWriter {
    file: tokio::fs::File,
}

impl ChunkWriter {
    /// Opens (or creates) `path` for positioned writes.
    ///
    /// Creates intermediate directories as needed. The file is truncated
    /// only when `truncate` is set; resumed downloads keep existing bytes.
    pub async fn open(path: &Path, truncate: bool) -> Result<Self, TransferError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !tokio::fs::try_exists(parent).await?
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(truncate)
            .open(path)
            .await?;

        Ok(Self { file })
    }

    /// Current length of the destination file on disk.
    pub async fn file_len(&self) -> Result<u64, TransferError> {
        Ok(self.file.metadata().await?.len())
    }

    /// Writes `data` starting at byte `offset`.
    pub async fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<(), TransferError> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.file.write_all(data).await?;
        Ok(())
    }

    /// Flushes buffered data to the OS.
    pub async fn flush(&mut self) -> Result<(), TransferError> {
        self.file.flush().await?;
        Ok(())
    }
}
