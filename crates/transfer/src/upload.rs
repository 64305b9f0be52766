//! Whole-file upload with stall-aware retries.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::chunked::ChunkReader;
use crate::primitive::upload_chunk;
use crate::progress::{ProgressObserver, TransferProgress};
use crate::transport::ChunkTransport;
use crate::types::{ChunkPayload, TransferOutcome, TransferReport};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

/// Failed attempts tolerated at one offset before the upload gives up.
pub const MAX_UPLOAD_RETRIES: u32 = 5;

pub const UPLOAD_OK_MESSAGE: &str = "upload successful";

enum UploadState {
    /// Read the next chunk and send it.
    Transferring,
    /// Resend a chunk that failed, at the same offset.
    Retrying { chunk: ChunkPayload, retries: u32 },
    Succeeded,
    Failed { message: String },
}

/// Pushes a local file to a remote object, chunk by chunk.
pub struct UploadOrchestrator<'a> {
    transport: &'a dyn ChunkTransport,
    chunk_size: usize,
    observer: Option<ProgressObserver>,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(transport: &'a dyn ChunkTransport) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
            observer: None,
        }
    }

    /// Overrides the chunk size (0 keeps the default).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        if chunk_size > 0 {
            self.chunk_size = chunk_size;
        }
        self
    }

    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Uploads `path` to `url`, starting at byte `start`.
    ///
    /// Transfer failures are reported through the returned
    /// [`TransferReport`], whose offset is where a later call can resume.
    /// Only local problems are errors: a missing source file, or an I/O
    /// error while reading it.
    pub async fn upload_file(
        &self,
        url: &str,
        path: &Path,
        start: u64,
    ) -> Result<TransferReport, TransferError> {
        if !tokio::fs::try_exists(path).await? {
            return Err(TransferError::SourceMissing(path.to_path_buf()));
        }

        let mut reader = open_reader(path, start, self.chunk_size).await?;
        let total = reader.file_size()?;
        let mut progress = TransferProgress::new(start);
        let mut state = UploadState::Transferring;

        debug!(url, path = %path.display(), start, total, "upload started");

        loop {
            state = match state {
                UploadState::Transferring => {
                    let (r, next) = read_next(reader).await?;
                    reader = r;
                    match next {
                        Some(chunk) => self.send(url, chunk, &mut progress, total).await,
                        None if progress.offset() >= total => UploadState::Succeeded,
                        None => UploadState::Failed {
                            message: format!(
                                "upload failed: source ended at byte {} of {total}",
                                progress.offset()
                            ),
                        },
                    }
                }
                UploadState::Retrying { chunk, retries } => {
                    warn!(url, offset = chunk.offset, retries, "retrying chunk upload");
                    self.send(url, chunk, &mut progress, total).await
                }
                UploadState::Succeeded => {
                    info!(url, offset = progress.offset(), "upload complete");
                    return Ok(TransferReport::succeeded(
                        progress.offset(),
                        UPLOAD_OK_MESSAGE,
                    ));
                }
                UploadState::Failed { message } => {
                    error!(url, offset = progress.offset(), %message, "upload aborted");
                    return Ok(TransferReport::failed(progress.offset(), message));
                }
            };
        }
    }

    async fn send(
        &self,
        url: &str,
        chunk: ChunkPayload,
        progress: &mut TransferProgress,
        total: u64,
    ) -> UploadState {
        let outcome = upload_chunk(self.transport, url, chunk.offset, &chunk.data).await;
        if let TransferOutcome::Success { .. } = outcome {
            progress.advance(chunk.len() as u64);
            if let Some(observer) = &self.observer {
                observer(progress.offset(), total);
            }
            return UploadState::Transferring;
        }

        // Nothing ever acknowledged, or the offset is stuck: give up.
        if progress.retries() > MAX_UPLOAD_RETRIES || progress.offset() == 0 {
            return UploadState::Failed {
                message: format!("upload failed: {}", outcome.message()),
            };
        }

        warn!(
            url,
            offset = progress.offset(),
            status = ?outcome.status(),
            message = outcome.message(),
            "chunk upload failed"
        );
        progress.record_failure();
        UploadState::Retrying {
            chunk,
            retries: progress.retries(),
        }
    }
}

async fn open_reader(
    path: &Path,
    start: u64,
    chunk_size: usize,
) -> Result<ChunkReader, TransferError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || ChunkReader::open(&path, start, chunk_size))
        .await
        .map_err(|e| TransferError::Task(e.to_string()))?
}

async fn read_next(
    mut reader: ChunkReader,
) -> Result<(ChunkReader, Option<ChunkPayload>), TransferError> {
    let (reader, next) = tokio::task::spawn_blocking(move || {
        let next = reader.next_chunk();
        (reader, next)
    })
    .await
    .map_err(|e| TransferError::Task(e.to_string()))?;
    Ok((reader, next?))
}
