//! Resumable chunked transfer against an object-storage backend.
//!
//! Files move in bounded chunks addressed by explicit byte offsets. Every
//! chunk exchange yields a [`TransferOutcome`], and the upload and download
//! orchestrators turn those outcomes into advance, retry or abort decisions.
//! HTTP is reached through the [`ChunkTransport`] seam, so this crate carries
//! no HTTP client of its own.

mod chunked;
mod download;
mod primitive;
mod progress;
mod transport;
mod types;
mod upload;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

pub use chunked::{ChunkReader, ChunkWriter};
pub use download::{DOWNLOAD_INTERRUPTED_MESSAGE, DOWNLOAD_OK_MESSAGE, DownloadOrchestrator};
pub use primitive::{
    CHUNK_SIZE_HEADER, OBJECT_SIZE_HEADER, SIZE_MISMATCH_MESSAGE, download_chunk, upload_chunk,
};
pub use progress::{ProgressObserver, RateMeter, TransferProgress};
pub use transport::{ChunkForm, ChunkTransport, HttpResponse, TransportError, TransportFuture};
pub use types::{ChunkPayload, DownloadedChunk, TransferOutcome, TransferReport};
pub use upload::{MAX_UPLOAD_RETRIES, UPLOAD_OK_MESSAGE, UploadOrchestrator};

/// Default chunk size: 5 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
///
/// Backend failures never show up here; they end a transfer with an
/// unsuccessful [`TransferReport`] instead.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source file not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("blocking task failed: {0}")]
    Task(String),
}
