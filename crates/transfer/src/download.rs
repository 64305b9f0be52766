//! Whole-object download with a single retry per chunk request.
//!
//! Unlike uploads there is no stall tracking: a chunk request that fails
//! twice in a row ends the download.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::chunked::ChunkWriter;
use crate::primitive::download_chunk;
use crate::progress::ProgressObserver;
use crate::transport::ChunkTransport;
use crate::types::{DownloadedChunk, TransferOutcome, TransferReport};
use crate::{DEFAULT_CHUNK_SIZE, TransferError};

pub const DOWNLOAD_OK_MESSAGE: &str = "download ok";

pub const DOWNLOAD_INTERRUPTED_MESSAGE: &str = "downloading interrupt";

enum DownloadState {
    Transferring,
    /// The last request at the current offset failed once. Holds the
    /// backend message when that failure was `RetryableOrMissing`.
    Retrying { missing: Option<String> },
    Succeeded,
    Failed { offset: u64, message: String },
}

/// Pulls a remote object into a local file, chunk by chunk.
pub struct DownloadOrchestrator<'a> {
    transport: &'a dyn ChunkTransport,
    chunk_size: u64,
    observer: Option<ProgressObserver>,
}

impl<'a> DownloadOrchestrator<'a> {
    pub fn new(transport: &'a dyn ChunkTransport) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE as u64,
            observer: None,
        }
    }

    /// Overrides the requested chunk size (0 keeps the default).
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        if chunk_size > 0 {
            self.chunk_size = chunk_size;
        }
        self
    }

    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Downloads the object at `url` into `dest`, starting at byte `start`.
    ///
    /// Missing parent directories are created. A download starting at 0
    /// truncates `dest`; a resumed one writes over it at explicit offsets.
    /// Backend failures are reported through the returned
    /// [`TransferReport`]; local I/O failures are errors.
    pub async fn download_object(
        &self,
        url: &str,
        dest: &Path,
        start: u64,
    ) -> Result<TransferReport, TransferError> {
        let mut writer = ChunkWriter::open(dest, start == 0).await?;
        if start > 0 {
            let existing = writer.file_len().await?;
            if existing != start {
                // Resuming into a file of unexpected length is not repaired.
                warn!(
                    path = %dest.display(),
                    existing,
                    start,
                    "resuming download into a file whose length differs from the start offset"
                );
            }
        }

        let mut offset = start;
        let mut state = DownloadState::Transferring;
        debug!(url, path = %dest.display(), start, "download started");

        loop {
            state = match state {
                DownloadState::Transferring => {
                    match download_chunk(self.transport, url, offset, self.chunk_size).await {
                        TransferOutcome::Success { value, .. } => {
                            self.store(&mut writer, &mut offset, value).await?
                        }
                        failure => {
                            warn!(
                                url,
                                offset,
                                status = ?failure.status(),
                                message = failure.message(),
                                "chunk download failed, retrying once"
                            );
                            let missing = match failure {
                                TransferOutcome::RetryableOrMissing { message, .. } => {
                                    Some(message)
                                }
                                _ => None,
                            };
                            DownloadState::Retrying { missing }
                        }
                    }
                }
                DownloadState::Retrying { missing } => {
                    match download_chunk(self.transport, url, offset, self.chunk_size).await {
                        TransferOutcome::Success { value, .. } => {
                            self.store(&mut writer, &mut offset, value).await?
                        }
                        // Object missing or request rejected on either attempt:
                        // nothing usable was fetched.
                        TransferOutcome::RetryableOrMissing { message, .. } => {
                            DownloadState::Failed { offset: 0, message }
                        }
                        TransferOutcome::PermanentFailure { .. } => match missing {
                            Some(message) => DownloadState::Failed { offset: 0, message },
                            None => DownloadState::Failed {
                                offset,
                                message: DOWNLOAD_INTERRUPTED_MESSAGE.into(),
                            },
                        },
                    }
                }
                DownloadState::Succeeded => {
                    writer.flush().await?;
                    info!(url, offset, "download complete");
                    return Ok(TransferReport::succeeded(offset, DOWNLOAD_OK_MESSAGE));
                }
                DownloadState::Failed {
                    offset: reported,
                    message,
                } => {
                    writer.flush().await?;
                    error!(url, offset, %message, "download aborted");
                    return Ok(TransferReport::failed(reported, message));
                }
            };
        }
    }

    async fn store(
        &self,
        writer: &mut ChunkWriter,
        offset: &mut u64,
        chunk: DownloadedChunk,
    ) -> Result<DownloadState, TransferError> {
        if chunk.data.is_empty() && *offset < chunk.object_size {
            // The backend stopped sending before the object was complete.
            return Ok(DownloadState::Failed {
                offset: *offset,
                message: DOWNLOAD_INTERRUPTED_MESSAGE.into(),
            });
        }

        writer.write_at(*offset, &chunk.data).await?;
        *offset += chunk.data.len() as u64;
        if let Some(observer) = &self.observer {
            observer(*offset, chunk.object_size);
        }

        if *offset >= chunk.object_size {
            Ok(DownloadState::Succeeded)
        } else {
            Ok(DownloadState::Transferring)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tempfile::TempDir;

    use super::*;
    use crate::primitive::{CHUNK_SIZE_HEADER, OBJECT_SIZE_HEADER};
    use crate::testing::{MemoryBackend, MockTransport, Recorded};
    use crate::transport::{HttpResponse, TransportError};

    const URL: &str = "http://backend/api/v1/obj/bucket/dir/file.bin/";
    const MIB: usize = 1024 * 1024;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 253) as u8).collect()
    }

    fn chunk_response(data: &[u8], object_size: usize) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(200)
            .with_header(CHUNK_SIZE_HEADER, data.len().to_string())
            .with_header(OBJECT_SIZE_HEADER, object_size.to_string())
            .with_body(data.to_vec()))
    }

    fn missing() -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(404).with_body(r#"{"code_text": "object not found"}"#))
    }

    fn get_offsets(calls: &[Recorded]) -> Vec<u64> {
        calls
            .iter()
            .filter_map(|c| match c {
                Recorded::Get { offset, .. } => Some(*offset),
                Recorded::Put { .. } => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn downloads_seven_mib_in_two_chunks() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let data = pattern(7 * MIB);
        let backend = MemoryBackend::with_object(data.clone());

        let report = DownloadOrchestrator::new(&backend)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::succeeded(7_340_032, "download ok"));
        assert_eq!(get_offsets(&backend.calls()), vec![0, 5 * MIB as u64]);
        assert!(
            backend
                .calls()
                .iter()
                .all(|c| matches!(c, Recorded::Get { size, .. } if *size == 5 * MIB as u64))
        );
        assert_eq!(std::fs::read(&dest).unwrap(), data);
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("a/b/c/out.bin");
        let backend = MemoryBackend::with_object(b"hello".to_vec());

        let report = DownloadOrchestrator::new(&backend)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn missing_twice_aborts_with_zero_offset() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let mock = MockTransport::new(vec![
            chunk_response(b"abcd", 10),
            missing(),
            missing(),
        ]);

        let report = DownloadOrchestrator::new(&mock)
            .with_chunk_size(4)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(0, "object not found"));
        assert_eq!(get_offsets(&mock.calls()), vec![0, 4, 4]);
    }

    #[tokio::test]
    async fn missing_once_then_success_proceeds() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let mock = MockTransport::new(vec![
            missing(),
            chunk_response(b"abcd", 6),
            chunk_response(b"ef", 6),
        ]);

        let report = DownloadOrchestrator::new(&mock)
            .with_chunk_size(4)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::succeeded(6, DOWNLOAD_OK_MESSAGE));
        assert_eq!(get_offsets(&mock.calls()), vec![0, 0, 4]);
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcdef");
    }

    #[tokio::test]
    async fn permanent_failure_twice_reports_interrupt_at_offset() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let mock = MockTransport::new(vec![
            chunk_response(b"abcd", 10),
            Ok(HttpResponse::new(500)),
            Err(TransportError::Connect("reset".into())),
        ]);

        let report = DownloadOrchestrator::new(&mock)
            .with_chunk_size(4)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(4, DOWNLOAD_INTERRUPTED_MESSAGE));
        assert_eq!(std::fs::read(&dest).unwrap(), b"abcd");
    }

    #[tokio::test]
    async fn permanent_then_missing_reports_zero_offset() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let mock = MockTransport::new(vec![Ok(HttpResponse::new(502)), missing()]);

        let report = DownloadOrchestrator::new(&mock)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(0, "object not found"));
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_then_permanent_reports_zero_offset() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let data = pattern(10);
        let mock = MockTransport::new(vec![
            chunk_response(&data[..4], 10),
            missing(),
            Ok(HttpResponse::new(500)),
        ]);

        let report = DownloadOrchestrator::new(&mock)
            .with_chunk_size(4)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(0, "object not found"));
        assert_eq!(get_offsets(&mock.calls()), vec![0, 4, 4]);
    }

    #[tokio::test]
    async fn size_mismatch_is_retried_then_interrupts() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let bad = Ok(HttpResponse::new(200)
            .with_header(CHUNK_SIZE_HEADER, "4")
            .with_header(OBJECT_SIZE_HEADER, "4")
            .with_body(b"abc".to_vec()));
        let mock = MockTransport::new(vec![bad.clone(), bad]);

        let report = DownloadOrchestrator::new(&mock)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(0, DOWNLOAD_INTERRUPTED_MESSAGE));
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn resumes_from_offset_without_truncating() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let data = pattern(10);
        std::fs::write(&dest, &data[..4]).unwrap();
        let backend = MemoryBackend::with_object(data.clone());

        let report = DownloadOrchestrator::new(&backend)
            .with_chunk_size(4)
            .download_object(URL, &dest, 4)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::succeeded(10, DOWNLOAD_OK_MESSAGE));
        assert_eq!(get_offsets(&backend.calls()), vec![4, 8]);
        assert_eq!(std::fs::read(&dest).unwrap(), data);
    }

    #[tokio::test]
    async fn fresh_download_truncates_stale_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        std::fs::write(&dest, b"stale contents that are longer").unwrap();
        let backend = MemoryBackend::with_object(b"new".to_vec());

        let report = DownloadOrchestrator::new(&backend)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn empty_object_completes_at_zero() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.bin");
        let backend = MemoryBackend::new();

        let report = DownloadOrchestrator::new(&backend)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::succeeded(0, DOWNLOAD_OK_MESSAGE));
        assert_eq!(std::fs::read(&dest).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn empty_chunk_before_end_interrupts() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let mock = MockTransport::new(vec![chunk_response(b"", 10)]);

        let report = DownloadOrchestrator::new(&mock)
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(report, TransferReport::failed(0, DOWNLOAD_INTERRUPTED_MESSAGE));
    }

    #[tokio::test]
    async fn observer_reports_object_size() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");
        let backend = MemoryBackend::with_object(pattern(10));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        DownloadOrchestrator::new(&backend)
            .with_chunk_size(4)
            .with_observer(Box::new(move |offset, total| {
                sink.lock().unwrap().push((offset, total));
            }))
            .download_object(URL, &dest, 0)
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(4, 10), (8, 10), (10, 10)]);
    }
}
