//! Single chunk exchanges and their status classification.

use tracing::{debug, warn};

use crate::transport::{ChunkForm, ChunkTransport, HttpResponse};
use crate::types::{DownloadedChunk, TransferOutcome};

/// Response header carrying the length of the returned chunk.
pub const CHUNK_SIZE_HEADER: &str = "evob_chunk_size";

/// Response header carrying the total object size.
pub const OBJECT_SIZE_HEADER: &str = "evob_obj_size";

/// Message used when the body length disagrees with [`CHUNK_SIZE_HEADER`].
pub const SIZE_MISMATCH_MESSAGE: &str = "received data size does not match server-declared size";

/// Uploads one chunk at `offset`.
///
/// | status            | outcome              |
/// |-------------------|----------------------|
/// | 200               | `Success`            |
/// | 404, other 4xx    | `RetryableOrMissing` |
/// | anything else     | `PermanentFailure`   |
///
/// Transport errors are reported as `PermanentFailure` without a status.
pub async fn upload_chunk(
    transport: &dyn ChunkTransport,
    url: &str,
    offset: u64,
    chunk: &[u8],
) -> TransferOutcome {
    let form = ChunkForm {
        chunk,
        chunk_offset: offset,
        chunk_size: chunk.len() as u64,
    };

    let resp = match transport.put_chunk(url, form).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url, offset, error = %e, "chunk upload request failed");
            return TransferOutcome::PermanentFailure {
                status: None,
                message: e.to_string(),
            };
        }
    };

    let message = resp.message();
    debug!(url, offset, len = chunk.len(), status = resp.status, "chunk upload response");
    classify_upload(resp.status, message)
}

fn classify_upload(status: u16, message: String) -> TransferOutcome {
    match status {
        200 => TransferOutcome::Success {
            value: (),
            status,
            message,
        },
        // The target directory may not exist (yet).
        404 => TransferOutcome::RetryableOrMissing {
            status: Some(status),
            message,
        },
        400..=499 => TransferOutcome::RetryableOrMissing {
            status: Some(status),
            message,
        },
        _ => TransferOutcome::PermanentFailure {
            status: Some(status),
            message,
        },
    }
}

/// Downloads up to `size` bytes of the object starting at `offset`.
///
/// A 200 response whose body length differs from the declared
/// [`CHUNK_SIZE_HEADER`] is a failure. 400 and 404 map to
/// `RetryableOrMissing`; every other status and transport errors map to
/// `PermanentFailure`.
pub async fn download_chunk(
    transport: &dyn ChunkTransport,
    url: &str,
    offset: u64,
    size: u64,
) -> TransferOutcome<DownloadedChunk> {
    let query = [("offset", offset.to_string()), ("size", size.to_string())];

    let resp = match transport.get_chunk(url, &query).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url, offset, error = %e, "chunk download request failed");
            return TransferOutcome::PermanentFailure {
                status: None,
                message: e.to_string(),
            };
        }
    };

    debug!(url, offset, status = resp.status, len = resp.body.len(), "chunk download response");
    classify_download(resp)
}

fn classify_download(resp: HttpResponse) -> TransferOutcome<DownloadedChunk> {
    let status = resp.status;
    match status {
        200 => {}
        400 | 404 => {
            return TransferOutcome::RetryableOrMissing {
                status: Some(status),
                message: resp.message(),
            };
        }
        _ => {
            return TransferOutcome::PermanentFailure {
                status: Some(status),
                message: resp.message(),
            };
        }
    }

    if let Some(declared) = resp.header(CHUNK_SIZE_HEADER) {
        match declared.trim().parse::<u64>() {
            Ok(declared) if declared == resp.body.len() as u64 => {}
            Ok(declared) => {
                warn!(
                    declared,
                    received = resp.body.len(),
                    "chunk size mismatch"
                );
                return TransferOutcome::PermanentFailure {
                    status: Some(status),
                    message: SIZE_MISMATCH_MESSAGE.into(),
                };
            }
            Err(_) => {
                return TransferOutcome::RetryableOrMissing {
                    status: Some(status),
                    message: format!("malformed {CHUNK_SIZE_HEADER} header: {declared}"),
                };
            }
        }
    }

    let object_size = resp
        .header(OBJECT_SIZE_HEADER)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    TransferOutcome::Success {
        value: DownloadedChunk {
            data: resp.body,
            object_size,
        },
        status,
        message: String::new(),
    }
}
