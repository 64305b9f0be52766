/// A chunk of file data read for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPayload {
    /// Byte offset within the source file.
    pub offset: u64,
    /// Raw chunk data.
    pub data: Vec<u8>,
}

impl ChunkPayload {
    pub fn new(offset: u64, data: Vec<u8>) -> Self {
        Self { offset, data }
    }

    /// Size of this chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A chunk received from the backend together with the object size it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedChunk {
    pub data: Vec<u8>,
    /// Total object size from `evob_obj_size` (0 when absent).
    pub object_size: u64,
}

/// Result of a single chunk exchange with the backend.
///
/// `RetryableOrMissing` covers both "path not found" and "malformed or short
/// response": the caller may retry or abort, but must never continue past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome<T = ()> {
    Success {
        value: T,
        status: u16,
        message: String,
    },
    PermanentFailure {
        status: Option<u16>,
        message: String,
    },
    RetryableOrMissing {
        status: Option<u16>,
        message: String,
    },
}

impl<T> TransferOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// HTTP status of the exchange, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::PermanentFailure { status, .. } | Self::RetryableOrMissing { status, .. } => {
                *status
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success { message, .. }
            | Self::PermanentFailure { message, .. }
            | Self::RetryableOrMissing { message, .. } => message,
        }
    }
}

/// Final result of a whole-object transfer.
///
/// `offset` is the number of bytes known to be transferred; callers resume
/// from it in a later call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub success: bool,
    pub offset: u64,
    pub message: String,
}

impl TransferReport {
    pub fn succeeded(offset: u64, message: impl Into<String>) -> Self {
        Self {
            success: true,
            offset,
            message: message.into(),
        }
    }

    pub fn failed(offset: u64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            offset,
            message: message.into(),
        }
    }
}
