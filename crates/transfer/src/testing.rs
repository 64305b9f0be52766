//! Scripted transports for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::primitive::{CHUNK_SIZE_HEADER, OBJECT_SIZE_HEADER};
use crate::transport::{ChunkForm, ChunkTransport, HttpResponse, TransportError, TransportFuture};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Put {
        url: String,
        offset: u64,
        size: u64,
        data: Vec<u8>,
    },
    Get {
        url: String,
        offset: u64,
        size: u64,
    },
}

fn query_value(query: &[(&str, String)], key: &str) -> u64 {
    query
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(u64::MAX)
}

/// Replays canned responses in order and records every request.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    calls: Mutex<Vec<Recorded>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self) -> Result<HttpResponse, TransportError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".into())))
    }
}

impl ChunkTransport for MockTransport {
    fn put_chunk<'a>(&'a self, url: &'a str, form: ChunkForm<'a>) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Recorded::Put {
                url: url.into(),
                offset: form.chunk_offset,
                size: form.chunk_size,
                data: form.chunk.to_vec(),
            });
            self.next()
        })
    }

    fn get_chunk<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'a str, String)],
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Recorded::Get {
                url: url.into(),
                offset: query_value(query, "offset"),
                size: query_value(query, "size"),
            });
            self.next()
        })
    }
}

/// In-memory object store speaking the chunk protocol.
///
/// Scripted overrides are served before the store answers a request, so a
/// test can inject failures at a chosen point of a transfer.
pub struct MemoryBackend {
    object: Mutex<Vec<u8>>,
    overrides: Mutex<VecDeque<Option<Result<HttpResponse, TransportError>>>>,
    fail_puts_from: Mutex<Option<u64>>,
    calls: Mutex<Vec<Recorded>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_object(Vec::new())
    }

    pub fn with_object(object: Vec<u8>) -> Self {
        Self {
            object: Mutex::new(object),
            overrides: Mutex::new(VecDeque::new()),
            fail_puts_from: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues per-request behavior: `None` lets the store answer normally.
    pub fn script(&self, steps: Vec<Option<Result<HttpResponse, TransportError>>>) {
        self.overrides.lock().unwrap().extend(steps);
    }

    /// Makes every upload at or beyond `offset` fail with a 500.
    pub fn fail_puts_from(&self, offset: Option<u64>) {
        *self.fail_puts_from.lock().unwrap() = offset;
    }

    pub fn object(&self) -> Vec<u8> {
        self.object.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn scripted(&self) -> Option<Result<HttpResponse, TransportError>> {
        self.overrides.lock().unwrap().pop_front().flatten()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkTransport for MemoryBackend {
    fn put_chunk<'a>(&'a self, url: &'a str, form: ChunkForm<'a>) -> TransportFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Recorded::Put {
                url: url.into(),
                offset: form.chunk_offset,
                size: form.chunk_size,
                data: form.chunk.to_vec(),
            });
            if let Some(resp) = self.scripted() {
                return resp;
            }
            if let Some(limit) = *self.fail_puts_from.lock().unwrap()
                && form.chunk_offset >= limit
            {
                return Ok(HttpResponse::new(500).with_body("injected failure"));
            }

            let mut object = self.object.lock().unwrap();
            let start = form.chunk_offset as usize;
            let end = start + form.chunk.len();
            if object.len() < end {
                object.resize(end, 0);
            }
            object[start..end].copy_from_slice(form.chunk);
            Ok(HttpResponse::new(200).with_body(r#"{"code": 200, "code_text": "ok"}"#))
        })
    }

    fn get_chunk<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'a str, String)],
    ) -> TransportFuture<'a> {
        Box::pin(async move {
            let offset = query_value(query, "offset");
            let size = query_value(query, "size");
            self.calls.lock().unwrap().push(Recorded::Get {
                url: url.into(),
                offset,
                size,
            });
            if let Some(resp) = self.scripted() {
                return resp;
            }

            let object = self.object.lock().unwrap();
            let start = (offset as usize).min(object.len());
            let end = start.saturating_add(size as usize).min(object.len());
            let body = object[start..end].to_vec();
            Ok(HttpResponse::new(200)
                .with_header(CHUNK_SIZE_HEADER, body.len().to_string())
                .with_header(OBJECT_SIZE_HEADER, object.len().to_string())
                .with_body(body))
        })
    }
}
