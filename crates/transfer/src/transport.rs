//! Transport seam between the transfer core and an HTTP implementation.
//!
//! `harbor-client` implements [`ChunkTransport`] on top of `reqwest`.
//! Keeping the trait here lets the primitives and orchestrators be
//! exercised with scripted mocks.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`ChunkTransport`] methods.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Connection-level failures raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Multipart body of a chunk upload.
///
/// Serialized as a file field `chunk` plus the text fields `chunk_offset`
/// and `chunk_size`.
#[derive(Debug, Clone, Copy)]
pub struct ChunkForm<'a> {
    pub chunk: &'a [u8],
    pub chunk_offset: u64,
    pub chunk_size: u64,
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parses the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Human-readable result message as the backend formats it.
    ///
    /// Looks for `code_text`, then `detail` in a JSON object body and falls
    /// back to the raw body text.
    pub fn message(&self) -> String {
        match serde_json::from_slice::<serde_json::Value>(&self.body) {
            Ok(serde_json::Value::Object(map)) => ["code_text", "detail"]
                .iter()
                .find_map(|k| map.get(*k))
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| self.text()),
            _ => self.text(),
        }
    }
}

/// The two requests the transfer core issues.
pub trait ChunkTransport: Send + Sync {
    /// `PUT url` with a multipart chunk body.
    fn put_chunk<'a>(&'a self, url: &'a str, form: ChunkForm<'a>) -> TransportFuture<'a>;

    /// `GET url` with the given query parameters.
    fn get_chunk<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'a str, String)],
    ) -> TransportFuture<'a>;
}
