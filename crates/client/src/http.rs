//! `reqwest`-backed requester.
//!
//! Implements [`ChunkTransport`] for the transfer core and exposes a plain
//! request helper for the resource wrappers.

use std::collections::HashMap;
use std::time::Duration;

use harbor_transfer::{ChunkForm, ChunkTransport, HttpResponse, TransportError, TransportFuture};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::{ClientError, HarborConfig};

/// Authenticated HTTP requester with a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    http: reqwest::Client,
}

impl HttpRequester {
    pub fn new(config: &HarborConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Token {token}")).map_err(|_| {
                ClientError::InvalidConfig("token contains invalid header characters".into())
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }

    /// Sends a body-less request and buffers the response.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<HttpResponse, TransportError> {
        debug!(%method, url, "request");
        let resp = self
            .http
            .request(method, url)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;
        buffer(resp).await
    }
}

impl ChunkTransport for HttpRequester {
    fn put_chunk<'a>(&'a self, url: &'a str, form: ChunkForm<'a>) -> TransportFuture<'a> {
        Box::pin(async move {
            let body = Form::new()
                .part("chunk", Part::bytes(form.chunk.to_vec()).file_name("chunk"))
                .text("chunk_offset", form.chunk_offset.to_string())
                .text("chunk_size", form.chunk_size.to_string());

            let resp = self
                .http
                .put(url)
                .multipart(body)
                .send()
                .await
                .map_err(transport_error)?;
            buffer(resp).await
        })
    }

    fn get_chunk<'a>(
        &'a self,
        url: &'a str,
        query: &'a [(&'a str, String)],
    ) -> TransportFuture<'a> {
        Box::pin(self.send(Method::GET, url, query))
    }
}

async fn buffer(resp: reqwest::Response) -> Result<HttpResponse, TransportError> {
    let status = resp.status().as_u16();
    let headers: HashMap<String, String> = resp
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();
    let body = resp.bytes().await.map_err(transport_error)?.to_vec();

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_body() || e.is_decode() {
        TransportError::Body(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
