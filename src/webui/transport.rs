//! Network access to the release store.
//!
//! Everything the engine needs from the network goes through the
//! [`Transport`] trait: small text documents (compatibility table, preview
//! info, checksum) and streamed archive bodies. [`HttpTransport`] is the
//! production implementation backed by `reqwest`; tests substitute an
//! in-memory fake.

use crate::config::NetworkConfig;
use crate::core::{Result, WebUiError};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use std::future::Future;
use tracing::debug;

/// A streamed response body.
pub struct ResponseBody {
    /// Length announced by the server, if any.
    pub content_length: Option<u64>,
    /// Body chunks in arrival order.
    pub chunks: BoxStream<'static, Result<Bytes>>,
}

impl ResponseBody {
    /// Body that yields `data` in chunks of at most `chunk_size` bytes.
    pub fn from_bytes(data: Vec<u8>, chunk_size: usize) -> Self {
        let total = data.len() as u64;
        let data = Bytes::from(data);
        let chunk_size = chunk_size.max(1);
        let chunks: Vec<Result<Bytes>> = (0..data.len())
            .step_by(chunk_size)
            .map(|start| Ok(data.slice(start..(start + chunk_size).min(data.len()))))
            .collect();

        Self {
            content_length: Some(total),
            chunks: futures::stream::iter(chunks).boxed(),
        }
    }
}

/// Read-only access to the release store.
///
/// Implementations must treat any non-success status, connect failure or
/// timeout as [`WebUiError::Network`].
pub trait Transport: Send + Sync {
    /// Fetch a small document as text.
    fn get_text(&self, url: &str) -> impl Future<Output = Result<String>> + Send;

    /// Open a streamed download.
    fn get_stream(&self, url: &str) -> impl Future<Output = Result<ResponseBody>> + Send;
}

/// [`Transport`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the configured connect and read timeouts.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(network.connect_timeout())
            .read_timeout(network.read_timeout())
            .user_agent(concat!("webui-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebUiError::network("build HTTP client", e))?;

        Ok(Self {
            client,
        })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WebUiError::network(format!("GET {url}"), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebUiError::network(format!("GET {url}"), format!("HTTP {status}")));
        }

        Ok(response)
    }
}

impl Transport for HttpTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.send(url)
            .await?
            .text()
            .await
            .map_err(|e| WebUiError::network(format!("read body of {url}"), e))
    }

    async fn get_stream(&self, url: &str) -> Result<ResponseBody> {
        let response = self.send(url).await?;
        let content_length = response.content_length();
        let url = url.to_string();
        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| WebUiError::network(format!("read body of {url}"), e))
            })
            .boxed();

        Ok(ResponseBody {
            content_length,
            chunks,
        })
    }
}
