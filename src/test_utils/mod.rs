//! Test utilities for the web UI manager
//!
//! Helpers shared by unit tests and the integration suite:
//! - [`FakeTransport`]: an in-memory release store with a request log
//! - [`BundleFixture`]: builds release archives and their reference digests
//! - [`init_test_logging`]: one-time tracing setup honoring `RUST_LOG`
//!
//! # Example
//!
//! ```rust,no_run
//! use webui_manager::test_utils::{BundleFixture, FakeTransport};
//!
//! let bundle = BundleFixture::new("r1200").with_file("index.html", "<html></html>");
//! let transport = FakeTransport::new()
//!     .with_bytes("https://releases.test/download/r1200/WebUI-r1200.zip", bundle.archive_bytes());
//! ```

use crate::constants::REVISION_FILE;
use crate::core::{Result, WebUiError};
use crate::webui::checksum::BundleDigest;
use crate::webui::transport::{ResponseBody, Transport};
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; does nothing if neither is set.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

#[derive(Debug, Clone)]
enum Canned {
    Body(Vec<u8>),
    Truncated {
        data: Vec<u8>,
        declared_len: u64,
    },
    Failure(String),
}

/// In-memory release store.
///
/// URLs that were never registered fail like an unreachable host. Every
/// request is logged so tests can assert exactly which endpoints were hit.
#[derive(Debug, Default)]
pub struct FakeTransport {
    responses: HashMap<String, Canned>,
    chunk_size: usize,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            chunk_size: 1024,
            ..Self::default()
        }
    }

    /// Size of the chunks streamed bodies are split into.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Body(body.as_bytes().to_vec()));
        self
    }

    #[must_use]
    pub fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), Canned::Body(body));
        self
    }

    /// Serve `data` while announcing `declared_len` bytes, like a dropped connection.
    #[must_use]
    pub fn with_truncated_bytes(mut self, url: &str, data: Vec<u8>, declared_len: u64) -> Self {
        self.responses.insert(
            url.to_string(),
            Canned::Truncated {
                data,
                declared_len,
            },
        );
        self
    }

    /// Answer `url` with a network error (e.g. an HTTP 503).
    #[must_use]
    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.responses.insert(url.to_string(), Canned::Failure(reason.to_string()));
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn lookup(&self, url: &str) -> Result<Canned> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.responses.get(url) {
            Some(Canned::Failure(reason)) => {
                Err(WebUiError::network(format!("GET {url}"), reason.clone()))
            }
            Some(canned) => Ok(canned.clone()),
            None => Err(WebUiError::network(format!("GET {url}"), "connection refused")),
        }
    }
}

impl Transport for FakeTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        match self.lookup(url)? {
            Canned::Body(data)
            | Canned::Truncated {
                data,
                ..
            } => String::from_utf8(data).map_err(|e| WebUiError::MalformedResponse {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Canned::Failure(_) => unreachable!("failures are returned by lookup"),
        }
    }

    async fn get_stream(&self, url: &str) -> Result<ResponseBody> {
        match self.lookup(url)? {
            Canned::Body(data) => Ok(ResponseBody::from_bytes(data, self.chunk_size)),
            Canned::Truncated {
                data,
                declared_len,
            } => {
                let url = url.to_string();
                let chunks = futures::stream::iter(vec![
                    Ok(Bytes::from(data)),
                    Err(WebUiError::network(format!("read body of {url}"), "connection reset")),
                ])
                .boxed();
                Ok(ResponseBody {
                    content_length: Some(declared_len),
                    chunks,
                })
            }
            Canned::Failure(_) => unreachable!("failures are returned by lookup"),
        }
    }
}

/// A web UI release: a set of files packed as a zip archive.
#[derive(Debug, Clone)]
pub struct BundleFixture {
    pub version: String,
    files: Vec<(String, Vec<u8>)>,
    with_revision: bool,
}

impl BundleFixture {
    /// A bundle for `version` containing `index.html` and a revision marker.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            files: vec![(
                "index.html".to_string(),
                format!("<html><body>web ui {version}</body></html>").into_bytes(),
            )],
            with_revision: true,
        }
    }

    #[must_use]
    pub fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.to_string(), content.into()));
        self
    }

    /// Leave the `revision` file out of the archive.
    #[must_use]
    pub fn without_revision(mut self) -> Self {
        self.with_revision = false;
        self
    }

    fn all_files(&self) -> Vec<(String, Vec<u8>)> {
        let mut files = self.files.clone();
        if self.with_revision {
            files.push((REVISION_FILE.to_string(), self.version.clone().into_bytes()));
        }
        files
    }

    /// The bundle as a zip archive.
    pub fn archive_bytes(&self) -> Vec<u8> {
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        for (path, content) in self.all_files() {
            writer.start_file(path.as_str(), options).expect("start zip entry");
            writer.write_all(&content).expect("write zip entry");
        }

        writer.finish().expect("finish zip").into_inner()
    }

    /// Write the bundle's files under `root`.
    pub fn write_to(&self, root: &std::path::Path) {
        for (path, content) in self.all_files() {
            let target = root.join(&path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).expect("create fixture dir");
            }
            std::fs::write(target, content).expect("write fixture file");
        }
    }

    /// Digest the release build would publish for this bundle.
    pub fn digest(&self) -> String {
        let temp = tempfile::TempDir::new().expect("temp dir");
        self.write_to(temp.path());
        BundleDigest::compute_blocking(temp.path()).expect("digest fixture")
    }
}
