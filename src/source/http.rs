//! HTTP range-request source
//!
//! Serves byte ranges of a remote resource through blocking `Range` GETs, so
//! a compressed database hosted on any static file server or CDN can be
//! queried without downloading it.

use std::io;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use reqwest::{StatusCode, Url};
use thiserror::Error;

use super::RangeSource;

/// Errors from the range-request client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Unexpected HTTP status from the server
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Resource not found (HTTP 404)
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// The server answered a range request with the full resource
    #[error("server ignored range request for {url}")]
    RangeNotSupported { url: String },

    /// Neither `Content-Length` nor `Content-Range` yielded a usable size
    #[error("could not determine resource size for {url}")]
    UnknownSize { url: String },

    /// Transport-level failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Configuration for the range-request client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request and connect timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient network failures (default: 3)
    pub max_retries: u32,
    /// Custom `User-Agent` header; defaults to the crate name and version
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: 30,
            max_retries: 3,
            user_agent: None,
        }
    }
}

/// Range-addressable view of a remote resource.
///
/// Every read is an independent `Range` GET; the client keeps no sequential
/// state, which is what lets the cursor layer above expose it as a stream.
pub struct HttpRangeSource {
    url: Url,
    client: Client,
    config: HttpConfig,
    content_length: OnceLock<u64>,
}

impl HttpRangeSource {
    /// Build a client for `url`.
    pub fn new(url: Url, config: HttpConfig) -> Result<Self, HttpError> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs));

        builder = match config.user_agent {
            Some(ref ua) => builder.user_agent(ua.clone()),
            None => builder.user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            )),
        };

        Ok(HttpRangeSource {
            url,
            client: builder.build()?,
            config,
            content_length: OnceLock::new(),
        })
    }

    /// URL this source reads from.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Total size of the remote resource in bytes.
    ///
    /// Tries a `HEAD` request first; servers that answer `HEAD` without a
    /// usable `Content-Length` are probed with a one-byte range request and
    /// the total is taken from `Content-Range` instead. The result is cached
    /// for the lifetime of the source.
    pub fn size(&self) -> Result<u64, HttpError> {
        if let Some(&size) = self.content_length.get() {
            return Ok(size);
        }

        let size = match self.size_from_head()? {
            Some(size) => size,
            None => self.size_from_range_probe()?,
        };

        let _ = self.content_length.set(size);
        Ok(size)
    }

    fn size_from_head(&self) -> Result<Option<u64>, HttpError> {
        let response = self.client.head(self.url.clone()).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(HttpError::NotFound {
                url: self.url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        // A zero length usually means the server suppressed the body length
        // for HEAD; fall through to the range probe to be sure.
        Ok(length.filter(|&n| n > 0))
    }

    fn size_from_range_probe(&self) -> Result<u64, HttpError> {
        let response = self
            .client
            .get(self.url.clone())
            .header(RANGE, "bytes=0-0")
            .send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(HttpError::NotFound {
                url: self.url.to_string(),
            });
        }

        if status == StatusCode::PARTIAL_CONTENT || status == StatusCode::RANGE_NOT_SATISFIABLE {
            // Content-Range: "bytes 0-0/12345" or "bytes */12345"
            return response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.rsplit('/').next())
                .and_then(|total| total.parse::<u64>().ok())
                .ok_or_else(|| HttpError::UnknownSize {
                    url: self.url.to_string(),
                });
        }

        if status.is_success() {
            // Server ignored the range; the full body length is the size.
            if let Some(n) = response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
            {
                return Ok(n);
            }
            return Ok(response.bytes()?.len() as u64);
        }

        Err(HttpError::Status {
            status: status.as_u16(),
            url: self.url.to_string(),
        })
    }

    /// One range request, retried on transient transport failures.
    fn fetch_range(&self, offset: u64, length: u64) -> Result<Vec<u8>, HttpError> {
        let mut attempt = 0;
        loop {
            match self.fetch_range_once(offset, length) {
                Ok(data) => return Ok(data),
                Err(HttpError::Network(e))
                    if attempt < self.config.max_retries && (e.is_timeout() || e.is_connect()) =>
                {
                    let delay_ms = 100u64 << attempt;
                    attempt += 1;
                    tracing::debug!(url = %self.url, attempt, "retrying range request");
                    std::thread::sleep(Duration::from_millis(delay_ms));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fetch_range_once(&self, offset: u64, length: u64) -> Result<Vec<u8>, HttpError> {
        let end = offset + length - 1;
        let response = self
            .client
            .get(self.url.clone())
            .header(RANGE, format!("bytes={offset}-{end}"))
            .send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(HttpError::NotFound {
                url: self.url.to_string(),
            });
        }

        if status == StatusCode::PARTIAL_CONTENT {
            return Ok(response.bytes()?.to_vec());
        }

        if status.is_success() {
            // Full-content answer is only salvageable when the requested
            // range starts at the beginning of the resource.
            if offset == 0 {
                let mut body = response.bytes()?.to_vec();
                body.truncate(length as usize);
                return Ok(body);
            }
            return Err(HttpError::RangeNotSupported {
                url: self.url.to_string(),
            });
        }

        Err(HttpError::Status {
            status: status.as_u16(),
            url: self.url.to_string(),
        })
    }
}

impl RangeSource for HttpRangeSource {
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let data = self
            .fetch_range(offset, buf.len() as u64)
            .map_err(io::Error::other)?;

        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}
