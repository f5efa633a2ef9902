//! Retrieving background bytes for a URL.
//!
//! [`BackgroundFetcher`] is the seam to the outside world. [`HttpFetcher`]
//! (feature `http`) handles `http`, `https`, `file` and `data:` URLs.

use async_trait::async_trait;
use url::Url;

use crate::{ArtError, ArtResult};

/// Fetches raw image bytes for a URL.
///
/// Implementations must not touch the document; they only produce bytes.
#[async_trait]
pub trait BackgroundFetcher: Send + Sync {
    /// Retrieve the bytes behind `url`.
    async fn fetch(&self, url: &Url) -> ArtResult<Vec<u8>>;
}

/// Default response size cap (20 MiB).
pub const DEFAULT_MAX_BYTES: usize = 20 * 1024 * 1024;

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent sent with HTTP requests.
    pub user_agent: String,
    /// Largest body accepted, in bytes.
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("emojiart/{}", env!("CARGO_PKG_VERSION")),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

/// Decode the payload of a `data:` URL.
///
/// Supports both `;base64` and percent-encoded payloads, e.g.
/// `data:image/png;base64,iVBORw0KGgo...`.
///
/// # Errors
///
/// Returns [`ArtError::Fetch`] if the URL is not a well-formed data URL.
pub fn decode_data_url(url: &Url) -> ArtResult<Vec<u8>> {
    if url.scheme() != "data" {
        return Err(ArtError::Fetch(format!("not a data URL: {}", url.scheme())));
    }
    let rest = url.path();
    let comma = rest
        .find(',')
        .ok_or_else(|| ArtError::Fetch("invalid data URL: missing comma".to_string()))?;
    let (metadata, encoded) = (&rest[..comma], &rest[comma + 1..]);

    if metadata.ends_with(";base64") {
        use base64::Engine;
        let compact: String = percent_decode(encoded)?
            .into_iter()
            .map(char::from)
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| ArtError::Fetch(format!("invalid base64 payload: {e}")))
    } else {
        percent_decode(encoded)
    }
}

fn percent_decode(input: &str) -> ArtResult<Vec<u8>> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let byte = bytes
                .get(i + 1..i + 3)
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| ArtError::Fetch("invalid percent encoding".to_string()))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::{async_trait, decode_data_url, ArtError, ArtResult, BackgroundFetcher, FetchConfig, Url};

    /// Fetches `http(s)` with reqwest, `file` from disk and `data:` in-process.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::Client,
        config: FetchConfig,
    }

    impl HttpFetcher {
        /// Create a fetcher with default configuration.
        ///
        /// # Errors
        ///
        /// Returns [`ArtError::Fetch`] if the HTTP client cannot be built.
        pub fn new() -> ArtResult<Self> {
            Self::with_config(FetchConfig::default())
        }

        /// Create a fetcher with custom configuration.
        ///
        /// # Errors
        ///
        /// Returns [`ArtError::Fetch`] if the HTTP client cannot be built.
        pub fn with_config(config: FetchConfig) -> ArtResult<Self> {
            let client = reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                // Proxy auto-detection panics on some macOS configurations.
                .no_proxy()
                .build()
                .map_err(|e| ArtError::Fetch(format!("failed to build HTTP client: {e}")))?;
            Ok(Self { client, config })
        }

        fn check_len(&self, len: usize) -> ArtResult<()> {
            if len > self.config.max_bytes {
                return Err(ArtError::Fetch(format!(
                    "background is {len} bytes, limit is {}",
                    self.config.max_bytes
                )));
            }
            Ok(())
        }

        async fn fetch_http(&self, url: &Url) -> ArtResult<Vec<u8>> {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| ArtError::Fetch(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ArtError::Fetch(format!("HTTP {status} for {url}")));
            }
            if let Some(len) = response.content_length() {
                self.check_len(usize::try_from(len).unwrap_or(usize::MAX))?;
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| ArtError::Fetch(e.to_string()))?;
            self.check_len(body.len())?;
            Ok(body.to_vec())
        }

        async fn fetch_file(&self, url: &Url) -> ArtResult<Vec<u8>> {
            let path = url
                .to_file_path()
                .map_err(|()| ArtError::Fetch(format!("not a local file URL: {url}")))?;
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| ArtError::Fetch(format!("{}: {e}", path.display())))?;
            self.check_len(bytes.len())?;
            Ok(bytes)
        }
    }

    #[async_trait]
    impl BackgroundFetcher for HttpFetcher {
        async fn fetch(&self, url: &Url) -> ArtResult<Vec<u8>> {
            tracing::debug!(%url, "fetching background");
            match url.scheme() {
                "http" | "https" => self.fetch_http(url).await,
                "file" => self.fetch_file(url).await,
                "data" => {
                    let bytes = decode_data_url(url)?;
                    self.check_len(bytes.len())?;
                    Ok(bytes)
                }
                other => Err(ArtError::Fetch(format!("unsupported URL scheme: {other}"))),
            }
        }
    }
}
