//! Background image resolution.
//!
//! ```text
//!                 set(blank | bytes)
//!   ┌──────────────────────────────────────┐
//!   ▼                                      │
//! Idle ──set(url)──► Fetching ──complete(url == current)──► Idle
//!   ▲                   │
//!   └──set(blank|bytes)─┘   complete(url != current) → discarded, no change
//! ```
//!
//! The loader never talks to the network itself. The controller spawns the
//! fetch and feeds the outcome back through [`BackgroundLoader::complete`],
//! passing the document's *current* background. A result is only applied if
//! that background is still the URL the fetch was started for.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ArtError, ArtResult, Background};

/// Whether a background fetch is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPhase {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Waiting for the current URL to resolve.
    Fetching,
}

/// A decoded background, RGBA8.
#[derive(Clone, PartialEq, Eq)]
pub struct BackgroundImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl BackgroundImage {
    /// Image dimensions as a float size, for zoom-to-fit.
    #[must_use]
    pub fn size(&self) -> crate::Size {
        crate::Size::new(f64::from(self.width), f64::from(self.height))
    }
}

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP).
///
/// # Errors
///
/// Returns [`ArtError::Decode`] if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> ArtResult<BackgroundImage> {
    let img = image::load_from_memory(bytes).map_err(|e| ArtError::Decode(e.to_string()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(BackgroundImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

/// The result of a fetch, tagged with the URL it was started for.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The URL that was requested.
    pub url: Url,
    /// Raw bytes, or why they could not be retrieved.
    pub result: ArtResult<Vec<u8>>,
}

/// What happened when a fetch outcome was handed to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchResolution {
    /// The image was decoded and is now the background.
    Applied {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The fetch or decode failed; the background has no image.
    Failed,
    /// The document moved on before the fetch finished; nothing changed.
    Discarded,
}

/// Tracks the decoded image for the document's current background.
#[derive(Debug, Default, Clone)]
pub struct BackgroundLoader {
    phase: FetchPhase,
    image: Option<Arc<BackgroundImage>>,
    last_error: Option<String>,
}

impl BackgroundLoader {
    /// Create an idle loader with no image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// The resolved image, if any.
    #[must_use]
    pub fn image(&self) -> Option<&Arc<BackgroundImage>> {
        self.image.as_ref()
    }

    /// Why the most recent resolution produced no image.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// React to a new background reference.
    ///
    /// Returns the URL to fetch when the background must be loaded
    /// asynchronously. The previous image is always cleared first so stale
    /// content is never shown under a new request.
    pub fn begin(&mut self, background: &Background) -> Option<Url> {
        self.image = None;
        self.last_error = None;
        match background {
            Background::Blank => {
                self.phase = FetchPhase::Idle;
                None
            }
            Background::ImageBytes(bytes) => {
                self.phase = FetchPhase::Idle;
                self.settle(decode_image(bytes));
                None
            }
            Background::Url(url) => {
                self.phase = FetchPhase::Fetching;
                Some(url.clone())
            }
        }
    }

    /// Apply a finished fetch if it still matches `current`.
    pub fn complete(&mut self, current: &Background, outcome: FetchOutcome) -> FetchResolution {
        if current.url() != Some(&outcome.url) {
            tracing::debug!(url = %outcome.url, "discarding stale background fetch");
            return FetchResolution::Discarded;
        }
        self.phase = FetchPhase::Idle;
        let decoded = outcome.result.and_then(|bytes| decode_image(&bytes));
        if let Err(e) = &decoded {
            tracing::warn!(url = %outcome.url, "background fetch failed: {e}");
        }
        self.settle(decoded)
    }

    fn settle(&mut self, decoded: ArtResult<BackgroundImage>) -> FetchResolution {
        match decoded {
            Ok(image) => {
                let resolution = FetchResolution::Applied {
                    width: image.width,
                    height: image.height,
                };
                tracing::info!(width = image.width, height = image.height, "background image resolved");
                self.image = Some(Arc::new(image));
                resolution
            }
            Err(e) => {
                self.image = None;
                self.last_error = Some(e.to_string());
                FetchResolution::Failed
            }
        }
    }
}
