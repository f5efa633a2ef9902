//! Error types for document operations.

use thiserror::Error;

/// Result type for document operations.
pub type ArtResult<T> = Result<T, ArtError>;

/// Errors that can occur in document operations.
///
/// Only [`ArtError::InvalidArgument`] ever reaches a caller of the
/// controller's intents. Fetch and decode failures are folded into an
/// absent background image, and missing elements are plain no-ops.
#[derive(Debug, Error)]
pub enum ArtError {
    /// Caller contract violation (empty glyph, non-positive size, bad factor).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Background bytes could not be retrieved.
    #[error("Failed to fetch background: {0}")]
    Fetch(String),

    /// Background bytes are not a decodable image.
    #[error("Failed to decode background image: {0}")]
    Decode(String),

    /// A URL background was set outside of a tokio runtime.
    #[error("No async runtime available to fetch the background")]
    NoRuntime,
}

impl ArtError {
    /// Whether this error belongs to the "resolves to no image" category.
    #[must_use]
    pub const fn is_background_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Decode(_) | Self::NoRuntime)
    }
}
