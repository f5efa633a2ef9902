//! Drives a document controller from a host configuration.

use std::path::Path;
use std::sync::Arc;

use emojiart_core::{
    Background, BackgroundFetcher, Document, DocumentController, DropPayload, FetchResolution,
    HttpFetcher, RenderSnapshot,
};
use thiserror::Error;
use url::Url;

use crate::HostConfig;

/// Errors raised while preparing the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// The background is neither a URL nor an existing file.
    #[error("invalid background '{0}': not a URL or an existing file")]
    InvalidBackground(String),
    /// The engine rejected an intent.
    #[error(transparent)]
    Engine(#[from] emojiart_core::ArtError),
}

/// Headless application: one controller, run to a settled state.
pub struct HostApp {
    config: HostConfig,
    controller: DocumentController,
}

impl HostApp {
    /// Create the app with the default HTTP fetcher.
    ///
    /// Must be called inside a tokio runtime so fetches can be spawned.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let fetcher = HttpFetcher::new()?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Create the app with a custom fetcher.
    #[must_use]
    pub fn with_fetcher(config: HostConfig, fetcher: Arc<dyn BackgroundFetcher>) -> Self {
        let document = if config.sample {
            Document::sample()
        } else {
            Document::new()
        };
        tracing::debug!("Document created with {} elements", document.element_count());
        let controller =
            DocumentController::new(config.engine.clone(), fetcher).with_document(document);
        Self { config, controller }
    }

    /// The controller being driven.
    #[must_use]
    pub const fn controller(&self) -> &DocumentController {
        &self.controller
    }

    /// Drop the configured glyphs, set the background and wait for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the background cannot be interpreted or a glyph
    /// is rejected.
    pub async fn run(&mut self) -> Result<RenderSnapshot, HostError> {
        let center = self.controller.viewport().canvas_size().center();
        for glyph in &self.config.emojis {
            let handled = self
                .controller
                .handle_drop([DropPayload::PlainText(glyph.clone())], center)?;
            if !handled {
                tracing::warn!("Skipping '{glyph}': not an emoji");
            }
        }

        if let Some(background) = &self.config.background {
            let url = parse_background(background)?;
            self.controller.set_background(Background::Url(url));
        }

        while let Some(resolution) = self.controller.next_fetch_resolution().await {
            match resolution {
                FetchResolution::Applied { width, height } => {
                    tracing::info!("Background loaded: {width}x{height}");
                }
                FetchResolution::Failed => {
                    tracing::warn!(
                        "Background unavailable: {}",
                        self.controller.background_error().unwrap_or("unknown error")
                    );
                }
                FetchResolution::Discarded => {}
            }
        }

        Ok(self.controller.snapshot())
    }
}

/// Interpret a user-supplied background as a URL, falling back to a path.
fn parse_background(input: &str) -> Result<Url, HostError> {
    if let Ok(url) = Url::parse(input) {
        // "C:\foo.png" parses as a URL with scheme "c".
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }
    let path = Path::new(input);
    if path.exists() {
        let absolute = std::fs::canonicalize(path)
            .map_err(|_| HostError::InvalidBackground(input.to_string()))?;
        return Url::from_file_path(absolute)
            .map_err(|()| HostError::InvalidBackground(input.to_string()));
    }
    Err(HostError::InvalidBackground(input.to_string()))
}
