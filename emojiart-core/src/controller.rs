//! The single mutation surface for a document.
//!
//! Every intent is a synchronous edit made on the caller's task. The only
//! asynchronous work is the background fetch, which runs on the tokio
//! runtime and reports back through a channel. Outcomes are applied when
//! the owner calls [`DocumentController::next_fetch_resolution`] or
//! [`DocumentController::drain_fetch_resolutions`], and a result is dropped
//! if the document's background changed in the meantime.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use url::Url;

use crate::background::{BackgroundImage, BackgroundLoader, FetchOutcome, FetchResolution};
use crate::payload::{resolve_drop, DropAction, DropPayload};
use crate::snapshot::{BackgroundState, RenderSnapshot, RenderedElement};
use crate::{
    ArtError, ArtResult, Background, BackgroundFetcher, Document, Element, ElementId,
    EngineConfig, FetchPhase, Point, Size, Vector, ViewTransform, Viewport,
};

/// Owns a document, its viewport and its background loader.
pub struct DocumentController {
    document: Document,
    loader: BackgroundLoader,
    viewport: Viewport,
    config: EngineConfig,
    fetcher: Arc<dyn BackgroundFetcher>,
    runtime: Option<Handle>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: usize,
}

impl std::fmt::Debug for DocumentController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentController")
            .field("document", &self.document)
            .field("loader", &self.loader)
            .field("viewport", &self.viewport)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

impl DocumentController {
    /// Create a controller for an empty document.
    ///
    /// Fetches are spawned on the tokio runtime current at construction
    /// time, if there is one.
    #[must_use]
    pub fn new(config: EngineConfig, fetcher: Arc<dyn BackgroundFetcher>) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let viewport =
            Viewport::new(config.canvas_size).with_zoom_limits(config.min_zoom, config.max_zoom);
        Self {
            document: Document::new(),
            loader: BackgroundLoader::new(),
            viewport,
            config,
            fetcher,
            runtime: Handle::try_current().ok(),
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    /// Start from an existing document. Its background is resolved
    /// immediately.
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.document = document;
        self.reload_background();
        self
    }

    /// Spawn fetches on `runtime` instead of the ambient one.
    #[must_use]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    // --- Observation -----------------------------------------------------

    /// The document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        self.document.elements()
    }

    /// Current background reference.
    #[must_use]
    pub const fn background(&self) -> &Background {
        self.document.background()
    }

    /// Whether a background fetch is in flight.
    #[must_use]
    pub const fn fetch_phase(&self) -> FetchPhase {
        self.loader.phase()
    }

    /// The resolved background image, if any.
    #[must_use]
    pub fn background_image(&self) -> Option<&Arc<BackgroundImage>> {
        self.loader.image()
    }

    /// Why the current background has no image, if it failed to resolve.
    #[must_use]
    pub fn background_error(&self) -> Option<&str> {
        self.loader.last_error()
    }

    /// Pan/zoom state.
    #[must_use]
    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The effective transform right now.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.viewport.transform()
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of fetches whose outcome has not been applied yet.
    #[must_use]
    pub const fn pending_fetches(&self) -> usize {
        self.in_flight
    }

    /// Everything the renderer needs for one frame.
    #[must_use]
    pub fn snapshot(&self) -> RenderSnapshot {
        let transform = self.transform();
        RenderSnapshot {
            elements: self
                .document
                .elements()
                .iter()
                .map(|e| RenderedElement::new(e, &transform))
                .collect(),
            background: BackgroundState {
                phase: self.loader.phase(),
                image_size: self.loader.image().map(|i| (i.width, i.height)),
            },
            pan: transform.pan,
            zoom: transform.zoom,
        }
    }

    // --- Element intents ---------------------------------------------------

    /// Place `glyph` where it was dropped.
    ///
    /// `nominal_size` is the on-screen size at drop time; the stored size is
    /// divided by the current zoom so the glyph looks the same size it was
    /// dragged at.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] for an empty glyph or a size
    /// that is not a positive finite number.
    pub fn add_emoji(
        &mut self,
        glyph: &str,
        drop_point: Point,
        nominal_size: f64,
    ) -> ArtResult<ElementId> {
        if !(nominal_size.is_finite() && nominal_size > 0.0) {
            return Err(ArtError::InvalidArgument(format!(
                "nominal size must be positive, got {nominal_size}"
            )));
        }
        let transform = self.transform();
        let (x, y) = transform.to_document_space(drop_point);
        let size = logical_size(nominal_size / transform.zoom);
        let id = self.document.add_element(glyph, x, y, size)?;
        tracing::debug!(%id, glyph, x, y, size, "emoji added");
        Ok(id)
    }

    /// Move an element by an on-screen displacement.
    ///
    /// Returns `false` (and changes nothing) if there is no such element.
    pub fn move_element(&mut self, id: ElementId, canvas_delta: Vector) -> bool {
        let (dx, dy) = self.transform().delta_to_document(canvas_delta);
        let moved = self
            .document
            .update_element(id, |e| e.offset_by(dx, dy))
            .is_some();
        if moved {
            tracing::debug!(%id, dx, dy, "emoji moved");
        } else {
            tracing::debug!(%id, "move ignored, no such element");
        }
        moved
    }

    /// Multiply an element's size by `factor`, rounding half away from zero.
    ///
    /// The result never drops below 1. Returns `Ok(false)` if there is no
    /// such element.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] if `factor` is not a positive
    /// finite number.
    pub fn scale_element(&mut self, id: ElementId, factor: f64) -> ArtResult<bool> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ArtError::InvalidArgument(format!(
                "scale factor must be positive, got {factor}"
            )));
        }
        let scaled = self.document.update_element(id, |e| {
            let size = scaled_size(e.size(), factor);
            e.set_size(size).map(|()| size)
        });
        match scaled {
            Some(result) => {
                let size = result?;
                tracing::debug!(%id, factor, size, "emoji scaled");
                Ok(true)
            }
            None => {
                tracing::debug!(%id, "scale ignored, no such element");
                Ok(false)
            }
        }
    }

    /// Remove an element. Returns `false` if there is no such element.
    pub fn remove_emoji(&mut self, id: ElementId) -> bool {
        let removed = self.document.remove_element(id).is_some();
        if removed {
            tracing::debug!(%id, "emoji removed");
        }
        removed
    }

    // --- Background --------------------------------------------------------

    /// Replace the background.
    ///
    /// Setting the same background again does nothing. Otherwise the old
    /// image is cleared and the new reference resolved: synchronously for
    /// bytes, via a spawned fetch for URLs. Returns whether it changed.
    pub fn set_background(&mut self, background: Background) -> bool {
        if *self.document.background() == background {
            return false;
        }
        tracing::info!(background = %background.describe(), "background set");
        self.document.set_background(background);
        self.reload_background();
        true
    }

    fn reload_background(&mut self) {
        if let Some(url) = self.loader.begin(self.document.background()) {
            self.spawn_fetch(url);
        } else {
            self.after_resolution();
        }
    }

    fn spawn_fetch(&mut self, url: Url) {
        let Some(runtime) = &self.runtime else {
            tracing::warn!(%url, "no tokio runtime, background cannot be fetched");
            let outcome = FetchOutcome {
                url,
                result: Err(ArtError::NoRuntime),
            };
            self.loader.complete(self.document.background(), outcome);
            return;
        };

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcome_tx.clone();
        self.in_flight += 1;
        let fetch_url = url.clone();
        let fetch = runtime.spawn(async move { fetcher.fetch(&fetch_url).await });
        // Every spawned fetch reports exactly once, even if the fetcher panics.
        runtime.spawn(async move {
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(%url, "background fetch task failed: {e}");
                    Err(ArtError::Fetch(format!("fetch task failed: {e}")))
                }
            };
            // The controller may already be gone.
            let _ = tx.send(FetchOutcome { url, result });
        });
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> FetchResolution {
        self.in_flight = self.in_flight.saturating_sub(1);
        let resolution = self.loader.complete(self.document.background(), outcome);
        if matches!(resolution, FetchResolution::Applied { .. }) {
            self.after_resolution();
        }
        resolution
    }

    fn after_resolution(&mut self) {
        if self.config.auto_fit_on_load && self.loader.image().is_some() {
            self.zoom_to_fit();
        }
    }

    /// Wait for the next fetch to finish and apply it.
    ///
    /// Returns `None` immediately if no fetch is in flight. A fetch that
    /// never completes makes this wait forever.
    pub async fn next_fetch_resolution(&mut self) -> Option<FetchResolution> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        Some(self.apply_outcome(outcome))
    }

    /// Apply every fetch that has already finished, without waiting.
    pub fn drain_fetch_resolutions(&mut self) -> Vec<FetchResolution> {
        let mut resolutions = Vec::new();
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            resolutions.push(self.apply_outcome(outcome));
        }
        resolutions
    }

    // --- Drops ---------------------------------------------------------------

    /// Handle a drop at `point`, acting on the first recognised payload.
    ///
    /// Returns `Ok(false)` if no payload was recognised.
    ///
    /// # Errors
    ///
    /// Propagates [`ArtError::InvalidArgument`] from placing a glyph.
    pub fn handle_drop(
        &mut self,
        payloads: impl IntoIterator<Item = DropPayload>,
        point: Point,
    ) -> ArtResult<bool> {
        match resolve_drop(payloads) {
            Some(DropAction::BackgroundUrl(url)) => {
                self.set_background(Background::Url(url));
            }
            Some(DropAction::BackgroundBytes(bytes)) => {
                self.set_background(Background::ImageBytes(bytes));
            }
            Some(DropAction::Glyph(glyph)) => {
                let size = f64::from(self.config.default_emoji_size);
                self.add_emoji(&glyph, point, size)?;
            }
            None => {
                tracing::debug!("drop ignored, no recognised payload");
                return Ok(false);
            }
        }
        Ok(true)
    }

    // --- Pan and zoom ------------------------------------------------------

    /// Resize the canvas.
    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.viewport.set_canvas_size(canvas);
    }

    /// Report an in-flight pan's total translation.
    pub fn update_pan(&mut self, translation: Vector) {
        self.viewport.update_pan(translation);
    }

    /// Finish a pan.
    pub fn end_pan(&mut self, translation: Vector) {
        self.viewport.end_pan(translation);
    }

    /// Abandon a pan.
    pub fn cancel_pan(&mut self) {
        self.viewport.cancel_pan();
    }

    /// Report an in-flight pinch's total magnification.
    pub fn update_zoom(&mut self, multiplier: f64) {
        self.viewport.update_zoom(multiplier);
    }

    /// Finish a pinch.
    pub fn end_zoom(&mut self, multiplier: f64) {
        self.viewport.end_zoom(multiplier);
    }

    /// Abandon a pinch.
    pub fn cancel_zoom(&mut self) {
        self.viewport.cancel_zoom();
    }

    /// Fit the background image into the canvas. No-op without an image.
    pub fn zoom_to_fit(&mut self) -> bool {
        let image = self.loader.image().map(|i| i.size());
        let canvas = self.viewport.canvas_size();
        self.viewport.zoom_to_fit(image, canvas)
    }
}

/// Stored size for an on-screen size already divided by zoom.
///
/// Truncates like coordinates do, kept within `1..=u32::MAX`.
#[allow(clippy::cast_possible_truncation)]
fn logical_size(size: f64) -> i64 {
    size.trunc().clamp(1.0, f64::from(u32::MAX)) as i64
}

/// `size * factor`, rounded half away from zero, kept within `1..=u32::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_size(size: u32, factor: f64) -> u32 {
    let scaled = (f64::from(size) * factor).round();
    scaled.clamp(1.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::background::tests::png_bytes;

    /// Answers immediately from a fixed table.
    #[derive(Default)]
    struct TableFetcher {
        table: HashMap<Url, Vec<u8>>,
    }

    #[async_trait]
    impl BackgroundFetcher for TableFetcher {
        async fn fetch(&self, url: &Url) -> ArtResult<Vec<u8>> {
            self.table
                .get(url)
                .cloned()
                .ok_or_else(|| ArtError::Fetch(format!("404 {url}")))
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    fn controller() -> DocumentController {
        DocumentController::new(EngineConfig::default(), Arc::new(TableFetcher::default()))
    }

    fn centered(controller: &DocumentController) -> Point {
        controller.viewport().canvas_size().center()
    }

    #[test]
    fn test_add_emoji_at_center() {
        let mut controller = controller();
        let center = centered(&controller);
        let id = controller.add_emoji("🐝", center, 40.0).expect("valid");
        let element = controller.document().find_element(id).expect("present");
        assert_eq!(element.position(), (0, 0));
        assert_eq!(element.size(), 40);
    }

    #[test]
    fn test_add_emoji_divides_size_by_zoom() {
        let mut controller = controller();
        controller.end_zoom(2.0);
        let center = centered(&controller);
        let drop = Point::new(center.x + 21.0, center.y - 21.0);
        let id = controller.add_emoji("🐝", drop, 40.0).expect("valid");
        let element = controller.document().find_element(id).expect("present");
        // 21 / 2 = 10.5 truncates to 10, -10.5 to -10
        assert_eq!(element.position(), (10, -10));
        assert_eq!(element.size(), 20);
    }

    #[test]
    fn test_add_emoji_small_size_at_high_zoom_clamps_to_one() {
        let mut controller = controller();
        controller.end_zoom(80.0);
        let center = centered(&controller);
        let id = controller.add_emoji("🐝", center, 40.0).expect("valid");
        assert_eq!(controller.document().find_element(id).map(Element::size), Some(1));
    }

    #[test]
    fn test_add_emoji_huge_size_clamps_to_max() {
        let mut controller = controller();
        let center = centered(&controller);
        let id = controller.add_emoji("🐋", center, 1e10).expect("finite size");
        assert_eq!(
            controller.document().find_element(id).map(Element::size),
            Some(u32::MAX)
        );
    }

    #[test]
    fn test_add_emoji_rejects_bad_arguments() {
        let mut controller = controller();
        let p = Point::default();
        assert!(matches!(controller.add_emoji("", p, 40.0), Err(ArtError::InvalidArgument(_))));
        assert!(controller.add_emoji("🐝", p, 0.0).is_err());
        assert!(controller.add_emoji("🐝", p, -5.0).is_err());
        assert!(controller.add_emoji("🐝", p, f64::NAN).is_err());
        assert!(controller.elements().is_empty());
    }

    #[test]
    fn test_move_element_scales_delta_only() {
        let mut controller = controller().with_document(Document::sample());
        controller.end_zoom(2.0);
        controller.end_pan(Vector::new(500.0, 500.0));
        let id = controller.elements()[1].id();
        assert!(controller.move_element(id, Vector::new(20.0, -7.0)));
        // 20 / 2 = 10 ; -7 / 2 = -3.5 -> -3
        assert_eq!(controller.elements()[1].position(), (60, 97));
    }

    #[test]
    fn test_move_missing_element_changes_nothing() {
        let mut controller = controller().with_document(Document::sample());
        let before = controller.document().clone();
        assert!(!controller.move_element(ElementId::from_raw(77), Vector::new(5.0, 5.0)));
        assert_eq!(controller.document(), &before);
    }

    #[test]
    fn test_scale_element_rounds_half_away_from_zero() {
        let mut controller = controller();
        let p = centered(&controller);
        let ten = controller.add_emoji("🔬", p, 10.0).expect("valid");
        let seven = controller.add_emoji("🔬", p, 7.0).expect("valid");
        assert!(controller.scale_element(ten, 1.5).expect("valid factor"));
        assert!(controller.scale_element(seven, 1.5).expect("valid factor"));
        let doc = controller.document();
        assert_eq!(doc.find_element(ten).map(Element::size), Some(15));
        assert_eq!(doc.find_element(seven).map(Element::size), Some(11));
    }

    #[test]
    fn test_scale_element_never_below_one() {
        let mut controller = controller();
        let p = centered(&controller);
        let id = controller.add_emoji("🔬", p, 3.0).expect("valid");
        controller.scale_element(id, 0.01).expect("valid factor");
        assert_eq!(controller.document().find_element(id).map(Element::size), Some(1));
    }

    #[test]
    fn test_scale_element_errors_and_missing() {
        let mut controller = controller().with_document(Document::sample());
        let id = controller.elements()[0].id();
        assert!(controller.scale_element(id, 0.0).is_err());
        assert!(controller.scale_element(id, f64::INFINITY).is_err());
        assert!(!controller
            .scale_element(ElementId::from_raw(99), 2.0)
            .expect("valid factor"));
        assert_eq!(controller.elements()[0].size(), 80);
    }

    #[test]
    fn test_remove_emoji() {
        let mut controller = controller().with_document(Document::sample());
        let id = controller.elements()[0].id();
        assert!(controller.remove_emoji(id));
        assert!(!controller.remove_emoji(id));
        assert_eq!(controller.elements().len(), 1);
    }

    #[test]
    fn test_set_background_bytes_resolves_synchronously() {
        let mut controller = controller();
        assert!(controller.set_background(Background::ImageBytes(png_bytes(400, 300))));
        assert_eq!(controller.fetch_phase(), FetchPhase::Idle);
        assert_eq!(controller.background_image().map(|i| i.height), Some(300));
        // 800x600 canvas, 400x300 image -> zoom 2
        assert!((controller.viewport().committed_zoom() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_same_background_is_noop() {
        let mut controller = controller();
        let bg = Background::ImageBytes(png_bytes(2, 2));
        assert!(controller.set_background(bg.clone()));
        assert!(!controller.set_background(bg));
    }

    #[test]
    fn test_url_without_runtime_resolves_to_no_image() {
        let mut controller = controller();
        controller.set_background(Background::ImageBytes(png_bytes(2, 2)));
        controller.set_background(Background::Url(url("https://example.com/a.png")));
        assert_eq!(controller.fetch_phase(), FetchPhase::Idle);
        assert!(controller.background_image().is_none());
        assert_eq!(controller.pending_fetches(), 0);
    }

    #[test]
    fn test_auto_fit_disabled() {
        let mut controller = DocumentController::new(
            EngineConfig::default().with_auto_fit(false),
            Arc::new(TableFetcher::default()),
        );
        controller.set_background(Background::ImageBytes(png_bytes(400, 300)));
        assert!((controller.viewport().committed_zoom() - 1.0).abs() < f64::EPSILON);
        assert!(controller.zoom_to_fit());
        assert!((controller.viewport().committed_zoom() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_handle_drop_text_uses_default_size() {
        let mut controller = controller();
        let center = centered(&controller);
        let handled = controller
            .handle_drop([DropPayload::PlainText("🦑 squid".to_string())], center)
            .expect("valid drop");
        assert!(handled);
        let element = &controller.elements()[0];
        assert_eq!(element.glyph(), "🦑");
        assert_eq!(element.size(), 40);
    }

    #[test]
    fn test_handle_drop_unrecognised() {
        let mut controller = controller();
        let handled = controller
            .handle_drop([DropPayload::PlainText("abc".to_string())], Point::default())
            .expect("no error");
        assert!(!handled);
        assert!(controller.elements().is_empty());
    }

    #[test]
    fn test_snapshot_positions() {
        let mut controller = controller().with_document(Document::sample());
        controller.end_zoom(2.0);
        let snapshot = controller.snapshot();
        let first = &snapshot.elements[0];
        // center (400, 300) + (-200, -200) * 2
        assert_eq!(first.position, Point::new(0.0, -100.0));
        assert!((first.font_size - 160.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.background.phase, FetchPhase::Idle);
        assert!(snapshot.background.image_size.is_none());
    }

    #[tokio::test]
    async fn test_url_fetch_applies() {
        let a = url("https://example.com/a.png");
        let fetcher = TableFetcher {
            table: HashMap::from([(a.clone(), png_bytes(8, 6))]),
        };
        let mut controller = DocumentController::new(EngineConfig::default(), Arc::new(fetcher));
        assert!(controller.set_background(Background::Url(a)));
        assert_eq!(controller.fetch_phase(), FetchPhase::Fetching);
        assert_eq!(controller.pending_fetches(), 1);

        let resolution = controller.next_fetch_resolution().await;
        assert_eq!(resolution, Some(FetchResolution::Applied { width: 8, height: 6 }));
        assert_eq!(controller.fetch_phase(), FetchPhase::Idle);
        assert_eq!(controller.pending_fetches(), 0);
        assert!(controller.next_fetch_resolution().await.is_none());
    }

    #[tokio::test]
    async fn test_url_fetch_failure() {
        let mut controller = controller();
        controller.set_background(Background::Url(url("https://example.com/missing.png")));
        let resolution = controller.next_fetch_resolution().await;
        assert_eq!(resolution, Some(FetchResolution::Failed));
        assert_eq!(controller.fetch_phase(), FetchPhase::Idle);
        assert!(controller.background_image().is_none());
        assert!(controller.background_error().is_some());
    }

    /// Panics instead of answering.
    struct PanickingFetcher;

    #[async_trait]
    impl BackgroundFetcher for PanickingFetcher {
        async fn fetch(&self, url: &Url) -> ArtResult<Vec<u8>> {
            panic!("fetcher exploded on {url}");
        }
    }

    #[tokio::test]
    async fn test_panicking_fetcher_still_resolves() {
        let mut controller =
            DocumentController::new(EngineConfig::default(), Arc::new(PanickingFetcher));
        controller.set_background(Background::Url(url("https://example.com/boom.png")));
        assert_eq!(controller.pending_fetches(), 1);

        let resolution = controller.next_fetch_resolution().await;
        assert_eq!(resolution, Some(FetchResolution::Failed));
        assert_eq!(controller.fetch_phase(), FetchPhase::Idle);
        assert_eq!(controller.pending_fetches(), 0);
        assert!(controller
            .background_error()
            .is_some_and(|e| e.contains("fetch task failed")));
    }
}
