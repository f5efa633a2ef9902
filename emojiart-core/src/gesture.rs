//! Gesture accumulation for pan and zoom.
//!
//! Each gesture is a two-state machine:
//!
//! ```text
//!            update(live)            end(final)
//! Settled ───────────────► Active ───────────────► Settled
//!    ▲                       │   committed ⊕= final
//!    └──────── cancel() ─────┘
//! ```
//!
//! While active, the effective value is `committed ⊕ live`. Pan accumulates
//! by addition, zoom by multiplication.

use serde::{Deserialize, Serialize};

use crate::transform::{Size, Vector, ViewTransform};

/// A value that gesture deltas can be folded into.
pub trait Accumulate: Copy {
    /// The neutral delta.
    const IDENTITY: Self;

    /// Fold `delta` into `self`.
    #[must_use]
    fn accumulate(self, delta: Self) -> Self;
}

impl Accumulate for Vector {
    const IDENTITY: Self = Self::ZERO;

    fn accumulate(self, delta: Self) -> Self {
        self + delta
    }
}

/// A zoom factor. Accumulates multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Scale(pub f64);

impl Accumulate for Scale {
    const IDENTITY: Self = Self(1.0);

    fn accumulate(self, delta: Self) -> Self {
        Self(self.0 * delta.0)
    }
}

/// Whether a gesture is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "live", rename_all = "lowercase")]
pub enum GesturePhase<T> {
    /// No gesture; the effective value is the committed value.
    Settled,
    /// A gesture is in progress with the given live delta.
    Active(T),
}

/// Committed value plus an optional in-flight delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gesture<T> {
    committed: T,
    phase: GesturePhase<T>,
}

impl<T: Accumulate> Gesture<T> {
    /// A settled gesture with the given committed value.
    #[must_use]
    pub fn new(committed: T) -> Self {
        Self {
            committed,
            phase: GesturePhase::Settled,
        }
    }

    /// The committed value.
    #[must_use]
    pub fn committed(&self) -> T {
        self.committed
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> GesturePhase<T> {
        self.phase
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, GesturePhase::Active(_))
    }

    /// The in-flight delta, or the identity when settled.
    #[must_use]
    pub fn live(&self) -> T {
        match self.phase {
            GesturePhase::Settled => T::IDENTITY,
            GesturePhase::Active(live) => live,
        }
    }

    /// The committed value combined with any live delta.
    #[must_use]
    pub fn effective(&self) -> T {
        self.committed.accumulate(self.live())
    }

    /// Start or continue the gesture. `live` is the total delta since the
    /// gesture began, not an increment.
    pub fn update(&mut self, live: T) {
        self.phase = GesturePhase::Active(live);
    }

    /// Finish the gesture, folding `last` into the committed value.
    ///
    /// Returns the new committed value.
    pub fn end(&mut self, last: T) -> T {
        self.committed = self.committed.accumulate(last);
        self.phase = GesturePhase::Settled;
        self.committed
    }

    /// Drop the live delta without committing it.
    pub fn cancel(&mut self) {
        self.phase = GesturePhase::Settled;
    }

    /// Overwrite the committed value. Any live delta is kept.
    pub fn set_committed(&mut self, committed: T) {
        self.committed = committed;
    }
}

impl<T: Accumulate> Default for Gesture<T> {
    fn default() -> Self {
        Self::new(T::IDENTITY)
    }
}

/// Default lower zoom bound.
pub const DEFAULT_MIN_ZOOM: f64 = 0.01;

/// Default upper zoom bound.
pub const DEFAULT_MAX_ZOOM: f64 = 100.0;

/// Pan and zoom state for one canvas.
///
/// Pan is stored in document units (before zoom is applied); the canvas
/// offset handed to [`ViewTransform`] is `pan * zoom`. That keeps a drag's
/// on-screen distance constant whatever the zoom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pan: Gesture<Vector>,
    zoom: Gesture<Scale>,
    canvas: Size,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    /// A viewport at zoom 1 and no pan.
    #[must_use]
    pub fn new(canvas: Size) -> Self {
        Self {
            pan: Gesture::default(),
            zoom: Gesture::default(),
            canvas,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }

    /// Set the zoom clamp range. Bounds are reordered if given backwards.
    #[must_use]
    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        let (lo, hi) = if min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            (max_zoom, min_zoom)
        };
        self.min_zoom = if lo > 0.0 { lo } else { DEFAULT_MIN_ZOOM };
        self.max_zoom = hi.max(self.min_zoom);
        let committed = self.clamp(self.zoom.committed().0);
        self.zoom.set_committed(Scale(committed));
        self
    }

    fn clamp(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0_f64.clamp(self.min_zoom, self.max_zoom);
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Canvas size in pixels.
    #[must_use]
    pub const fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Update the canvas size (window resize).
    pub fn set_canvas_size(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    /// The pan gesture state (document units).
    #[must_use]
    pub const fn pan_gesture(&self) -> &Gesture<Vector> {
        &self.pan
    }

    /// The zoom gesture state.
    #[must_use]
    pub const fn zoom_gesture(&self) -> &Gesture<Scale> {
        &self.zoom
    }

    /// Committed zoom, clamped.
    #[must_use]
    pub fn committed_zoom(&self) -> f64 {
        self.clamp(self.zoom.committed().0)
    }

    /// Committed pan in document units.
    #[must_use]
    pub fn committed_pan(&self) -> Vector {
        self.pan.committed()
    }

    /// Zoom including any live pinch, clamped.
    #[must_use]
    pub fn effective_zoom(&self) -> f64 {
        self.clamp(self.zoom.effective().0)
    }

    /// Pan offset in canvas pixels, including any live drag.
    #[must_use]
    pub fn pan_offset(&self) -> Vector {
        self.pan.effective().scale(self.effective_zoom())
    }

    /// The transform to use right now.
    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        ViewTransform::new(self.pan_offset(), self.effective_zoom(), self.canvas.center())
    }

    fn to_document_units(&self, translation: Vector) -> Vector {
        let zoom = self.effective_zoom();
        Vector::new(translation.dx / zoom, translation.dy / zoom)
    }

    /// Report the total on-screen translation of an in-flight pan.
    pub fn update_pan(&mut self, translation: Vector) {
        let live = self.to_document_units(translation);
        tracing::trace!(dx = live.dx, dy = live.dy, "pan gesture update");
        self.pan.update(live);
    }

    /// Finish a pan with its final on-screen translation.
    pub fn end_pan(&mut self, translation: Vector) {
        let last = self.to_document_units(translation);
        let committed = self.pan.end(last);
        tracing::debug!(dx = committed.dx, dy = committed.dy, "pan committed");
    }

    /// Abandon an in-flight pan.
    pub fn cancel_pan(&mut self) {
        self.pan.cancel();
    }

    /// Report the total magnification of an in-flight pinch.
    ///
    /// Non-finite or non-positive multipliers are ignored.
    pub fn update_zoom(&mut self, multiplier: f64) {
        if !is_valid_multiplier(multiplier) {
            tracing::warn!(multiplier, "ignoring invalid zoom multiplier");
            return;
        }
        tracing::trace!(multiplier, "zoom gesture update");
        self.zoom.update(Scale(multiplier));
    }

    /// Finish a pinch with its final magnification.
    ///
    /// An invalid multiplier cancels the gesture instead.
    pub fn end_zoom(&mut self, multiplier: f64) {
        if !is_valid_multiplier(multiplier) {
            tracing::warn!(multiplier, "invalid final zoom multiplier, cancelling");
            self.zoom.cancel();
            return;
        }
        let committed = self.zoom.end(Scale(multiplier));
        let clamped = self.clamp(committed.0);
        self.zoom.set_committed(Scale(clamped));
        tracing::debug!(zoom = clamped, "zoom committed");
    }

    /// Abandon an in-flight pinch.
    pub fn cancel_zoom(&mut self) {
        self.zoom.cancel();
    }

    /// Fit an image into the viewport: committed zoom becomes
    /// `min(viewport.w / image.w, viewport.h / image.h)` and committed pan
    /// returns to the origin.
    ///
    /// No-op if the image is absent or either size has a zero dimension.
    /// Returns whether anything changed.
    pub fn zoom_to_fit(&mut self, image: Option<Size>, viewport: Size) -> bool {
        let Some(image) = image else {
            return false;
        };
        if image.is_empty() || viewport.is_empty() {
            return false;
        }
        let h_zoom = viewport.width / image.width;
        let v_zoom = viewport.height / image.height;
        let zoom = self.clamp(h_zoom.min(v_zoom));
        self.zoom.set_committed(Scale(zoom));
        self.pan.set_committed(Vector::ZERO);
        tracing::debug!(zoom, "zoomed to fit");
        true
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Size::new(800.0, 600.0))
    }
}

fn is_valid_multiplier(multiplier: f64) -> bool {
    multiplier.is_finite() && multiplier > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_gesture_settled_effective_is_committed() {
        let gesture = Gesture::new(Vector::new(3.0, 4.0));
        assert!(!gesture.is_active());
        assert_eq!(gesture.effective(), Vector::new(3.0, 4.0));
    }

    #[test]
    fn test_gesture_active_combines_live() {
        let mut gesture = Gesture::new(Scale(2.0));
        gesture.update(Scale(1.5));
        assert!(gesture.is_active());
        assert_eq!(gesture.committed(), Scale(2.0));
        assert!(approx(gesture.effective().0, 3.0));
    }

    #[test]
    fn test_gesture_update_replaces_live() {
        let mut gesture = Gesture::new(Vector::ZERO);
        gesture.update(Vector::new(5.0, 0.0));
        gesture.update(Vector::new(8.0, 0.0));
        assert_eq!(gesture.effective(), Vector::new(8.0, 0.0));
    }

    #[test]
    fn test_gesture_end_commits() {
        let mut gesture = Gesture::new(Vector::new(1.0, 1.0));
        gesture.update(Vector::new(2.0, 2.0));
        let committed = gesture.end(Vector::new(4.0, -1.0));
        assert_eq!(committed, Vector::new(5.0, 0.0));
        assert_eq!(gesture.phase(), GesturePhase::Settled);
        assert_eq!(gesture.live(), Vector::ZERO);
    }

    #[test]
    fn test_gesture_cancel_discards_live() {
        let mut gesture = Gesture::new(Scale(1.0));
        gesture.update(Scale(4.0));
        gesture.cancel();
        assert_eq!(gesture.effective(), Scale(1.0));
    }

    #[test]
    fn test_zoom_to_fit_uses_min_ratio() {
        let mut viewport = Viewport::new(Size::new(100.0, 100.0));
        viewport.update_pan(Vector::new(30.0, 30.0));
        viewport.end_pan(Vector::new(30.0, 30.0));
        // hZoom = 100/200 = 0.5, vZoom = 100/100 = 1.0
        let changed = viewport.zoom_to_fit(Some(Size::new(200.0, 100.0)), Size::new(100.0, 100.0));
        assert!(changed);
        assert!(approx(viewport.committed_zoom(), 0.5));
        assert_eq!(viewport.committed_pan(), Vector::ZERO);
    }

    #[test]
    fn test_zoom_to_fit_wider_viewport() {
        let mut viewport = Viewport::default();
        // min(400/200 = 2, 100/100 = 1) = 1
        viewport.zoom_to_fit(Some(Size::new(200.0, 100.0)), Size::new(400.0, 100.0));
        assert!(approx(viewport.committed_zoom(), 1.0));
    }

    #[test]
    fn test_zoom_to_fit_noop_cases() {
        let mut viewport = Viewport::default();
        viewport.end_zoom(2.0);
        assert!(!viewport.zoom_to_fit(None, Size::new(100.0, 100.0)));
        assert!(!viewport.zoom_to_fit(Some(Size::new(0.0, 100.0)), Size::new(100.0, 100.0)));
        assert!(!viewport.zoom_to_fit(Some(Size::new(100.0, 100.0)), Size::new(100.0, 0.0)));
        assert!(approx(viewport.committed_zoom(), 2.0));
    }

    #[test]
    fn test_pan_translation_divided_by_zoom() {
        let mut viewport = Viewport::default();
        viewport.end_zoom(2.0);
        viewport.update_pan(Vector::new(40.0, -20.0));
        // Stored in document units...
        assert_eq!(viewport.pan_gesture().live(), Vector::new(20.0, -10.0));
        // ...but shows up on screen unchanged.
        assert_eq!(viewport.pan_offset(), Vector::new(40.0, -20.0));
        viewport.end_pan(Vector::new(40.0, -20.0));
        assert_eq!(viewport.committed_pan(), Vector::new(20.0, -10.0));
    }

    #[test]
    fn test_pan_during_active_zoom_uses_effective_zoom() {
        let mut viewport = Viewport::default();
        viewport.update_zoom(4.0);
        viewport.end_pan(Vector::new(8.0, 8.0));
        assert_eq!(viewport.committed_pan(), Vector::new(2.0, 2.0));
        viewport.cancel_zoom();
        assert!(approx(viewport.effective_zoom(), 1.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default().with_zoom_limits(0.5, 4.0);
        viewport.update_zoom(100.0);
        assert!(approx(viewport.effective_zoom(), 4.0));
        viewport.end_zoom(100.0);
        assert!(approx(viewport.committed_zoom(), 4.0));
        viewport.end_zoom(0.0001);
        assert!(approx(viewport.committed_zoom(), 0.5));
    }

    #[test]
    fn test_invalid_zoom_multipliers_ignored() {
        let mut viewport = Viewport::default();
        viewport.update_zoom(0.0);
        assert!(!viewport.zoom_gesture().is_active());
        viewport.update_zoom(-2.0);
        viewport.update_zoom(f64::NAN);
        assert!(approx(viewport.effective_zoom(), 1.0));
        viewport.update_zoom(2.0);
        viewport.end_zoom(f64::INFINITY);
        assert!(!viewport.zoom_gesture().is_active());
        assert!(approx(viewport.committed_zoom(), 1.0));
    }

    #[test]
    fn test_transform_reflects_state() {
        let mut viewport = Viewport::new(Size::new(200.0, 200.0));
        viewport.end_zoom(2.0);
        viewport.end_pan(Vector::new(10.0, 0.0));
        let transform = viewport.transform();
        assert!(approx(transform.zoom, 2.0));
        assert_eq!(transform.pan, Vector::new(10.0, 0.0));
        assert_eq!(transform.center, Size::new(200.0, 200.0).center());
    }
}
