//! What the rendering layer needs to draw one frame.

use serde::{Deserialize, Serialize};

use crate::{Element, ElementId, FetchPhase, Point, Vector, ViewTransform};

/// An element positioned in canvas space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedElement {
    /// Element identifier.
    pub id: ElementId,
    /// Glyph text.
    pub glyph: String,
    /// Center of the glyph in canvas pixels.
    pub position: Point,
    /// Font size in canvas pixels.
    pub font_size: f64,
}

impl RenderedElement {
    /// Place `element` using `transform`.
    #[must_use]
    pub fn new(element: &Element, transform: &ViewTransform) -> Self {
        Self {
            id: element.id(),
            glyph: element.glyph().to_string(),
            position: transform.to_canvas_space(element.x, element.y),
            font_size: transform.to_canvas_size(element.size()),
        }
    }
}

/// Background state for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundState {
    /// Whether a fetch is in flight (show a spinner).
    pub phase: FetchPhase,
    /// Resolved image dimensions, if there is an image.
    pub image_size: Option<(u32, u32)>,
}

/// Everything needed to draw the document at this instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Elements in insertion order.
    pub elements: Vec<RenderedElement>,
    /// Background phase and image.
    pub background: BackgroundState,
    /// Effective pan offset in canvas pixels.
    pub pan: Vector,
    /// Effective zoom.
    pub zoom: f64,
}
