//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::gesture::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM};
use crate::Size;

/// Size given to glyphs dropped from the palette, in canvas pixels.
pub const DEFAULT_EMOJI_SIZE: u32 = 40;

/// Configuration for a [`crate::DocumentController`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// On-screen size of a dropped glyph.
    pub default_emoji_size: u32,
    /// Smallest allowed zoom.
    pub min_zoom: f64,
    /// Largest allowed zoom.
    pub max_zoom: f64,
    /// Zoom to fit whenever a background image is applied.
    pub auto_fit_on_load: bool,
    /// Initial canvas size in pixels.
    pub canvas_size: Size,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_emoji_size: DEFAULT_EMOJI_SIZE,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            auto_fit_on_load: true,
            canvas_size: Size::new(800.0, 600.0),
        }
    }
}

impl EngineConfig {
    /// Set the default glyph size.
    #[must_use]
    pub fn with_default_emoji_size(mut self, size: u32) -> Self {
        self.default_emoji_size = size;
        self
    }

    /// Set the zoom clamp range.
    #[must_use]
    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    /// Enable or disable zoom-to-fit on background load.
    #[must_use]
    pub fn with_auto_fit(mut self, enabled: bool) -> Self {
        self.auto_fit_on_load = enabled;
        self
    }

    /// Set the initial canvas size.
    #[must_use]
    pub fn with_canvas_size(mut self, canvas_size: Size) -> Self {
        self.canvas_size = canvas_size;
        self
    }
}
