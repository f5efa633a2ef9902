//! Placed glyphs - the building blocks of a document.

use serde::{Deserialize, Serialize};

use crate::{ArtError, ArtResult};

/// Unique identifier for an element.
///
/// Ids are handed out by [`crate::Document`] in strictly increasing order
/// and are never reused, even after the element is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(u64);

impl ElementId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A glyph placed on the document.
///
/// `x`/`y` are offsets in document units from the canvas center, and
/// `size` is the nominal font size at zoom 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    id: ElementId,
    glyph: String,
    /// Horizontal offset from the document origin.
    pub x: i64,
    /// Vertical offset from the document origin.
    pub y: i64,
    size: u32,
}

impl Element {
    pub(crate) fn new(id: ElementId, glyph: String, x: i64, y: i64, size: u32) -> Self {
        Self {
            id,
            glyph,
            x,
            y,
            size,
        }
    }

    /// Identity of this element.
    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    /// The glyph text.
    #[must_use]
    pub fn glyph(&self) -> &str {
        &self.glyph
    }

    /// Nominal size in document units.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Position as an `(x, y)` pair.
    #[must_use]
    pub const fn position(&self) -> (i64, i64) {
        (self.x, self.y)
    }

    /// Shift the element by a document-space delta.
    pub fn offset_by(&mut self, dx: i64, dy: i64) {
        self.x = self.x.saturating_add(dx);
        self.y = self.y.saturating_add(dy);
    }

    /// Replace the size.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] if `size` is zero.
    pub fn set_size(&mut self, size: u32) -> ArtResult<()> {
        if size == 0 {
            return Err(ArtError::InvalidArgument(format!(
                "element {} size must be positive",
                self.id
            )));
        }
        self.size = size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new(ElementId::from_raw(1), "🙂".to_string(), 10, -5, 40)
    }

    #[test]
    fn test_offset_by() {
        let mut element = sample();
        element.offset_by(5, 5);
        assert_eq!(element.position(), (15, 0));
    }

    #[test]
    fn test_offset_saturates() {
        let mut element = sample();
        element.x = i64::MAX;
        element.offset_by(1, 0);
        assert_eq!(element.x, i64::MAX);
    }

    #[test]
    fn test_set_size_rejects_zero() {
        let mut element = sample();
        assert!(element.set_size(0).is_err());
        assert_eq!(element.size(), 40);
        element.set_size(12).expect("positive size");
        assert_eq!(element.size(), 12);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ElementId::from_raw(42).to_string(), "42");
    }
}
