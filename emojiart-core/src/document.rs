//! The document: a background reference plus an ordered list of glyphs.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{ArtError, ArtResult, Element, ElementId};

/// What the document draws behind its elements.
///
/// This is a reference, never a decoded image: the decoded pixels live in
/// [`crate::BackgroundLoader`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Background {
    /// No background.
    #[default]
    Blank,
    /// An image that has to be fetched.
    Url(Url),
    /// Raw encoded image bytes.
    ImageBytes(Vec<u8>),
}

impl Background {
    /// The URL, if this background must be fetched.
    #[must_use]
    pub const fn url(&self) -> Option<&Url> {
        match self {
            Self::Url(url) => Some(url),
            Self::Blank | Self::ImageBytes(_) => None,
        }
    }

    /// Short label for logging (never the raw bytes).
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Blank => "blank".to_string(),
            Self::Url(url) => format!("url({url})"),
            Self::ImageBytes(bytes) => format!("image_bytes({} bytes)", bytes.len()),
        }
    }
}

/// A document of glyphs over an optional background.
///
/// Elements keep insertion order. The id counter belongs to the document
/// instance and travels with clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRecord")]
pub struct Document {
    background: Background,
    elements: Vec<Element>,
    /// Last id handed out; the next element gets `last_id + 1`.
    last_id: u64,
}

/// Serialized form of a [`Document`], checked before it becomes one.
#[derive(Deserialize)]
struct DocumentRecord {
    #[serde(default)]
    background: Background,
    #[serde(default)]
    elements: Vec<Element>,
    #[serde(default)]
    last_id: u64,
}

impl TryFrom<DocumentRecord> for Document {
    type Error = ArtError;

    /// Duplicate ids and zero sizes are rejected. A counter behind the highest stored id is
    /// raised to it so no id is handed out twice.
    fn try_from(record: DocumentRecord) -> ArtResult<Self> {
        if let Some(element) = record.elements.iter().find(|e| e.size() == 0) {
            return Err(ArtError::InvalidArgument(format!(
                "element {} has zero size",
                element.id()
            )));
        }
        let mut ids: Vec<u64> = record.elements.iter().map(|e| e.id().get()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ArtError::InvalidArgument(format!(
                "duplicate element id {}",
                pair[0]
            )));
        }
        let highest = ids.last().copied().unwrap_or(0);
        if record.last_id < highest {
            tracing::warn!(
                last_id = record.last_id,
                highest,
                "id counter behind stored elements, raising it"
            );
        }
        Ok(Self {
            background: record.background,
            elements: record.elements,
            last_id: record.last_id.max(highest),
        })
    }
}

impl Document {
    /// Create an empty document with a blank background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default startup scene: two faces on a blank canvas.
    #[must_use]
    pub fn sample() -> Self {
        let mut document = Self::new();
        for (glyph, x, y, size) in [("😷", -200, -200, 80), ("🥸", 50, 100, 40)] {
            if let Err(e) = document.add_element(glyph, x, y, size) {
                tracing::error!("Sample element rejected: {e}");
            }
        }
        document
    }

    /// Append a new element and return its freshly assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`ArtError::InvalidArgument`] if `glyph` is empty or `size`
    /// is not positive. The id counter is untouched on error.
    pub fn add_element(
        &mut self,
        glyph: impl Into<String>,
        x: i64,
        y: i64,
        size: i64,
    ) -> ArtResult<ElementId> {
        let glyph = glyph.into();
        if glyph.is_empty() {
            return Err(ArtError::InvalidArgument(
                "glyph must contain at least one character".to_string(),
            ));
        }
        let size = u32::try_from(size)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| ArtError::InvalidArgument(format!("size must be positive, got {size}")))?;

        self.last_id += 1;
        let id = ElementId::from_raw(self.last_id);
        self.elements.push(Element::new(id, glyph, x, y, size));
        Ok(id)
    }

    /// Replace the background reference unconditionally.
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Current background reference.
    #[must_use]
    pub const fn background(&self) -> &Background {
        &self.background
    }

    /// Look up an element by id.
    #[must_use]
    pub fn find_element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    /// Apply `mutate` to the element with `id`.
    ///
    /// Returns `None` without calling `mutate` if there is no such element.
    pub fn update_element<R>(
        &mut self,
        id: ElementId,
        mutate: impl FnOnce(&mut Element) -> R,
    ) -> Option<R> {
        self.elements.iter_mut().find(|e| e.id() == id).map(mutate)
    }

    /// Remove an element, preserving the order of the rest.
    ///
    /// The removed id is never handed out again.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Element> {
        let index = self.elements.iter().position(|e| e.id() == id)?;
        Some(self.elements.remove(index))
    }

    /// All elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the document has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
