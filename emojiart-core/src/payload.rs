//! Drop payloads from the palette or other apps.
//!
//! A drop carries several candidate representations of the same item. They
//! are tried in a fixed order (URL, then image bytes, then plain text) and
//! the first recognised one wins.

use url::Url;

/// One representation offered by a drop source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// Plain text; only its first emoji is used.
    PlainText(String),
    /// An image URL to use as background.
    ImageUrl(Url),
    /// Encoded image bytes to use as background.
    ImageBytes(Vec<u8>),
}

impl DropPayload {
    fn priority(&self) -> u8 {
        match self {
            Self::ImageUrl(_) => 0,
            Self::ImageBytes(_) => 1,
            Self::PlainText(_) => 2,
        }
    }
}

/// A payload that was recognised and should be acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropAction {
    /// Set the background to this URL.
    BackgroundUrl(Url),
    /// Set the background to these bytes.
    BackgroundBytes(Vec<u8>),
    /// Place this glyph.
    Glyph(String),
}

/// Pick the payload to act on.
///
/// Text that does not start with an emoji is not recognised, so a drop
/// offering only such text yields `None`. Within one kind, the first
/// payload offered wins.
#[must_use]
pub fn resolve_drop(payloads: impl IntoIterator<Item = DropPayload>) -> Option<DropAction> {
    let mut payloads: Vec<_> = payloads.into_iter().collect();
    // Stable sort keeps the offered order within each kind.
    payloads.sort_by_key(DropPayload::priority);
    payloads.into_iter().find_map(|payload| match payload {
        DropPayload::ImageUrl(url) => Some(DropAction::BackgroundUrl(url)),
        DropPayload::ImageBytes(bytes) if !bytes.is_empty() => {
            Some(DropAction::BackgroundBytes(bytes))
        }
        DropPayload::ImageBytes(_) => None,
        DropPayload::PlainText(text) => leading_emoji(&text).map(DropAction::Glyph),
    })
}

/// The first emoji of `text`, including any modifiers that follow it.
///
/// Returns `None` if `text` does not start with an emoji.
#[must_use]
pub fn leading_emoji(text: &str) -> Option<String> {
    let mut chars = text.chars().peekable();
    let first = chars.next()?;
    let next = chars.peek().copied();

    // Low scalars with the emoji property (digits, arrows, (c)) are plain
    // text unless a modifier turns them into an emoji.
    let followed_by_modifier = next.is_some_and(is_emoji_modifier);
    if !(is_emoji(first) && (u32::from(first) > 0x238C || followed_by_modifier)) {
        return None;
    }

    let mut glyph = String::from(first);
    let mut joined = false;
    while let Some(&c) = chars.peek() {
        if is_emoji_modifier(c) || c == ZWJ || joined {
            joined = c == ZWJ;
            glyph.push(c);
            chars.next();
        } else if is_regional_indicator(first) && is_regional_indicator(c) && glyph.chars().count() == 1 {
            // Flags are a pair of regional indicators.
            glyph.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Some(glyph)
}

const ZWJ: char = '\u{200D}';

fn is_emoji_modifier(c: char) -> bool {
    matches!(c,
        '\u{FE0F}'                 // variation selector-16
        | '\u{20E3}'               // combining enclosing keycap
        | '\u{1F3FB}'..='\u{1F3FF}' // skin tones
        | '\u{E0020}'..='\u{E007F}' // tags
    )
}

/// Scalars carrying the Unicode `Emoji` property.
fn is_emoji(c: char) -> bool {
    matches!(c,
        '#' | '*' | '0'..='9'
        | '\u{00A9}' | '\u{00AE}' | '\u{203C}' | '\u{2049}' | '\u{2122}' | '\u{2139}'
        | '\u{2194}'..='\u{2199}' | '\u{21A9}'..='\u{21AA}'
        | '\u{231A}'..='\u{231B}' | '\u{2328}' | '\u{23CF}'
        | '\u{23E9}'..='\u{23F3}' | '\u{23F8}'..='\u{23FA}'
        | '\u{24C2}' | '\u{25AA}'..='\u{25AB}' | '\u{25B6}' | '\u{25C0}'
        | '\u{25FB}'..='\u{25FE}'
        | '\u{2600}'..='\u{27BF}' // misc symbols, dingbats
        | '\u{2934}'..='\u{2935}'
        | '\u{2B05}'..='\u{2B07}' | '\u{2B1B}'..='\u{2B1C}' | '\u{2B50}' | '\u{2B55}'
        | '\u{3030}' | '\u{303D}' | '\u{3297}' | '\u{3299}'
        | '\u{1F004}' | '\u{1F0CF}'
        | '\u{1F170}'..='\u{1F251}' // enclosed letters, regional indicators
        | '\u{1F300}'..='\u{1F64F}'
        | '\u{1F680}'..='\u{1F6FF}'
        | '\u{1F7E0}'..='\u{1F7EB}'
        | '\u{1F90C}'..='\u{1F9FF}'
        | '\u{1FA70}'..='\u{1FAFF}'
    )
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c, '\u{1F1E6}'..='\u{1F1FF}')
}
