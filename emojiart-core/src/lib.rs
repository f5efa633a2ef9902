//! # EmojiArt Core
//!
//! Document state engine for composing emoji scenes over a background
//! image. Rendering, gesture recognition and windowing live elsewhere; this
//! crate owns the data and the rules.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                DocumentController                 │
//! │  intents: add / move / scale / remove / drop /    │
//! │           set_background / pan / zoom             │
//! ├───────────────────┬───────────────────────────────┤
//! │  Document         │  Viewport                     │
//! │  - Background ref │  - Gesture<Vector> (pan)      │
//! │  - Elements       │  - Gesture<Scale>  (zoom)     │
//! │  - Id counter     │  - ViewTransform              │
//! ├───────────────────┴───────────────────────────────┤
//! │  BackgroundLoader  ◄── FetchOutcome ── fetch task │
//! │  (idle / fetching, stale results discarded)       │
//! └───────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::float_cmp))]

pub mod background;
pub mod config;
pub mod controller;
pub mod document;
pub mod element;
pub mod error;
pub mod fetch;
pub mod gesture;
pub mod payload;
pub mod snapshot;
pub mod transform;

pub use background::{
    decode_image, BackgroundImage, BackgroundLoader, FetchOutcome, FetchPhase, FetchResolution,
};
pub use config::EngineConfig;
pub use controller::DocumentController;
pub use document::{Background, Document};
pub use element::{Element, ElementId};
pub use error::{ArtError, ArtResult};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use fetch::{decode_data_url, BackgroundFetcher, FetchConfig};
pub use gesture::{Accumulate, Gesture, GesturePhase, Scale, Viewport};
pub use payload::{leading_emoji, resolve_drop, DropAction, DropPayload};
pub use snapshot::{BackgroundState, RenderSnapshot, RenderedElement};
pub use transform::{Point, Size, Vector, ViewTransform};

/// Core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
