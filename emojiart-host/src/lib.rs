//! # EmojiArt Host
//!
//! Headless host for the EmojiArt engine.
//!
//! Builds a document (the sample scene plus any glyphs given on the command
//! line), resolves its background and prints the render snapshot as JSON.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p emojiart-host -- --background https://example.com/beach.jpg --emoji 🐶
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `HostConfig` - Canvas size, glyph size, background and glyphs to drop
//! - `HostApp` - Drives a `DocumentController` to a settled snapshot

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod app;

pub use app::{HostApp, HostError};

use clap::Parser;
use emojiart_core::{EngineConfig, Size};

/// Command-line arguments for emojiart-host.
#[derive(Debug, Clone, Parser)]
#[command(name = "emojiart-host")]
#[command(about = "EmojiArt headless document host")]
#[command(version)]
pub struct CliArgs {
    /// Background image: an http(s), file or data URL, or a local path
    #[arg(long, env = "EMOJIART_BACKGROUND")]
    pub background: Option<String>,

    /// Glyph to drop at the canvas center (repeatable)
    #[arg(long = "emoji")]
    pub emojis: Vec<String>,

    /// Start from an empty document instead of the sample scene
    #[arg(long)]
    pub empty: bool,

    /// Canvas width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value = "600")]
    pub height: u32,

    /// On-screen size of dropped glyphs
    #[arg(long, env = "EMOJIART_EMOJI_SIZE", default_value = "40")]
    pub emoji_size: u32,

    /// Keep zoom at 1 when the background loads
    #[arg(long)]
    pub no_auto_fit: bool,
}

/// Host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Engine settings.
    pub engine: EngineConfig,
    /// Background to load, as given by the user.
    pub background: Option<String>,
    /// Glyphs to drop at the canvas center.
    pub emojis: Vec<String>,
    /// Seed with the sample scene.
    pub sample: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HostConfig {
    /// Create a host configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: EngineConfig::default(),
            background: None,
            emojis: Vec::new(),
            sample: true,
        }
    }
}

impl From<CliArgs> for HostConfig {
    fn from(args: CliArgs) -> Self {
        let engine = EngineConfig::default()
            .with_canvas_size(Size::new(f64::from(args.width), f64::from(args.height)))
            .with_default_emoji_size(args.emoji_size)
            .with_auto_fit(!args.no_auto_fit);
        Self {
            engine,
            background: args.background,
            emojis: args.emojis,
            sample: !args.empty,
        }
    }
}
