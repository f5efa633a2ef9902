//! # EmojiArt Host
//!
//! Builds a document, resolves its background and prints the render
//! snapshot as JSON on stdout.

use clap::Parser;
use emojiart_host::{CliArgs, HostApp, HostConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,emojiart_core=debug,emojiart_host=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emojiart_core=debug,emojiart_host=debug"));

    // Logs go to stderr so stdout stays valid JSON.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = HostConfig::from(args);

    tracing::info!(
        "Canvas {}x{}, emoji size {}",
        config.engine.canvas_size.width,
        config.engine.canvas_size.height,
        config.engine.default_emoji_size
    );

    let mut app = HostApp::new(config)?;
    let snapshot = app.run().await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
