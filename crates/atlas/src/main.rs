//! `atlas` - renders a chat transcript through the cell registry.
//!
//! Every message is dispatched to a cell factory, bound into a holder sized
//! for the given viewport, and printed once its image loads settle.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod loader;
mod render;
mod store;
mod transcript;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use atlas_cells::{
    CellHolderSpecs, CellRegistry, CellsConfig, Coordinates, ImageLoader, ImageSender,
    LocationProvider, LocationSender, MessagePartRequestHandler, Scope, ScrollState, TextSender,
};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loader::ConsoleLoader;
use store::{LocalConversation, TranscriptStore};
use transcript::{Row, Transcript};

/// Render a chat transcript as Atlas cells.
#[derive(Debug, Parser)]
#[command(name = "atlas", version, about)]
struct Args {
    /// Transcript JSON file.
    transcript: PathBuf,

    /// Cells configuration file [default: <config dir>/atlas/cells.json].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration back to the config file.
    #[arg(long)]
    write_config: bool,

    /// Maximum cell width in pixels.
    #[arg(long, default_value_t = 480)]
    width: u32,

    /// Maximum cell height in pixels.
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Bind while dragging, holding image loads until the list is idle.
    #[arg(long)]
    drag: bool,

    /// Send a text message before rendering.
    #[arg(long, value_name = "TEXT")]
    say: Option<String>,

    /// Send an image file before rendering.
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,

    /// Share a location before rendering.
    #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinates)]
    location: Option<Coordinates>,
}

fn parse_coordinates(value: &str) -> Result<Coordinates, String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| "expected LAT,LON".to_string())?;
    let latitude: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let longitude: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    Ok(Coordinates {
        latitude,
        longitude,
    })
}

/// Location provider answering with a fix given on the command line.
struct FixedLocation(Coordinates);

impl LocationProvider for FixedLocation {
    fn fresh_location(&self) -> impl Future<Output = atlas_cells::Result<Coordinates>> + Send {
        let fix = self.0;
        async move { Ok(fix) }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atlas")
        .join("cells.json")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atlas=info,atlas_cells=info,atlas_message=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    info!("Starting Atlas");

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let config = CellsConfig::load(&config_path)
        .await
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if args.write_config {
        config.save(&config_path).await?;
    }

    let transcript = Transcript::load(&args.transcript).await?;
    let base = args.transcript.parent().unwrap_or_else(|| Path::new("."));
    let store = TranscriptStore::default();
    let mut rows = transcript.import(base, &store).await?;

    let conversation = LocalConversation::new(store.clone());
    send_outgoing(&args, &config, &transcript.participant, &conversation).await?;
    rows.extend(conversation.take().into_iter().map(|message| Row {
        message,
        is_me: true,
    }));

    let (loader, mut completions) = ConsoleLoader::new(MessagePartRequestHandler::new(
        store,
        config.download_timeout,
    ));
    let loader = Arc::new(loader);
    let image_loader: Arc<dyn ImageLoader> = loader.clone();
    let registry = CellRegistry::with_defaults(&config, &image_loader);

    if args.drag {
        registry.on_scroll_state_changed(ScrollState::Dragging);
    }
    let mut cells = Vec::with_capacity(rows.len());
    for (position, row) in rows.iter().enumerate() {
        let Some(view_type) = registry.view_type(&row.message, row.is_me) else {
            continue;
        };
        let Some(mut holder) = registry.create_holder(view_type) else {
            continue;
        };
        let specs = CellHolderSpecs::new(row.is_me, position, args.width, args.height);
        registry.bind(&mut holder, &row.message, &specs)?;
        cells.push((row, holder));
    }
    if args.drag {
        info!(deferred = loader.deferred(), "Drag ended");
        registry.on_scroll_state_changed(ScrollState::Idle);
    }

    loader.drain(&mut completions).await;

    for (row, holder) in &cells {
        println!("{}", render::describe(&registry, row, holder));
    }
    for factory in registry.factories() {
        let stats = factory.cache().stats();
        info!(
            factory = factory.name(),
            entries = factory.cache().len(),
            bytes = factory.cache().total_size(),
            hits = stats.hits,
            misses = stats.misses,
            "Cache usage"
        );
    }
    Ok(())
}

async fn send_outgoing(
    args: &Args,
    config: &CellsConfig,
    participant: &str,
    conversation: &LocalConversation,
) -> anyhow::Result<()> {
    if let Some(text) = &args.say {
        TextSender::new(participant, config.notification_max_length).send(text, conversation)?;
    }
    if let Some(path) = &args.image {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        ImageSender::new(participant, config.preview).send(&bytes, conversation)?;
    }
    if let Some(coordinates) = args.location {
        let scope = Scope::new("location share");
        LocationSender::new(scope.handle(FixedLocation(coordinates)), participant)
            .send(conversation)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinates() {
        let parsed = parse_coordinates("40.5, -3.25").unwrap();
        assert!((parsed.latitude - 40.5).abs() < f64::EPSILON);
        assert!((parsed.longitude + 3.25).abs() < f64::EPSILON);
        assert!(parse_coordinates("40.5").is_err());
        assert!(parse_coordinates("north,south").is_err());
    }
}
