use anyhow::{bail, Context, Result};
use chronoatlas_core::prelude::*;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod output;
mod render;
mod report;

use output::write_scene_geojson;
use render::render_map;
use report::{active_layer_names, describe_map, timeline_lines};

#[derive(Parser, Debug)]
#[command(
    name = "atlas",
    author,
    version,
    about = "Inspect, georeference and render stored chronoatlas maps",
    long_about = "Works on a map collection saved as <store>/<key>.json, the same \
                  document the editor persists.\n\n\
                  Maps are rendered through the synchronization engine on a headless \
                  surface, so the GeoJSON output shows exactly what an editor would \
                  display for the chosen timeline event."
)]
struct Args {
    /// Directory holding the map collection
    #[arg(short, long, global = true, default_value = ".")]
    store: PathBuf,

    /// Key the collection is stored under
    #[arg(short, long, global = true, default_value = DEFAULT_STORE_KEY)]
    key: String,

    /// Engine configuration JSON file (missing keys use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (show debug messages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the stored maps
    Maps,

    /// Compute where an image lands on the map for a given view.
    /// With --map, missing values come from that map's custom image and view.
    Georef {
        /// Map whose custom image and view supply defaults
        #[arg(short, long)]
        map: Option<String>,

        /// Image width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Image height in pixels
        #[arg(long)]
        height: Option<u32>,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,

        #[arg(short, long)]
        zoom: Option<u8>,

        /// Store the recomputed bounds on the map's custom image
        #[arg(long, requires = "map")]
        save: bool,
    },

    /// Show a map's timeline in order and the layers an event activates
    Timeline {
        #[arg(short, long)]
        map: String,

        /// Event to resolve active layers for
        #[arg(short, long)]
        event: Option<String>,
    },

    /// Render a map headlessly and write the visible content as GeoJSON
    Render {
        #[arg(short, long)]
        map: String,

        /// Selected timeline event (all layers when omitted)
        #[arg(short, long)]
        event: Option<String>,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    log::info!("Config: {}", path.display());
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    EngineConfig::from_json(&json).with_context(|| format!("Invalid config {}", path.display()))
}

fn open_collection(args: &Args) -> Result<MapCollection<JsonDirStore>> {
    let store = JsonDirStore::new(&args.store);
    let path = store.path_for(&args.key);
    log::debug!("Store: {}", path.display());
    MapCollection::open(store, args.key.as_str())
        .with_context(|| format!("Failed to load maps from {}", path.display()))
}

fn find_map(collection: &MapCollection<JsonDirStore>, id: &str) -> Result<MapData> {
    collection
        .get(&MapId::new(id))
        .cloned()
        .with_context(|| format!("No map with id {id}"))
}

#[allow(clippy::too_many_arguments)]
fn georef(
    collection: &mut MapCollection<JsonDirStore>,
    config: &EngineConfig,
    map_id: Option<&str>,
    width: Option<u32>,
    height: Option<u32>,
    lat: Option<f64>,
    lng: Option<f64>,
    zoom: Option<u8>,
    save: bool,
) -> Result<()> {
    let map = map_id.map(|id| find_map(collection, id)).transpose()?;
    let custom = map.as_ref().and_then(|m| m.custom_tile_layer.clone());

    let width = width
        .or(custom.as_ref().map(|c| c.width))
        .context("--width is required unless the map has a custom image")?;
    let height = height
        .or(custom.as_ref().map(|c| c.height))
        .context("--height is required unless the map has a custom image")?;
    let view = map
        .as_ref()
        .map(|m| (m.center, m.zoom))
        .unwrap_or((LatLng::default(), DEFAULT_ZOOM));
    let center = LatLng::new(lat.unwrap_or(view.0.lat), lng.unwrap_or(view.0.lng));
    let zoom = zoom.unwrap_or(view.1);

    let bounds = config
        .georef
        .bounds(center, zoom, width, height)
        .context("Failed to georeference image")?;
    println!("{}", serde_json::to_string_pretty(&bounds)?);

    if save {
        let Some(map) = map else {
            bail!("--save requires --map");
        };
        let Some(custom) = custom else {
            bail!("Map {} has no custom image to update", map.id);
        };
        let source = ImageSource {
            width,
            height,
            ..custom.source()
        };
        let layer = config.georef.georeference(&source, center, zoom)?;
        let id = map.id.clone();
        collection
            .upsert(MapData {
                custom_tile_layer: Some(layer),
                ..map
            })
            .context("Failed to save map")?;
        log::info!("Updated custom image bounds of map {id}");
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    let config = load_config(args.config.as_deref())?;
    let mut collection = open_collection(&args)?;

    match &args.command {
        Command::Maps => {
            if collection.maps().is_empty() {
                log::warn!("No maps stored under key {:?}", args.key);
            }
            for map in collection.maps() {
                println!("{}", describe_map(map));
            }
        }
        Command::Georef {
            map,
            width,
            height,
            lat,
            lng,
            zoom,
            save,
        } => georef(
            &mut collection,
            &config,
            map.as_deref(),
            *width,
            *height,
            *lat,
            *lng,
            *zoom,
            *save,
        )?,
        Command::Timeline { map, event } => {
            let map = find_map(&collection, map)?;
            for line in timeline_lines(&map) {
                println!("{line}");
            }

            let event = event.as_deref().map(TimelineEventId::new);
            if let Some(id) = &event {
                if map.timeline_event(id).is_none() {
                    log::warn!("Event {id} not found, showing all layers");
                }
            }
            println!("active: {}", active_layer_names(&map, event.as_ref()).join(", "));
        }
        Command::Render { map, event, output } => {
            let map = find_map(&collection, map)?;
            log::info!("Rendering map {} ({})", map.name, map.id);
            let event = event.as_deref().map(TimelineEventId::new);

            let outcome = render_map(map, event, config).await?;
            log::info!(
                "  {} markers, {} polygons rendered; {} inactive, {} dangling, {} invalid skipped",
                outcome.report.markers,
                outcome.report.polygons,
                outcome.report.skipped_inactive,
                outcome.report.skipped_dangling,
                outcome.report.skipped_invalid
            );
            write_scene_geojson(&outcome, output)?;
        }
    }

    Ok(())
}
