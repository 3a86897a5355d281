use std::fs::{self, File};
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use foundation::math::{LngLat, MercatorViewport};
use gpu::recording::RecordingDevice;
use layers::symbology::PointLayerOptions;
use layers::{PointLayer, RenderOutcome};
use scene::picking::DEFAULT_PICK_RADIUS_PX;
use tools::CapitalStore;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "capitals", about = "World capitals on a point layer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the bundled capitals table as CSV and print a per-continent summary.
    Generate {
        #[arg(long)]
        out: PathBuf,
    },
    /// Render the capitals headlessly and report the one nearest a click.
    #[command(allow_negative_numbers = true)]
    Pick {
        /// CSV to load instead of the bundled table.
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        lng: f64,
        #[arg(long)]
        lat: f64,
        #[arg(long, default_value_t = 2.0)]
        zoom: f64,
        #[arg(long, default_value_t = 0.0)]
        center_lng: f64,
        #[arg(long, default_value_t = 0.0)]
        center_lat: f64,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        /// Pick radius in screen pixels.
        #[arg(long, default_value_t = DEFAULT_PICK_RADIUS_PX)]
        radius: f64,
        /// Point layer options as JSON, e.g. '{"pointSize": 8}'.
        #[arg(long)]
        style: Option<String>,
        /// Only keep capitals on this continent.
        #[arg(long)]
        continent: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate { out } => cmd_generate(out),
        Command::Pick {
            data,
            lng,
            lat,
            zoom,
            center_lng,
            center_lat,
            width,
            height,
            radius,
            style,
            continent,
        } => {
            let viewport =
                MercatorViewport::new(LngLat::new(center_lng, center_lat), zoom, width, height);
            cmd_pick(PickArgs {
                data,
                click: LngLat::new(lng, lat),
                viewport,
                radius,
                style,
                continent,
            })
        }
    }
}

fn cmd_generate(out: PathBuf) -> Result<()> {
    let store = CapitalStore::embedded().context("parse bundled capitals")?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(&out).with_context(|| format!("create {}", out.display()))?;
    store
        .write_csv(file)
        .with_context(|| format!("write {}", out.display()))?;
    info!(rows = store.len(), path = %out.display(), "wrote capitals");

    for s in store.continent_summary() {
        println!(
            "{:<16} {:>4} capitals, mean population {}",
            s.continent, s.count, s.mean_population
        );
    }
    Ok(())
}

struct PickArgs {
    data: Option<PathBuf>,
    click: LngLat,
    viewport: MercatorViewport,
    radius: f64,
    style: Option<String>,
    continent: Option<String>,
}

fn cmd_pick(args: PickArgs) -> Result<()> {
    let mut store = match &args.data {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            CapitalStore::from_csv(BufReader::new(file))
                .with_context(|| format!("parse {}", path.display()))?
        }
        None => CapitalStore::embedded().context("parse bundled capitals")?,
    };
    if let Some(continent) = &args.continent {
        store = store.on_continent(continent);
        if store.is_empty() {
            bail!("no capitals on continent {continent:?}");
        }
    }

    let options = match &args.style {
        Some(json) => PointLayerOptions::from_json_str(json).context("parse --style")?,
        None => PointLayerOptions::default(),
    };

    let mut device = RecordingDevice::new();
    let mut layer: PointLayer<RecordingDevice> = PointLayer::with_options(1, &options);
    layer.set_data(store.flat_coords())?;
    layer.bind(&mut device)?;

    match layer.render(&mut device, &args.viewport.matrix()) {
        RenderOutcome::Drawn { count } => info!(count, "frame drawn"),
        other => info!(?other, "frame skipped"),
    }
    debug!(commands = device.commands().len(), draws = ?device.draw_calls(), "recorded");

    let hit = layer.find_nearest(&args.viewport, args.click, args.radius);
    layer.unbind(&mut device);

    match hit.and_then(|i| store.get(i)) {
        Some(capital) => println!("{}", serde_json::to_string_pretty(capital)?),
        None => println!("no point within radius"),
    }
    Ok(())
}
