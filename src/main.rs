use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};

use mushroom_gps::sample::utc_to_epoch;
use mushroom_gps::{
    FixUpdate, GpxExporter, LocationSample, LogNotifier, ProviderKind, Result, Session, Settings,
    WaypointError, WaypointLog, parser,
};

/// Record foraging waypoints and export them as GPX.
#[derive(Parser, Debug)]
#[command(name = "mushroom-gps", version, about)]
struct Cli {
    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage directory, overriding the settings file
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a waypoint at the given position
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        alt: f64,
        #[arg(long, default_value_t = 0.0)]
        acc: f64,
        #[arg(long, default_value = "#ff0000")]
        color: String,
        #[arg(long, default_value = "mushroom")]
        category: String,
        /// Provider the fix is attributed to (defaults to the active provider)
        #[arg(long)]
        provider: Option<ProviderKind>,
        /// Unix time of the fix (defaults to now)
        #[arg(long)]
        fix_time: Option<f64>,
    },
    /// Remove the most recent waypoint
    Undo,
    /// Remove all waypoints
    Clear,
    /// List waypoints, newest first
    List,
    /// Write a timestamped JSON copy and GPX file
    Export {
        /// Output directory (defaults to the storage directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Append the waypoints of a GPX file
    Import { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = cli.dir {
        settings.storage_dir = dir;
    }
    settings.ensure_storage_dir()?;

    let store = WaypointLog::open(settings.store_path())?;
    let mut session = Session::new(store, settings.active_provider);

    match cli.command {
        Command::Add {
            title,
            lat,
            lon,
            alt,
            acc,
            color,
            category,
            provider,
            fix_time,
        } => {
            let kind = provider.unwrap_or(settings.active_provider);
            let now = utc_to_epoch(Utc::now());
            let sample = LocationSample {
                provider: kind.to_string(),
                latitude: lat,
                longitude: lon,
                altitude: alt,
                accuracy: acc,
                fix_time: fix_time.unwrap_or(now),
                capture_time: now,
            };
            session.set_active_provider(kind);
            session.apply(FixUpdate {
                kind,
                sample: Some(sample),
            });
            session.save_point(&title, &color, &category)?;
            if let Some(fix) = session.current_fix() {
                println!("{}", fix.summary());
            }
        }
        Command::Undo => {
            let removed = session.remove_last()?;
            println!("removed {}", removed.list_line());
        }
        Command::Clear => {
            let count = session.log().len();
            session.clear()?;
            println!("removed {count} waypoints");
        }
        Command::List => {
            for waypoint in session.log().iter().rev() {
                println!("{}", waypoint.list_line());
            }
        }
        Command::Export { out } => {
            let dir = out.unwrap_or_else(|| settings.storage_dir.clone());
            let exporter = GpxExporter::new(settings.export.clone());
            let report = session.export_files(&exporter, &dir, Utc::now(), &LogNotifier)?;
            println!("{}", report.json_path.display());
            println!("{}", report.gpx_path.display());
        }
        Command::Import { file } => {
            let xml = std::fs::read_to_string(&file)
                .map_err(|source| WaypointError::Io { path: file, source })?;
            let count = session.import(parser::read_waypoints(&xml)?)?;
            println!("imported {count} waypoints");
        }
    }

    Ok(())
}
