//! EQ Log Tracker - Tail, classify and aggregate EverQuest combat logs.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eqlog_tracker::combat::{CombatEngine, CombatEvent};
use eqlog_tracker::config::{ConfigError, ConfigLoader, TrackerConfig};
use eqlog_tracker::display;
use eqlog_tracker::loot::CurrencyEvent;
use eqlog_tracker::queue::BoundedQueue;
use eqlog_tracker::watcher::{player_name, replay_file, Tracker, TrackerError};

#[derive(Parser)]
#[command(
    name = "eqlog-tracker",
    about = "Tail and classify EverQuest combat logs",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow a log file and print events as they are written.
    Watch {
        /// Path to an eqlog_<Name>_<server>.txt file.
        log: PathBuf,
        /// Process existing content before following new lines.
        #[arg(long)]
        from_start: bool,
        /// Print one JSON object per line.
        #[arg(long)]
        json: bool,
    },
    /// Process a whole log file and print battles and DPS totals.
    Replay {
        /// Path to an eqlog_<Name>_<server>.txt file.
        log: PathBuf,
        /// Print one JSON object per line.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

/// Items handed from the tail thread to the printing loop.
enum Feed {
    Event(CombatEvent),
    Currency(CurrencyEvent),
    Zone(NaiveDateTime, String),
}

impl Feed {
    fn print(&self, json: bool) {
        match self {
            Self::Event(event) => display::print_event(event, json),
            Self::Currency(gain) => display::print_currency(gain, json),
            Self::Zone(at, zone) => display::print_zone(*at, zone, json),
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<TrackerConfig, ConfigError> {
    match path {
        Some(path) => ConfigLoader::load_from_path(&path),
        None => ConfigLoader::new().load(),
    }
}

async fn watch(
    config: TrackerConfig,
    log: PathBuf,
    from_start: bool,
    json: bool,
) -> Result<(), CliError> {
    let mut tail = config.tail.clone();
    tail.from_start |= from_start;

    let mut tracker = Tracker::new(log, tail)?;
    tracker.install_engine(CombatEngine::from_config(tracker.player_name(), &config))?;

    let queue = BoundedQueue::new(config.queue.capacity, config.queue.overflow);
    let sink = queue.clone();
    tracker.subscribe_to_combat_event(move |event| {
        if let Err(e) = sink.push(Feed::Event(event.clone())) {
            tracing::trace!(error = %e, "Dropping combat event");
        }
    })?;
    let sink = queue.clone();
    tracker.subscribe_to_currency(move |gain| {
        if let Err(e) = sink.push(Feed::Currency(gain.clone())) {
            tracing::trace!(error = %e, "Dropping currency event");
        }
    })?;
    let sink = queue.clone();
    tracker.subscribe_to_zone_change(move |at, zone| {
        if let Err(e) = sink.push(Feed::Zone(at, zone.to_string())) {
            tracing::trace!(error = %e, "Dropping zone change");
        }
    });

    tracker.start()?;
    tracing::info!(
        player = %tracker.player_name(),
        path = %tracker.path().display(),
        "Watching log"
    );

    let mut ticker = tokio::time::interval(config.queue.tick());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for item in queue.drain(config.queue.drain_per_tick) {
                    item.print(json);
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, stopping");
                break;
            }
        }
    }

    queue.close();
    tracker.stop();
    for item in queue.drain(usize::MAX) {
        item.print(json);
    }
    if queue.dropped() > 0 {
        tracing::warn!(dropped = queue.dropped(), "Events dropped on overflow");
    }
    tracker.with_engine(|engine| display::print_report(engine.reporter(), engine.window(), json));
    Ok(())
}

fn replay(config: &TrackerConfig, log: &Path, json: bool) -> Result<(), CliError> {
    let mut engine = CombatEngine::from_config(player_name(log)?, config);
    engine.subscribe_to_combat_event(move |event| display::print_event(event, json));
    engine.subscribe_to_currency(move |gain| display::print_currency(gain, json));

    let stats = replay_file(log, &mut engine)?;
    display::print_report(engine.reporter(), engine.window(), json);
    display::print_replay_stats(&stats, json);
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config)?;
    match cli.command {
        Commands::Watch {
            log,
            from_start,
            json,
        } => watch(config, log, from_start, json).await,
        Commands::Replay { log, json } => replay(&config, &log, json),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        display::print_error(&e.to_string());
        std::process::exit(1);
    }
}
