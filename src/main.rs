use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use roundcast::SchedulerService;
use roundcast::clock::ManualClock;
use roundcast::config::StationConfig;
use roundcast::now_playing::LiveState;
use roundcast::overrides::parse_time;
use roundcast::track::NewTrack;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "roundcast", about = "24-hour rolling broadcast scheduler", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full day's timeline for a playlist file
    Schedule(PlaylistArgs),
    /// Show what is on air at an instant
    Now(PlaylistArgs),
    /// Load a playlist through the 24h budget and report evictions
    Check(PlaylistArgs),
}

#[derive(Args)]
struct PlaylistArgs {
    /// JSON file holding an array of tracks
    #[arg(short, long)]
    playlist: PathBuf,
    /// Instant to evaluate (RFC 3339). Defaults to now
    #[arg(long)]
    at: Option<String>,
    /// Pin a track to a UTC time of day, as ID=HH:MM (repeatable)
    #[arg(long = "pin", value_name = "ID=HH:MM")]
    pins: Vec<String>,
    /// Station config (JSON)
    #[arg(short, long, env = "ROUNDCAST_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "roundcast=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schedule(args) => {
            let (service, _) = load_station(&args)?;
            let schedule = service.full_schedule()?;
            println!(
                "Schedule for {} UTC: {} event(s)",
                service.now().format("%Y-%m-%d"),
                schedule.len()
            );
            for event in &schedule {
                println!(
                    "  {}  {:>6}  {}{} — {} [{}]",
                    event.start.format("%H:%M:%S"),
                    format_secs(event.duration.as_secs()),
                    if event.pinned { "[pin] " } else { "" },
                    event.track.artist,
                    event.track.title,
                    event.track.id
                );
            }
        }
        Commands::Now(args) => {
            let (service, _) = load_station(&args)?;
            match service.currently_playing()? {
                LiveState::NoSongs => println!("No songs in playlist"),
                LiveState::NoSchedule => println!("No schedule"),
                LiveState::Playing(np) => {
                    println!(
                        "[{}] {} — {} ({} / {}, {:.0}%)",
                        np.status,
                        np.event.track.artist,
                        np.event.track.title,
                        format_secs(np.elapsed as u64),
                        format_secs(np.event.duration.as_secs()),
                        np.progress * 100.0
                    );
                    if let Some(next) = np.next {
                        println!(
                            "Next at {}: {} — {}",
                            next.start.format("%H:%M:%S"),
                            next.track.artist,
                            next.track.title
                        );
                    }
                }
            }
        }
        Commands::Check(args) => {
            let (service, evicted) = load_station(&args)?;
            let snapshot = service.playlist(None)?;
            let total: u64 = snapshot.tracks.iter().map(|t| t.duration.as_secs()).sum();
            println!(
                "{} track(s), {} total",
                snapshot.tracks.len(),
                format_secs(total)
            );
            if evicted.is_empty() {
                println!("Within budget, nothing evicted.");
            } else {
                println!("Evicted {} track(s) over budget:", evicted.len());
                for id in evicted {
                    println!("  - {}", id);
                }
            }
        }
    }

    Ok(())
}

/// Build a station from a playlist file. Returns the service and the ids the
/// budget evicted while loading.
fn load_station(args: &PlaylistArgs) -> Result<(SchedulerService, Vec<String>)> {
    let config = match &args.config {
        Some(path) => StationConfig::load_from(path)?,
        None => StationConfig::default(),
    };
    let at = match &args.at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid --at '{}'", s))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let service = SchedulerService::open(config, Arc::new(ManualClock::new(at)));

    let mut evicted = Vec::new();
    for payload in read_playlist(&args.playlist)? {
        let outcome = service.add_track(None, payload)?;
        evicted.extend(outcome.evicted.into_iter().map(|t| t.id));
    }

    for pin in &args.pins {
        let (id, time) = pin
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid --pin '{}'. Expected ID=HH:MM", pin))?;
        let (hour, minute) = parse_time(time)?;
        service.set_override(None, id, hour, minute)?;
    }

    Ok((service, evicted))
}

fn read_playlist(path: &Path) -> Result<Vec<NewTrack>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Could not read '{}'", path.display()))?;
    let tracks: Vec<NewTrack> = serde_json::from_str(&data)
        .with_context(|| format!("Invalid playlist '{}'", path.display()))?;
    if tracks.is_empty() {
        bail!("Playlist '{}' has no tracks", path.display());
    }
    Ok(tracks)
}

fn format_secs(secs: u64) -> String {
    if secs >= 3600 {
        format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
