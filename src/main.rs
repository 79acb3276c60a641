//! Placenote CLI
//!
//! Usage:
//!   placenote --catalog outputList.json                   # Interactive
//!   placenote --catalog outputList.json --replay walk.txt # Replay a command file
//!   placenote --catalog outputList.json --json            # JSON output
//!
//! Commands (one per line):
//!   loc <lat> <lng>          New visitor position
//!   enter <name>             Region enter signal
//!   exit <name>              Region exit signal
//!   tap <actionId> [title]   Answer to a notification
//!   reset                    Stop every region
//!   status                   Working set and tallies
//!   quit

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use placenote::core::{
    load_catalog, FileEventLogger, HttpImageFetcher, ImageCache, NotificationComposer,
    PlacenoteService, SimulatedGateway, TerminalDelivery, WorkingSetManager,
};
use placenote::types::{ComposeOutcome, Coordinate, RegionEvent, RegionEventKind, UpdateOutcome};
use placenote::{Config, VERSION};

#[derive(Parser, Debug)]
#[command(
    name = "placenote",
    version = VERSION,
    about = "Placenote - proximity notifications about exhibits",
    long_about = "Placenote keeps the 20 catalog places nearest to the visitor subscribed\n\
                  as 100 m regions and, when a region is entered or left, sends a\n\
                  notification relating the place to an exhibit.\n\n\
                  Commands:\n  \
                  loc <lat> <lng>         New visitor position\n  \
                  enter <name>            Region enter signal\n  \
                  exit <name>             Region exit signal\n  \
                  tap <actionId> [title]  Answer a notification (actionUseful / actionUseless)\n  \
                  reset                   Stop every region\n  \
                  status                  Working set and tallies\n  \
                  quit                    Leave"
)]
struct Args {
    /// JSON catalog of places
    #[arg(long, env = "PLACENOTE_CATALOG")]
    catalog: PathBuf,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Directory for the event log (default: ./logs)
    #[arg(long, env = "PLACENOTE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Directory for downloaded images (default: ./image_cache)
    #[arg(long, env = "PLACENOTE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Give up on an image after this many milliseconds
    #[arg(long, env = "PLACENOTE_IMAGE_TIMEOUT_MS")]
    image_timeout_ms: Option<u64>,

    /// Notify about a random place every N seconds (0 = off)
    #[arg(long, env = "PLACENOTE_TIMER_SECS")]
    timer_secs: Option<u64>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

impl Args {
    fn into_config(self) -> (Config, Options) {
        let mut config = Config::from_env();
        config.catalog_path = self.catalog;
        if let Some(dir) = self.log_dir {
            config.log_dir = dir;
        }
        if let Some(dir) = self.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(ms) = self.image_timeout_ms {
            config.image_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = self.timer_secs {
            config.timer_interval = (secs > 0).then(|| Duration::from_secs(secs));
        }

        let options = Options {
            replay: self.replay,
            json: self.json,
            no_color: self.no_color,
        };
        (config, options)
    }
}

/// Presentation flags
#[derive(Debug, Clone)]
struct Options {
    replay: Option<PathBuf>,
    json: bool,
    no_color: bool,
}

/// One line of input
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Location(Coordinate),
    Region(RegionEvent),
    Tap { action_id: String, title: String },
    Reset,
    Status,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let rest: Vec<&str> = parts.collect();

    match verb.as_str() {
        "loc" => {
            let [lat, lng] = rest.as_slice() else {
                return Err("usage: loc <lat> <lng>".to_string());
            };
            let lat: f64 = lat.parse().map_err(|_| format!("bad latitude '{}'", lat))?;
            let lng: f64 = lng.parse().map_err(|_| format!("bad longitude '{}'", lng))?;
            Ok(Command::Location(Coordinate::new(lat, lng)))
        }
        "enter" | "exit" if !rest.is_empty() => {
            let kind = if verb == "enter" {
                RegionEventKind::Enter
            } else {
                RegionEventKind::Exit
            };
            Ok(Command::Region(RegionEvent::new(kind, rest.join(" "))))
        }
        "enter" | "exit" => Err(format!("usage: {} <name>", verb)),
        "tap" => match rest.split_first() {
            Some((action_id, title)) => Ok(Command::Tap {
                action_id: action_id.to_string(),
                title: title.join(" "),
            }),
            None => Err("usage: tap <actionId> [title]".to_string()),
        },
        "reset" => Ok(Command::Reset),
        "status" => Ok(Command::Status),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command '{}'", other)),
    }
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let (config, options) = Args::parse().into_config();

    let catalog = match load_catalog(&config.catalog_path) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            eprintln!("Cannot load catalog: {}", e);
            std::process::exit(1);
        }
    };
    let fetcher = match HttpImageFetcher::new(config.image_timeout) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => {
            eprintln!("Cannot build image fetcher: {}", e);
            std::process::exit(1);
        }
    };

    let logger = Arc::new(FileEventLogger::new(&config.log_dir));
    let manager = WorkingSetManager::new(catalog.clone(), SimulatedGateway::new(), logger.clone());
    let composer = NotificationComposer::new(
        catalog.clone(),
        ImageCache::new(&config.cache_dir, fetcher),
        Arc::new(TerminalDelivery::new(options.json, options.no_color)),
        logger.clone(),
        config.image_timeout,
    );
    let service = PlacenoteService::spawn(manager, composer, logger.clone());

    if !options.json {
        print_header(catalog.len(), &options);
        println!("Event log: {}", logger.path().display());
        println!();
    }

    match service.bootstrap().await {
        Ok(outcome) => print_update(&outcome, &options),
        Err(e) => eprintln!("Bootstrap failed: {}", e),
    }

    let timer = config.timer_interval.map(|period| service.spawn_timer_feed(period));

    let result = match &options.replay {
        Some(path) => run_replay(&service, path, &options).await,
        None => run_interactive(&service, &options).await,
    };
    if let Err(e) = result {
        eprintln!("Input error: {}", e);
    }

    if let Some(timer) = timer {
        timer.abort();
    }
    let counters = service.counters();
    if !options.json {
        println!(
            "\nSession ended. Useful: {} | Not relevant: {}",
            counters.useful, counters.useless
        );
    }
    service.shutdown().await;
}

/// Commands from a file, echoed as they run
async fn run_replay(service: &PlacenoteService, path: &std::path::Path, options: &Options) -> std::io::Result<()> {
    let script = tokio::fs::read_to_string(path).await?;
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !options.json {
            println!("{}", format_prompt(options.no_color) + line);
        }
        if !handle_line(service, line, options).await {
            break;
        }
    }
    Ok(())
}

async fn run_interactive(service: &PlacenoteService, options: &Options) -> std::io::Result<()> {
    if !options.json {
        println!("Type a command and press Enter. Type 'quit' to exit.");
        println!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !options.json {
            print!("{}", format_prompt(options.no_color));
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !handle_line(service, line, options).await {
            break;
        }
    }
    Ok(())
}

/// Run one command; `false` ends the session
async fn handle_line(service: &PlacenoteService, line: &str, options: &Options) -> bool {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(message) => {
            print_warning(&message, options.no_color);
            return true;
        }
    };

    match command {
        Command::Location(origin) => match service.location_update(Some(origin)).await {
            Ok(report) => {
                print_update(&report.outcome, options);
                for handle in report.triggered {
                    if let Ok(outcome) = handle.await {
                        print_compose(&outcome, options);
                    }
                }
            }
            Err(e) => print_warning(&e.to_string(), options.no_color),
        },
        Command::Region(event) => {
            if let Ok(outcome) = service.region_event(event).await {
                print_compose(&outcome, options);
            }
        }
        Command::Tap { action_id, title } => {
            let outcome = service.response(&action_id, &title);
            if options.json {
                print_json(&outcome);
            } else {
                println!(
                    "{} | useful={} useless={}",
                    outcome.reason.code(),
                    outcome.counters.useful,
                    outcome.counters.useless
                );
            }
        }
        Command::Reset => match service.reset_all().await {
            Ok(outcome) => print_update(&outcome, options),
            Err(e) => print_warning(&e.to_string(), options.no_color),
        },
        Command::Status => match service.status().await {
            Ok(status) if options.json => print_json(&status),
            Ok(status) if options.no_color => println!("{}", status.to_parseable_string()),
            Ok(status) => println!("{}", status.to_terminal_string()),
            Err(e) => print_warning(&e.to_string(), options.no_color),
        },
        Command::Quit => return false,
    }
    true
}

/// Print header
fn print_header(places: usize, options: &Options) {
    if options.no_color {
        println!("========================================");
        println!("  Placenote v{} - {} places", VERSION, places);
        println!("========================================");
    } else {
        println!("\x1b[1m========================================\x1b[0m");
        println!("\x1b[1m  📍 Placenote v{} - {} places\x1b[0m", VERSION, places);
        println!("\x1b[1m========================================\x1b[0m");
    }
    println!();
}

fn format_prompt(no_color: bool) -> String {
    if no_color {
        "> ".to_string()
    } else {
        "\x1b[36m>\x1b[0m ".to_string()
    }
}

fn print_update(outcome: &UpdateOutcome, options: &Options) {
    if options.json {
        print_json(outcome);
    } else if options.no_color {
        println!("{}", outcome.to_parseable_string());
    } else {
        println!("{}", outcome.to_terminal_string());
    }
}

/// The notification itself is printed by the delivery; only the reason
/// is shown here.
fn print_compose(outcome: &ComposeOutcome, options: &Options) {
    if options.json {
        return;
    }
    let color = if options.no_color { "" } else { "\x1b[90m" };
    let reset = if options.no_color { "" } else { "\x1b[0m" };
    println!("{}  └─ {}: {}{}", color, outcome.reason.code(), outcome.reason.description(), reset);
}

fn print_warning(message: &str, no_color: bool) {
    if no_color {
        println!("! {}", message);
    } else {
        println!("\x1b[33m⚠ {}\x1b[0m", message);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Cannot serialize output: {}", e),
    }
}
