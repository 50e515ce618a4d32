// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde_json::Value;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use wfp_core::config::{ConfigManager, RouteConfig};
use wfp_core::export;
use wfp_core::flight::{FlightController, FlightEvent, MarkerSpawner};
use wfp_core::geo::{distance_km, initial_bearing_deg, Coordinate};
use wfp_core::host::{MemoryHost, PoiSearch, VAR_START_FLIGHT};
use wfp_core::planner;
use wfp_core::poi;
use wfp_core::session::{NavigationSession, SessionSettings, TickOutcome};
use wfp_core::wiki::{extract_geosearch, WikipediaClient};
use wfp_core::WfpError;

const KNOTS_TO_KMH: f64 = 1.852;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to route_config.json
    #[arg(short, long, env = "WFP_CONFIG")]
    config: Option<PathBuf>,

    /// Arrival threshold in km (overrides config)
    #[arg(long)]
    threshold: Option<f64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search Wikipedia around a position and print the planned route
    Search {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in metres
        #[arg(long)]
        radius: Option<u32>,
        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,
        /// Print the ordered-coordinates payload instead of a table
        #[arg(long)]
        payload: bool,
    },
    /// Plan a route over POIs stored in a JSON file
    Plan {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Show the Wikipedia summary for a page title
    Summary { title: String },
    /// Fly a simulated aircraft along the route and report arrivals
    Simulate {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// POI JSON file; searches Wikipedia when omitted
        #[arg(long)]
        file: Option<PathBuf>,
        /// Ground speed in knots
        #[arg(long, default_value_t = 120.0)]
        speed: f64,
        /// Give up after this many simulated minutes
        #[arg(long, default_value_t = 120)]
        max_minutes: u64,
    },
    /// Show or initialise the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration if none exists
    Init,
}

/// Prints marker placement instead of spawning scenery objects.
struct ConsoleMarkers;

impl MarkerSpawner for ConsoleMarkers {
    fn spawn(&mut self, at: Coordinate) -> Result<(), WfpError> {
        println!("  marker placed at {}", at);
        Ok(())
    }

    fn remove_all(&mut self) {}
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    if let Commands::Config { action } = &cli.command {
        return run_config(&manager, action);
    }

    let mut config = manager.load()?;
    if let Some(threshold) = cli.threshold {
        config.arrival_threshold_km = threshold;
        config.validate()?;
    }

    match &cli.command {
        Commands::Search {
            lat,
            lon,
            radius,
            limit,
            payload,
        } => {
            let start = Coordinate::new(*lat, *lon);
            let client = WikipediaClient::from_config(&config)?;
            let raw = client.search(
                start,
                radius.unwrap_or(config.search_radius_m),
                limit.unwrap_or(config.search_limit),
            );
            let pois = poi::dedup_nearby(poi::normalize(&raw), config.dedup_km);
            if *payload {
                let message = export::build_message(Some(start), &pois);
                println!("{}", serde_json::to_string_pretty(&message)?);
            } else {
                print_route(start, &planner::plan(start, &pois));
            }
        }
        Commands::Plan { file, lat, lon } => {
            let start = Coordinate::new(*lat, *lon);
            let raw = read_poi_file(file)?;
            let pois = poi::dedup_nearby(poi::normalize(&raw), config.dedup_km);
            print_route(start, &planner::plan(start, &pois));
        }
        Commands::Summary { title } => {
            let client = WikipediaClient::from_config(&config)?;
            match client.summary(title)? {
                Some(summary) => {
                    println!("{}", summary.title);
                    if let Some(description) = &summary.description {
                        println!("  {}", description);
                    }
                    if let Some(extract) = &summary.extract {
                        println!();
                        println!("{}", extract);
                    }
                    if let Some(url) = summary.page_url() {
                        println!();
                        println!("{}", url);
                    }
                }
                None => println!("No summary for an empty title."),
            }
        }
        Commands::Simulate {
            lat,
            lon,
            file,
            speed,
            max_minutes,
        } => {
            let start = Coordinate::new(*lat, *lon);
            let raw = match file {
                Some(path) => read_poi_file(path)?,
                None => WikipediaClient::from_config(&config)?.search(
                    start,
                    config.search_radius_m,
                    config.search_limit,
                ),
            };
            simulate(&config, start, &raw, *speed, *max_minutes);
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(manager: &ConfigManager, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = manager.load()?;
            println!("# {}", manager.path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Init => {
            if manager.path().exists() {
                println!("Config already exists at {}", manager.path().display());
            } else {
                manager.save(&RouteConfig::default())?;
                println!("Wrote default config to {}", manager.path().display());
            }
        }
    }
    Ok(())
}

/// Accepts either a bare array of records or a full GeoSearch response.
fn read_poi_file(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read POI file {:?}", path))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse POI file {:?}", path))?;
    Ok(match value {
        Value::Array(items) => items,
        other => extract_geosearch(other),
    })
}

fn print_route(start: Coordinate, route: &[poi::PointOfInterest]) {
    if route.is_empty() {
        println!("No points of interest found around {}", start);
        return;
    }
    println!("Route from {} — {} stops", start, route.len());
    let mut cursor = start;
    for (i, p) in route.iter().enumerate() {
        let leg = distance_km(cursor, p.coordinate());
        println!(
            "{:>3}. {:<40} {} {:>7.2} km {:>5.0}°",
            i + 1,
            p.title,
            p.coordinate(),
            leg,
            initial_bearing_deg(cursor, p.coordinate())
        );
        cursor = p.coordinate();
    }
    println!(
        "Total: {:.2} km",
        planner::route_length_km(start, route)
    );
}

/// Moves `from` toward `to` by at most `step_km` along the straight lat/lon line.
fn step_toward(from: Coordinate, to: Coordinate, step_km: f64) -> Coordinate {
    let remaining = distance_km(from, to);
    if remaining <= step_km || remaining == 0.0 {
        return to;
    }
    let f = step_km / remaining;
    Coordinate::new(
        from.lat + (to.lat - from.lat) * f,
        from.lon + (to.lon - from.lon) * f,
    )
}

/// Number of poll periods in `max_minutes`, saturating at `u32::MAX`.
fn simulation_steps(max_minutes: u64, dt: Duration) -> u32 {
    let total_ms = u128::from(max_minutes).saturating_mul(60_000);
    u32::try_from(total_ms / dt.as_millis().max(1)).unwrap_or(u32::MAX)
}

fn simulate(config: &RouteConfig, start: Coordinate, raw: &[Value], speed_kts: f64, max_minutes: u64) {
    let mut host = MemoryHost::new();
    host.set_position(start);
    host.insert_var(VAR_START_FLIGHT, 1.0);

    let mut session = NavigationSession::new(host, SessionSettings::from(config));
    let mut channel = MemoryHost::new();
    let kept = session.load_pois(raw, Some(start), Some(&mut channel));
    if kept.is_empty() {
        println!("No points of interest to fly to around {}", start);
        return;
    }

    let mut flight = FlightController::new(ConsoleMarkers);
    for message in &channel.sent {
        flight.handle_message(&message.payload);
    }
    flight.on_start_flight(1.0);

    let dt = config.poll_interval();
    let step_km = speed_kts * KNOTS_TO_KMH * dt.as_secs_f64() / 3600.0;
    let steps = simulation_steps(max_minutes, dt);
    let base = Instant::now();
    let mut position = start;

    println!(
        "Flying {} stops at {:.0} kts from {}",
        session.tracker().plan().len(),
        speed_kts,
        start
    );

    for step in 0..steps {
        let elapsed = dt * step;
        let now = base + elapsed;

        if let Some(target) = session.tracker().current_target() {
            position = step_toward(position, target.coordinate(), step_km);
            session.host_mut().set_position(position);
        }

        if let TickOutcome::Arrived(arrival) = session.tick(now) {
            println!(
                "[{:>4}s] Arrived at {} ({}) — {} left",
                elapsed.as_secs(),
                arrival.poi.title,
                arrival.poi.coordinate(),
                arrival.remaining
            );
            if let Some(FlightEvent::Completed) = flight.on_arrival_pulse(session.host_mut(), now) {
                println!("All markers visited.");
            }
        }
        flight.update(session.host_mut(), now);

        if session.tracker().is_finished() && session.pending_writes() == 0 {
            break;
        }
    }

    let flown: f64 = session
        .tracker()
        .completed_segments()
        .iter()
        .map(|s| s.length_km())
        .sum();
    if session.tracker().is_finished() {
        println!("Route complete — {:.2} km flown", flown);
    } else {
        println!(
            "Stopped after {} minutes with {} stops left",
            max_minutes,
            session.tracker().remaining().len()
        );
    }
    flight.shutdown();
    session.shutdown();
}
