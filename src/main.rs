//! # Arrival Alarm Application Entry Point
//!
//! This binary drives the alarm core end to end without a phone: it arms the
//! saved places plus any zones given on the command line, replays a recorded
//! route through the simulated position provider, and reports every arrival.
//!
//! ```text
//! arrival-alarm [--config PATH] [--json-logs] [--geocode]
//!               [--zone LAT,LON[,RADIUS_M[,NAME]]]... ROUTE_FILE
//! ```


use anyhow::{bail, Context};
use arrival_alarm_lib::config::Config;
use arrival_alarm_lib::geocode::{address_for, NominatimGeocoder};
use arrival_alarm_lib::monitor::{self, GeofenceMonitor, SharedMonitor};
use arrival_alarm_lib::provider::PositionProvider;
use arrival_alarm_lib::simulated::{parse_route, SimulatedProvider};
use arrival_alarm_lib::store::{load_saved, FileStore};
use arrival_alarm_lib::{logging, Coordinate, Meters, NewZone, TrackingSession, Zone};
use std::env;
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

const USAGE: &str = "usage: arrival-alarm [--config PATH] [--json-logs] [--geocode] \
                     [--zone LAT,LON[,RADIUS_M[,NAME]]]... ROUTE_FILE";

/// A zone given on the command line.
#[derive(Debug, PartialEq)]
struct ZoneArg {
    center: Coordinate,
    radius: Option<Meters>,
    name: Option<String>,
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<String>,
    json_logs: bool,
    geocode: bool,
    zones: Vec<ZoneArg>,
    route: String,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut route = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    parsed.config = Some(args.next().context("--config needs a path")?);
                }
                "--json-logs" => parsed.json_logs = true,
                "--geocode" => parsed.geocode = true,
                "--zone" => {
                    let raw = args.next().context("--zone needs LAT,LON")?;
                    parsed.zones.push(parse_zone_arg(&raw)?);
                }
                "-h" | "--help" => bail!(USAGE),
                other if other.starts_with("--") => bail!("unknown option {other}\n{USAGE}"),
                other => {
                    if route.replace(other.to_string()).is_some() {
                        bail!("only one route file may be given\n{USAGE}");
                    }
                }
            }
        }

        parsed.route = route.context(USAGE)?;
        Ok(parsed)
    }
}

/// Parse `LAT,LON[,RADIUS_M[,NAME]]`.
fn parse_zone_arg(raw: &str) -> anyhow::Result<ZoneArg> {
    let mut parts = raw.splitn(4, ',').map(str::trim);
    let latitude: f64 = parts
        .next()
        .unwrap_or_default()
        .parse()
        .with_context(|| format!("bad latitude in --zone {raw}"))?;
    let longitude: f64 = parts
        .next()
        .context("--zone needs LAT,LON")?
        .parse()
        .with_context(|| format!("bad longitude in --zone {raw}"))?;
    let radius = parts
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map(Meters))
        .transpose()
        .with_context(|| format!("bad radius in --zone {raw}"))?;
    let name = parts.next().filter(|s| !s.is_empty()).map(str::to_string);

    Ok(ZoneArg {
        center: Coordinate::new(latitude, longitude),
        radius,
        name,
    })
}

/// Arm saved places and command-line zones. Returns how many were armed.
fn arm_zones(monitor: &SharedMonitor, config: &Config, zones: Vec<ZoneArg>) -> usize {
    let mut monitor = monitor::lock(monitor);

    let store = FileStore::new(&config.storage.dir);
    let saved = load_saved(&store).unwrap_or_else(|error| {
        warn!(%error, dir = %config.storage.dir, "could not read saved places");
        Vec::new()
    });
    for place in &saved {
        if let Err(error) = monitor.add_zone(place.to_new_zone()) {
            warn!(%error, place = %place.name, "skipping saved place");
        }
    }

    for zone in zones {
        let mut request = NewZone::new(
            zone.center,
            zone.radius.unwrap_or_else(|| config.default_radius()),
        );
        request.name = zone.name;
        if let Err(error) = monitor.add_zone(request) {
            warn!(%error, center = %zone.center, "ignoring --zone");
        }
    }

    monitor.len()
}

/// Distance from `at` to the closest zone that has not fired yet.
fn nearest_pending(monitor: &SharedMonitor, at: Coordinate) -> Option<(String, Meters)> {
    let monitor = monitor::lock(monitor);
    monitor
        .zones()
        .iter()
        .filter(|z| !z.triggered)
        .map(|z| (z.label().to_string(), at.distance_to(z.center).to_meters()))
        .min_by(|a, b| a.1.value().total_cmp(&b.1.value()))
}

async fn run(config: Config, args: Args, route: Vec<Coordinate>) -> anyhow::Result<()> {
    let monitor = GeofenceMonitor::shared();
    let armed = arm_zones(&monitor, &config, args.zones);
    if armed == 0 {
        eprintln!("⚠️  No zones armed - the route will be replayed without alarms");
    } else {
        eprintln!("🎯 {armed} zone(s) armed");
    }

    let provider = Arc::new(SimulatedProvider::new());
    let mut session = TrackingSession::new(Arc::clone(&provider), Arc::clone(&monitor))
        .with_options(config.subscription_options());

    let (arrivals_tx, mut arrivals_rx) = mpsc::unbounded_channel::<Zone>();
    let display_monitor = Arc::clone(&monitor);
    let started = session.start(
        move |at| match nearest_pending(&display_monitor, at) {
            Some((label, distance)) => println!("📍 {at}  ({distance} to {label})"),
            None => println!("📍 {at}"),
        },
        move |zone| {
            // Terminal bell stands in for the vibration alert
            println!("\x07⏰ ARRIVED: {} (radius {})", zone.label(), zone.radius);
            let _ = arrivals_tx.send(zone.clone());
        },
    );
    if !started {
        bail!("tracking could not be started");
    }

    provider.replay(&route, config.simulation_step()).await;
    session.drain().await;

    let mut reached = Vec::new();
    while let Ok(zone) = arrivals_rx.try_recv() {
        reached.push(zone);
    }
    eprintln!("✅ Route finished: {} of {} zone(s) reached", reached.len(), armed);

    if args.geocode || config.geocoding.enabled {
        let geocoder = NominatimGeocoder::from_config(&config.geocoding);
        if let Ok(last) = provider.current_position() {
            match address_for(&geocoder, last).await {
                Some(address) => eprintln!("🏠 Final position: {address}"),
                None => eprintln!("🏠 Final position: {last} (no address available)"),
            }
        }
    }

    Ok(())
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let args = Args::parse(env::args().skip(1))?;

    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    let text = fs::read_to_string(&args.route)
        .with_context(|| format!("cannot read route file {}", args.route))?;
    let route = parse_route(&text)?;
    if route.is_empty() {
        bail!("route file {} has no points", args.route);
    }

    // Create Tokio runtime for the delivery task and the replay timer
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args, route))
}
