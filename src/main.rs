use std::path::PathBuf;

use anyhow::{Context, Result};
use attendance_geofence::{
    load_authorization, load_zones, validate_zones_with_direction, CheckInPolicy, LocationFix,
    ZoneAuthorization, BOUNDARY_TOLERANCE_METERS, DEFAULT_MAX_ACCURACY_METERS,
    STRICT_MAX_ACCURACY_METERS,
};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Position {
    /// zones file, either the backend response or a bare array of [lng, lat] rings
    #[arg(short, long)]
    zones: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    lng: f64,
    /// print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// check a position against the zones
    Validate {
        #[command(flatten)]
        position: Position,
    },
    /// apply the full check-in rules to a location fix
    CheckIn {
        #[command(flatten)]
        position: Position,
        /// horizontal accuracy of the fix in meters
        #[arg(short, long)]
        accuracy: f64,
        /// when the fix was taken (RFC 3339), defaults to now
        #[arg(long)]
        timestamp: Option<DateTime<Utc>>,
        /// employee may check in from any zone
        #[arg(long, conflicts_with = "employee")]
        any_zone: bool,
        /// employee record from the backend, read for its any-zone flag
        #[arg(long)]
        employee: Option<PathBuf>,
        /// meters outside a zone that still count as inside
        #[arg(long, default_value_t = BOUNDARY_TOLERANCE_METERS)]
        tolerance: f64,
        /// worst acceptable fix accuracy in meters
        #[arg(long, default_value_t = DEFAULT_MAX_ACCURACY_METERS, conflicts_with = "strict")]
        max_accuracy: f64,
        /// require the foreground accuracy limit instead of the background one
        #[arg(long)]
        strict: bool,
        /// oldest acceptable fix in seconds
        #[arg(long)]
        max_age: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli.command)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "attendance_geofence=debug"
    } else {
        "attendance_geofence=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .init();
}

fn run_cli(command: Commands) -> Result<()> {
    match command {
        Commands::Validate { position } => {
            let zones = load_zones(&position.zones)
                .with_context(|| format!("loading zones from {}", position.zones.display()))?;
            let result = validate_zones_with_direction(position.lat, position.lng, &zones);
            emit(&result, position.json)
        }
        Commands::CheckIn {
            position,
            accuracy,
            timestamp,
            any_zone,
            employee,
            tolerance,
            max_accuracy,
            strict,
            max_age,
        } => {
            let zones = load_zones(&position.zones)
                .with_context(|| format!("loading zones from {}", position.zones.display()))?;
            let authorization = match (any_zone, employee) {
                (true, _) => ZoneAuthorization::AnyZone,
                (false, Some(path)) => load_authorization(&path)
                    .with_context(|| format!("loading employee record from {}", path.display()))?,
                (false, None) => ZoneAuthorization::AssignedZones,
            };
            let policy = CheckInPolicy {
                boundary_tolerance: tolerance,
                max_accuracy: if strict {
                    STRICT_MAX_ACCURACY_METERS
                } else {
                    max_accuracy
                },
                max_fix_age: max_age.map(Duration::seconds),
            };

            let now = Utc::now();
            let fix = LocationFix::new(position.lat, position.lng, accuracy, timestamp.unwrap_or(now));
            let decision = policy.evaluate(&fix, authorization, &zones, now);
            emit(&decision, position.json)?;
            if !decision.is_permitted() {
                std::process::exit(2);
            }
            Ok(())
        }
    }
}

fn emit<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}
