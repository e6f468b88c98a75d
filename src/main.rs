//! RideTheBike - Personal Motorcycle Dashboard
//!
//! Command-line front end over the dashboard state.

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ridethebike::dashboard::{Clock, Dashboard, SystemClock};
use ridethebike::integrations::weather::{InsightsProvider, OpenMeteoProvider};
use ridethebike::metrics::LUBE_INTERVAL_KM;
use ridethebike::state::parse_due_date;
use ridethebike::storage::config::{self, AppConfig};
use ridethebike::storage::{JsonFileStore, StateStore};

#[derive(Parser)]
#[command(name = "ridethebike")]
#[command(about = "Personal motorcycle dashboard: odometer target, battery, chain, fuel and tyres")]
#[command(version)]
struct Cli {
    /// Directory holding the state snapshot (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dashboard (default)
    Status,

    /// Log a ride of the given distance in km
    Ride {
        #[arg(allow_negative_numbers = true)]
        distance: String,
    },

    /// Log a refuel
    Fuel {
        #[arg(allow_negative_numbers = true)]
        liters: String,
        #[arg(allow_negative_numbers = true)]
        cost: String,
    },

    /// Mark the chain as lubricated at the current odometer
    Lube,

    /// Set the fuel gauge (0-12 segments)
    Bars {
        #[arg(allow_negative_numbers = true)]
        bars: String,
    },

    /// Record tyre pressure in PSI ("-" leaves a side unset)
    Tyres {
        #[arg(allow_negative_numbers = true)]
        front: String,
        #[arg(allow_negative_numbers = true)]
        rear: String,
    },

    /// Change a setting
    Set {
        #[command(subcommand)]
        setting: Setting,
    },

    /// Toggle a pre-ride checklist item
    Check { id: String },

    /// Uncheck every checklist item
    ResetChecklist,

    /// Show the ride and fuel logs
    History {
        /// Number of entries to show per log
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Show weather and air quality for the configured location
    Weather {
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Remember the given coordinates in the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand)]
enum Setting {
    /// Current odometer reading
    Odo {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Start of the service window
    Base {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Target odometer for the next service
    Target {
        #[arg(allow_negative_numbers = true)]
        value: String,
    },
    /// Service deadline (YYYY-MM-DD or "none")
    Due { date: String },
}

/// Parse a form-style number; anything unparseable becomes NaN for the core to ignore.
fn lenient_number(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

fn optional_number(raw: &str) -> Option<f64> {
    match raw.trim() {
        "" | "-" | "none" => None,
        value => Some(lenient_number(value)),
    }
}

fn format_pressure(value: Option<f64>) -> String {
    value.map(|v| format!("{:.0}", v)).unwrap_or_else(|| "--".to_string())
}

fn print_status<S: StateStore, C: Clock>(dash: &Dashboard<S, C>) {
    let state = dash.state();

    println!("Odometer      {:.1} km", state.current_odo);
    println!(
        "Progress      {:.1}% of {:.0} -> {:.0}",
        dash.progress_percent(),
        state.base_odo,
        state.target_odo
    );
    match state.service_due_date {
        Some(due) => println!(
            "Service due   {} ({} days left, {:.1} km/day needed)",
            due,
            dash.days_remaining(),
            dash.daily_target()
        ),
        None => println!("Service due   not set"),
    }
    println!("Battery       {}% - {}", dash.battery_health(), dash.battery_message());
    println!(
        "Chain         {:.0}% ({:.0} km since lube, every {:.0} km)",
        dash.chain_health(),
        state.current_odo - state.last_lube_odo,
        LUBE_INTERVAL_KM
    );
    println!("Fuel gauge    {}/12", state.fuel_bars);

    let efficiency = dash.average_fuel_efficiency();
    if efficiency > 0.0 {
        println!("Efficiency    {:.2} km/L", efficiency);
    } else {
        println!("Efficiency    -- (needs two refuels)");
    }

    println!(
        "Tyres         front {} / rear {} PSI",
        format_pressure(state.tyre_pressure.front),
        format_pressure(state.tyre_pressure.rear)
    );
    println!("Rides (7d)    {}", dash.rides_this_week());

    println!();
    println!("Pre-ride checklist:");
    for item in &state.checklist {
        let mark = if item.checked { "x" } else { " " };
        println!("  [{}] {:<8} {}", mark, item.id, item.text);
    }
    if dash.is_checklist_complete() {
        println!("  Ready to ride.");
    }
}

fn print_history<S: StateStore, C: Clock>(dash: &Dashboard<S, C>, limit: usize) {
    let state = dash.state();

    println!("Rides:");
    if state.rides.is_empty() {
        println!("  none yet");
    }
    for ride in state.rides.iter().take(limit) {
        println!(
            "  {}  {:>8.1} km  odo {:.1}",
            ride.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            ride.distance,
            ride.odometer
        );
    }

    println!();
    println!("Refuels:");
    if state.fuel_log.is_empty() {
        println!("  none yet");
    }
    for entry in state.fuel_log.iter().take(limit) {
        println!(
            "  {}  {:>6.2} L  {:>8.2}  odo {:.1}",
            entry.date.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            entry.liters,
            entry.cost,
            entry.odo
        );
    }

    let trend = dash.fuel_trend();
    if !trend.is_empty() {
        println!();
        println!("Efficiency trend:");
        for point in trend {
            println!("  {}  {:.1} km/L", point.date.format("%b %d"), point.km_per_liter);
        }
    }
    println!("Total fuel spend: {:.2}", dash.total_fuel_cost());
}

async fn show_weather(
    mut app_config: AppConfig,
    config_path: &std::path::Path,
    lat: Option<f64>,
    lon: Option<f64>,
    save: bool,
) -> Result<()> {
    if let Some(lat) = lat {
        app_config.weather.latitude = Some(lat);
    }
    if let Some(lon) = lon {
        app_config.weather.longitude = Some(lon);
    }

    if save {
        config::save_config_to(&app_config, config_path).context("Failed to save config")?;
        tracing::info!("Saved location to {}", config_path.display());
    }

    let provider = OpenMeteoProvider::new(app_config.weather.clone())?;
    match provider.get_insights().await {
        Ok(insights) => {
            println!("{}", insights.city);
            println!(
                "  {}°C  {}  rain {}%",
                insights.weather.temperature,
                insights.weather.condition.label(),
                insights.weather.rain_probability
            );
            println!(
                "  AQI {:.0} ({})",
                insights.air_quality.value,
                insights.air_quality.level.label()
            );
        }
        Err(e) => {
            // Decorative only: report offline and carry on
            tracing::warn!("Rider insights unavailable: {}", e);
            println!("Rider insights: offline ({})", e);
        }
    }

    Ok(())
}

/// Run a dashboard command against the state.
fn apply<S: StateStore, C: Clock>(dash: &mut Dashboard<S, C>, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_status(&*dash),
        Commands::Ride { distance } => {
            let ride = dash.log_ride(lenient_number(&distance));
            println!("Logged {:.1} km, odometer now {:.1}", ride.distance, ride.odometer);
        }
        Commands::Fuel { liters, cost } => {
            let entry = dash.log_fuel(lenient_number(&liters), lenient_number(&cost));
            println!("Logged {:.2} L for {:.2} at {:.1} km", entry.liters, entry.cost, entry.odo);
            let efficiency = dash.average_fuel_efficiency();
            if efficiency > 0.0 {
                println!("Average efficiency {:.2} km/L", efficiency);
            }
        }
        Commands::Lube => {
            dash.log_lube();
            println!("Chain lubed at {:.1} km", dash.state().last_lube_odo);
        }
        Commands::Bars { bars } => {
            let bars = lenient_number(&bars);
            if !bars.is_finite() {
                bail!("Fuel gauge must be a number between 0 and 12");
            }
            dash.set_fuel_bars(bars.trunc() as i64);
            println!("Fuel gauge {}/12", dash.state().fuel_bars);
        }
        Commands::Tyres { front, rear } => {
            dash.set_tyre_pressure(optional_number(&front), optional_number(&rear));
            let pressure = dash.state().tyre_pressure;
            println!(
                "Tyres front {} / rear {} PSI",
                format_pressure(pressure.front),
                format_pressure(pressure.rear)
            );
        }
        Commands::Set { setting } => match setting {
            Setting::Odo { value } => dash.set_current_odo(lenient_number(&value)),
            Setting::Base { value } => dash.set_base_odo(lenient_number(&value)),
            Setting::Target { value } => dash.set_target_odo(lenient_number(&value)),
            Setting::Due { date } => {
                let due = match date.trim() {
                    "none" | "" => None,
                    raw => match parse_due_date(raw) {
                        Some(due) => Some(due),
                        None => bail!("Invalid date '{}', expected YYYY-MM-DD", raw),
                    },
                };
                dash.set_service_due_date(due);
            }
        },
        Commands::Check { id } => {
            if !dash.toggle_checklist_item(&id) {
                let known: Vec<&str> = dash.state().checklist.iter().map(|i| i.id.as_str()).collect();
                bail!("Unknown checklist item '{}' (known: {})", id, known.join(", "));
            }
            if dash.is_checklist_complete() {
                println!("Checklist complete. Ready to ride.");
            }
        }
        Commands::ResetChecklist => dash.reset_checklist(),
        Commands::History { limit } => print_history(&*dash, limit),
        // Touches no bike state
        Commands::Weather { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(config::get_config_path);
    let app_config = config::load_config_from(&config_path).context("Failed to load config")?;

    let command = cli.command.unwrap_or(Commands::Status);

    let state_dir = cli.data_dir.unwrap_or_else(|| app_config.state_dir());
    let store = JsonFileStore::in_dir(&state_dir);
    tracing::debug!("Using state file {}", store.path().display());
    let mut dash = Dashboard::open(store, SystemClock);

    match command {
        Commands::Weather { lat, lon, save } => {
            show_weather(app_config, &config_path, lat, lon, save).await?;
        }
        command => apply(&mut dash, command)?,
    }

    dash.flush().context("Failed to save bike state")?;
    Ok(())
}
