use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use marble_sim::config::{ConfigOverrides, SimConfig};
use marble_sim::sim::{RunSummary, SimulationDriver};
use marble_sim::types::{EventKind, Phase, Sample};
use marble_sim::UnitCount;

/// Substituted when the host hands us something that is not a marble count.
const DEFAULT_UNITS: u32 = 100;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Throw marbles out the back until you cover the distance home"
)]
struct Cli {
    /// Marbles on board (non-negative integer)
    #[arg(env = "MARBLE_COUNT")]
    units: Option<String>,

    /// TOML file overriding any subset of the default parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target distance, m
    #[arg(long)]
    distance: Option<f64>,

    /// Integration step, s
    #[arg(long)]
    dt: Option<f64>,

    /// Initial throw rate, marbles/s
    #[arg(long)]
    throw_rate: Option<f64>,

    /// Fatigue decay constant, 1/s
    #[arg(long)]
    fatigue: Option<f64>,

    /// Mass per marble, kg
    #[arg(long)]
    unit_mass: Option<f64>,

    /// Marble ejection speed relative to the vehicle, m/s
    #[arg(long)]
    ejection_velocity: Option<f64>,

    /// Vehicle mass without marbles, kg
    #[arg(long)]
    dry_mass: Option<f64>,

    /// Throw rate below which the thrower rests, marbles/s
    #[arg(long)]
    rate_threshold: Option<f64>,

    /// Rest interval, s
    #[arg(long)]
    rest: Option<f64>,

    /// Refuse counts above this
    #[arg(long)]
    max_units: Option<u64>,

    /// Give up after this many integration steps
    #[arg(long)]
    max_steps: Option<u64>,

    /// Print the sampled trajectory instead of only the summary
    #[arg(long, default_value_t = false)]
    trajectory: bool,

    /// Print every Nth trajectory sample (the last one is always printed)
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    every: u64,

    /// Comma-separated marble counts to compare, run in parallel
    #[arg(long, value_delimiter = ',')]
    sweep: Vec<String>,

    /// Emit JSON instead of tables
    #[arg(long, default_value_t = false)]
    json: bool,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            target_distance: self.distance,
            dt: self.dt,
            throw_rate: self.throw_rate,
            fatigue: self.fatigue,
            unit_mass: self.unit_mass,
            ejection_velocity: self.ejection_velocity,
            dry_mass: self.dry_mass,
            rate_threshold: self.rate_threshold,
            rest_duration: self.rest,
            max_units: self.max_units,
            max_steps: self.max_steps,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let base = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let driver = SimulationDriver::new(base.with_overrides(&cli.overrides()))?;

    if !cli.sweep.is_empty() {
        return run_sweep(&driver, &cli.sweep, cli.json);
    }

    let units = resolve_units(cli.units.as_deref());
    if cli.trajectory {
        print_trajectory(&driver, units, cli.every, cli.json)
    } else {
        let summary = driver.summarize(units)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(driver.config(), &summary);
        }
        Ok(())
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse the host-supplied count, substituting the default (and saying so)
/// when it is missing or malformed.
fn resolve_units(raw: Option<&str>) -> UnitCount {
    match raw.map(str::parse::<UnitCount>) {
        Some(Ok(units)) => units,
        Some(Err(err)) => {
            warn!(%err, default = DEFAULT_UNITS, "unusable marble count, using default");
            UnitCount::from(DEFAULT_UNITS)
        }
        None => {
            warn!(default = DEFAULT_UNITS, "no marble count given, using default");
            UnitCount::from(DEFAULT_UNITS)
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_summary(config: &SimConfig, s: &RunSummary) {
    let marbles_kg = s.units.get() as f64 * config.unit_mass;
    let duration = s.duration();

    println!();
    println!("====================================================================");
    println!("  MARBLE RUN — {} marbles", s.units);
    println!("====================================================================");
    println!();
    println!("  Vehicle");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Dry mass:      {:>10.3} kg   Marbles:      {:>10.3} kg",
        config.dry_mass, marbles_kg
    );
    println!(
        "  Throw rate:    {:>10.3} /s   Fatigue:      {:>10.3} /s",
        config.throw_rate, config.fatigue
    );
    println!(
        "  Rest below:    {:>10.3} /s   Rest for:     {:>10.1} s",
        config.rate_threshold, config.rest_duration
    );
    println!();

    println!("  Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for e in s.events.iter().filter(|e| {
        !matches!(e.kind, EventKind::ThrowStart { .. } | EventKind::Fatigued)
    }) {
        println!(
            "  {:<10} t={:>14.1}s   x={:>14.1}m   v={:>10.5}m/s",
            event_label(e.kind),
            e.time,
            e.position,
            e.velocity
        );
    }
    println!();

    println!("  Result");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Total time:     {:>16.2} s  ({} days {} hours)",
        s.elapsed, duration.days, duration.hours
    );
    println!("  Final velocity: {:>16.5} m/s", s.final_velocity);
    println!("  Distance:       {:>16.3} km", s.distance / 1000.0);
    println!("  Throw bouts:    {:>16}", s.throwing_intervals);
    println!();
    println!("  Simulation: {} steps, dt={} s", s.steps, config.dt);
    println!("====================================================================");
    println!();
}

fn event_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::ThrowStart { .. } => "THROW",
        EventKind::Fatigued => "REST",
        EventKind::Exhausted => "EMPTY",
        EventKind::Arrived => "ARRIVED",
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Throwing => "THROW",
        Phase::Resting => "REST",
        Phase::Coasting => "COAST",
        Phase::Done => "DONE",
    }
}

fn print_trajectory(
    driver: &SimulationDriver,
    units: UnitCount,
    every: u64,
    json: bool,
) -> anyhow::Result<()> {
    let print = |s: &Sample| -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string(s)?);
        } else {
            println!(
                "  {:>14.1}  {:>16.3}  {:>11.6}  {:>11.3e}  {:>11.4}  {:>6}",
                s.time,
                s.pos,
                s.vel,
                s.accel,
                s.mass,
                phase_label(s.phase)
            );
        }
        Ok(())
    };

    if !json {
        println!(
            "  {:>14}  {:>16}  {:>11}  {:>11}  {:>11}  {:>6}",
            "t (s)", "x (m)", "v (m/s)", "a (m/s^2)", "mass (kg)", "phase"
        );
        println!("  {}", "─".repeat(78));
    }

    let mut pending = None;
    for (i, sample) in driver.trajectory(units)?.enumerate() {
        let sample = sample?;
        if i as u64 % every == 0 {
            print(&sample)?;
            pending = None;
        } else {
            pending = Some(sample);
        }
    }
    if let Some(last) = pending {
        print(&last)?;
    }
    Ok(())
}

fn run_sweep(driver: &SimulationDriver, raw: &[String], json: bool) -> anyhow::Result<()> {
    let counts: Vec<UnitCount> = raw
        .iter()
        .filter_map(|r| match r.parse::<UnitCount>() {
            Ok(units) => Some(units),
            Err(err) => {
                warn!(%err, "skipping sweep entry");
                None
            }
        })
        .collect();

    let results = driver.sweep(&counts);

    if !json {
        println!(
            "  {:>8}  {:>18}  {:>14}  {:>8}",
            "marbles", "time (s)", "v (m/s)", "bouts"
        );
        println!("  {}", "─".repeat(56));
    }
    for (units, result) in counts.iter().zip(results) {
        match (result, json) {
            (Ok(s), true) => println!("{}", serde_json::to_string(&s)?),
            (Ok(s), false) => println!(
                "  {:>8}  {:>18.2}  {:>14.6}  {:>8}",
                s.units, s.elapsed, s.final_velocity, s.throwing_intervals
            ),
            (Err(err), true) => println!(
                "{}",
                serde_json::json!({ "units": units, "error": err.to_string() })
            ),
            (Err(err), false) => println!("  {:>8}  {}", units, err),
        }
    }
    Ok(())
}
