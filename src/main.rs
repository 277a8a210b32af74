mod simulation;

use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use simulation::{ControlMode, PhaseTopology, SimConfig, Simulation, TrafficPreset};

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Signalized intersection microsimulation")]
struct Cli {
    /// Simulated seconds to run
    #[arg(long, default_value = "300")]
    duration: f64,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Signal control mode: pretimed, actuated, or adaptive
    #[arg(long, default_value = "pretimed")]
    mode: String,

    /// Phase topology: simple, protected-left, or approach
    #[arg(long, default_value = "simple")]
    topology: String,

    /// Traffic preset: light, balanced, ns-heavy, ew-heavy, or rush-hour
    #[arg(long)]
    preset: Option<String>,

    /// Seconds of simulated time between progress reports
    #[arg(long, default_value = "30")]
    report_every: f64,
}

fn parse_mode(name: &str) -> Result<ControlMode> {
    Ok(match name {
        "pretimed" => ControlMode::Pretimed,
        "actuated" => ControlMode::Actuated,
        "adaptive" => ControlMode::Adaptive,
        other => bail!("unknown control mode: {}", other),
    })
}

fn parse_topology(name: &str) -> Result<PhaseTopology> {
    Ok(match name {
        "simple" => PhaseTopology::Simple,
        "protected-left" => PhaseTopology::ProtectedLeft,
        "approach" => PhaseTopology::ApproachByApproach,
        other => bail!("unknown phase topology: {}", other),
    })
}

fn parse_preset(name: &str) -> Result<TrafficPreset> {
    Ok(match name {
        "light" => TrafficPreset::Light,
        "balanced" => TrafficPreset::Balanced,
        "ns-heavy" => TrafficPreset::NsHeavy,
        "ew-heavy" => TrafficPreset::EwHeavy,
        "rush-hour" => TrafficPreset::RushHour,
        other => bail!("unknown traffic preset: {}", other),
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = SimConfig::default();
    config.mode = parse_mode(&cli.mode)?;
    config.topology = parse_topology(&cli.topology)?;

    let mut sim = match cli.seed {
        Some(seed) => Simulation::new_with_seed(config, seed),
        None => Simulation::new(config),
    };
    if let Some(name) = &cli.preset {
        sim.apply_preset(parse_preset(name)?);
    }
    sim.start_measurement(cli.duration);

    info!(
        "running {}s at dt={}s, mode={}, topology={}",
        cli.duration, cli.delta, cli.mode, cli.topology
    );

    let total_ticks = (cli.duration / cli.delta as f64).ceil() as u64;
    let report_ticks = (cli.report_every / cli.delta as f64).max(1.0) as u64;

    for tick in 1..=total_ticks {
        sim.tick(cli.delta);
        if tick % report_ticks == 0 {
            info!(
                "t={:.0}s phase={} vehicles={} completed={}",
                sim.time,
                sim.controller.phase_label(),
                sim.vehicles.len(),
                sim.metrics.total_vehicles
            );
        }
    }

    sim.print_summary();
    Ok(())
}
