use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dtn_radio_simulator::config::scenario::{ReportKind, ScenarioConfig};
use dtn_radio_simulator::geometry::{Coordinate, Room};
use dtn_radio_simulator::simulation::Simulation;

/// Run a single delay-tolerant wireless network scenario to completion.
#[derive(Parser, Debug)]
#[command(name = "simulate")]
struct Cli {
    /// Path to the scenario configuration file.
    scenario_file: PathBuf,

    /// Override the scenario's configured RNG seed, for sweeping without
    /// editing the file.
    #[arg(long)]
    seed: Option<u64>,

    /// Override the scenario's configured report directory.
    #[arg(long)]
    report_dir: Option<PathBuf>,
}

fn rectangular_room(width_m: f64, height_m: f64) -> Room {
    Room::new(vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(width_m, 0.0),
        Coordinate::new(width_m, height_m),
        Coordinate::new(0.0, height_m),
    ])
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let text = std::fs::read_to_string(&cli.scenario_file).with_context(|| format!("reading scenario file {}", cli.scenario_file.display()))?;
    let mut config = ScenarioConfig::parse(&text)?;
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }
    let report_dir = cli.report_dir.map(|p| p.display().to_string()).or_else(|| config.report_dir.clone());

    log::info!("loaded scenario `{}`: {} hosts, endTime={}s", config.name, config.nrof_hosts, config.end_time_s);

    let room = rectangular_room(config.world_width_m, config.world_height_m);
    let simulation = Simulation::build(&config, room)?;

    log::info!("starting simulation");
    let output = simulation.run();
    log::info!("simulation finished after {} ticks", output.ticks_run);

    if let Some(dir) = report_dir {
        std::fs::create_dir_all(&dir).with_context(|| format!("creating report directory {dir}"))?;
        if config.reports.contains(&ReportKind::Unified) {
            std::fs::write(format!("{dir}/{}.unified.txt", config.name), &output.unified_report).with_context(|| "writing unified report")?;
        }
        if config.reports.contains(&ReportKind::Adjacency) {
            std::fs::write(format!("{dir}/{}.adjacency.txt", config.name), &output.adjacency_report).with_context(|| "writing adjacency report")?;
        }
    }

    println!(
        "hosts={} messagesCreated={} messagesDelivered={} ticks={} endTime={}s",
        config.nrof_hosts, output.messages_created, output.messages_delivered, output.ticks_run, config.end_time_s
    );
    Ok(())
}
