//! Enactive Agent Simulator
//!
//! Runs an experiment preset for a number of ticks and writes the agents'
//! rolling traces and the full event log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use enact_core::config::SimConfig;
use enact_core::{BoredomStrategy, Experiment, SimResult, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "enactive_sim")]
#[command(about = "Simulates enactive agents in a grid world")]
struct Args {
    /// Tuning file; tuning.toml is used when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Experiment preset to run
    #[arg(long, value_enum)]
    experiment: Option<Experiment>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Boredom handler given to every agent
    #[arg(long, value_enum)]
    boredom: Option<BoredomStrategy>,

    /// Where to write the per-agent trace JSON
    #[arg(long)]
    traces: Option<PathBuf>,

    /// Where to write the JSONL event log
    #[arg(long)]
    events: Option<PathBuf>,
}

impl Args {
    fn load_config(&self) -> Result<SimConfig, enact_core::ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::load_or_default(),
        };

        if let Some(experiment) = self.experiment {
            config.simulation.experiment = experiment;
        }
        if let Some(ticks) = self.ticks {
            config.simulation.ticks = ticks;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(strategy) = self.boredom {
            config.boredom.strategy = strategy;
        }
        if let Some(path) = &self.traces {
            config.trace.traces_path = Some(path.clone());
        }
        if let Some(path) = &self.events {
            config.trace.events_path = Some(path.clone());
        }
        Ok(config)
    }
}

fn run(config: &SimConfig) -> SimResult<()> {
    let mut sim = Simulation::from_config(config)?;
    let summary = sim.run(config.simulation.ticks)?;

    println!();
    println!(
        "Simulation complete. Ran {} ticks, {} enactions ({} surprises), mean valence {:.3}.",
        summary.ticks,
        summary.enactions,
        summary.surprises,
        summary.mean_valence()
    );

    for agent in sim.world().agents() {
        let label = agent.agent_label();
        let position = sim
            .world()
            .position(agent)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let last = sim
            .recorder()
            .get(&label)
            .and_then(|trace| trace.enaction.back())
            .map(|entry| format!("{} ({:.2})", entry.0, entry.1))
            .unwrap_or_default();
        println!("  {} at {}: last enacted {}", label, position, last);
    }

    if let Some(path) = &config.trace.traces_path {
        sim.write_traces(path)?;
        println!("Wrote traces to {}", path.display());
    }
    if let Some(path) = &config.trace.events_path {
        println!("Wrote {} events to {}", sim.events_logged(), path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: could not load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Enactive Agent Simulator");
    println!("========================");
    println!("Experiment: {}", config.simulation.experiment.as_str());
    println!("Seed: {}", config.simulation.seed);
    println!("Ticks: {}", config.simulation.ticks);
    println!("Boredom: {}", config.boredom.strategy.as_str());

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
