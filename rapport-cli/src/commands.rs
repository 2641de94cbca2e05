use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use rapport_config::{ConfigError, ServiceRange, SimulationConfig};
use rapport_simulator::Simulation;

#[derive(Parser)]
#[command(name = "rapport", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Advance the clock step by step, printing one table row per step
    Step(SimArgs),
    /// Run to completion and print the cumulative summary
    Auto(AutoArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// Optional YAML profile; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Expected arrivals per unit time
    #[arg(long = "lambda")]
    pub lambda_rate: Option<f64>,

    /// Total simulated time
    #[arg(long)]
    pub duration: Option<f64>,

    /// Clock step width
    #[arg(long)]
    pub delta: Option<f64>,

    /// Pending-report buffer capacity
    #[arg(long)]
    pub buffer_size: Option<usize>,

    /// Number of serving devices
    #[arg(long)]
    pub devices: Option<usize>,

    /// Number of report sources
    #[arg(long)]
    pub sources: Option<usize>,

    /// Lower bound of the service-time range
    #[arg(long)]
    pub service_min: Option<f64>,

    /// Upper bound of the service-time range
    #[arg(long)]
    pub service_max: Option<f64>,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct AutoArgs {
    #[command(flatten)]
    pub sim: SimArgs,

    /// Emit the summary as YAML instead of the text block
    #[arg(long)]
    pub yaml: bool,
}

impl SimArgs {
    fn into_config(self) -> Result<SimulationConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load_from_path(path)?,
            None => SimulationConfig::load()?,
        };

        if let Some(v) = self.lambda_rate {
            config.lambda_rate = v;
        }
        if let Some(v) = self.duration {
            config.duration = v;
        }
        if let Some(v) = self.delta {
            config.delta = v;
        }
        if let Some(v) = self.buffer_size {
            config.buffer_size = v;
        }
        if let Some(v) = self.devices {
            config.devices = v;
        }
        if let Some(v) = self.sources {
            config.sources = v;
        }
        let ServiceRange { min, max } = config.service_range;
        config.service_range = ServiceRange {
            min: self.service_min.unwrap_or(min),
            max: self.service_max.unwrap_or(max),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.ensure_valid()?;
        Ok(config)
    }
}

pub fn run_command(cli: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match cli.command {
        Commands::Step(args) => {
            let mut sim = Simulation::new(&args.into_config()?)?;
            run_step_mode(&mut sim)
        }
        Commands::Auto(args) => {
            let yaml = args.yaml;
            let mut sim = Simulation::new(&args.sim.into_config()?)?;
            run_auto_mode(&mut sim, yaml)
        }
    }
}

fn run_step_mode(sim: &mut Simulation) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    println!(
        "{:>6} | Events{} | Buffer{} | Operators{} | %rej",
        "t",
        " ".repeat(54),
        " ".repeat(31),
        " ".repeat(31)
    );
    println!("{}", "-".repeat(140));

    while !sim.is_complete() {
        let events = sim.step()?;
        let labels = events
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        println!(
            "{:6.2} | {:60} | {:37} | {:40} | {:5.2}",
            sim.clock(),
            labels,
            sim.buffer_state(),
            sim.devices_state(),
            sim.rejection_percent()
        );
    }
    Ok(())
}

fn run_auto_mode(
    sim: &mut Simulation,
    yaml: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    while !sim.is_complete() {
        sim.step()?;
    }

    let summary = sim.summary();
    if yaml {
        print!("{}", serde_yaml::to_string(&summary)?);
        return Ok(());
    }

    println!("\n---- Summary ----");
    println!("Generated: {}", summary.generated);
    println!("Started:   {}", summary.started);
    println!("Completed: {}", summary.completed);
    println!("Rejected:  {}", summary.rejected);
    println!("Rejection %: {:.2}", summary.rejection_percent);
    println!("Average waiting time: {:.2}", sim.average_waiting_time());
    println!("Average service time: {:.2}", sim.average_service_time());
    for source in &summary.sources {
        println!(
            "  {}: generated={} rejected={} completed={} avg_wait={:.2} avg_service={:.2}",
            source.name,
            source.generated,
            source.rejected,
            source.completed,
            source.average_waiting_time,
            source.average_service_time
        );
    }
    for device in &summary.devices {
        println!(
            "  {}: processed={} busy={:.2} utilization={:.1}%",
            device.name, device.processed, device.busy_time, device.utilization_percent
        );
    }
    println!("-----------------\n");
    Ok(())
}
