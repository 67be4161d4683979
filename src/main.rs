mod simulation;

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use simulation::{Scenario, SimWorld};

#[derive(Parser)]
#[command(name = "crossing_sim")]
#[command(about = "Traffic crossing simulation: narrow bridges, ferries and crossroads")]
struct Cli {
    /// Scenario file to run; reads stdin when omitted
    scenario: Option<PathBuf>,

    /// Generate a random scenario with this many cars instead of reading one
    #[arg(long)]
    random_cars: Option<usize>,

    /// Seed for the random scenario generator
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Print the scenario text and exit without running it
    #[arg(long)]
    print_scenario: bool,

    /// Suppress live event output
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scenario = load_scenario(&cli)?;

    if cli.print_scenario {
        print!("{}", scenario);
        return Ok(());
    }

    let world = SimWorld::new(&scenario, !cli.quiet)?;
    info!("running {} cars", world.car_count());

    let started = Instant::now();
    let events = world.run()?;
    info!(
        "simulation complete: {} cars, {} events, {:.1?} wall time",
        scenario.cars.len(),
        events.len(),
        started.elapsed()
    );
    Ok(())
}

fn load_scenario(cli: &Cli) -> Result<Scenario> {
    if let Some(car_count) = cli.random_cars {
        return Ok(Scenario::random(cli.seed, car_count));
    }
    let text = match &cli.scenario {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read scenario from stdin")?;
            buffer
        }
    };
    Scenario::parse(&text)
}
