//! dps - Resolve a scenario file and print its DPS breakdown

use clap::{Parser, ValueEnum};
use dps_cli::scenario::Scenario;
use dps_core::CombatConstants;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "dps", version, about = "Analytical DPS estimate for a character build")]
struct Args {
    /// Scenario TOML file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Combat constants TOML, replacing the scenario's own
    #[arg(short, long)]
    constants: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Also compute stat weights
    #[arg(short, long)]
    weights: bool,

    /// Amount each stat is raised by for stat weights
    #[arg(long, default_value_t = 1.0)]
    stat_delta: f64,

    /// Log resolver iterations
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let mut scenario = match Scenario::from_file(&args.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.scenario.display(), e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.constants {
        match CombatConstants::load(path) {
            Ok(constants) => scenario.constants = constants,
            Err(e) => {
                eprintln!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let report = match dps_cli::run(&scenario, args.weights, args.stat_delta) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match args.output {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
    }
}
