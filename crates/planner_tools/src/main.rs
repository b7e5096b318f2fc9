//! Build Order Planner - command line

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use planner_core::optimize::{Constraint, EvaluationBudget, Optimizer, SearchControl, Target, Unbounded};
use planner_core::race::Race;
use planner_tools::build_order::BuildOrderFile;
use planner_tools::error::Result;
use planner_tools::report::{optimize_summary, transcript, RunReport};
use planner_tools::validate::{load_catalog, validate_catalog};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "planner")]
#[command(about = "Simulate and optimize RTS build orders")]
struct Cli {
    /// Directory of race RON files to use instead of the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the catalog
    Validate,
    /// List the catalog entries of a race
    List {
        /// Race: terran, protoss or zerg
        #[arg(long)]
        race: Race,
    },
    /// Simulate a build order file
    Simulate {
        /// Build order file (RON)
        file: PathBuf,
        /// Print a JSON report instead of a transcript
        #[arg(long)]
        json: bool,
    },
    /// Optimize a build order file
    Optimize {
        /// Build order file (RON)
        file: PathBuf,
        /// Targets, run in order (fastest, supply_cap, supply:N, count:NAME:K,
        /// supply_structures, workers)
        #[arg(long = "target", default_value = "fastest")]
        targets: Vec<Target>,
        /// Constraints as INDEX:KIND (after, at, before, remove)
        #[arg(long = "constraint")]
        constraints: Vec<Constraint>,
        /// Stop after this many simulations
        #[arg(long)]
        max_evaluations: Option<usize>,
        /// Print a JSON report instead of a transcript
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let catalog = load_catalog(cli.catalog.as_deref())?;

    match cli.command {
        Commands::Validate => {
            tracing::info!("Validating catalog");
            validate_catalog(&catalog)?;
            println!("catalog is valid ({} races)", catalog.races().count());
        }
        Commands::List { race } => {
            for entry in &catalog.race(race)?.entries {
                println!(
                    "{:<32} {:<10} {:>4}m {:>4}g {:>4}s",
                    entry.name,
                    entry.kind,
                    entry.minerals,
                    entry.gas,
                    entry.build_time
                );
            }
        }
        Commands::Simulate { file, json } => {
            let build = BuildOrderFile::load(&file)?;
            let logic = build.logic(catalog)?;
            let actions = build.actions(&logic)?;
            let run = logic.simulated_build_order(&actions);
            if json {
                println!("{}", RunReport::new(&run).to_json()?);
            } else {
                print!("{}", transcript(&run));
            }
        }
        Commands::Optimize {
            file,
            targets,
            constraints,
            max_evaluations,
            json,
        } => optimize(&file, catalog, &targets, &constraints, max_evaluations, json)?,
    }
    Ok(())
}

fn optimize(
    file: &Path,
    catalog: planner_core::catalog::Catalog,
    targets: &[Target],
    constraints: &[Constraint],
    max_evaluations: Option<usize>,
    json: bool,
) -> Result<()> {
    let build = BuildOrderFile::load(file)?;
    let logic = build.logic(catalog)?;
    let actions = build.actions(&logic)?;

    let mut budget;
    let mut unbounded = Unbounded;
    let control: &mut dyn SearchControl = match max_evaluations {
        Some(limit) => {
            budget = EvaluationBudget::new(limit);
            &mut budget
        }
        None => &mut unbounded,
    };

    let report = Optimizer::new(&logic).optimize(&actions, targets, constraints, control);
    if json {
        println!("{}", RunReport::optimized(&report).to_json()?);
    } else {
        print!("{}", optimize_summary(&report));
    }
    Ok(())
}
