mod case;

use case::{Case, CliResult};
use clap::{Parser, Subcommand};
use pd_chem::{CompositionMap, Layer};
use pd_core::units::gpa;
use pd_partition::{ElementPartitionModel, PartitionCoefficients, PartitionTables};
use pd_solver::{EquilibriumSolver, SolveOutput};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "pd-cli")]
#[command(about = "Core/mantle differentiation - metal-silicate equilibrium solver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Equilibrate a body described by a case file
    Solve {
        /// Path to the case YAML file
        case_path: PathBuf,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Keep per-iteration coefficients (JSON output only)
        #[arg(long)]
        history: bool,
    },
    /// Partition coefficients against a pure-iron metal
    Coefficients {
        /// Path to the case YAML file
        case_path: PathBuf,
    },
    /// Peridotite liquidus temperature
    Liquidus {
        /// Pressure in GPa
        #[arg(long)]
        pressure: f64,
    },
    /// Print partition tables as YAML
    Tables {
        /// Tables file to validate and print (defaults to the built-in set)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            case_path,
            json,
            history,
        } => cmd_solve(&case_path, json, history),
        Commands::Coefficients { case_path } => cmd_coefficients(&case_path),
        Commands::Liquidus { pressure } => cmd_liquidus(pressure),
        Commands::Tables { path } => cmd_tables(path.as_deref()),
    }
}

fn cmd_solve(case_path: &Path, json: bool, history: bool) -> CliResult<()> {
    let case = Case::load(case_path)?;
    let bulk = case.bulk_composition()?;
    let model = case.model()?;
    let solver = EquilibriumSolver::new(&model, case.solver.clone())?;

    info!(case = %case.name, pressure_gpa = case.pressure_gpa, fo2 = case.fo2, "solving");
    let output = solver.solve(&case.request(&bulk, history))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary(&case, &output);
    }
    Ok(())
}

fn cmd_coefficients(case_path: &Path) -> CliResult<()> {
    let case = Case::load(case_path)?;
    let model = case.model()?;
    let conditions = case.conditions();
    let ds = model.compute_coefficients(&conditions, None);

    println!(
        "P = {:.4} GPa, T = {:.1} K, fO2 = {:+.2} (IW)",
        case.pressure_gpa,
        model.temperature(&conditions),
        case.fo2
    );
    print_coefficients(&ds);
    Ok(())
}

fn cmd_liquidus(pressure: f64) -> CliResult<()> {
    let pressure = pd_core::ensure_positive(pressure, "pressure")?;
    let model = ElementPartitionModel::builtin()?;
    println!(
        "Liquidus at {:.4} GPa: {:.1} K",
        pressure,
        model.liquidus(gpa(pressure))
    );
    Ok(())
}

fn cmd_tables(path: Option<&Path>) -> CliResult<()> {
    let tables = match path {
        Some(path) => PartitionTables::load_yaml(path)?,
        None => PartitionTables::builtin()?,
    };
    print!("{}", tables.to_yaml()?);
    Ok(())
}

fn print_summary(case: &Case, output: &SolveOutput) {
    if !case.name.is_empty() {
        println!("Case: {}", case.name);
    }
    println!("Outcome: {:?} ({})", output.outcome, output.message);
    println!("  Iterations: {}", output.diagnostics.iterations);
    if let Some(frozen) = output.diagnostics.o_cap_frozen_at {
        println!(
            "  O cap frozen at iteration {} ({:.4})",
            frozen, output.diagnostics.o_cap
        );
    }
    if !output.is_success() {
        return;
    }

    if let Some(cnf) = output.core_number_fraction {
        println!("  Core number fraction: {:.4}", cnf);
    }
    if let Some(cmf) = output.core_mass_fraction() {
        println!("  Core mass fraction:   {:.4}", cmf);
    }
    if let Some(ds) = &output.coefficients {
        print_coefficients(ds);
    }
    if let Some(composition) = &output.composition {
        print_layers(composition);
    }
}

fn print_coefficients(ds: &PartitionCoefficients) {
    println!("Partition coefficients:");
    for (element, d) in ds.iter() {
        println!(
            "  {:<3} {:<11} {:>12.4e}",
            element.symbol(),
            element.display_name(),
            d
        );
    }
}

fn print_layers(composition: &CompositionMap) {
    println!("{:<4} {:>10} {:>10} {:>10}", "", "bulk", "core", "mantle");
    for element in composition.elements() {
        println!(
            "{:<4} {:>10.5} {:>10.5} {:>10.5}",
            element.symbol(),
            composition.get(element, Layer::Bulk),
            composition.get(element, Layer::Core),
            composition.get(element, Layer::Mantle)
        );
    }
}
