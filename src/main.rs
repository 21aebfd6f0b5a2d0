use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use finsim::api::cli::{
    MonteCarloArgs, SimulateArgs, build_monte_carlo_config, build_simulation_input,
};
use finsim::api::run_http_server;
use finsim::core::{RateCatalog, run_monte_carlo, simulate};
use finsim::logging;

#[derive(Parser, Debug)]
#[command(
    name = "finsim",
    about = "Compound interest, inflation, retirement and Monte Carlo projections"
)]
struct Cli {
    #[arg(long, global = true, help = "JSON rate catalog replacing the built-in one")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON API.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Run one projection and print the result as JSON.
    Simulate(SimulateArgs),
    /// Run a seeded Monte Carlo analysis and print the summary as JSON.
    MonteCarlo {
        #[command(flatten)]
        simulate: SimulateArgs,
        #[command(flatten)]
        options: MonteCarloArgs,
    },
}

fn load_catalog(path: Option<&PathBuf>) -> Result<RateCatalog, String> {
    match path {
        Some(path) => RateCatalog::load(path).map_err(|e| e.to_string()),
        None => Ok(RateCatalog::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

async fn run(cli: Cli) -> Result<(), String> {
    let catalog = load_catalog(cli.catalog.as_ref())?;
    match cli.command {
        Command::Serve { port } => run_http_server(port, catalog)
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Simulate(args) => {
            let input = build_simulation_input(&args).map_err(|e| e.to_string())?;
            print_json(&simulate(&input, &catalog))
        }
        Command::MonteCarlo { simulate, options } => {
            let input = build_simulation_input(&simulate).map_err(|e| e.to_string())?;
            let config = build_monte_carlo_config(&options).map_err(|e| e.to_string())?;
            print_json(&run_monte_carlo(&input, &catalog, &config))
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("Error: {msg}");
            ExitCode::FAILURE
        }
    }
}
