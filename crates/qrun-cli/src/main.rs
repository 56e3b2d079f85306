//! qrun command-line interface.
//!
//! Builds a three-qubit superposition and entanglement circuit, runs it on a
//! local simulator or an IBM Quantum device and plots the counts.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qrun_cli::commands::{backends, draw, result, run, status};
use qrun_cli::config::{BackendKind, CONFIG_ENV, Config};

/// qrun - run a small entangling circuit on IBM Quantum or a local simulator
#[derive(Parser)]
#[command(name = "qrun")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.qrun/config.yaml)
    #[arg(long, env = CONFIG_ENV, global = true)]
    config: Option<PathBuf>,

    /// IBM Quantum API endpoint
    #[arg(long, env = "IBM_QUANTUM_ENDPOINT", global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, run and plot the circuit
    Run {
        /// Where to run
        #[arg(short, long, value_enum)]
        backend: Option<BackendKind>,

        /// IBM device; the least busy one is picked when omitted
        #[arg(short, long)]
        device: Option<String>,

        /// Number of shots [default: 4096]
        #[arg(short, long)]
        shots: Option<u32>,

        /// Simulator RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Gate and readout error probability for the noisy simulator
        #[arg(long)]
        noise: Option<f64>,

        /// IBM transpiler optimization level
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
        optimization_level: Option<u8>,

        /// Write counts as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the histogram as SVG
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Submit and exit without waiting (IBM only)
        #[arg(long)]
        no_wait: bool,
    },

    /// Print the circuit diagram
    Draw {
        /// Print OpenQASM 3 instead
        #[arg(long)]
        qasm: bool,
    },

    /// List IBM Quantum backends
    Backends {
        /// Only devices with at least this many qubits
        #[arg(long, default_value = "1")]
        min_qubits: u32,
    },

    /// Query the status of an IBM Quantum job
    Status {
        /// Job ID
        job_id: String,
    },

    /// Retrieve results for a completed IBM Quantum job
    Result {
        /// Job ID
        job_id: String,

        /// Write counts as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write the histogram as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = execute(cli).await;

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let endpoint = cli.endpoint.as_deref();

    match cli.command {
        Commands::Run {
            backend,
            device,
            shots,
            seed,
            noise,
            optimization_level,
            json,
            svg,
            no_wait,
        } => {
            let args = run::RunArgs {
                backend,
                device,
                shots,
                seed,
                noise,
                endpoint: cli.endpoint.clone(),
                optimization_level,
                json,
                svg,
                no_wait,
            };
            run::execute(&config, args).await
        }

        Commands::Draw { qasm } => draw::execute(qasm),

        Commands::Backends { min_qubits } => backends::execute(&config, endpoint, min_qubits).await,

        Commands::Status { job_id } => status::execute(&config, endpoint, &job_id).await,

        Commands::Result { job_id, json, svg } => {
            result::execute(&config, endpoint, &job_id, json.as_deref(), svg.as_deref()).await
        }
    }
}
