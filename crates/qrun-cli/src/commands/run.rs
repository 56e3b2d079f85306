//! Run command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use qrun_adapter_ibm::{DASHBOARD_URL, IbmBackend};
use qrun_adapter_sim::SimulatorBackend;
use qrun_hal::{Backend, WaitOptions};
use qrun_ir::{NoiseModel, draw};

use super::common::{
    cloud_wait_options, export, print_results, program_circuit, spinner, wait_with_spinner,
};
use crate::config::{BackendKind, Config};

/// Options of `qrun run`, merged with the config file by [`execute`].
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub backend: Option<BackendKind>,
    pub device: Option<String>,
    pub shots: Option<u32>,
    pub seed: Option<u64>,
    pub noise: Option<f64>,
    pub endpoint: Option<String>,
    pub optimization_level: Option<u8>,
    pub json: Option<PathBuf>,
    pub svg: Option<PathBuf>,
    pub no_wait: bool,
}

/// Execute the run command.
pub async fn execute(config: &Config, args: RunArgs) -> Result<()> {
    let circuit = program_circuit()?;
    println!("Quantum circuit:");
    println!("{}", draw(&circuit));

    let shots = config.shots(args.shots);
    let kind = effective_backend(config.backend(args.backend), args.noise);
    if args.no_wait && kind != BackendKind::Ibm {
        anyhow::bail!("--no-wait only applies to IBM Quantum jobs");
    }

    let backend: Box<dyn Backend> = match kind {
        BackendKind::Sim => Box::new(with_seed(SimulatorBackend::new(), args.seed)),
        BackendKind::NoisySim => {
            let noise = noise_model(args.noise)?;
            Box::new(with_seed(SimulatorBackend::with_noise(noise)?, args.seed))
        }
        BackendKind::Ibm => Box::new(connect_ibm(config, &args, circuit.num_qubits()).await?),
    };

    let avail = backend.availability().await?;
    if !avail.is_available {
        anyhow::bail!(
            "Backend '{}' is not available: {}",
            backend.name(),
            avail.status_message.as_deref().unwrap_or("offline")
        );
    }

    let job_id = backend.submit(&circuit, shots).await?;
    println!(">>> Job ID: {job_id}");
    let status = backend.status(&job_id).await?;
    println!(">>> Job Status: {}", status.name());

    if args.no_wait {
        println!(
            "{} Fetch the result later with {}",
            style("→").cyan().bold(),
            style(format!("qrun result {job_id}")).yellow()
        );
        return Ok(());
    }

    let options = if kind == BackendKind::Ibm {
        println!("Waiting for the job to finish...");
        println!("You can watch the status of the job on {DASHBOARD_URL}");
        cloud_wait_options()
    } else {
        WaitOptions::default()
    };

    let result = wait_with_spinner(backend.as_ref(), &job_id, options).await?;
    print_results(&result);
    export(&result, args.json.as_deref(), args.svg.as_deref())
}

/// `--noise` turns the plain simulator into the noisy one.
fn effective_backend(kind: BackendKind, noise: Option<f64>) -> BackendKind {
    match (kind, noise) {
        (BackendKind::Sim, Some(_)) => BackendKind::NoisySim,
        (kind, _) => kind,
    }
}

/// `--noise P`: depolarizing probability `P` after every gate and readout
/// flip probability `P`. Without it, typical superconducting figures.
fn noise_model(noise: Option<f64>) -> Result<NoiseModel> {
    match noise {
        Some(p) => NoiseModel::depolarizing(p, p)
            .and_then(|model| model.with_readout_error(p))
            .with_context(|| format!("Invalid noise probability {p}")),
        None => Ok(NoiseModel::superconducting()),
    }
}

fn with_seed(backend: SimulatorBackend, seed: Option<u64>) -> SimulatorBackend {
    match seed {
        Some(seed) => backend.with_seed(seed),
        None => backend,
    }
}

async fn connect_ibm(config: &Config, args: &RunArgs, num_qubits: usize) -> Result<IbmBackend> {
    let credentials = config.ibm_credentials()?;
    let options = config.ibm_options(args.endpoint.as_deref(), args.optimization_level);

    let connecting = spinner("Connecting to IBM Quantum...");
    let backend = match config.device(args.device.as_deref()) {
        Some(device) => IbmBackend::connect_with(&credentials, &device, options)
            .await
            .with_context(|| format!("Failed to connect to {device}")),
        None => {
            let min_qubits = u32::try_from(num_qubits).unwrap_or(u32::MAX);
            IbmBackend::least_busy_with(&credentials, min_qubits, options)
                .await
                .context("Failed to find a least busy backend")
        }
    };
    connecting.finish_and_clear();

    let backend = backend?;
    println!(
        "{} Using backend {}",
        style("→").cyan().bold(),
        style(backend.target()).yellow()
    );
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_promotes_simulator() {
        assert_eq!(
            effective_backend(BackendKind::Sim, Some(0.01)),
            BackendKind::NoisySim
        );
        assert_eq!(effective_backend(BackendKind::Sim, None), BackendKind::Sim);
        assert_eq!(
            effective_backend(BackendKind::Ibm, Some(0.01)),
            BackendKind::Ibm
        );
    }

    #[test]
    fn test_noise_model() {
        let model = noise_model(Some(0.02)).unwrap();
        assert_eq!(model.single_qubit_error, 0.02);
        assert_eq!(model.two_qubit_error, 0.02);
        assert_eq!(model.readout_error, 0.02);

        assert!(noise_model(Some(1.5)).is_err());
        assert!(!noise_model(None).unwrap().is_ideal());
    }

    #[tokio::test]
    async fn test_run_on_simulator() {
        let args = RunArgs {
            shots: Some(256),
            seed: Some(7),
            ..RunArgs::default()
        };
        execute(&Config::default(), args).await.unwrap();
    }

    #[tokio::test]
    async fn test_no_wait_rejected_for_simulator() {
        let args = RunArgs {
            no_wait: true,
            ..RunArgs::default()
        };
        let err = execute(&Config::default(), args).await.unwrap_err();
        assert!(err.to_string().contains("--no-wait"));
    }
}
