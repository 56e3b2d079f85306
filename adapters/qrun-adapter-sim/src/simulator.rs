//! Simulator backend implementation.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use qrun_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, Counts,
    ExecutionResult, HalError, HalResult, Job, JobId, JobStatus, ValidationResult,
};
use qrun_ir::{Circuit, InstructionKind, NoiseModel};

use crate::statevector::Statevector;

/// Default qubit limit; a 24-qubit state takes 256 MiB.
pub const DEFAULT_MAX_QUBITS: u32 = 24;

struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

type JobTable = Arc<Mutex<FxHashMap<String, SimJob>>>;

/// Local statevector simulator.
///
/// Noiseless by default. With a [`NoiseModel`] it behaves like a noisy
/// device: depolarizing errors after gates and flipped readouts.
pub struct SimulatorBackend {
    config: BackendConfig,
    capabilities: Capabilities,
    noise: NoiseModel,
    seed: Option<u64>,
    jobs: JobTable,
}

impl SimulatorBackend {
    /// Noiseless simulator.
    pub fn new() -> Self {
        Self::build(BackendConfig::new("simulator"), DEFAULT_MAX_QUBITS, NoiseModel::ideal())
    }

    /// Simulator that applies `noise`. Rates outside `[0, 1]` are a
    /// configuration error.
    pub fn with_noise(noise: NoiseModel) -> HalResult<Self> {
        noise
            .validate()
            .map_err(|e| HalError::Configuration(e.to_string()))?;
        Ok(Self::build(
            BackendConfig::new("noisy_simulator"),
            DEFAULT_MAX_QUBITS,
            noise,
        ))
    }

    /// Simulator with a smaller qubit limit, capped at [`DEFAULT_MAX_QUBITS`].
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self::build(
            BackendConfig::new("simulator"),
            max_qubits.min(DEFAULT_MAX_QUBITS),
            NoiseModel::ideal(),
        )
    }

    /// Seed every job's random source, making counts reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn noise(&self) -> &NoiseModel {
        &self.noise
    }

    fn build(config: BackendConfig, max_qubits: u32, noise: NoiseModel) -> Self {
        let capabilities = Capabilities::simulator(max_qubits).with_name(config.name.clone());
        Self {
            config,
            capabilities,
            noise,
            seed: None,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_shots(&self, shots: u32) -> HalResult<()> {
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, simulator accepts 1..={}",
                self.capabilities.max_shots
            )));
        }
        Ok(())
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulate `shots` executions of `circuit` and tally the classical bits.
///
/// Circuits that measure only at the end on a run without gate errors are
/// evolved once and sampled; everything else runs one trajectory per shot.
#[instrument(skip_all, fields(circuit = %circuit.name(), shots = shots))]
pub fn run_simulation<R: Rng>(
    circuit: &Circuit,
    shots: u32,
    noise: &NoiseModel,
    rng: &mut R,
) -> HalResult<Counts> {
    let gate_noise = noise.single_qubit_error > 0.0 || noise.two_qubit_error > 0.0;
    if !gate_noise && circuit.has_terminal_measurements_only() {
        debug!("sampling a single statevector");
        sample_final_state(circuit, shots, noise.readout_error, rng)
    } else {
        debug!("simulating per-shot trajectories");
        Ok(run_trajectories(circuit, shots, noise, rng))
    }
}

fn sample_final_state<R: Rng>(
    circuit: &Circuit,
    shots: u32,
    readout_error: f64,
    rng: &mut R,
) -> HalResult<Counts> {
    let mut sv = Statevector::new(circuit.num_qubits());
    // Later measurements into the same bit overwrite earlier ones.
    let mut measured: Vec<(usize, usize)> = Vec::new();
    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.0 as usize).collect();
                sv.apply_gate(gate, &qubits);
            }
            InstructionKind::Measure => {
                measured.push((inst.qubits[0].0 as usize, inst.clbits[0].0 as usize));
            }
            InstructionKind::Reset | InstructionKind::Barrier => {}
        }
    }

    let sampler = sv.sampler()?;
    let mut outcomes: FxHashMap<usize, u64> = FxHashMap::default();
    let mut counts = Counts::new();
    let mut bits = vec![false; circuit.num_clbits()];
    for _ in 0..shots {
        let index = sampler.sample(rng);
        if readout_error > 0.0 {
            bits.fill(false);
            for &(q, c) in &measured {
                bits[c] = (index >> q) & 1 == 1;
                if rng.gen_bool(readout_error) {
                    bits[c] = !bits[c];
                }
            }
            counts.insert(bitstring(&bits), 1);
        } else {
            *outcomes.entry(index).or_insert(0) += 1;
        }
    }

    for (index, n) in outcomes {
        bits.fill(false);
        for &(q, c) in &measured {
            bits[c] = (index >> q) & 1 == 1;
        }
        counts.insert(bitstring(&bits), n);
    }
    Ok(counts)
}

fn run_trajectories<R: Rng>(
    circuit: &Circuit,
    shots: u32,
    noise: &NoiseModel,
    rng: &mut R,
) -> Counts {
    let instructions: Vec<_> = circuit.instructions().collect();
    let mut counts = Counts::new();
    let mut bits = vec![false; circuit.num_clbits()];

    for shot in 0..shots {
        let mut sv = Statevector::new(circuit.num_qubits());
        bits.fill(false);

        for inst in &instructions {
            let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.0 as usize).collect();
            match &inst.kind {
                InstructionKind::Gate(gate) => {
                    sv.apply_gate(gate, &qubits);
                    let p = if qubits.len() == 1 {
                        noise.single_qubit_error
                    } else {
                        noise.two_qubit_error
                    };
                    if p > 0.0 {
                        for &q in &qubits {
                            depolarize(&mut sv, q, p, rng);
                        }
                    }
                }
                InstructionKind::Measure => {
                    let mut outcome = sv.measure(qubits[0], rng);
                    if noise.readout_error > 0.0 && rng.gen_bool(noise.readout_error) {
                        outcome = !outcome;
                    }
                    bits[inst.clbits[0].0 as usize] = outcome;
                }
                InstructionKind::Reset => sv.reset(qubits[0], rng),
                InstructionKind::Barrier => {}
            }
        }

        counts.insert(bitstring(&bits), 1);
        if shot > 0 && shot % 1000 == 0 {
            debug!(shot, "trajectories completed");
        }
    }
    counts
}

/// With probability `p`, apply a uniformly random Pauli to `qubit`.
fn depolarize<R: Rng>(sv: &mut Statevector, qubit: usize, p: f64, rng: &mut R) {
    if !rng.gen_bool(p) {
        return;
    }
    match rng.gen_range(0..3) {
        0 => sv.apply_x(qubit),
        1 => sv.apply_y(qubit),
        _ => sv.apply_z(qubit),
    }
}

/// Drive one job of the table through `Running` to its final state.
///
/// A panicking `simulate` fails the job instead of leaving it `Running`.
fn run_job<F>(jobs: &JobTable, id: &str, shots: u32, backend: String, simulate: F)
where
    F: FnOnce() -> HalResult<Counts>,
{
    {
        let mut table = jobs.lock().unwrap_or_else(PoisonError::into_inner);
        match table.get_mut(id) {
            Some(entry) => {
                if !entry.job.transition(JobStatus::Running) {
                    return;
                }
            }
            None => return,
        }
    }

    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(simulate)).unwrap_or_else(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(HalError::Backend(format!("simulation panicked: {msg}")))
    });
    let elapsed = start.elapsed();

    let mut table = jobs.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(entry) = table.get_mut(id) else {
        return;
    };
    match outcome {
        Ok(counts) => {
            if entry.job.transition(JobStatus::Completed) {
                let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
                entry.result = Some(
                    ExecutionResult::new(counts, shots)
                        .with_backend(backend)
                        .with_execution_time(millis),
                );
                debug!(job_id = %id, ?elapsed, "simulation completed");
            }
        }
        Err(e) => {
            warn!(job_id = %id, error = %e, "simulation failed");
            entry.job.transition(JobStatus::Failed(e.to_string()));
        }
    }
}

/// Classical bits as a string with bit 0 rightmost.
fn bitstring(bits: &[bool]) -> String {
    bits.iter()
        .rev()
        .map(|&b| if b { '1' } else { '0' })
        .collect()
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        let pending = self
            .lock_jobs()
            .values()
            .filter(|j| j.job.status.is_pending())
            .count();
        Ok(BackendAvailability {
            pending_jobs: Some(u32::try_from(pending).unwrap_or(u32::MAX)),
            ..BackendAvailability::always_available()
        })
    }

    async fn validate(&self, circuit: &Circuit) -> HalResult<ValidationResult> {
        let mut result = self.capabilities.check(circuit);
        if !circuit.instructions().any(|inst| inst.is_measure()) {
            let reason = "circuit has no measurements".to_string();
            result = match result {
                ValidationResult::Valid => ValidationResult::Invalid {
                    reasons: vec![reason],
                },
                ValidationResult::Invalid { mut reasons } => {
                    reasons.push(reason);
                    ValidationResult::Invalid { reasons }
                }
            };
        }
        Ok(result)
    }

    #[instrument(skip(self, circuit), fields(backend = %self.config.name))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if circuit.num_qubits() > self.capabilities.num_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "circuit has {} qubits but the simulator supports {}",
                circuit.num_qubits(),
                self.capabilities.num_qubits
            )));
        }
        self.check_shots(shots)?;
        self.validate(circuit).await?.into_result()?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend(self.config.name.clone());
        self.lock_jobs()
            .insert(job_id.0.clone(), SimJob { job, result: None });
        debug!(job_id = %job_id, "submitted job");

        let jobs = Arc::clone(&self.jobs);
        let circuit = circuit.clone();
        let noise = self.noise;
        let seed = self.seed;
        let backend = self.config.name.clone();
        let id = job_id.0.clone();

        tokio::task::spawn_blocking(move || {
            run_job(&jobs, &id, shots, backend, || {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                run_simulation(&circuit, shots, &noise, &mut rng)
            });
        });

        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let jobs = self.lock_jobs();
        let entry = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match (&entry.job.status, &entry.result) {
            (JobStatus::Completed, Some(result)) => Ok(result.clone()),
            (JobStatus::Failed(msg), _) => Err(HalError::JobFailed(msg.clone())),
            (JobStatus::Cancelled, _) => Err(HalError::JobCancelled),
            _ => Err(HalError::JobNotCompleted(job_id.0.clone())),
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.lock_jobs();
        let entry = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if !entry.job.transition(JobStatus::Cancelled) {
            debug!(job_id = %job_id, status = %entry.job.status, "job already finished");
        }
        Ok(())
    }
}

impl BackendFactory for SimulatorBackend {
    /// Recognized extras: `max_qubits`, `seed`, and `noise` (a serialized
    /// [`NoiseModel`]).
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let max_qubits = match config.extra_u64("max_qubits") {
            Some(n) => u32::try_from(n)
                .ok()
                .filter(|&n| (1..=DEFAULT_MAX_QUBITS).contains(&n))
                .ok_or_else(|| {
                    HalError::Configuration(format!(
                        "max_qubits {n} out of range 1..={DEFAULT_MAX_QUBITS}"
                    ))
                })?,
            None => DEFAULT_MAX_QUBITS,
        };
        let noise = match config.extra.get("noise") {
            Some(value) => {
                let noise: NoiseModel = serde_json::from_value(value.clone())?;
                noise
                    .validate()
                    .map_err(|e| HalError::Configuration(e.to_string()))?;
                noise
            }
            None => NoiseModel::ideal(),
        };
        let seed = config.extra_u64("seed");

        let mut backend = Self::build(config, max_qubits, noise);
        backend.seed = seed;
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use qrun_hal::WaitOptions;
    use qrun_ir::{ClbitId, QubitId};

    fn fast() -> WaitOptions {
        WaitOptions::default().with_poll_interval(Duration::from_millis(5))
    }

    #[test]
    fn test_bitstring_order() {
        assert_eq!(bitstring(&[true, false, false]), "001");
        assert_eq!(bitstring(&[false, true, true]), "110");
        assert_eq!(bitstring(&[]), "");
    }

    #[test]
    fn test_program_outcomes() {
        let circuit = Circuit::superposition_entanglement().unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let counts = run_simulation(&circuit, 4096, &NoiseModel::ideal(), &mut rng).unwrap();

        assert_eq!(counts.total_shots(), 4096);
        let keys: Vec<_> = counts.sorted_by_key().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["000", "010", "101", "111"]);
        for (_, n) in counts.iter() {
            assert!((850..=1200).contains(&n), "count {n} far from 1024");
        }
    }

    #[test]
    fn test_trajectories_agree_with_sampling() {
        // A reset forces the trajectory path.
        let mut circuit = Circuit::with_size("reset", 2, 2);
        circuit
            .x(QubitId(1))
            .unwrap()
            .reset(QubitId(1))
            .unwrap()
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure_register("q", "c")
            .unwrap();
        assert!(!circuit.has_terminal_measurements_only());

        let mut rng = StdRng::seed_from_u64(3);
        let counts = run_simulation(&circuit, 500, &NoiseModel::ideal(), &mut rng).unwrap();
        assert_eq!(counts.get("00") + counts.get("11"), 500);
    }

    #[test]
    fn test_mid_circuit_measurement() {
        let mut circuit = Circuit::with_size("mid", 1, 2);
        circuit
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .x(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(1))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let counts = run_simulation(&circuit, 50, &NoiseModel::ideal(), &mut rng).unwrap();
        assert_eq!(counts.get("01"), 50);
    }

    #[test]
    fn test_unmeasured_bits_are_zero() {
        let mut circuit = Circuit::with_size("partial", 2, 3);
        circuit
            .x(QubitId(0))
            .unwrap()
            .x(QubitId(1))
            .unwrap()
            .measure(QubitId(1), ClbitId(2))
            .unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let counts = run_simulation(&circuit, 10, &NoiseModel::ideal(), &mut rng).unwrap();
        assert_eq!(counts.get("100"), 10);
    }

    #[test]
    fn test_noise_produces_impossible_outcomes() {
        let circuit = Circuit::superposition_entanglement().unwrap();
        let noise = NoiseModel::depolarizing(0.05, 0.2)
            .unwrap()
            .with_readout_error(0.05)
            .unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let counts = run_simulation(&circuit, 2000, &noise, &mut rng).unwrap();
        assert_eq!(counts.total_shots(), 2000);
        let impossible: u64 = ["001", "011", "100", "110"]
            .iter()
            .map(|k| counts.get(k))
            .sum();
        assert!(impossible > 0);
    }

    #[test]
    fn test_readout_only_uses_sampling_path() {
        let circuit = Circuit::ghz(2).unwrap();
        let noise = NoiseModel::ideal().with_readout_error(1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let counts = run_simulation(&circuit, 100, &noise, &mut rng).unwrap();
        // Every bit flipped: 00 -> 11, 11 -> 00
        assert_eq!(counts.get("00") + counts.get("11"), 100);
    }

    #[tokio::test]
    async fn test_simulator_capabilities() {
        let backend = SimulatorBackend::new();
        let caps = backend.capabilities();
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, DEFAULT_MAX_QUBITS);
        assert_eq!(backend.name(), "simulator");
        assert!(backend.availability().await.unwrap().is_available);
    }

    #[tokio::test]
    async fn test_submit_and_wait() {
        let backend = SimulatorBackend::new().with_seed(1);
        let circuit = Circuit::superposition_entanglement().unwrap();

        let job_id = backend.submit(&circuit, 1024).await.unwrap();
        let result = backend.wait_with(&job_id, fast()).await.unwrap();

        assert_eq!(result.shots, 1024);
        assert_eq!(result.counts.total_shots(), 1024);
        assert_eq!(result.backend.as_deref(), Some("simulator"));
        assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_seed_makes_runs_reproducible() {
        let backend = SimulatorBackend::new().with_seed(1234);
        let circuit = Circuit::superposition_entanglement().unwrap();

        let a = backend.submit(&circuit, 512).await.unwrap();
        let b = backend.submit(&circuit, 512).await.unwrap();
        let a = backend.wait_with(&a, fast()).await.unwrap();
        let b = backend.wait_with(&b, fast()).await.unwrap();
        assert_eq!(a.counts, b.counts);
    }

    #[tokio::test]
    async fn test_rejects_bad_requests() {
        let backend = SimulatorBackend::with_max_qubits(5);
        let circuit = Circuit::with_size("test", 10, 0);
        assert!(matches!(
            backend.submit(&circuit, 100).await,
            Err(HalError::CircuitTooLarge(_))
        ));

        let circuit = Circuit::bell().unwrap();
        assert!(matches!(
            backend.submit(&circuit, 0).await,
            Err(HalError::InvalidShots(_))
        ));

        let mut unmeasured = Circuit::with_size("unmeasured", 1, 1);
        unmeasured.h(QubitId(0)).unwrap();
        assert!(matches!(
            backend.submit(&unmeasured, 10).await,
            Err(HalError::InvalidCircuit(msg)) if msg.contains("no measurements")
        ));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = SimulatorBackend::new();
        let id = JobId::new("missing");
        assert!(matches!(
            backend.status(&id).await,
            Err(HalError::JobNotFound(_))
        ));
        assert!(matches!(
            backend.cancel(&id).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_completion_keeps_result() {
        let backend = SimulatorBackend::new();
        let circuit = Circuit::bell().unwrap();
        let job_id = backend.submit(&circuit, 100).await.unwrap();
        backend.wait_with(&job_id, fast()).await.unwrap();

        backend.cancel(&job_id).await.unwrap();
        assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Completed);
        assert!(backend.result(&job_id).await.is_ok());
    }

    #[test]
    fn test_invalid_noise_rejected() {
        let noise = NoiseModel {
            readout_error: 1.5,
            ..NoiseModel::ideal()
        };
        assert!(matches!(
            SimulatorBackend::with_noise(noise),
            Err(HalError::Configuration(msg)) if msg.contains("readout error")
        ));
        let backend = SimulatorBackend::with_noise(NoiseModel::superconducting()).unwrap();
        assert_eq!(backend.name(), "noisy_simulator");
    }

    #[test]
    fn test_max_qubits_capped() {
        let backend = SimulatorBackend::with_max_qubits(64);
        assert_eq!(backend.capabilities().num_qubits, DEFAULT_MAX_QUBITS);

        let config = BackendConfig::new("wide").with_extra("max_qubits", serde_json::json!(64));
        assert!(matches!(
            SimulatorBackend::from_config(config),
            Err(HalError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_panicking_simulation_fails_job() {
        let backend = SimulatorBackend::new();
        let id = JobId::new("doomed");
        backend.lock_jobs().insert(
            id.0.clone(),
            SimJob {
                job: Job::new(id.clone(), 10),
                result: None,
            },
        );

        run_job(&backend.jobs, &id.0, 10, "simulator".into(), || {
            panic!("amplitude buffer exhausted")
        });

        assert!(matches!(
            backend.status(&id).await.unwrap(),
            JobStatus::Failed(msg) if msg.contains("panicked: amplitude buffer exhausted")
        ));
        assert!(matches!(
            backend.wait_with(&id, fast()).await,
            Err(HalError::JobFailed(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let config = BackendConfig::new("fake_device")
            .with_extra("max_qubits", serde_json::json!(8))
            .with_extra("seed", serde_json::json!(7))
            .with_extra(
                "noise",
                serde_json::json!({"two_qubit_error": 0.02, "readout_error": 0.01}),
            );
        let backend = SimulatorBackend::from_config(config).unwrap();
        assert_eq!(backend.name(), "fake_device");
        assert_eq!(backend.capabilities().num_qubits, 8);
        assert_eq!(backend.noise().two_qubit_error, 0.02);
        assert_eq!(backend.seed, Some(7));

        let bad = BackendConfig::new("bad")
            .with_extra("noise", serde_json::json!({"readout_error": 2.0}));
        assert!(matches!(
            SimulatorBackend::from_config(bad),
            Err(HalError::Configuration(_))
        ));
    }
}
