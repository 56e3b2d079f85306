//! IBM Quantum backend implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use qrun_hal::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, Capabilities, ExecutionResult,
    GateSet, HalError, HalResult, JobId, JobStatus, SelectionCriteria, Topology, ValidationResult,
    least_busy,
};
use qrun_ir::Circuit;

use crate::api::{BackendInfo, IbmClient, LEGACY_ENDPOINT};
use crate::auth::IbmCredentials;
use crate::error::{IbmError, IbmResult};

/// How long device status is trusted before refreshing.
const BACKEND_INFO_TTL: Duration = Duration::from_secs(300);

/// Connection options beyond credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbmOptions {
    /// API endpoint; the default depends on the credential kind.
    pub endpoint: Option<String>,
    /// Provider-side transpiler optimization level (0-3).
    pub optimization_level: u8,
}

impl Default for IbmOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            optimization_level: 1,
        }
    }
}

/// Classical register a submitted job reports under.
#[derive(Debug, Clone)]
struct SubmittedRegister {
    name: String,
    width: usize,
}

/// A single IBM Quantum device.
///
/// Circuits are sent as OpenQASM 3 to the Sampler primitive and transpiled
/// for the device by IBM.
pub struct IbmBackend {
    client: Arc<IbmClient>,
    target: String,
    capabilities: Capabilities,
    optimization_level: u8,
    backend_info: Arc<RwLock<Option<(BackendInfo, Instant)>>>,
    registers: Mutex<HashMap<String, SubmittedRegister>>,
}

impl IbmBackend {
    /// Connect to `target` with credentials from the environment.
    pub async fn connect(target: &str) -> IbmResult<Self> {
        Self::connect_with(&IbmCredentials::from_env()?, target, IbmOptions::default()).await
    }

    pub async fn connect_with(
        credentials: &IbmCredentials,
        target: &str,
        options: IbmOptions,
    ) -> IbmResult<Self> {
        let client = IbmClient::connect(credentials, options.endpoint.as_deref()).await?;
        let info = client.get_backend(target).await?;
        Ok(Self::from_info(Arc::new(client), info, options.optimization_level))
    }

    /// Connect to the operational hardware device with the shortest queue
    /// that has at least `min_qubits` qubits.
    pub async fn least_busy(min_qubits: u32) -> IbmResult<Self> {
        Self::least_busy_with(
            &IbmCredentials::from_env()?,
            min_qubits,
            IbmOptions::default(),
        )
        .await
    }

    #[instrument(skip(credentials, options))]
    pub async fn least_busy_with(
        credentials: &IbmCredentials,
        min_qubits: u32,
        options: IbmOptions,
    ) -> IbmResult<Self> {
        let client = IbmClient::connect(credentials, options.endpoint.as_deref()).await?;
        let backends = client.list_backends().await?;
        let info = pick_least_busy(backends, min_qubits)?;
        info!(
            backend = %info.name,
            pending_jobs = info.pending_jobs,
            "selected least busy backend"
        );
        Ok(Self::from_info(Arc::new(client), info, options.optimization_level))
    }

    /// Reattach to the device that ran `job_id`.
    pub async fn for_job(
        credentials: &IbmCredentials,
        job_id: &str,
        options: IbmOptions,
    ) -> IbmResult<Self> {
        let client = IbmClient::connect(credentials, options.endpoint.as_deref()).await?;
        let job = client.get_job_status(job_id).await?;
        let target = job
            .backend
            .ok_or_else(|| IbmError::BackendNotFound(format!("job {job_id} has no backend")))?;
        let info = client.get_backend(&target).await?;
        Ok(Self::from_info(Arc::new(client), info, options.optimization_level))
    }

    fn from_info(client: Arc<IbmClient>, info: BackendInfo, optimization_level: u8) -> Self {
        let capabilities = capabilities_from_info(&info);
        Self {
            client,
            target: info.name.clone(),
            capabilities,
            optimization_level,
            backend_info: Arc::new(RwLock::new(Some((info, Instant::now())))),
            registers: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the device jobs are sent to.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn optimization_level(&self) -> u8 {
        self.optimization_level
    }

    /// Device configuration and status, refreshed after five minutes.
    pub async fn backend_info(&self) -> IbmResult<BackendInfo> {
        {
            let cached = self.backend_info.read().await;
            if let Some((info, fetched_at)) = cached.as_ref() {
                if fetched_at.elapsed() < BACKEND_INFO_TTL {
                    return Ok(info.clone());
                }
            }
        }

        let info = self.client.get_backend(&self.target).await?;
        *self.backend_info.write().await = Some((info.clone(), Instant::now()));
        Ok(info)
    }

    async fn refresh_backend_info(&self) -> IbmResult<BackendInfo> {
        *self.backend_info.write().await = None;
        self.backend_info().await
    }

    fn register_for(&self, job_id: &str) -> Option<SubmittedRegister> {
        self.registers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }
}

/// Least busy hardware device among `backends`.
fn pick_least_busy(backends: Vec<BackendInfo>, min_qubits: u32) -> IbmResult<BackendInfo> {
    let candidates: Vec<_> = backends.iter().map(BackendInfo::to_candidate).collect();
    let chosen = least_busy(&candidates, &SelectionCriteria::hardware(min_qubits))
        .map_err(|e| IbmError::BackendUnavailable(e.to_string()))?;
    backends
        .into_iter()
        .find(|b| b.name == chosen.name)
        .ok_or(IbmError::BackendNotFound(chosen.name))
}

fn capabilities_from_info(info: &BackendInfo) -> Capabilities {
    let mut capabilities = Capabilities::ibm(info.name.clone(), info.num_qubits);
    if !info.basis_gates.is_empty() {
        capabilities.gate_set = GateSet {
            native: info.basis_gates.clone(),
            ..GateSet::ibm_heron()
        };
    }
    if !info.coupling_map.is_empty() {
        capabilities = capabilities.with_topology(Topology::custom(
            info.coupling_map.iter().map(|&[a, b]| (a, b)).collect(),
        ));
    }
    if let Some(max_shots) = info.max_shots {
        capabilities = capabilities.with_max_shots(max_shots);
    }
    capabilities.is_simulator = info.simulator;
    capabilities
}

#[async_trait]
impl Backend for IbmBackend {
    fn name(&self) -> &str {
        &self.target
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        match self.backend_info().await {
            Ok(info) if info.operational => Ok(BackendAvailability {
                is_available: true,
                pending_jobs: Some(info.pending_jobs),
                status_message: info.status_msg,
            }),
            Ok(info) => Ok(BackendAvailability::unavailable(
                info.status_msg
                    .unwrap_or_else(|| "backend offline".to_string()),
            )),
            Err(e) => {
                warn!(backend = %self.target, error = %e, "availability check failed");
                Ok(BackendAvailability::unavailable("failed to query backend"))
            }
        }
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

    #[instrument(skip(self, circuit), fields(backend = %self.target, circuit = %circuit.name()))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, {} accepts 1..={}",
                self.target, self.capabilities.max_shots
            )));
        }
        self.validate(circuit).await?.into_result()?;

        let info = self.refresh_backend_info().await?;
        if !info.operational {
            return Err(IbmError::BackendUnavailable(format!(
                "{} is not operational ({})",
                self.target,
                info.status_msg.as_deref().unwrap_or("no status message")
            ))
            .into());
        }

        let qasm = qrun_qasm3::emit(circuit).map_err(IbmError::from)?;
        debug!(qasm_len = qasm.len(), "emitted OpenQASM 3");

        let submitted = self
            .client
            .submit_sampler_job(&self.target, &qasm, shots, self.optimization_level)
            .await
            .map_err(|e| match e {
                e if e.is_auth() => HalError::from(e),
                e => HalError::SubmissionFailed(e.to_string()),
            })?;

        if let Some(creg) = circuit.cregs().first() {
            self.registers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    submitted.id.clone(),
                    SubmittedRegister {
                        name: creg.name.clone(),
                        width: creg.size as usize,
                    },
                );
        }

        info!(job_id = %submitted.id, shots, "submitted job");
        Ok(JobId::new(submitted.id))
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let response = self.client.get_job_status(&job_id.0).await?;
        Ok(response.to_job_status())
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let status = self.status(job_id).await?;
        match status {
            JobStatus::Completed => {}
            JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
            JobStatus::Cancelled => return Err(HalError::JobCancelled),
            other => {
                return Err(HalError::JobNotCompleted(format!(
                    "job {job_id} is {}",
                    other.name()
                )));
            }
        }

        let response = self.client.get_job_results(&job_id.0).await?;
        let register = self.register_for(&job_id.0);
        let counts = response
            .to_counts(
                register.as_ref().map(|r| r.name.as_str()),
                register.as_ref().map(|r| r.width),
            )
            .filter(|c| !c.is_empty())
            .ok_or_else(|| IbmError::NoResults(job_id.0.clone()))?;

        let shots = u32::try_from(counts.total_shots()).unwrap_or(u32::MAX);
        let mut result = ExecutionResult::new(counts, shots).with_backend(self.target.clone());
        if let Some(metadata) = response
            .results
            .first()
            .and_then(|r| r.metadata.clone())
        {
            result = result.with_metadata("sampler", metadata);
        }
        Ok(result)
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        self.client.cancel_job(&job_id.0).await?;
        info!(job_id = %job_id, "cancelled job");
        Ok(())
    }
}

impl BackendFactory for IbmBackend {
    /// Build a backend for the device in `config.name` from a bearer token.
    ///
    /// Device details are fetched lazily; API-key authentication needs the
    /// async constructors.
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let token = config
            .token
            .as_deref()
            .ok_or_else(|| HalError::Configuration("IBM backend needs a token".into()))?;
        let endpoint = config.endpoint.as_deref().unwrap_or(LEGACY_ENDPOINT);
        let client = IbmClient::with_token(endpoint, token)?;
        let optimization_level = config
            .extra_u64("optimization_level")
            .map(|level| {
                u8::try_from(level)
                    .ok()
                    .filter(|l| *l <= 3)
                    .ok_or_else(|| {
                        HalError::Configuration(format!(
                            "optimization_level must be 0-3, got {level}"
                        ))
                    })
            })
            .transpose()?
            .unwrap_or(1);

        Ok(Self {
            client: Arc::new(client),
            capabilities: Capabilities::ibm(config.name.clone(), 133),
            target: config.name,
            optimization_level,
            backend_info: Arc::new(RwLock::new(None)),
            registers: Mutex::new(HashMap::new()),
        })
    }
}
