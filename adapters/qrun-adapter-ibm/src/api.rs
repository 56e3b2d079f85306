//! IBM Quantum Runtime REST client.
//!
//! Covers what a Sampler run needs: IAM token exchange, device listing,
//! configuration and status, job submission, polling, results and
//! cancellation. The IBM Cloud endpoint (`quantum.cloud.ibm.com/api`) is the
//! default; a direct bearer token talks to the legacy endpoint unless another
//! endpoint is configured.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Response, header};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use qrun_hal::{BackendCandidate, Counts, JobStatus};

use crate::auth::IbmCredentials;
use crate::error::{IbmError, IbmResult};

/// IBM Quantum Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Legacy IBM Quantum API endpoint, used with direct tokens.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com/runtime";

/// Where jobs can be watched in a browser.
pub const DASHBOARD_URL: &str = "https://quantum.ibm.com/";

const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

const IBM_API_VERSION: &str = "2025-05-01";

const USER_AGENT: &str = concat!("qrun/", env!("CARGO_PKG_VERSION"));

/// IBM Quantum API client.
pub struct IbmClient {
    client: Client,
    endpoint: String,
    cloud_api: bool,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("cloud_api", &self.cloud_api)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl IbmClient {
    /// Authenticate and build a client.
    ///
    /// API keys are exchanged for an IAM bearer token; `endpoint` overrides
    /// the default for the credential kind.
    pub async fn connect(credentials: &IbmCredentials, endpoint: Option<&str>) -> IbmResult<Self> {
        match credentials {
            IbmCredentials::ApiKey {
                api_key,
                service_crn,
            } => {
                let bearer = exchange_api_key(api_key).await?;
                let mut headers = default_headers(&bearer)?;
                headers.insert(
                    header::HeaderName::from_static("service-crn"),
                    header::HeaderValue::from_str(service_crn)
                        .map_err(|_| IbmError::InvalidCredential("service CRN"))?,
                );
                headers.insert(
                    header::HeaderName::from_static("ibm-api-version"),
                    header::HeaderValue::from_static(IBM_API_VERSION),
                );
                Ok(Self {
                    client: build_client(headers)?,
                    endpoint: endpoint.unwrap_or(DEFAULT_ENDPOINT).to_string(),
                    cloud_api: true,
                })
            }
            IbmCredentials::Token(token) => {
                Self::with_token(endpoint.unwrap_or(LEGACY_ENDPOINT), token)
            }
        }
    }

    /// Client that sends `token` as a bearer token, without IAM exchange.
    pub fn with_token(endpoint: impl Into<String>, token: &str) -> IbmResult<Self> {
        Ok(Self {
            client: build_client(default_headers(token)?)?,
            endpoint: endpoint.into(),
            cloud_api: false,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether this client talks to the IBM Cloud API.
    pub fn is_cloud_api(&self) -> bool {
        self.cloud_api
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.endpoint.trim_end_matches('/'))
    }

    /// All devices visible to the account, with configuration and status.
    ///
    /// Devices whose details cannot be fetched are skipped.
    #[instrument(skip(self))]
    pub async fn list_backends(&self) -> IbmResult<Vec<BackendInfo>> {
        let response = check(self.client.get(self.url("backends")).send().await?).await?;
        let devices: DevicesResponse = response.json().await?;
        debug!(count = devices.devices.len(), "listed devices");

        let mut backends = Vec::with_capacity(devices.devices.len());
        for device in &devices.devices {
            match self.get_backend(device.name()).await {
                Ok(info) => backends.push(info),
                Err(e) => warn!(backend = device.name(), error = %e, "skipping backend"),
            }
        }
        Ok(backends)
    }

    /// Configuration and status of one device.
    #[instrument(skip(self))]
    pub async fn get_backend(&self, name: &str) -> IbmResult<BackendInfo> {
        let config: BackendConfigResponse = self.get_backend_configuration(name).await?;
        let status = match self.get_backend_status(name).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(backend = name, error = %e, "status unavailable, assuming operational");
                None
            }
        };
        Ok(BackendInfo::from_parts(config, status))
    }

    async fn get_backend_configuration(&self, name: &str) -> IbmResult<BackendConfigResponse> {
        let url = self.url(&format!("backends/{name}/configuration"));
        let response = check(self.client.get(url).send().await?)
            .await
            .map_err(|e| not_found(e, || IbmError::BackendNotFound(name.to_string())))?;
        Ok(response.json().await?)
    }

    async fn get_backend_status(&self, name: &str) -> IbmResult<BackendStatusResponse> {
        let url = self.url(&format!("backends/{name}/status"));
        let response = check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    /// Submit one circuit to the Sampler primitive.
    #[instrument(skip(self, qasm))]
    pub async fn submit_sampler_job(
        &self,
        backend: &str,
        qasm: &str,
        shots: u32,
        optimization_level: u8,
    ) -> IbmResult<SubmitResponse> {
        let body = sampler_request(backend, qasm, shots, optimization_level);
        let response = check(self.client.post(self.url("jobs")).json(&body).send().await?).await?;
        let submitted: SubmitResponse = response.json().await?;
        debug!(job_id = %submitted.id, "job submitted");
        Ok(submitted)
    }

    pub async fn get_job_status(&self, job_id: &str) -> IbmResult<JobStatusResponse> {
        let response = check(self.client.get(self.url(&format!("jobs/{job_id}"))).send().await?)
            .await
            .map_err(|e| not_found(e, || IbmError::JobNotFound(job_id.to_string())))?;
        Ok(response.json().await?)
    }

    pub async fn get_job_results(&self, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = self.url(&format!("jobs/{job_id}/results"));
        let response = check(self.client.get(url).send().await?)
            .await
            .map_err(|e| not_found(e, || IbmError::JobNotFound(job_id.to_string())))?;
        Ok(response.json().await?)
    }

    pub async fn cancel_job(&self, job_id: &str) -> IbmResult<()> {
        let url = self.url(&format!("jobs/{job_id}/cancel"));
        check(self.client.post(url).send().await?)
            .await
            .map_err(|e| not_found(e, || IbmError::JobNotFound(job_id.to_string())))?;
        Ok(())
    }
}

async fn exchange_api_key(api_key: &str) -> IbmResult<String> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .post(IAM_TOKEN_URL)
        .header(header::ACCEPT, "application/json")
        .form(&[
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", api_key),
        ])
        .send()
        .await
        .map_err(|e| IbmError::IamTokenExchange(e.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(IbmError::IamTokenExchange(format!(
            "IAM returned {status}: {}",
            api_error_message(&body)
        )));
    }

    let token: IamTokenResponse = response
        .json()
        .await
        .map_err(|e| IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}")))?;
    debug!(expires_in = ?token.expires_in, "obtained IAM token");
    Ok(token.access_token)
}

fn default_headers(bearer: &str) -> IbmResult<header::HeaderMap> {
    let mut headers = header::HeaderMap::new();
    let mut auth = header::HeaderValue::from_str(&format!("Bearer {bearer}"))
        .map_err(|_| IbmError::InvalidCredential("token"))?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    Ok(headers)
}

fn build_client(headers: header::HeaderMap) -> IbmResult<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(10))
        .build()?)
}

/// Turn a non-success response into [`IbmError::Api`].
async fn check(response: Response) -> IbmResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IbmError::Api {
        status: status.as_u16(),
        message: api_error_message(&body),
    })
}

fn not_found(error: IbmError, replacement: impl FnOnce() -> IbmError) -> IbmError {
    match error {
        IbmError::Api { status: 404, .. } => replacement(),
        other => other,
    }
}

/// Best human-readable message in an API error body.
fn api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(default)]
        errors: Vec<ErrorItem>,
        #[serde(default)]
        message: Option<String>,
        #[serde(default, rename = "errorMessage")]
        error_message: Option<String>,
    }
    #[derive(Deserialize)]
    struct ErrorItem {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join("; "),
        Ok(ErrorBody {
            message: Some(m), ..
        })
        | Ok(ErrorBody {
            error_message: Some(m),
            ..
        }) => m,
        _ if body.trim().is_empty() => "no body".to_string(),
        _ => body.trim().to_string(),
    }
}

/// Sampler V2 job body with a single PUB `[qasm, {}, shots]`.
pub fn sampler_request(
    backend: &str,
    qasm: &str,
    shots: u32,
    optimization_level: u8,
) -> serde_json::Value {
    serde_json::json!({
        "program_id": "sampler",
        "backend": backend,
        "params": {
            "version": 2,
            "pubs": [[qasm, {}, shots]],
            "options": {
                "default_shots": shots,
                "optimization_level": optimization_level,
            },
        },
    })
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<DeviceEntry>,
}

/// The cloud API lists objects, the legacy API bare names.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeviceEntry {
    Name(String),
    Object { name: String },
}

impl DeviceEntry {
    fn name(&self) -> &str {
        match self {
            DeviceEntry::Name(name) | DeviceEntry::Object { name } => name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendConfigResponse {
    backend_name: String,
    n_qubits: u32,
    #[serde(default)]
    basis_gates: Vec<String>,
    #[serde(default)]
    coupling_map: Option<Vec<[u32; 2]>>,
    #[serde(default)]
    processor_type: Option<ProcessorType>,
    #[serde(default)]
    simulator: Option<bool>,
    #[serde(default)]
    max_shots: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BackendStatusResponse {
    state: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    length_queue: u64,
}

/// Processor family, e.g. Eagle or Heron.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessorType {
    pub family: String,
    #[serde(default)]
    pub revision: Option<serde_json::Value>,
}

impl ProcessorType {
    /// Family and revision the way IBM labels them, e.g. `Heron r2`.
    pub fn label(&self) -> String {
        match &self.revision {
            Some(serde_json::Value::Number(n)) => format!("{} r{n}", self.family),
            Some(serde_json::Value::String(r)) if !r.is_empty() => {
                format!("{} r{}", self.family, r.trim_start_matches('r'))
            }
            _ => self.family.clone(),
        }
    }
}

/// Configuration and live status of a device.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: String,
    pub num_qubits: u32,
    pub operational: bool,
    /// Status text such as `active` or `maintenance`.
    pub status_msg: Option<String>,
    pub pending_jobs: u32,
    pub basis_gates: Vec<String>,
    pub coupling_map: Vec<[u32; 2]>,
    pub processor: Option<String>,
    pub simulator: bool,
    pub max_shots: Option<u32>,
}

impl BackendInfo {
    fn from_parts(config: BackendConfigResponse, status: Option<BackendStatusResponse>) -> Self {
        let (operational, status_msg, pending_jobs) = match status {
            Some(s) => {
                let msg = if s.message.is_empty() || s.message == s.status {
                    s.status
                } else {
                    format!("{}: {}", s.status, s.message)
                };
                (
                    s.state,
                    Some(msg).filter(|m| !m.is_empty()),
                    u32::try_from(s.length_queue).unwrap_or(u32::MAX),
                )
            }
            None => (true, None, 0),
        };
        Self {
            name: config.backend_name,
            num_qubits: config.n_qubits,
            operational,
            status_msg,
            pending_jobs,
            basis_gates: config.basis_gates,
            coupling_map: config.coupling_map.unwrap_or_default(),
            processor: config.processor_type.as_ref().map(ProcessorType::label),
            simulator: config.simulator.unwrap_or(false),
            max_shots: config.max_shots,
        }
    }

    /// Summary used for least-busy selection.
    pub fn to_candidate(&self) -> BackendCandidate {
        BackendCandidate {
            name: self.name.clone(),
            num_qubits: self.num_qubits,
            operational: self.operational,
            simulator: self.simulator,
            pending_jobs: self.pending_jobs,
        }
    }
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    #[serde(default)]
    pub backend: Option<String>,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    pub id: String,
    /// Mixed case on the cloud API (`Completed`), upper case on legacy.
    pub status: String,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub state: Option<JobState>,
    /// Legacy failure detail.
    #[serde(default)]
    pub error: Option<JobError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reason_code: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobError {
    pub message: String,
}

impl JobStatusResponse {
    /// Map the provider status onto the common lifecycle.
    pub fn to_job_status(&self) -> JobStatus {
        match self.status.to_ascii_uppercase().as_str() {
            "QUEUED" | "INITIALIZING" => JobStatus::Queued,
            "VALIDATING" | "RUNNING" => JobStatus::Running,
            "COMPLETED" | "DONE" => JobStatus::Completed,
            "FAILED" | "ERROR" => JobStatus::Failed(
                self.error_message()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ),
            "CANCELLED" | "CANCELED" => JobStatus::Cancelled,
            other => {
                warn!(job_id = %self.id, status = other, "unknown job status, treating as running");
                JobStatus::Running
            }
        }
    }

    /// Failure reason, from the cloud `state` or the legacy `error`.
    pub fn error_message(&self) -> Option<String> {
        self.state
            .as_ref()
            .and_then(|s| s.reason.clone())
            .or_else(|| self.error.as_ref().map(|e| e.message.clone()))
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let created = self.created.as_deref()?;
        DateTime::parse_from_rfc3339(created)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Job result response.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// One entry per PUB.
    pub results: Vec<PubResult>,
}

/// Result of one PUB.
#[derive(Debug, Deserialize)]
pub struct PubResult {
    /// V2: per classical register samples.
    #[serde(default)]
    pub data: Option<BTreeMap<String, RegisterData>>,
    /// Legacy: pre-aggregated counts keyed by hex or binary outcome.
    #[serde(default)]
    pub counts: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Shots recorded for one classical register.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    /// One hex string per shot, e.g. `"0x5"`.
    pub samples: Vec<String>,
    #[serde(default)]
    pub num_bits: Option<usize>,
}

impl JobResultResponse {
    /// Counts for `register` (or `c`, or the first register present).
    ///
    /// The bitstring width comes from the payload when given, then
    /// `width_hint`, then the widest sample.
    pub fn to_counts(&self, register: Option<&str>, width_hint: Option<usize>) -> Option<Counts> {
        let result = self.results.first()?;

        if let Some(data) = &result.data {
            let reg = register
                .and_then(|name| data.get(name))
                .or_else(|| data.get("c"))
                .or_else(|| data.values().next())?;
            let width = reg
                .num_bits
                .or(width_hint)
                .unwrap_or_else(|| infer_bit_width(&reg.samples));
            let mut tally: BTreeMap<String, u64> = BTreeMap::new();
            for sample in &reg.samples {
                *tally.entry(hex_to_binary(sample, width)).or_insert(0) += 1;
            }
            return Some(tally.into_iter().collect());
        }

        let raw = result.counts.as_ref()?;
        let width = width_hint.unwrap_or_else(|| {
            infer_bit_width(&raw.keys().cloned().collect::<Vec<_>>())
        });
        Some(
            raw.iter()
                .map(|(outcome, &n)| {
                    let bits = if outcome.starts_with("0x") {
                        hex_to_binary(outcome, width)
                    } else {
                        outcome.clone()
                    };
                    (bits, n)
                })
                .collect(),
        )
    }
}

/// Bits needed for the largest sample, at least one.
fn infer_bit_width(samples: &[String]) -> usize {
    let max = samples
        .iter()
        .filter_map(|s| u128::from_str_radix(s.trim_start_matches("0x"), 16).ok())
        .max()
        .unwrap_or(0);
    (128 - max.leading_zeros() as usize).max(1)
}

/// `"0x5"` with width 3 becomes `"101"`. Unparseable input is returned as is.
fn hex_to_binary(hex: &str, width: usize) -> String {
    let digits = hex.trim_start_matches("0x");
    match u128::from_str_radix(digits, 16) {
        Ok(value) => format!("{value:0width$b}"),
        Err(_) => hex.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> JobStatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_hex_to_binary() {
        assert_eq!(hex_to_binary("0x0", 3), "000");
        assert_eq!(hex_to_binary("0x5", 3), "101");
        assert_eq!(hex_to_binary("0x2", 3), "010");
        assert_eq!(hex_to_binary("0xff", 4), "11111111");
        assert_eq!(hex_to_binary("zz", 3), "zz");
    }

    #[test]
    fn test_infer_bit_width() {
        assert_eq!(infer_bit_width(&["0x0".into(), "0x3".into()]), 2);
        assert_eq!(infer_bit_width(&["0x7".into(), "0x5".into()]), 3);
        assert_eq!(infer_bit_width(&["0x0".into()]), 1);
        assert_eq!(infer_bit_width(&[]), 1);
    }

    #[test]
    fn test_v2_results_to_counts() {
        let json = r#"{
            "results": [{
                "data": {
                    "c": {"samples": ["0x0", "0x5", "0x2", "0x7", "0x5", "0x0"], "num_bits": 3}
                },
                "metadata": {"version": 2}
            }]
        }"#;
        let response: JobResultResponse = serde_json::from_str(json).unwrap();
        let counts = response.to_counts(None, None).unwrap();
        assert_eq!(counts.get("000"), 2);
        assert_eq!(counts.get("101"), 2);
        assert_eq!(counts.get("010"), 1);
        assert_eq!(counts.get("111"), 1);
        assert_eq!(counts.total_shots(), 6);
    }

    #[test]
    fn test_v2_width_from_hint_then_samples() {
        let json = r#"{"results": [{"data": {"meas": {"samples": ["0x0", "0x1"]}}}]}"#;
        let response: JobResultResponse = serde_json::from_str(json).unwrap();

        // No "c" register: first register is used
        let counts = response.to_counts(None, Some(3)).unwrap();
        assert_eq!(counts.get("001"), 1);

        let counts = response.to_counts(Some("meas"), None).unwrap();
        assert_eq!(counts.get("1"), 1);
        assert_eq!(counts.get("0"), 1);
    }

    #[test]
    fn test_legacy_counts() {
        let json = r#"{"results": [{"counts": {"0x0": 500, "0x3": 480, "01": 20}}]}"#;
        let response: JobResultResponse = serde_json::from_str(json).unwrap();
        let counts = response.to_counts(None, Some(2)).unwrap();
        assert_eq!(counts.get("00"), 500);
        assert_eq!(counts.get("11"), 480);
        assert_eq!(counts.get("01"), 20);
    }

    #[test]
    fn test_empty_results() {
        let response: JobResultResponse = serde_json::from_str(r#"{"results": []}"#).unwrap();
        assert!(response.to_counts(None, None).is_none());
    }

    #[test]
    fn test_job_status_mapping() {
        assert_eq!(
            status(r#"{"id": "j", "status": "Queued"}"#).to_job_status(),
            JobStatus::Queued
        );
        assert_eq!(
            status(r#"{"id": "j", "status": "RUNNING"}"#).to_job_status(),
            JobStatus::Running
        );
        assert_eq!(
            status(r#"{"id": "j", "status": "Completed"}"#).to_job_status(),
            JobStatus::Completed
        );
        assert_eq!(
            status(r#"{"id": "j", "status": "Cancelled"}"#).to_job_status(),
            JobStatus::Cancelled
        );

        let failed = status(
            r#"{"id": "j", "status": "Failed",
                "state": {"status": "Failed", "reason": "circuit too deep", "reason_code": 1513}}"#,
        );
        assert_eq!(
            failed.to_job_status(),
            JobStatus::Failed("circuit too deep".into())
        );

        let legacy = status(r#"{"id": "j", "status": "ERROR", "error": {"message": "boom"}}"#);
        assert_eq!(legacy.to_job_status(), JobStatus::Failed("boom".into()));
    }

    #[test]
    fn test_created_at() {
        let s = status(r#"{"id": "j", "status": "Queued", "created": "2024-12-01T10:20:30.123Z"}"#);
        let created = s.created_at().unwrap();
        assert_eq!(created.timestamp(), 1_733_048_430);
        assert!(status(r#"{"id": "j", "status": "Queued", "created": "yesterday"}"#)
            .created_at()
            .is_none());
    }

    #[test]
    fn test_sampler_request_shape() {
        let body = sampler_request("ibm_kyiv", "OPENQASM 3.0;", 4096, 1);
        assert_eq!(body["program_id"], "sampler");
        assert_eq!(body["backend"], "ibm_kyiv");
        assert_eq!(body["params"]["version"], 2);
        assert_eq!(
            body["params"]["pubs"],
            serde_json::json!([["OPENQASM 3.0;", {}, 4096]])
        );
        assert_eq!(body["params"]["options"]["optimization_level"], 1);
    }

    #[test]
    fn test_devices_listing_formats() {
        let cloud: DevicesResponse =
            serde_json::from_str(r#"{"devices": [{"name": "ibm_fez", "status": {"name": "online"}}]}"#)
                .unwrap();
        assert_eq!(cloud.devices[0].name(), "ibm_fez");

        let legacy: DevicesResponse =
            serde_json::from_str(r#"{"devices": ["ibm_kyiv", "ibm_sherbrooke"]}"#).unwrap();
        assert_eq!(legacy.devices[1].name(), "ibm_sherbrooke");
    }

    #[test]
    fn test_backend_info_from_parts() {
        let config: BackendConfigResponse = serde_json::from_str(
            r#"{
                "backend_name": "ibm_torino",
                "n_qubits": 133,
                "basis_gates": ["cz", "id", "rz", "sx", "x"],
                "coupling_map": [[0, 1], [1, 2]],
                "processor_type": {"family": "Heron", "revision": 1},
                "simulator": false
            }"#,
        )
        .unwrap();
        let status: BackendStatusResponse = serde_json::from_str(
            r#"{"state": true, "status": "active", "message": "", "length_queue": 17}"#,
        )
        .unwrap();

        let info = BackendInfo::from_parts(config, Some(status));
        assert_eq!(info.name, "ibm_torino");
        assert_eq!(info.num_qubits, 133);
        assert_eq!(info.pending_jobs, 17);
        assert_eq!(info.status_msg.as_deref(), Some("active"));
        assert_eq!(info.processor.as_deref(), Some("Heron r1"));

        let candidate = info.to_candidate();
        assert!(candidate.operational);
        assert!(!candidate.simulator);
        assert_eq!(candidate.pending_jobs, 17);
    }

    #[test]
    fn test_processor_label() {
        let parse = |json: &str| serde_json::from_str::<ProcessorType>(json).unwrap().label();
        assert_eq!(parse(r#"{"family": "Eagle", "revision": "r3"}"#), "Eagle r3");
        assert_eq!(parse(r#"{"family": "Heron", "revision": 2}"#), "Heron r2");
        assert_eq!(parse(r#"{"family": "Falcon"}"#), "Falcon");
    }

    #[test]
    fn test_status_missing_assumes_operational() {
        let config: BackendConfigResponse =
            serde_json::from_str(r#"{"backend_name": "ibm_x", "n_qubits": 5}"#).unwrap();
        let info = BackendInfo::from_parts(config, None);
        assert!(info.operational);
        assert!(info.coupling_map.is_empty());
    }

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error_message(r#"{"errors": [{"code": "x", "message": "Invalid backend"}], "trace": "t"}"#),
            "Invalid backend"
        );
        assert_eq!(api_error_message(r#"{"message": "Unauthorized"}"#), "Unauthorized");
        assert_eq!(api_error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(api_error_message(""), "no body");
    }

    #[test]
    fn test_token_client() {
        let client = IbmClient::with_token("https://example.com/api/", "test-token").unwrap();
        assert!(!client.is_cloud_api());
        assert_eq!(client.url("jobs"), "https://example.com/api/v1/jobs");
        assert!(!format!("{client:?}").contains("test-token"));
        assert!(IbmClient::with_token(LEGACY_ENDPOINT, "bad\ntoken").is_err());
    }
}
