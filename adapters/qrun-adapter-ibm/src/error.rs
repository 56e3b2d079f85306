//! Error types for the IBM Quantum adapter.

use thiserror::Error;

use qrun_hal::HalError;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when using IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// No credentials in the environment or configuration.
    #[error(
        "IBM Quantum credentials not found. Set IBM_API_KEY and IBM_SERVICE_CRN, or IBM_QUANTUM_TOKEN."
    )]
    MissingCredentials,

    /// API key given without a service instance.
    #[error("IBM_SERVICE_CRN is required when using IBM_API_KEY")]
    MissingServiceCrn,

    /// Token or CRN contains characters not allowed in a header.
    #[error("Invalid IBM Quantum credential: {0}")]
    InvalidCredential(&'static str),

    /// IAM token exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("IBM Quantum API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Unknown job.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Unknown device.
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Device is offline or paused.
    #[error("Backend not available: {0}")]
    BackendUnavailable(String),

    /// Circuit could not be serialized.
    #[error("Circuit conversion error: {0}")]
    Circuit(#[from] qrun_qasm3::Qasm3Error),

    /// The results payload held no usable counts.
    #[error("No results in job {0}")]
    NoResults(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IbmError {
    /// Whether the error came from rejected credentials.
    pub fn is_auth(&self) -> bool {
        match self {
            IbmError::MissingCredentials
            | IbmError::MissingServiceCrn
            | IbmError::InvalidCredential(_)
            | IbmError::IamTokenExchange(_) => true,
            IbmError::Api { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }
}

impl From<IbmError> for HalError {
    fn from(e: IbmError) -> Self {
        if e.is_auth() {
            return HalError::AuthenticationFailed(e.to_string());
        }
        match e {
            IbmError::JobNotFound(id) => HalError::JobNotFound(id),
            IbmError::BackendNotFound(name) | IbmError::BackendUnavailable(name) => {
                HalError::BackendUnavailable(name)
            }
            IbmError::Circuit(e) => HalError::InvalidCircuit(e.to_string()),
            IbmError::Json(e) => HalError::Serialization(e),
            other => HalError::Backend(other.to_string()),
        }
    }
}
