//! IBM Quantum backend for qrun.
//!
//! Runs circuits on IBM Quantum devices through the Qiskit Runtime REST API
//! and the Sampler primitive. Circuits travel as OpenQASM 3 and are
//! transpiled for the chosen device on IBM's side.
//!
//! # Authentication
//!
//! ```bash
//! # IBM Cloud (recommended)
//! export IBM_API_KEY="your-api-key"
//! export IBM_SERVICE_CRN="crn:v1:bluemix:public:quantum-computing:..."
//!
//! # Or a bearer token for the legacy endpoint
//! export IBM_QUANTUM_TOKEN="your-token"
//! ```
//!
//! # Example
//!
//! ```ignore
//! use qrun_adapter_ibm::IbmBackend;
//! use qrun_hal::Backend;
//! use qrun_ir::Circuit;
//!
//! let backend = IbmBackend::least_busy(3).await?;
//! let circuit = Circuit::superposition_entanglement()?;
//! let job_id = backend.submit(&circuit, 4096).await?;
//! let result = backend.wait(&job_id).await?;
//! ```

mod api;
mod auth;
mod backend;
mod error;

pub use api::{BackendInfo, DASHBOARD_URL, DEFAULT_ENDPOINT, IbmClient, LEGACY_ENDPOINT};
pub use auth::{ENV_API_KEY, ENV_SERVICE_CRN, ENV_TOKEN, IbmCredentials};
pub use backend::{IbmBackend, IbmOptions};
pub use error::{IbmError, IbmResult};
