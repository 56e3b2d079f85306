//! Hardware abstraction layer for qrun.
//!
//! A common [`Backend`] trait for job submission, [`Capabilities`] describing
//! what a device accepts, [`Counts`] and [`ExecutionResult`] for measurement
//! outcomes, and [`least_busy`] for picking a cloud device.
//!
//! | Backend | Crate | Authentication |
//! |---------|-------|----------------|
//! | Local simulator | `qrun-adapter-sim` | None |
//! | IBM Quantum | `qrun-adapter-ibm` | `IBM_API_KEY` + `IBM_SERVICE_CRN`, or `IBM_QUANTUM_TOKEN` |
//!
//! # Example
//!
//! ```ignore
//! use qrun_hal::Backend;
//! use qrun_adapter_sim::SimulatorBackend;
//! use qrun_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let circuit = Circuit::superposition_entanglement()?;
//!     let backend = SimulatorBackend::new();
//!
//!     let job_id = backend.submit(&circuit, 4096).await?;
//!     let result = backend.wait(&job_id).await?;
//!     println!("Results: {}", result.counts);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod capability;
pub mod error;
pub mod job;
pub mod result;
pub mod selection;

pub use backend::{
    Backend, BackendAvailability, BackendConfig, BackendFactory, ValidationResult, WaitOptions,
};
pub use capability::{Capabilities, GateSet, Topology, TopologyKind};
pub use error::{HalError, HalResult};
pub use job::{Job, JobId, JobStatus};
pub use result::{Counts, ExecutionResult};
pub use selection::{BackendCandidate, SelectionCriteria, least_busy};
