//! Local statevector simulator for qrun.
//!
//! Exact state evolution for up to 24 qubits, optionally with a
//! [`NoiseModel`](qrun_ir::NoiseModel) to mimic a real device.
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 20 | ~16 MB |
//! | 24 | ~256 MB |
//!
//! # Example
//!
//! ```ignore
//! use qrun_adapter_sim::SimulatorBackend;
//! use qrun_hal::Backend;
//! use qrun_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new().with_seed(7);
//!     let circuit = Circuit::superposition_entanglement()?;
//!     let job_id = backend.submit(&circuit, 4096).await?;
//!     let result = backend.wait(&job_id).await?;
//!
//!     // Roughly a quarter each of 000, 010, 101 and 111
//!     println!("Results: {}", result.counts);
//!     Ok(())
//! }
//! ```

mod simulator;
mod statevector;

pub use simulator::{DEFAULT_MAX_QUBITS, SimulatorBackend, run_simulation};
pub use statevector::Statevector;
