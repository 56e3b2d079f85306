//! Error types for OpenQASM emission.

use qrun_ir::{ClbitId, QubitId};
use thiserror::Error;

/// Errors raised while serializing a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Qasm3Error {
    /// The circuit declares no qubits.
    #[error("Circuit '{0}' has no qubits to emit")]
    EmptyCircuit(String),

    /// A qubit is not covered by any quantum register.
    #[error("Qubit {0} does not belong to any register")]
    UnregisteredQubit(QubitId),

    /// A classical bit is not covered by any classical register.
    #[error("Classical bit {0} does not belong to any register")]
    UnregisteredClbit(ClbitId),
}

/// Result type for emission.
pub type Qasm3Result<T> = Result<T, Qasm3Error>;
