//! OpenQASM 3 output for qrun circuits.
//!
//! Cloud providers accept circuits as OpenQASM source. [`emit`] serializes a
//! [`qrun_ir::Circuit`] with one declaration per register and register-indexed
//! operands, so the names chosen by the builder (`q`, `c`) survive the round
//! trip to the provider and come back as keys of the result data.
//!
//! ```rust
//! use qrun_ir::Circuit;
//!
//! let circuit = Circuit::superposition_entanglement().unwrap();
//! let source = qrun_qasm3::emit(&circuit).unwrap();
//! assert!(source.contains("cx q[0], q[2];"));
//! ```

pub mod emitter;
pub mod error;

pub use emitter::emit;
pub use error::{Qasm3Error, Qasm3Result};
