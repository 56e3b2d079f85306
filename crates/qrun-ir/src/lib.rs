//! Circuit intermediate representation for qrun.
//!
//! Circuits are built over named registers through the [`Circuit`] builder and
//! stored as a DAG ([`CircuitDag`]) whose edges are qubit and classical wires.
//! [`draw`] renders a circuit as a text diagram; [`NoiseModel`] describes the
//! error rates a noisy simulator should apply.
//!
//! # Example
//!
//! ```rust
//! use qrun_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::new("demo");
//! circuit.add_qreg("q", 3).unwrap();
//! circuit.add_creg("c", 3).unwrap();
//!
//! circuit.h(QubitId(0)).unwrap().h(QubitId(1)).unwrap();
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//! circuit.measure_register("q", "c").unwrap();
//!
//! assert_eq!(circuit.depth(), 3);
//! println!("{circuit}");
//! ```

pub mod circuit;
pub mod dag;
pub mod draw;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod noise;
pub mod qubit;

pub use circuit::Circuit;
pub use dag::{CircuitDag, DagNode, NodeIndex, WireId};
pub use draw::draw;
pub use error::{IrError, IrResult};
pub use gate::{StandardGate, format_angle, format_angle_exact, pi_fraction};
pub use instruction::{Instruction, InstructionKind};
pub use noise::NoiseModel;
pub use qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};
