//! Backend capability introspection.
//!
//! All edges in [`Topology`] are bidirectional: if `(a, b)` is present,
//! both `a → b` and `b → a` are valid two-qubit interactions.

use serde::{Deserialize, Serialize};

use qrun_ir::{Circuit, InstructionKind};

use crate::backend::ValidationResult;

/// Hardware capabilities of a quantum backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Number of qubits available.
    pub num_qubits: u32,
    /// Supported gate set (OpenQASM 3 naming convention).
    pub gate_set: GateSet,
    /// Qubit connectivity topology.
    pub topology: Topology,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or real hardware (`false`).
    pub is_simulator: bool,
}

impl Capabilities {
    /// Create capabilities for a simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            topology: Topology::full(num_qubits),
            max_shots: 100_000,
            is_simulator: true,
        }
    }

    /// Create capabilities for an IBM Heron-class device.
    ///
    /// The device transpiles submitted circuits itself, so the supported set
    /// is universal while `native` lists the hardware basis.
    pub fn ibm(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::ibm_heron(),
            topology: Topology::heavy_hex(),
            max_shots: 100_000,
            is_simulator: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Check a circuit against qubit count and gate support.
    pub fn check(&self, circuit: &Circuit) -> ValidationResult {
        let mut reasons = Vec::new();

        if circuit.num_qubits() > self.num_qubits as usize {
            reasons.push(format!(
                "circuit uses {} qubits but {} has {}",
                circuit.num_qubits(),
                self.name,
                self.num_qubits
            ));
        }

        let mut unsupported: Vec<&str> = circuit
            .instructions()
            .filter_map(|inst| match &inst.kind {
                InstructionKind::Gate(gate) if !self.gate_set.contains(gate.name()) => {
                    Some(gate.name())
                }
                _ => None,
            })
            .collect();
        unsupported.sort_unstable();
        unsupported.dedup();
        if !unsupported.is_empty() {
            reasons.push(format!("unsupported gates: {}", unsupported.join(", ")));
        }

        if reasons.is_empty() {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid { reasons }
        }
    }
}

/// Gate set supported by a backend.
///
/// Gate names follow the OpenQASM 3 naming convention. If `native` is empty,
/// all supported gates are considered native.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
    /// Native gates (execute without decomposition on this backend).
    pub native: Vec<String>,
}

impl GateSet {
    /// Every gate the circuit model can express.
    pub fn universal() -> Self {
        Self {
            single_qubit: [
                "id", "x", "y", "z", "h", "s", "sdg", "t", "tdg", "sx", "rx", "ry", "rz", "p", "U",
            ]
            .map(String::from)
            .to_vec(),
            two_qubit: ["cx", "cy", "cz", "swap"].map(String::from).to_vec(),
            three_qubit: vec!["ccx".into()],
            native: vec![],
        }
    }

    /// IBM Heron gate set: native `cz, rz, sx, x`, everything else is
    /// decomposed by the provider-side transpiler.
    pub fn ibm_heron() -> Self {
        Self {
            native: ["rz", "sx", "x", "cz", "id"].map(String::from).to_vec(),
            ..Self::universal()
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.three_qubit.iter().any(|g| g == gate)
    }

    /// Check if a gate is native (executes without decomposition).
    pub fn is_native(&self, gate: &str) -> bool {
        if self.native.is_empty() {
            self.contains(gate)
        } else {
            self.native.iter().any(|g| g == gate)
        }
    }
}

/// Qubit connectivity topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub kind: TopologyKind,
    /// Coupling edges. Bidirectional.
    pub edges: Vec<(u32, u32)>,
}

impl Topology {
    /// Create a linear topology.
    pub fn linear(n: u32) -> Self {
        Self {
            kind: TopologyKind::Linear,
            edges: (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
        }
    }

    /// Create a fully connected topology.
    pub fn full(n: u32) -> Self {
        let mut edges = vec![];
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((i, j));
            }
        }
        Self {
            kind: TopologyKind::FullyConnected,
            edges,
        }
    }

    /// Heavy-hex lattice whose coupling map is not known locally.
    pub fn heavy_hex() -> Self {
        Self {
            kind: TopologyKind::HeavyHex,
            edges: vec![],
        }
    }

    /// Create a custom topology from edges.
    pub fn custom(edges: Vec<(u32, u32)>) -> Self {
        Self {
            kind: TopologyKind::Custom,
            edges,
        }
    }

    /// Check if two qubits are connected.
    pub fn is_connected(&self, q1: u32, q2: u32) -> bool {
        if self.kind == TopologyKind::FullyConnected {
            return q1 != q2;
        }
        self.edges
            .iter()
            .any(|&(a, b)| (a == q1 && b == q2) || (a == q2 && b == q1))
    }
}

/// Kind of qubit topology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum TopologyKind {
    FullyConnected,
    Linear,
    /// IBM Heron/Eagle lattice.
    HeavyHex,
    Custom,
}
