//! High-level circuit builder API.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::dag::CircuitDag;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClassicalRegister, ClbitId, QuantumRegister, QubitId};

/// A quantum circuit over named quantum and classical registers.
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    qregs: Vec<QuantumRegister>,
    cregs: Vec<ClassicalRegister>,
    dag: CircuitDag,
    num_qubits: u32,
    num_clbits: u32,
}

impl Circuit {
    /// Create an empty circuit without registers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qregs: vec![],
            cregs: vec![],
            dag: CircuitDag::new(),
            num_qubits: 0,
            num_clbits: 0,
        }
    }

    /// Create a circuit with a `q` register and, if `num_clbits > 0`, a `c` register.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        if num_qubits > 0 {
            circuit.qregs.push(QuantumRegister {
                name: "q".into(),
                size: num_qubits,
                offset: 0,
            });
            for i in 0..num_qubits {
                circuit.dag.add_qubit(QubitId(i));
            }
            circuit.num_qubits = num_qubits;
        }
        if num_clbits > 0 {
            circuit.cregs.push(ClassicalRegister {
                name: "c".into(),
                size: num_clbits,
                offset: 0,
            });
            for i in 0..num_clbits {
                circuit.dag.add_clbit(ClbitId(i));
            }
            circuit.num_clbits = num_clbits;
        }
        circuit
    }

    /// Add a quantum register and return a copy of its descriptor.
    pub fn add_qreg(&mut self, name: impl Into<String>, size: u32) -> IrResult<QuantumRegister> {
        let name = name.into();
        if self.qregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        let reg = QuantumRegister {
            name,
            size,
            offset: self.num_qubits,
        };
        for q in reg.qubits() {
            self.dag.add_qubit(q);
        }
        self.num_qubits += size;
        self.qregs.push(reg.clone());
        Ok(reg)
    }

    /// Add a classical register and return a copy of its descriptor.
    pub fn add_creg(
        &mut self,
        name: impl Into<String>,
        size: u32,
    ) -> IrResult<ClassicalRegister> {
        let name = name.into();
        if self.cregs.iter().any(|r| r.name == name) {
            return Err(IrError::DuplicateRegister(name));
        }
        let reg = ClassicalRegister {
            name,
            size,
            offset: self.num_clbits,
        };
        for c in reg.clbits() {
            self.dag.add_clbit(c);
        }
        self.num_clbits += size;
        self.cregs.push(reg.clone());
        Ok(reg)
    }

    /// Append an arbitrary instruction.
    pub fn append(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.dag.apply(instruction)?;
        Ok(self)
    }

    /// Apply `gate` to `qubits` (controls first).
    pub fn apply(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.append(Instruction::gate(gate, qubits))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::S, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::T, [qubit])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::SX, [qubit])
    }

    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Rx(theta), [qubit])
    }

    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Ry(theta), [qubit])
    }

    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Rz(theta), [qubit])
    }

    pub fn p(&mut self, lambda: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::P(lambda), [qubit])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::CX, [control, target])
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::CY, [control, target])
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::CZ, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::Swap, [q1, q2])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(StandardGate::CCX, [c1, c2, target])
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure one qubit into one classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.append(Instruction::measure(qubit, clbit))
    }

    /// Measure register `qreg` into register `creg` bit for bit.
    pub fn measure_register(&mut self, qreg: &str, creg: &str) -> IrResult<&mut Self> {
        let q = self
            .qreg(qreg)
            .ok_or_else(|| IrError::RegisterNotFound(qreg.to_string()))?
            .clone();
        let c = self
            .creg(creg)
            .ok_or_else(|| IrError::RegisterNotFound(creg.to_string()))?
            .clone();
        if q.size != c.size {
            return Err(IrError::RegisterSizeMismatch {
                qreg: q.name,
                qsize: q.size,
                creg: c.name,
                csize: c.size,
            });
        }
        for (qubit, clbit) in q.qubits().zip(c.clbits()) {
            self.measure(qubit, clbit)?;
        }
        Ok(self)
    }

    /// Measure every qubit into the classical bit with the same flat index,
    /// adding a `meas` register when there are not enough bits.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        if self.num_clbits < self.num_qubits {
            let missing = self.num_qubits - self.num_clbits;
            self.add_creg("meas", missing)?;
        }
        for i in 0..self.num_qubits {
            self.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(self)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.append(Instruction::reset(qubit))
    }

    /// Add a barrier on the given qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.append(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Circuit depth, barriers excluded.
    pub fn depth(&self) -> usize {
        self.dag.depth()
    }

    /// Instructions in the order they were added.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.dag.instructions()
    }

    pub fn dag(&self) -> &CircuitDag {
        &self.dag
    }

    pub fn qregs(&self) -> &[QuantumRegister] {
        &self.qregs
    }

    pub fn cregs(&self) -> &[ClassicalRegister] {
        &self.cregs
    }

    /// Look up a quantum register by name.
    pub fn qreg(&self, name: &str) -> Option<&QuantumRegister> {
        self.qregs.iter().find(|r| r.name == name)
    }

    /// Look up a classical register by name.
    pub fn creg(&self, name: &str) -> Option<&ClassicalRegister> {
        self.cregs.iter().find(|r| r.name == name)
    }

    /// The register owning `qubit` and the qubit's index in it.
    pub fn locate_qubit(&self, qubit: QubitId) -> Option<(&QuantumRegister, u32)> {
        self.qregs
            .iter()
            .find_map(|r| r.index_of(qubit).map(|i| (r, i)))
    }

    /// The register owning `clbit` and the bit's index in it.
    pub fn locate_clbit(&self, clbit: ClbitId) -> Option<(&ClassicalRegister, u32)> {
        self.cregs
            .iter()
            .find_map(|r| r.index_of(clbit).map(|i| (r, i)))
    }

    /// Number of instructions per operation name.
    pub fn count_ops(&self) -> FxHashMap<&'static str, usize> {
        let mut counts = FxHashMap::default();
        for inst in self.instructions() {
            *counts.entry(inst.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Whether every measurement is the last operation on its qubit and
    /// nothing is reset.
    pub fn has_terminal_measurements_only(&self) -> bool {
        let mut measured = vec![false; self.num_qubits()];
        for inst in self.instructions() {
            if inst.is_barrier() {
                continue;
            }
            if matches!(inst.kind, InstructionKind::Reset) {
                return false;
            }
            for q in &inst.qubits {
                let slot = &mut measured[q.0 as usize];
                if *slot {
                    return false;
                }
                if inst.is_measure() {
                    *slot = true;
                }
            }
        }
        true
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Superposition on two qubits, entanglement of the first with a third.
    ///
    /// `H q[0]; H q[1]; CX q[0], q[2]; measure q -> c` on registers `q[3]` and
    /// `c[3]`. Ideal outcomes are `000`, `010`, `101` and `111` with equal
    /// probability.
    pub fn superposition_entanglement() -> IrResult<Self> {
        let mut circuit = Self::new("superposition_entanglement");
        let q = circuit.add_qreg("q", 3)?;
        circuit.add_creg("c", 3)?;

        let (q0, q1, q2) = (QubitId(q.offset), QubitId(q.offset + 1), QubitId(q.offset + 2));
        circuit.h(q0)?.h(q1)?.cx(q0, q2)?;
        circuit.measure_register("q", "c")?;
        Ok(circuit)
    }

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure_register("q", "c")?;
        Ok(circuit)
    }

    /// Create an `n`-qubit GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_register("q", "c")?;
        Ok(circuit)
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::draw::draw(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_add_registers() {
        let mut circuit = Circuit::new("test");
        let a = circuit.add_qreg("a", 2).unwrap();
        let b = circuit.add_qreg("b", 3).unwrap();
        circuit.add_creg("c", 5).unwrap();

        assert_eq!(a.offset, 0);
        assert_eq!(b.offset, 2);
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 5);
        assert_eq!(circuit.locate_qubit(QubitId(3)).map(|(r, i)| (r.name.as_str(), i)), Some(("b", 1)));
        assert!(matches!(
            circuit.add_qreg("a", 1),
            Err(IrError::DuplicateRegister(name)) if name == "a"
        ));
    }

    #[test]
    fn test_superposition_entanglement() {
        let circuit = Circuit::superposition_entanglement().unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 3);

        let ops: Vec<_> = circuit.instructions().collect();
        assert_eq!(ops.len(), 6);
        assert_eq!(ops[0].kind, InstructionKind::Gate(StandardGate::H));
        assert_eq!(ops[0].qubits, vec![QubitId(0)]);
        assert_eq!(ops[1].qubits, vec![QubitId(1)]);
        assert_eq!(ops[2].kind, InstructionKind::Gate(StandardGate::CX));
        assert_eq!(ops[2].qubits, vec![QubitId(0), QubitId(2)]);
        for (i, m) in ops[3..].iter().enumerate() {
            assert!(m.is_measure());
            assert_eq!(m.qubits[0].0 as usize, i);
            assert_eq!(m.clbits[0].0 as usize, i);
        }

        assert_eq!(circuit.depth(), 3);
        assert_eq!(circuit.count_ops()["measure"], 3);
        assert!(circuit.has_terminal_measurements_only());
    }

    #[test]
    fn test_measure_register_size_mismatch() {
        let mut circuit = Circuit::new("m");
        circuit.add_qreg("q", 3).unwrap();
        circuit.add_creg("c", 2).unwrap();
        assert!(matches!(
            circuit.measure_register("q", "c"),
            Err(IrError::RegisterSizeMismatch { qsize: 3, csize: 2, .. })
        ));
        assert!(matches!(
            circuit.measure_register("q", "missing"),
            Err(IrError::RegisterNotFound(_))
        ));
    }

    #[test]
    fn test_measure_all_adds_register() {
        let mut circuit = Circuit::with_size("t", 2, 0);
        circuit.h(QubitId(0)).unwrap().measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 2);
        assert!(circuit.creg("meas").is_some());
    }

    #[test]
    fn test_mid_circuit_measurement_detected() {
        let mut circuit = Circuit::with_size("mid", 1, 1);
        circuit
            .h(QubitId(0))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .x(QubitId(0))
            .unwrap();
        assert!(!circuit.has_terminal_measurements_only());
    }

    #[test]
    fn test_bell_and_ghz() {
        let bell = Circuit::bell().unwrap();
        assert_eq!(bell.depth(), 3);
        let ghz = Circuit::ghz(5).unwrap();
        assert_eq!(ghz.num_qubits(), 5);
        assert_eq!(ghz.count_ops()["cx"], 4);
        assert_eq!(Circuit::ghz(0).unwrap().num_qubits(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn op() -> impl Strategy<Value = (u8, u32, u32)> {
            (0u8..4, 0u32..5, 0u32..5)
        }

        proptest! {
            #[test]
            fn random_circuits_stay_consistent(ops in prop::collection::vec(op(), 0..40)) {
                let mut circuit = Circuit::with_size("rand", 5, 5);
                let mut applied = 0usize;
                for (kind, a, b) in ops {
                    let result = match kind {
                        0 => circuit.h(QubitId(a)).map(|_| ()),
                        1 => circuit.cx(QubitId(a), QubitId(b)).map(|_| ()),
                        2 => circuit.measure(QubitId(a), ClbitId(b)).map(|_| ()),
                        _ => circuit.barrier([QubitId(a), QubitId(b)]).map(|_| ()),
                    };
                    match result {
                        Ok(()) => applied += 1,
                        Err(e) => {
                            let duplicate = matches!(e, IrError::DuplicateQubit { .. });
                            prop_assert!(duplicate, "unexpected error: {}", e);
                        }
                    }
                }
                prop_assert_eq!(circuit.instructions().count(), applied);
                prop_assert!(circuit.depth() <= applied);
                prop_assert!(circuit.dag().verify_integrity().is_ok());
            }
        }
    }
}
