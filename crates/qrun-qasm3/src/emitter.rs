//! QASM3 emitter for serializing circuits.

use std::fmt::Write as _;

use qrun_ir::{Circuit, ClbitId, Instruction, InstructionKind, QubitId, format_angle_exact};

use crate::error::{Qasm3Error, Qasm3Result};

/// Emit a circuit as OpenQASM 3.0 source code.
pub fn emit(circuit: &Circuit) -> Qasm3Result<String> {
    if circuit.num_qubits() == 0 {
        return Err(Qasm3Error::EmptyCircuit(circuit.name().to_string()));
    }
    Emitter { circuit }.emit_circuit()
}

struct Emitter<'a> {
    circuit: &'a Circuit,
}

impl Emitter<'_> {
    fn emit_circuit(&self) -> Qasm3Result<String> {
        let mut out = String::new();
        out.push_str("OPENQASM 3.0;\n");
        out.push_str("include \"stdgates.inc\";\n\n");

        for reg in self.circuit.qregs() {
            let _ = writeln!(out, "qubit[{}] {};", reg.size, reg.name);
        }
        for reg in self.circuit.cregs() {
            let _ = writeln!(out, "bit[{}] {};", reg.size, reg.name);
        }
        out.push('\n');

        for instruction in self.circuit.instructions() {
            self.emit_instruction(&mut out, instruction)?;
        }
        Ok(out)
    }

    fn emit_instruction(&self, out: &mut String, instruction: &Instruction) -> Qasm3Result<()> {
        let qubits = instruction
            .qubits
            .iter()
            .map(|&q| self.qubit(q))
            .collect::<Qasm3Result<Vec<_>>>()?
            .join(", ");

        match &instruction.kind {
            InstructionKind::Gate(gate) => {
                let params = gate.params();
                if params.is_empty() {
                    let _ = writeln!(out, "{} {qubits};", gate.name());
                } else {
                    let params: Vec<String> = params
                        .iter()
                        .map(|&p| format_angle_exact(p, "pi"))
                        .collect();
                    let _ = writeln!(out, "{}({}) {qubits};", gate.name(), params.join(", "));
                }
            }
            InstructionKind::Measure => {
                for (&q, &c) in instruction.qubits.iter().zip(&instruction.clbits) {
                    let _ = writeln!(out, "{} = measure {};", self.clbit(c)?, self.qubit(q)?);
                }
            }
            InstructionKind::Reset => {
                let _ = writeln!(out, "reset {qubits};");
            }
            InstructionKind::Barrier => {
                let _ = writeln!(out, "barrier {qubits};");
            }
        }
        Ok(())
    }

    fn qubit(&self, qubit: QubitId) -> Qasm3Result<String> {
        self.circuit
            .locate_qubit(qubit)
            .map(|(reg, i)| format!("{}[{i}]", reg.name))
            .ok_or(Qasm3Error::UnregisteredQubit(qubit))
    }

    fn clbit(&self, clbit: ClbitId) -> Qasm3Result<String> {
        self.circuit
            .locate_clbit(clbit)
            .map(|(reg, i)| format!("{}[{i}]", reg.name))
            .ok_or(Qasm3Error::UnregisteredClbit(clbit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_emit_program_circuit() {
        let circuit = Circuit::superposition_entanglement().unwrap();
        let qasm = emit(&circuit).unwrap();
        let expected = "\
OPENQASM 3.0;
include \"stdgates.inc\";

qubit[3] q;
bit[3] c;

h q[0];
h q[1];
cx q[0], q[2];
c[0] = measure q[0];
c[1] = measure q[1];
c[2] = measure q[2];
";
        assert_eq!(qasm, expected);
    }

    #[test]
    fn test_emit_parameters_and_registers() {
        let mut circuit = Circuit::new("regs");
        circuit.add_qreg("a", 1).unwrap();
        circuit.add_qreg("b", 2).unwrap();
        circuit.add_creg("out", 1).unwrap();
        circuit
            .rz(PI / 2.0, QubitId(0))
            .unwrap()
            .rx(0.125, QubitId(2))
            .unwrap()
            .barrier([QubitId(0), QubitId(1)])
            .unwrap()
            .measure(QubitId(2), ClbitId(0))
            .unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("qubit[1] a;\nqubit[2] b;\nbit[1] out;"));
        assert!(qasm.contains("rz(pi/2) a[0];"));
        assert!(qasm.contains("rx(0.125) b[1];"));
        assert!(qasm.contains("barrier a[0], b[0];"));
        assert!(qasm.contains("out[0] = measure b[1];"));
    }

    #[test]
    fn test_emit_keeps_full_angle_precision() {
        let mut circuit = Circuit::with_size("angles", 1, 0);
        circuit
            .rx(0.123456789, QubitId(0))
            .unwrap()
            .rz(1e-7, QubitId(0))
            .unwrap()
            .p(-3.0 * PI / 4.0, QubitId(0))
            .unwrap();

        let qasm = emit(&circuit).unwrap();
        assert!(qasm.contains("rx(0.123456789) q[0];"), "{qasm}");
        assert!(qasm.contains("rz(0.0000001) q[0];"), "{qasm}");
        assert!(qasm.contains("p(-3*pi/4) q[0];"), "{qasm}");
    }

    #[test]
    fn test_emit_empty_circuit_fails() {
        assert!(matches!(
            emit(&Circuit::new("nothing")),
            Err(Qasm3Error::EmptyCircuit(name)) if name == "nothing"
        ));
    }
}
