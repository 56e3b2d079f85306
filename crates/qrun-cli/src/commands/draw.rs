//! Draw command implementation.

use anyhow::{Context, Result};

use qrun_ir::draw;

use super::common::program_circuit;

/// Print the program circuit as a diagram, or as OpenQASM 3 with `qasm`.
pub fn execute(qasm: bool) -> Result<()> {
    let circuit = program_circuit()?;
    if qasm {
        let source = qrun_qasm3::emit(&circuit).context("Failed to emit OpenQASM 3")?;
        print!("{source}");
    } else {
        println!("{}", draw(&circuit));
    }
    Ok(())
}
