//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Standard gates with known semantics. Rotation angles are in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),
    /// Phase gate.
    P(f64),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(f64, f64, f64),
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Toffoli gate.
    CCX,
}

impl StandardGate {
    /// OpenQASM name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(..) => "U",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::CCX => "ccx",
        }
    }

    /// Number of qubits this gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::CX | StandardGate::CY | StandardGate::CZ | StandardGate::Swap => 2,
            StandardGate::CCX => 3,
            _ => 1,
        }
    }

    /// Number of leading operands that act as controls.
    ///
    /// `CZ` is symmetric and reports one control; `Swap` reports none.
    #[inline]
    pub fn num_controls(&self) -> usize {
        match self {
            StandardGate::CX | StandardGate::CY | StandardGate::CZ => 1,
            StandardGate::CCX => 2,
            _ => 0,
        }
    }

    /// Angle parameters in declaration order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            StandardGate::Rx(t)
            | StandardGate::Ry(t)
            | StandardGate::Rz(t)
            | StandardGate::P(t) => vec![t],
            StandardGate::U(theta, phi, lambda) => vec![theta, phi, lambda],
            _ => vec![],
        }
    }

    /// Short label drawn inside the gate box of the target qubit.
    ///
    /// Controlled gates report the label of the operation applied to the target.
    pub fn label(&self) -> String {
        let base = match self {
            StandardGate::I => "I",
            StandardGate::X | StandardGate::CX | StandardGate::CCX => "X",
            StandardGate::Y | StandardGate::CY => "Y",
            StandardGate::Z | StandardGate::CZ => "Z",
            StandardGate::H => "H",
            StandardGate::S => "S",
            StandardGate::Sdg => "Sdg",
            StandardGate::T => "T",
            StandardGate::Tdg => "Tdg",
            StandardGate::SX => "√X",
            StandardGate::Rx(_) => "Rx",
            StandardGate::Ry(_) => "Ry",
            StandardGate::Rz(_) => "Rz",
            StandardGate::P(_) => "P",
            StandardGate::U(..) => "U",
            StandardGate::Swap => "Swap",
        };
        let params = self.params();
        if params.is_empty() {
            return base.to_string();
        }
        let rendered: Vec<String> = params.iter().map(|&p| format_angle(p, "π")).collect();
        format!("{base}({})", rendered.join(","))
    }
}

/// Express `theta` as `num·π/den` when it is a small rational multiple of π.
pub fn pi_fraction(theta: f64) -> Option<(i64, i64)> {
    const EPS: f64 = 1e-10;
    for den in [1_i64, 2, 3, 4, 6, 8, 16] {
        #[allow(clippy::cast_precision_loss)]
        let scaled = theta * den as f64 / PI;
        let num = scaled.round();
        if num != 0.0 && (scaled - num).abs() < EPS {
            #[allow(clippy::cast_possible_truncation)]
            return Some((num as i64, den));
        }
    }
    None
}

/// Render an angle for display, spelling rational multiples of π with
/// `pi_symbol` and rounding anything else to six decimals.
pub fn format_angle(theta: f64, pi_symbol: &str) -> String {
    format_pi_multiple(theta, pi_symbol).unwrap_or_else(|| {
        let s = format!("{theta:.6}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    })
}

/// Like [`format_angle`], but angles that are not multiples of π keep
/// the shortest representation that parses back to the same `f64`.
pub fn format_angle_exact(theta: f64, pi_symbol: &str) -> String {
    format_pi_multiple(theta, pi_symbol).unwrap_or_else(|| format!("{theta}"))
}

fn format_pi_multiple(theta: f64, pi_symbol: &str) -> Option<String> {
    let (num, den) = pi_fraction(theta)?;
    Some(match (num, den) {
        (1, 1) => pi_symbol.to_string(),
        (-1, 1) => format!("-{pi_symbol}"),
        (num, 1) => format!("{num}*{pi_symbol}"),
        (1, den) => format!("{pi_symbol}/{den}"),
        (-1, den) => format!("-{pi_symbol}/{den}"),
        (num, den) => format!("{num}*{pi_symbol}/{den}"),
    })
}
