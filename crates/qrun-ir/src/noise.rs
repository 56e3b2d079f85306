//! Simple hardware noise description for simulation.
//!
//! A depolarizing channel after every one- and two-qubit gate plus a
//! symmetric bit-flip on readout. Enough to reproduce the "impossible"
//! outcomes seen on real devices.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Depolarizing and readout error rates applied by a noisy simulator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseModel {
    /// Depolarizing probability after each single-qubit gate.
    pub single_qubit_error: f64,
    /// Depolarizing probability after each multi-qubit gate, per operand.
    pub two_qubit_error: f64,
    /// Probability that a measured bit is reported flipped.
    pub readout_error: f64,
}

impl NoiseModel {
    /// A noiseless model.
    pub fn ideal() -> Self {
        Self::default()
    }

    /// Gate errors only, no readout error.
    pub fn depolarizing(single_qubit_error: f64, two_qubit_error: f64) -> IrResult<Self> {
        let model = Self {
            single_qubit_error,
            two_qubit_error,
            readout_error: 0.0,
        };
        model.validate()?;
        Ok(model)
    }

    /// Set the readout flip probability.
    pub fn with_readout_error(mut self, p: f64) -> IrResult<Self> {
        self.readout_error = p;
        self.validate()?;
        Ok(self)
    }

    /// Error rates in the range reported by current superconducting devices.
    pub fn superconducting() -> Self {
        Self {
            single_qubit_error: 0.001,
            two_qubit_error: 0.01,
            readout_error: 0.02,
        }
    }

    /// Whether every error rate is zero.
    pub fn is_ideal(&self) -> bool {
        self.single_qubit_error == 0.0 && self.two_qubit_error == 0.0 && self.readout_error == 0.0
    }

    /// Check that every rate is a probability.
    pub fn validate(&self) -> IrResult<()> {
        for (what, value) in [
            ("single-qubit error", self.single_qubit_error),
            ("two-qubit error", self.two_qubit_error),
            ("readout error", self.readout_error),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(IrError::InvalidProbability { what, value });
            }
        }
        Ok(())
    }
}
