//! Statevector simulation engine.
//!
//! Basis index bit `k` holds qubit `k`, so qubit 0 is the least significant
//! bit of an outcome.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use num_complex::Complex64;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use qrun_hal::{HalError, HalResult};
use qrun_ir::StandardGate;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A pure quantum state over `num_qubits` qubits.
#[derive(Debug, Clone)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_qubits];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Sum of squared amplitude magnitudes; 1 for a valid state.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum()
    }

    /// Probability of every basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// Apply a gate. `qubits` lists controls first, as in the circuit model.
    pub fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) {
        match *gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_phase(qubits[0], PI),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_phase(qubits[0], PI / 2.0),
            StandardGate::Sdg => self.apply_phase(qubits[0], -PI / 2.0),
            StandardGate::T => self.apply_phase(qubits[0], PI / 4.0),
            StandardGate::Tdg => self.apply_phase(qubits[0], -PI / 4.0),
            StandardGate::SX => self.apply_sx(qubits[0]),
            StandardGate::Rx(theta) => self.apply_rx(qubits[0], theta),
            StandardGate::Ry(theta) => self.apply_ry(qubits[0], theta),
            StandardGate::Rz(theta) => self.apply_rz(qubits[0], theta),
            StandardGate::P(lambda) => self.apply_phase(qubits[0], lambda),
            StandardGate::U(theta, phi, lambda) => self.apply_u(qubits[0], theta, phi, lambda),
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CY => self.apply_cy(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
            StandardGate::CCX => self.apply_ccx(qubits[0], qubits[1], qubits[2]),
        }
    }

    /// Apply an arbitrary 2x2 unitary `[[a, b], [c, d]]` to `qubit`.
    fn apply_single(&mut self, qubit: usize, m: [[Complex64; 2]; 2]) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    pub(crate) fn apply_x(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                self.amplitudes.swap(i, i | mask);
            }
        }
    }

    pub(crate) fn apply_y(&mut self, qubit: usize) {
        let mask = 1 << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -I * self.amplitudes[j];
                self.amplitudes[j] = I * tmp;
            }
        }
    }

    pub(crate) fn apply_z(&mut self, qubit: usize) {
        self.apply_phase(qubit, PI);
    }

    fn apply_h(&mut self, qubit: usize) {
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        self.apply_single(qubit, [[h, h], [h, -h]]);
    }

    /// diag(1, e^{iθ}).
    fn apply_phase(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase = Complex64::from_polar(1.0, theta);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask != 0 {
                *amp *= phase;
            }
        }
    }

    fn apply_sx(&mut self, qubit: usize) {
        let p = Complex64::new(0.5, 0.5);
        let m = Complex64::new(0.5, -0.5);
        self.apply_single(qubit, [[p, m], [m, p]]);
    }

    fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        self.apply_single(qubit, [[c, s], [s, c]]);
    }

    fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new((theta / 2.0).sin(), 0.0);
        self.apply_single(qubit, [[c, -s], [s, c]]);
    }

    fn apply_rz(&mut self, qubit: usize, theta: f64) {
        let mask = 1 << qubit;
        let phase_0 = Complex64::from_polar(1.0, -theta / 2.0);
        let phase_1 = Complex64::from_polar(1.0, theta / 2.0);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            *amp *= if i & mask == 0 { phase_0 } else { phase_1 };
        }
    }

    fn apply_u(&mut self, qubit: usize, theta: f64, phi: f64, lambda: f64) {
        let c = (theta / 2.0).cos();
        let s = (theta / 2.0).sin();
        self.apply_single(
            qubit,
            [
                [Complex64::new(c, 0.0), -Complex64::from_polar(s, lambda)],
                [
                    Complex64::from_polar(s, phi),
                    Complex64::from_polar(c, phi + lambda),
                ],
            ],
        );
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    fn apply_cy(&mut self, control: usize, target: usize) {
        let ctrl_mask = 1 << control;
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask != 0) && (i & tgt_mask == 0) {
                let j = i | tgt_mask;
                let tmp = self.amplitudes[i];
                self.amplitudes[i] = -I * self.amplitudes[j];
                self.amplitudes[j] = I * tmp;
            }
        }
    }

    fn apply_cz(&mut self, control: usize, target: usize) {
        let mask = (1 << control) | (1 << target);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp = -*amp;
            }
        }
    }

    fn apply_swap(&mut self, q1: usize, q2: usize) {
        let mask1 = 1 << q1;
        let mask2 = 1 << q2;
        for i in 0..self.amplitudes.len() {
            if (i & mask1 != 0) && (i & mask2 == 0) {
                let j = (i & !mask1) | mask2;
                self.amplitudes.swap(i, j);
            }
        }
    }

    fn apply_ccx(&mut self, c1: usize, c2: usize, target: usize) {
        let ctrl_mask = (1 << c1) | (1 << c2);
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if (i & ctrl_mask == ctrl_mask) && (i & tgt_mask == 0) {
                self.amplitudes.swap(i, i | tgt_mask);
            }
        }
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Probability of reading `1` on `qubit`.
    pub fn probability_one(&self, qubit: usize) -> f64 {
        let mask = 1 << qubit;
        self.amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum()
    }

    /// Projectively measure `qubit`, collapsing the state.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let p1 = self.probability_one(qubit).clamp(0.0, 1.0);
        let outcome = rng.gen_bool(p1);
        let norm = if outcome { p1 } else { 1.0 - p1 }.sqrt();
        let mask = 1 << qubit;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp /= norm;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Return `qubit` to |0⟩.
    pub fn reset<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) {
        if self.measure(qubit, rng) {
            self.apply_x(qubit);
        }
    }

    /// Sampler over basis states, for drawing many shots from one state.
    pub fn sampler(&self) -> HalResult<WeightedIndex<f64>> {
        WeightedIndex::new(self.probabilities())
            .map_err(|e| HalError::Backend(format!("cannot sample statevector: {e}")))
    }

    /// Draw a single basis-state outcome.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> HalResult<usize> {
        Ok(self.sampler()?.sample(rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes[0], ONE));
        assert!(sv.amplitudes[1..].iter().all(|a| approx_eq(*a, ZERO)));
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply_gate(&StandardGate::H, &[0]);
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes[0], h));
        assert!(approx_eq(sv.amplitudes[1], h));
    }

    #[test]
    fn test_program_state() {
        // H q0; H q1; CX q0 -> q2
        let mut sv = Statevector::new(3);
        sv.apply_gate(&StandardGate::H, &[0]);
        sv.apply_gate(&StandardGate::H, &[1]);
        sv.apply_gate(&StandardGate::CX, &[0, 2]);

        let probs = sv.probabilities();
        for (index, p) in probs.iter().enumerate() {
            let expected = if [0b000, 0b010, 0b101, 0b111].contains(&index) {
                0.25
            } else {
                0.0
            };
            assert!((p - expected).abs() < 1e-12, "index {index:03b}: {p}");
        }
    }

    #[test]
    fn test_sx_squared_is_x() {
        let mut sv = Statevector::new(1);
        sv.apply_gate(&StandardGate::SX, &[0]);
        sv.apply_gate(&StandardGate::SX, &[0]);
        assert!(approx_eq(sv.amplitudes[1], ONE));
    }

    #[test]
    fn test_u_matches_h() {
        // U(π/2, 0, π) = H
        let mut sv = Statevector::new(1);
        sv.apply_gate(&StandardGate::U(PI / 2.0, 0.0, PI), &[0]);
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes[0], h));
        assert!(approx_eq(sv.amplitudes[1], h));
    }

    #[test]
    fn test_swap_and_toffoli() {
        let mut sv = Statevector::new(3);
        sv.apply_gate(&StandardGate::X, &[0]);
        sv.apply_gate(&StandardGate::Swap, &[0, 1]);
        assert!(approx_eq(sv.amplitudes[0b010], ONE));

        sv.apply_gate(&StandardGate::X, &[0]);
        sv.apply_gate(&StandardGate::CCX, &[0, 1, 2]);
        assert!(approx_eq(sv.amplitudes[0b111], ONE));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sv = Statevector::new(2);
        sv.apply_gate(&StandardGate::H, &[0]);
        sv.apply_gate(&StandardGate::CX, &[0, 1]);

        let first = sv.measure(0, &mut rng);
        assert!((sv.norm_sqr() - 1.0).abs() < 1e-12);
        // Bell partner must agree
        assert_eq!(sv.measure(1, &mut rng), first);
    }

    #[test]
    fn test_reset() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let mut sv = Statevector::new(1);
            sv.apply_gate(&StandardGate::H, &[0]);
            sv.reset(0, &mut rng);
            assert!(approx_eq(sv.amplitudes[0], ONE));
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut sv = Statevector::new(1);
        sv.apply_gate(&StandardGate::X, &[0]);
        for _ in 0..100 {
            assert_eq!(sv.sample(&mut rng).unwrap(), 1);
        }
    }

    fn arb_gate() -> impl Strategy<Value = (StandardGate, Vec<usize>)> {
        let angle = -PI..PI;
        prop_oneof![
            (0usize..4).prop_map(|q| (StandardGate::H, vec![q])),
            (0usize..4).prop_map(|q| (StandardGate::T, vec![q])),
            (0usize..4).prop_map(|q| (StandardGate::SX, vec![q])),
            (angle.clone(), 0usize..4).prop_map(|(t, q)| (StandardGate::Rx(t), vec![q])),
            (angle.clone(), 0usize..4).prop_map(|(t, q)| (StandardGate::Ry(t), vec![q])),
            (angle.clone(), angle.clone(), angle, 0usize..4)
                .prop_map(|(t, p, l, q)| (StandardGate::U(t, p, l), vec![q])),
            (0usize..4, 1usize..4)
                .prop_map(|(a, d)| (StandardGate::CX, vec![a, (a + d) % 4])),
            (0usize..4, 1usize..4)
                .prop_map(|(a, d)| (StandardGate::CY, vec![a, (a + d) % 4])),
            (0usize..4, 1usize..4)
                .prop_map(|(a, d)| (StandardGate::Swap, vec![a, (a + d) % 4])),
        ]
    }

    proptest! {
        #[test]
        fn gates_preserve_norm(gates in prop::collection::vec(arb_gate(), 0..40)) {
            let mut sv = Statevector::new(4);
            for (gate, qubits) in &gates {
                sv.apply_gate(gate, qubits);
            }
            prop_assert!((sv.norm_sqr() - 1.0).abs() < 1e-9);
        }

        #[test]
        fn measurement_preserves_norm(
            gates in prop::collection::vec(arb_gate(), 1..20),
            qubit in 0usize..4,
            seed in any::<u64>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sv = Statevector::new(4);
            for (gate, qubits) in &gates {
                sv.apply_gate(gate, qubits);
            }
            let outcome = sv.measure(qubit, &mut rng);
            prop_assert!((sv.norm_sqr() - 1.0).abs() < 1e-9);
            let p1 = sv.probability_one(qubit);
            let expected = if outcome { 1.0 } else { 0.0 };
            prop_assert!((p1 - expected).abs() < 1e-9, "p1 = {}, outcome = {}", p1, outcome);
        }
    }
}
