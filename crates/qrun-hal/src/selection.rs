//! Least-busy device selection.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HalError, HalResult};

/// Summary of a device offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCandidate {
    pub name: String,
    pub num_qubits: u32,
    /// Whether the device currently accepts jobs.
    pub operational: bool,
    pub simulator: bool,
    /// Jobs queued on the device.
    pub pending_jobs: u32,
}

/// Filters applied before picking the least busy device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Minimum number of qubits.
    pub min_qubits: u32,
    /// Only operational devices.
    pub operational: bool,
    /// Exclude simulators.
    pub exclude_simulators: bool,
}

impl SelectionCriteria {
    /// Operational hardware with at least `min_qubits`.
    pub fn hardware(min_qubits: u32) -> Self {
        Self {
            min_qubits,
            ..Self::default()
        }
    }

    pub fn accepts(&self, candidate: &BackendCandidate) -> bool {
        candidate.num_qubits >= self.min_qubits
            && (!self.operational || candidate.operational)
            && (!self.exclude_simulators || !candidate.simulator)
    }
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            min_qubits: 1,
            operational: true,
            exclude_simulators: true,
        }
    }
}

/// Pick the matching candidate with the fewest pending jobs.
///
/// Ties go to the alphabetically first name so the choice is reproducible.
pub fn least_busy<'a, I>(candidates: I, criteria: &SelectionCriteria) -> HalResult<BackendCandidate>
where
    I: IntoIterator<Item = &'a BackendCandidate>,
{
    let mut considered = 0usize;
    let best = candidates
        .into_iter()
        .inspect(|_| considered += 1)
        .filter(|c| criteria.accepts(c))
        .min_by(|a, b| {
            a.pending_jobs
                .cmp(&b.pending_jobs)
                .then_with(|| a.name.cmp(&b.name))
        })
        .cloned();

    match best {
        Some(candidate) => {
            debug!(
                backend = %candidate.name,
                pending_jobs = candidate.pending_jobs,
                considered,
                "selected least busy backend"
            );
            Ok(candidate)
        }
        None => Err(HalError::NoSuitableBackend(format!(
            "none of {considered} backends is operational hardware with at least {} qubits",
            criteria.min_qubits
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, qubits: u32, operational: bool, pending: u32) -> BackendCandidate {
        BackendCandidate {
            name: name.into(),
            num_qubits: qubits,
            operational,
            simulator: false,
            pending_jobs: pending,
        }
    }

    #[test]
    fn test_picks_fewest_pending() {
        let candidates = vec![
            candidate("ibm_brisbane", 127, true, 40),
            candidate("ibm_kyiv", 127, true, 3),
            candidate("ibm_sherbrooke", 127, true, 12),
        ];
        let best = least_busy(&candidates, &SelectionCriteria::default()).unwrap();
        assert_eq!(best.name, "ibm_kyiv");
    }

    #[test]
    fn test_filters_offline_small_and_simulators() {
        let mut sim = candidate("simulator_stabilizer", 5000, true, 0);
        sim.simulator = true;
        let candidates = vec![
            sim,
            candidate("ibm_down", 127, false, 0),
            candidate("ibm_tiny", 2, true, 0),
            candidate("ibm_torino", 133, true, 9),
        ];
        let best = least_busy(&candidates, &SelectionCriteria::hardware(3)).unwrap();
        assert_eq!(best.name, "ibm_torino");
    }

    #[test]
    fn test_ties_broken_by_name() {
        let candidates = vec![
            candidate("ibm_b", 127, true, 5),
            candidate("ibm_a", 127, true, 5),
        ];
        let best = least_busy(&candidates, &SelectionCriteria::default()).unwrap();
        assert_eq!(best.name, "ibm_a");
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![candidate("ibm_down", 127, false, 0)];
        let err = least_busy(&candidates, &SelectionCriteria::hardware(3)).unwrap_err();
        assert!(matches!(err, HalError::NoSuitableBackend(msg) if msg.contains("1 backends")));
        assert!(least_busy(&[], &SelectionCriteria::default()).is_err());
    }
}
