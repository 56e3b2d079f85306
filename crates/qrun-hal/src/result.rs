//! Measurement results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Occurrences of each measured bitstring.
///
/// Bitstrings are written with classical bit 0 rightmost. Iteration is in
/// lexicographic bitstring order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` occurrences of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Occurrences of `bitstring`, zero if it was never seen.
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total_shots(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Outcomes by descending count, ties broken by bitstring.
    pub fn sorted(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Outcomes in bitstring order.
    pub fn sorted_by_key(&self) -> Vec<(&str, u64)> {
        self.iter().collect()
    }

    /// The most frequent outcome.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.sorted().into_iter().next()
    }

    /// Relative frequency of every outcome, in bitstring order.
    #[allow(clippy::cast_precision_loss)]
    pub fn probabilities(&self) -> Vec<(&str, f64)> {
        let total = self.total_shots();
        if total == 0 {
            return vec![];
        }
        self.iter()
            .map(|(k, v)| (k, v as f64 / total as f64))
            .collect()
    }

    /// Width of the bitstrings, if any outcome was recorded.
    pub fn bit_width(&self) -> Option<usize> {
        self.0.keys().map(String::len).max()
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut counts = Counts::new();
        for (k, v) in iter {
            counts.insert(k, v);
        }
        counts
    }
}

impl<'a> IntoIterator for &'a Counts {
    type Item = (&'a String, &'a u64);
    type IntoIter = std::collections::btree_map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Renders like a Python dict: `{'000': 1022, '111': 1019}`.
impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{k}': {v}")?;
        }
        f.write_str("}")
    }
}

/// Result of a completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Counts for the measured classical register(s).
    pub counts: Counts,
    /// Number of shots executed.
    pub shots: u32,
    /// Execution time reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    /// Backend that produced the result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Backend-specific extras.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ExecutionResult {
    pub fn new(counts: Counts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
            backend: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Counts {
        let mut counts = Counts::new();
        counts.insert("000", 1022);
        counts.insert("111", 1019);
        counts.insert("101", 1062);
        counts.insert("010", 993);
        counts
    }

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.insert("01", 3);
        counts.insert("01", 2);
        assert_eq!(counts.get("01"), 5);
        assert_eq!(counts.get("10"), 0);
        assert_eq!(counts.total_shots(), 5);
    }

    #[test]
    fn test_sorting_and_most_frequent() {
        let counts = sample();
        assert_eq!(counts.total_shots(), 4096);
        assert_eq!(counts.most_frequent(), Some(("101", 1062)));
        let keys: Vec<_> = counts.sorted_by_key().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["000", "010", "101", "111"]);
        assert_eq!(counts.sorted()[3], ("010", 993));
        assert_eq!(counts.bit_width(), Some(3));
    }

    #[test]
    fn test_display_like_dict() {
        let counts = sample();
        assert_eq!(
            counts.to_string(),
            "{'000': 1022, '010': 993, '101': 1062, '111': 1019}"
        );
        assert_eq!(Counts::new().to_string(), "{}");
    }

    #[test]
    fn test_probabilities() {
        let counts: Counts = vec![("0".to_string(), 1), ("1".to_string(), 3)]
            .into_iter()
            .collect();
        let p = counts.probabilities();
        assert_eq!(p, vec![("0", 0.25), ("1", 0.75)]);
        assert!(Counts::new().probabilities().is_empty());
    }

    #[test]
    fn test_result_serializes_counts_as_map() {
        let result = ExecutionResult::new(sample(), 4096)
            .with_backend("simulator")
            .with_execution_time(12);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["counts"]["101"], 1062);
        assert_eq!(json["shots"], 4096);
        assert_eq!(json["backend"], "simulator");
        assert!(json.get("metadata").is_none());
    }
}
