//! Qubit and classical bit identifiers, and the named registers that own them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat index of a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Flat index of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// A named quantum register covering a contiguous range of qubit ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumRegister {
    /// Register name, e.g. `q`.
    pub name: String,
    /// Number of qubits.
    pub size: u32,
    /// Flat id of the register's first qubit.
    pub offset: u32,
}

impl QuantumRegister {
    /// The `index`-th qubit of this register.
    pub fn qubit(&self, index: u32) -> Option<QubitId> {
        (index < self.size).then(|| QubitId(self.offset + index))
    }

    /// All qubits of this register in index order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        (self.offset..self.offset + self.size).map(QubitId)
    }

    /// Position of `qubit` inside this register.
    pub fn index_of(&self, qubit: QubitId) -> Option<u32> {
        (self.offset..self.offset + self.size)
            .contains(&qubit.0)
            .then(|| qubit.0 - self.offset)
    }
}

/// A named classical register covering a contiguous range of bit ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// Register name, e.g. `c`.
    pub name: String,
    /// Number of bits.
    pub size: u32,
    /// Flat id of the register's first bit.
    pub offset: u32,
}

impl ClassicalRegister {
    /// The `index`-th bit of this register.
    pub fn clbit(&self, index: u32) -> Option<ClbitId> {
        (index < self.size).then(|| ClbitId(self.offset + index))
    }

    /// All bits of this register in index order.
    pub fn clbits(&self) -> impl Iterator<Item = ClbitId> + '_ {
        (self.offset..self.offset + self.size).map(ClbitId)
    }

    /// Position of `clbit` inside this register.
    pub fn index_of(&self, clbit: ClbitId) -> Option<u32> {
        (self.offset..self.offset + self.size)
            .contains(&clbit.0)
            .then(|| clbit.0 - self.offset)
    }
}

impl fmt::Display for QuantumRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.size)
    }
}

impl fmt::Display for ClassicalRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(QubitId(0).to_string(), "q0");
        assert_eq!(ClbitId(2).to_string(), "c2");
    }

    #[test]
    fn test_register_ranges() {
        let reg = QuantumRegister {
            name: "anc".into(),
            size: 2,
            offset: 3,
        };
        assert_eq!(reg.qubit(0), Some(QubitId(3)));
        assert_eq!(reg.qubit(2), None);
        assert_eq!(reg.index_of(QubitId(4)), Some(1));
        assert_eq!(reg.index_of(QubitId(2)), None);
        assert_eq!(reg.qubits().collect::<Vec<_>>(), vec![QubitId(3), QubitId(4)]);
        assert_eq!(reg.to_string(), "anc[2]");
    }

    #[test]
    fn test_classical_register() {
        let reg = ClassicalRegister {
            name: "c".into(),
            size: 3,
            offset: 0,
        };
        assert_eq!(reg.clbit(2), Some(ClbitId(2)));
        assert_eq!(reg.clbits().count(), 3);
        assert_eq!(reg.index_of(ClbitId(3)), None);
    }
}
