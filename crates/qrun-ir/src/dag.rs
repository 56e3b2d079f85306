//! DAG-based circuit representation.
//!
//! Every wire (qubit or classical bit) runs from an input node to an output
//! node. Operations are spliced into the wires they touch, so the graph
//! carries the data dependencies between instructions.

use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex as PetNodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{IrError, IrResult};
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// Node index type for the circuit DAG.
pub type NodeIndex = PetNodeIndex<u32>;

/// A node in the circuit DAG.
#[derive(Debug, Clone, PartialEq)]
pub enum DagNode {
    /// Input node for a wire.
    In(WireId),
    /// Output node for a wire.
    Out(WireId),
    /// Operation node.
    Op(Instruction),
}

/// Identifier for a wire in the DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireId {
    /// A quantum wire.
    Qubit(QubitId),
    /// A classical wire.
    Clbit(ClbitId),
}

/// Directed acyclic graph of a circuit's instructions.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    graph: StableDiGraph<DagNode, WireId, u32>,
    inputs: FxHashMap<WireId, NodeIndex>,
    outputs: FxHashMap<WireId, NodeIndex>,
    /// Last node on each wire before its output node.
    wire_front: FxHashMap<WireId, NodeIndex>,
    /// Operation nodes in insertion order, which is a valid topological order.
    ops: Vec<NodeIndex>,
}

impl CircuitDag {
    /// Create an empty DAG.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qubit wire. Adding an existing wire is a no-op.
    pub fn add_qubit(&mut self, qubit: QubitId) {
        self.add_wire(WireId::Qubit(qubit));
    }

    /// Add a classical wire. Adding an existing wire is a no-op.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        self.add_wire(WireId::Clbit(clbit));
    }

    fn add_wire(&mut self, wire: WireId) {
        if self.inputs.contains_key(&wire) {
            return;
        }
        let in_node = self.graph.add_node(DagNode::In(wire));
        let out_node = self.graph.add_node(DagNode::Out(wire));
        self.graph.add_edge(in_node, out_node, wire);
        self.inputs.insert(wire, in_node);
        self.outputs.insert(wire, out_node);
        self.wire_front.insert(wire, in_node);
    }

    /// Validate `instruction` and append it at the end of its wires.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<NodeIndex> {
        let gate_name = Some(instruction.name().to_string());

        if let InstructionKind::Gate(gate) = &instruction.kind {
            if gate.num_qubits() != instruction.qubits.len() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got: instruction.qubits.len(),
                });
            }
        }

        let mut seen = FxHashSet::default();
        for &qubit in &instruction.qubits {
            if !self.inputs.contains_key(&WireId::Qubit(qubit)) {
                return Err(IrError::QubitNotFound {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate_name.clone(),
                });
            }
        }
        for &clbit in &instruction.clbits {
            if !self.inputs.contains_key(&WireId::Clbit(clbit)) {
                return Err(IrError::ClbitNotFound {
                    clbit,
                    gate_name: gate_name.clone(),
                });
            }
        }

        let wires: Vec<WireId> = instruction
            .qubits
            .iter()
            .map(|&q| WireId::Qubit(q))
            .chain(instruction.clbits.iter().map(|&c| WireId::Clbit(c)))
            .collect();

        let op_node = self.graph.add_node(DagNode::Op(instruction));
        for wire in wires {
            let out_node = self.outputs[&wire];
            let prev = self.wire_front[&wire];
            let edge = self
                .graph
                .edges_directed(prev, Direction::Outgoing)
                .find(|e| *e.weight() == wire && e.target() == out_node)
                .map(|e| e.id())
                .ok_or_else(|| {
                    IrError::InvalidDag(format!("wire {wire:?} is not connected to its output"))
                })?;
            self.graph.remove_edge(edge);
            self.graph.add_edge(prev, op_node, wire);
            self.graph.add_edge(op_node, out_node, wire);
            self.wire_front.insert(wire, op_node);
        }
        self.ops.push(op_node);

        Ok(op_node)
    }

    /// Instructions in the order they were applied.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.ops.iter().filter_map(|&idx| match &self.graph[idx] {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        })
    }

    /// Number of operation nodes.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// The instruction at an index returned by [`apply`](Self::apply).
    pub fn instruction(&self, node: NodeIndex) -> Option<&Instruction> {
        match self.graph.node_weight(node)? {
            DagNode::Op(inst) => Some(inst),
            _ => None,
        }
    }

    /// Moment index (starting at 1) of every operation, in insertion order.
    ///
    /// Barriers do not occupy a moment of their own; they report the moment
    /// of their latest predecessor and only order what comes after them.
    fn moments(&self) -> Vec<usize> {
        let mut by_node: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(self.ops.len(), Default::default());
        let mut moments = Vec::with_capacity(self.ops.len());

        for &node in &self.ops {
            let pred = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| by_node.get(&e.source()).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let is_barrier = matches!(&self.graph[node], DagNode::Op(inst) if inst.is_barrier());
            let moment = if is_barrier { pred } else { pred + 1 };
            by_node.insert(node, moment);
            moments.push(moment);
        }
        moments
    }

    /// Circuit depth: the length of the longest path of non-barrier operations.
    pub fn depth(&self) -> usize {
        self.moments().into_iter().max().unwrap_or(0)
    }

    /// Operations grouped into moments that can execute in parallel.
    pub fn layers(&self) -> Vec<Vec<&Instruction>> {
        let mut layers: Vec<Vec<&Instruction>> = vec![Vec::new(); self.depth()];
        for (inst, moment) in self.instructions().zip(self.moments()) {
            if !inst.is_barrier() && moment > 0 {
                layers[moment - 1].push(inst);
            }
        }
        layers
    }

    /// Check that every wire is a single path from its input to its output.
    pub fn verify_integrity(&self) -> IrResult<()> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(IrError::InvalidDag("cycle detected".into()));
        }
        for (&wire, &start) in &self.inputs {
            let end = self.outputs[&wire];
            let mut node = start;
            let mut steps = 0usize;
            while node != end {
                let next: Vec<NodeIndex> = self
                    .graph
                    .edges_directed(node, Direction::Outgoing)
                    .filter(|e| *e.weight() == wire)
                    .map(|e| e.target())
                    .collect();
                if next.len() != 1 {
                    return Err(IrError::InvalidDag(format!(
                        "wire {wire:?} branches or breaks at node {}",
                        node.index()
                    )));
                }
                node = next[0];
                steps += 1;
                if steps > self.graph.node_count() {
                    return Err(IrError::InvalidDag(format!("wire {wire:?} does not terminate")));
                }
            }
        }
        Ok(())
    }
}
