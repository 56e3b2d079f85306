//! Text diagrams of circuits using box-drawing characters.
//!
//! Every qubit gets one wire row and every classical register one collapsed
//! `═` row. Adjacent wires share a spacer row so stacked gate boxes fuse
//! (`└┘` over `┌┐` becomes `├┤`). Operations are packed greedily into columns;
//! an operation spans every row between its outermost operands, so crossings
//! never collide with another operation in the same column.
//!
//! ```text
//!      ┌───┐     ┌─┐
//! q_0: ┤ H ├──■──┤M├─────────
//!      ├───┤  │  └╥┘┌─┐
//! q_1: ┤ H ├──┼───╫─┤M├──────
//!      └───┘┌─┴─┐ ║ └╥┘┌─┐
//! q_2: ─────┤ X ├─╫──╫─┤M├───
//!           └───┘ ║  ║ └╥┘
//! c: 3/═══════════╩══╩══╩════
//!                 0  1  2
//! ```

use crate::circuit::Circuit;
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Quantum,
    Classical,
    Spacer,
}

impl RowKind {
    fn fill(self) -> char {
        match self {
            RowKind::Quantum => '─',
            RowKind::Classical => '═',
            RowKind::Spacer => ' ',
        }
    }
}

#[derive(Debug)]
enum Marker {
    Dot,
    Cross,
    Boxed(String),
}

#[derive(Debug)]
enum Element {
    /// Markers on qubit slots, joined by a vertical connector.
    Gate(Vec<(usize, Marker)>),
    Measure { qubit: usize, creg: usize, bit: u32 },
    Barrier(Vec<usize>),
}

impl Element {
    fn from_instruction(inst: &Instruction, circuit: &Circuit) -> Option<Self> {
        let slots: Vec<usize> = inst.qubits.iter().map(|q| q.0 as usize).collect();
        match &inst.kind {
            InstructionKind::Gate(gate) => Some(Element::Gate(gate_markers(gate, &slots))),
            InstructionKind::Reset => Some(Element::Gate(vec![(
                *slots.first()?,
                Marker::Boxed("|0>".into()),
            )])),
            InstructionKind::Barrier if slots.is_empty() => None,
            InstructionKind::Barrier => Some(Element::Barrier(slots)),
            InstructionKind::Measure => {
                let clbit = *inst.clbits.first()?;
                let (reg, bit) = circuit.locate_clbit(clbit)?;
                let creg = circuit.cregs().iter().position(|r| r.name == reg.name)?;
                Some(Element::Measure {
                    qubit: *slots.first()?,
                    creg: circuit.num_qubits() + creg,
                    bit,
                })
            }
        }
    }

    fn span(&self) -> (usize, usize) {
        match self {
            Element::Gate(markers) => min_max(markers.iter().map(|(s, _)| *s)),
            Element::Measure { qubit, creg, .. } => (*qubit, *creg),
            Element::Barrier(slots) => min_max(slots.iter().copied()),
        }
    }

    fn width(&self) -> usize {
        let w = match self {
            Element::Gate(markers) => markers
                .iter()
                .map(|(_, m)| match m {
                    Marker::Boxed(label) => box_width(label),
                    _ => 3,
                })
                .max()
                .unwrap_or(3),
            Element::Measure { bit, .. } => (2 * bit.to_string().len() + 1).max(3),
            Element::Barrier(_) => 3,
        };
        w | 1
    }
}

fn gate_markers(gate: &StandardGate, slots: &[usize]) -> Vec<(usize, Marker)> {
    let controls = gate.num_controls();
    slots
        .iter()
        .enumerate()
        .map(|(i, &slot)| {
            let marker = match gate {
                StandardGate::Swap => Marker::Cross,
                StandardGate::CZ => Marker::Dot,
                _ if i < controls => Marker::Dot,
                _ => Marker::Boxed(gate.label()),
            };
            (slot, marker)
        })
        .collect()
}

fn min_max(slots: impl Iterator<Item = usize>) -> (usize, usize) {
    slots.fold((usize::MAX, 0), |(lo, hi), s| (lo.min(s), hi.max(s)))
}

fn box_width(label: &str) -> usize {
    (label.chars().count() + 4) | 1
}

/// Connection bits of single-line box characters: up, down, left, right.
fn line_bits(c: char) -> Option<u8> {
    Some(match c {
        ' ' => 0,
        '│' => 0b0011,
        '─' => 0b1100,
        '┌' => 0b1010,
        '┐' => 0b0110,
        '└' => 0b1001,
        '┘' => 0b0101,
        '├' => 0b1011,
        '┤' => 0b0111,
        '┬' => 0b1110,
        '┴' => 0b1101,
        '┼' => 0b1111,
        _ => return None,
    })
}

fn from_line_bits(bits: u8) -> char {
    match bits {
        0b0011 => '│',
        0b1100 | 0b0100 | 0b1000 => '─',
        0b1010 => '┌',
        0b0110 => '┐',
        0b1001 => '└',
        0b0101 => '┘',
        0b1011 => '├',
        0b0111 => '┤',
        0b1110 => '┬',
        0b1101 => '┴',
        0b1111 => '┼',
        0b0001 | 0b0010 => '│',
        _ => ' ',
    }
}

/// A single column of the diagram being painted.
struct Column<'a> {
    cells: Vec<Vec<char>>,
    kinds: &'a [RowKind],
    width: usize,
}

impl<'a> Column<'a> {
    fn new(kinds: &'a [RowKind], width: usize) -> Self {
        let cells = kinds.iter().map(|k| vec![k.fill(); width]).collect();
        Self {
            cells,
            kinds,
            width,
        }
    }

    fn center(&self) -> usize {
        self.width / 2
    }

    fn put(&mut self, row: usize, col: usize, c: char) {
        if let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = c;
        }
    }

    /// Combine a line character with what is already in the cell.
    fn merge(&mut self, row: usize, col: usize, c: char) {
        let Some(cell) = self.cells.get_mut(row).and_then(|r| r.get_mut(col)) else {
            return;
        };
        *cell = match (line_bits(*cell), line_bits(c)) {
            (Some(a), Some(b)) => from_line_bits(a | b),
            _ => c,
        };
    }

    fn paint_box(&mut self, slot: usize, label: &str) {
        let bw = box_width(label);
        let start = self.center() - bw / 2;
        let (top, mid, bot) = (2 * slot, 2 * slot + 1, 2 * slot + 2);

        self.merge(top, start, '┌');
        self.merge(bot, start, '└');
        for x in start + 1..start + bw - 1 {
            self.merge(top, x, '─');
            self.merge(bot, x, '─');
        }
        self.merge(top, start + bw - 1, '┐');
        self.merge(bot, start + bw - 1, '┘');

        let inner: Vec<char> = format!(" {label:<width$}", width = bw - 3).chars().collect();
        self.put(mid, start, '┤');
        for (i, c) in inner.into_iter().enumerate() {
            self.put(mid, start + 1 + i, c);
        }
        self.put(mid, start + bw - 1, '├');
    }

    fn paint_gate(&mut self, markers: &[(usize, Marker)]) {
        let (lo, hi) = min_max(markers.iter().map(|(s, _)| *s));
        let cx = self.center();
        let boxed: Vec<usize> = markers
            .iter()
            .filter(|(_, m)| matches!(m, Marker::Boxed(_)))
            .map(|(s, _)| *s)
            .collect();

        for (slot, marker) in markers {
            match marker {
                Marker::Dot => self.put(2 * slot + 1, cx, '■'),
                Marker::Cross => self.put(2 * slot + 1, cx, '╳'),
                Marker::Boxed(label) => self.paint_box(*slot, label),
            }
        }

        if lo == hi {
            return;
        }
        let marker_rows: Vec<usize> = markers.iter().map(|(s, _)| 2 * s + 1).collect();
        for row in 2 * lo + 2..2 * hi + 1 {
            let in_box = boxed.iter().any(|&s| (2 * s..=2 * s + 2).contains(&row));
            if in_box || marker_rows.contains(&row) {
                continue;
            }
            self.merge(row, cx, '│');
        }
        for &s in &boxed {
            if s > lo {
                self.put(2 * s, cx, '┴');
            }
            if s < hi {
                self.put(2 * s + 2, cx, '┬');
            }
        }
    }

    fn paint_measure(&mut self, qubit: usize, creg: usize, bit: u32) {
        let cx = self.center();
        let (top, mid, bot) = (2 * qubit, 2 * qubit + 1, 2 * qubit + 2);
        self.merge(top, cx - 1, '┌');
        self.merge(top, cx, '─');
        self.merge(top, cx + 1, '┐');
        self.put(mid, cx - 1, '┤');
        self.put(mid, cx, 'M');
        self.put(mid, cx + 1, '├');
        self.merge(bot, cx - 1, '└');
        self.put(bot, cx, '╥');
        self.merge(bot, cx + 1, '┘');

        let creg_row = 2 * creg + 1;
        for row in bot + 1..creg_row {
            let c = match self.kinds[row] {
                RowKind::Quantum => '╫',
                RowKind::Classical => '╬',
                RowKind::Spacer => '║',
            };
            self.put(row, cx, c);
        }
        self.put(creg_row, cx, '╩');
        for (i, c) in bit.to_string().chars().enumerate() {
            self.put(creg_row + 1, cx + i, c);
        }
    }

    fn paint_barrier(&mut self, slots: &[usize]) {
        let (lo, hi) = min_max(slots.iter().copied());
        let cx = self.center();
        for row in 2 * lo + 1..=2 * hi + 1 {
            self.put(row, cx, '░');
        }
    }
}

/// Render `circuit` as a multi-line text diagram.
///
/// Qubit wires are labelled `{register}_{index}:`, classical registers
/// `{register}: {size}/`. Returns an empty string for a circuit without
/// qubits.
pub fn draw(circuit: &Circuit) -> String {
    let nq = circuit.num_qubits();
    if nq == 0 {
        return String::new();
    }
    let slots = nq + circuit.cregs().len();

    let mut kinds = Vec::with_capacity(2 * slots + 1);
    kinds.push(RowKind::Spacer);
    for s in 0..slots {
        kinds.push(if s < nq {
            RowKind::Quantum
        } else {
            RowKind::Classical
        });
        kinds.push(RowKind::Spacer);
    }

    let mut labels = vec![String::new(); kinds.len()];
    for reg in circuit.qregs() {
        for (i, q) in reg.qubits().enumerate() {
            labels[2 * q.0 as usize + 1] = format!("{}_{}: ", reg.name, i);
        }
    }
    for (k, reg) in circuit.cregs().iter().enumerate() {
        labels[2 * (nq + k) + 1] = format!("{}: {}/", reg.name, reg.size);
    }
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    // Greedy column packing over each element's row span.
    let elements: Vec<Element> = circuit
        .instructions()
        .filter_map(|inst| Element::from_instruction(inst, circuit))
        .collect();
    let mut next_free = vec![0usize; slots];
    let mut columns: Vec<Vec<&Element>> = Vec::new();
    for element in &elements {
        let (lo, hi) = element.span();
        let col = next_free[lo..=hi].iter().copied().max().unwrap_or(0);
        if columns.len() <= col {
            columns.resize_with(col + 1, Vec::new);
        }
        columns[col].push(element);
        for slot in &mut next_free[lo..=hi] {
            *slot = col + 1;
        }
    }

    let mut lines: Vec<String> = labels
        .iter()
        .map(|l| format!("{l:>label_width$}"))
        .collect();

    for column in &columns {
        let width = column.iter().map(|e| e.width()).max().unwrap_or(3);
        let mut painter = Column::new(&kinds, width);
        for element in column {
            match element {
                Element::Gate(markers) => painter.paint_gate(markers),
                Element::Measure { qubit, creg, bit } => {
                    painter.paint_measure(*qubit, *creg, *bit);
                }
                Element::Barrier(slots) => painter.paint_barrier(slots),
            }
        }
        for (line, cells) in lines.iter_mut().zip(&painter.cells) {
            line.extend(cells.iter());
        }
    }

    for (line, kind) in lines.iter_mut().zip(&kinds) {
        for _ in 0..3 {
            line.push(kind.fill());
        }
    }

    lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
