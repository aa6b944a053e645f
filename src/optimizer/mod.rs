use std::fmt;

use crate::parser::{AstKind, Program};
use crate::Optimizations;

use self::idioms::{is_clear_loop, move_pair, redistribute_pairs};
use self::symbolic::SymTape;

pub mod idioms;
pub mod symbolic;

/// Mid-level instructions: the parser tree with loop idioms collapsed into
/// closed-form operations and runs folded into signed totals.
#[derive(Debug, Clone, PartialEq)]
pub enum MirAstKind {
    /// `data pointer += delta`
    PointerAdd(i32),

    /// `data pointer = value`; only emitted when the pointer is provably
    /// zero before the add this replaces
    PointerSet(i32),

    /// `cell at pointer += delta`
    CellAdd(i32),

    /// `cell at pointer = value`
    CellSet(i32),

    /// `cell at (pointer + offset) += factor * cell at pointer`
    CellAddCell { offset: i32, factor: i32 },

    /// Write the cell at the pointer to the print import
    Output,

    /// Never implemented; lowers to a runtime trap
    Input,

    /// `while (cell at pointer != 0) { .. }`
    Loop(MirBasicBlock),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MirBasicBlock {
    pub instructions: Vec<MirAstKind>,
}

pub type MirProgram = MirBasicBlock;

/// Lower the parse tree into MIR. One recursive descent; the symbolic tape
/// lives only for the duration of this call.
pub fn optimize(program: &Program, optimizations: Optimizations) -> MirProgram {
    let mut tape = SymTape::new();
    MirBasicBlock {
        instructions: walk(&program.instructions, optimizations, &mut tape),
    }
}

fn pointer_step(node: &AstKind) -> i32 {
    match node {
        AstKind::PointerRight => 1,
        AstKind::PointerLeft => -1,
        _ => 0,
    }
}

fn cell_step(node: &AstKind) -> i32 {
    match node {
        AstKind::Increment => 1,
        AstKind::Decrement => -1,
        _ => 0,
    }
}

fn walk(nodes: &[AstKind], optimizations: Optimizations, tape: &mut SymTape) -> Vec<MirAstKind> {
    let combine = optimizations.contains(Optimizations::COMBINE_OPS);
    let as_set = optimizations.contains(Optimizations::ADD_TO_ZERO_AS_SET);

    let mut out = vec![];
    let mut i = 0;

    while i < nodes.len() {
        match &nodes[i] {
            node @ (AstKind::PointerRight | AstKind::PointerLeft) => {
                let mut delta = pointer_step(node);
                while combine && i + 1 < nodes.len() && pointer_step(&nodes[i + 1]) != 0 {
                    i += 1;
                    delta += pointer_step(&nodes[i]);
                }

                out.push(if as_set && tape.pointer_is_zero() {
                    MirAstKind::PointerSet(delta)
                } else {
                    MirAstKind::PointerAdd(delta)
                });
                tape.move_pointer(delta);
            }

            node @ (AstKind::Increment | AstKind::Decrement) => {
                let mut delta = cell_step(node);
                while combine && i + 1 < nodes.len() && cell_step(&nodes[i + 1]) != 0 {
                    i += 1;
                    delta += cell_step(&nodes[i]);
                }

                out.push(if as_set && tape.cell_is_zero() {
                    MirAstKind::CellSet(delta)
                } else {
                    MirAstKind::CellAdd(delta)
                });
                tape.add_cell(delta);
            }

            AstKind::Output => out.push(MirAstKind::Output),

            AstKind::Input => {
                // still compiles (to a trap); the cell is unknowable past here
                tape.taint();
                out.push(MirAstKind::Input);
            }

            AstKind::Loop(block) => {
                if optimizations.contains(Optimizations::CLEAR_LOOP) && is_clear_loop(block) {
                    tape.set_cell(0);
                    out.push(MirAstKind::CellSet(0));
                } else if let Some(pairs) = matched_redistribute(block, optimizations) {
                    for &(offset, factor) in &pairs {
                        out.push(MirAstKind::CellAddCell { offset, factor });
                    }
                    out.push(MirAstKind::CellSet(0));
                    tape.redistribute(&pairs);
                } else {
                    // unknown trip count: everything from here on, in the
                    // body and after it, compiles without tape knowledge
                    tape.taint();
                    out.push(MirAstKind::Loop(MirBasicBlock {
                        instructions: walk(&block.instructions, optimizations, tape),
                    }));
                }
            }
        }

        i += 1;
    }

    out
}

fn matched_redistribute(
    block: &crate::parser::BasicBlock,
    optimizations: Optimizations,
) -> Option<Vec<(i32, i32)>> {
    if optimizations.contains(Optimizations::COPY_LOOP) {
        redistribute_pairs(block)
    } else if optimizations.contains(Optimizations::MOVE_LOOP) {
        move_pair(block).map(|pair| vec![pair])
    } else {
        None
    }
}

impl MirBasicBlock {
    /// Total number of nodes in the tree, loops included.
    pub fn len(&self) -> usize {
        self.instructions
            .iter()
            .map(|node| match node {
                MirAstKind::Loop(block) => 1 + block.len(),
                _ => 1,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn fmt_at_depth(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let count = self.instructions.len();
        for (i, node) in self.instructions.iter().enumerate() {
            let last = depth > 0 && i == count - 1 && !matches!(node, MirAstKind::Loop(_));
            let rail = if last {
                format!("{} └ ", " │ ".repeat(depth - 1))
            } else {
                " │ ".repeat(depth)
            };
            f.write_str(&rail)?;

            match node {
                MirAstKind::PointerAdd(val) => writeln!(f, "PointerAdd {val}")?,
                MirAstKind::PointerSet(val) => writeln!(f, "PointerSet {val}")?,
                MirAstKind::CellAdd(val) => writeln!(f, "CellAdd {val}")?,
                MirAstKind::CellSet(val) => writeln!(f, "CellSet {val}")?,
                MirAstKind::CellAddCell { offset, factor } => {
                    writeln!(f, "CellAddCell {offset} x{factor}")?
                }
                MirAstKind::Output => writeln!(f, "Output")?,
                MirAstKind::Input => writeln!(f, "Input")?,
                MirAstKind::Loop(block) => {
                    writeln!(f, "Loop")?;
                    block.fmt_at_depth(f, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for MirBasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at_depth(f, 0)
    }
}
