use std::fmt;

use thiserror::Error;

pub mod parser;

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    PointerRight,
    PointerLeft,

    Increment,
    Decrement,

    Output,
    Input,

    Loop(BasicBlock),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicBlock {
    pub instructions: Vec<AstKind>,
}

pub type Program = BasicBlock;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("can't find matching `[` for `]` at {line}:{col}")]
    UnmatchedLoopClose { line: usize, col: usize },

    #[error("can't find matching `]` for `[` at {line}:{col}")]
    UnclosedLoop { line: usize, col: usize },
}

impl BasicBlock {
    /// Total number of nodes in the tree, loops included.
    pub fn len(&self) -> usize {
        self.instructions
            .iter()
            .map(|node| match node {
                AstKind::Loop(block) => 1 + block.len(),
                _ => 1,
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Re-serialize the tree back to source text (comments are not kept).
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for node in &self.instructions {
            match node {
                AstKind::PointerRight => out.push('>'),
                AstKind::PointerLeft => out.push('<'),
                AstKind::Increment => out.push('+'),
                AstKind::Decrement => out.push('-'),
                AstKind::Output => out.push('.'),
                AstKind::Input => out.push(','),
                AstKind::Loop(block) => {
                    out.push('[');
                    out.push_str(&block.to_source());
                    out.push(']');
                }
            }
        }
        out
    }

    fn fmt_at_depth(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let count = self.instructions.len();
        for (i, node) in self.instructions.iter().enumerate() {
            let last = depth > 0 && i == count - 1 && !matches!(node, AstKind::Loop(_));
            let rail = if last {
                format!("{} └ ", " │ ".repeat(depth - 1))
            } else {
                " │ ".repeat(depth)
            };
            f.write_str(&rail)?;

            match node {
                AstKind::PointerRight => writeln!(f, "PointerRight")?,
                AstKind::PointerLeft => writeln!(f, "PointerLeft")?,
                AstKind::Increment => writeln!(f, "Increment")?,
                AstKind::Decrement => writeln!(f, "Decrement")?,
                AstKind::Output => writeln!(f, "Output")?,
                AstKind::Input => writeln!(f, "Input")?,
                AstKind::Loop(block) => {
                    writeln!(f, "Loop")?;
                    block.fmt_at_depth(f, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at_depth(f, 0)
    }
}
