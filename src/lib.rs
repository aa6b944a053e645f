//! Ahead-of-time Brainfuck to WebAssembly compiler.
//!
//! Strictly linear pipeline, every stage a pure function:
//! text -> tokens -> AST -> MIR -> function body bytes -> module bytes.
//! The produced module imports `env.print(i32)` and `env.memory` (min one
//! page) and exports `run()`; instantiating and running it is the host's job.

use bitflags::bitflags;

pub mod codegen;
pub mod lexer;
pub mod optimizer;
pub mod parser;

pub use parser::ParseError;

bitflags! {
    /// The optimizations the pipeline may apply. Immutable input to
    /// `optimize`/`generate`, threaded by value, never process-wide state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Optimizations: u8 {
        /// Fold a run of `>`/`<` (or `+`/`-`) into one signed total.
        const COMBINE_OPS = 1 << 0;
        /// Rewrite `[-]` to a direct cell clear.
        const CLEAR_LOOP = 1 << 1;
        /// Collapse redistribute loops (`[->+<]` and friends) into
        /// multiply-accumulates plus a clear.
        const COPY_LOOP = 1 << 2;
        /// Restricted single-target form of `COPY_LOOP`; subsumed by it
        /// whenever both are enabled.
        const MOVE_LOOP = 1 << 3;
        /// Emit `*Set` instead of `*Add` when the destination is provably
        /// still zero.
        const ADD_TO_ZERO_AS_SET = 1 << 4;
        /// Merge `local.set` + `local.get` pairs into `local.tee`.
        const LOCAL_TEE_FUSION = 1 << 5;
    }
}

impl Default for Optimizations {
    fn default() -> Optimizations {
        Optimizations::all() - Optimizations::MOVE_LOOP
    }
}

/// One-shot composition of the whole pipeline: source text to module bytes.
/// Deterministic: the same source and flags always produce identical bytes.
pub fn compile(source: &str, optimizations: Optimizations) -> Result<Vec<u8>, ParseError> {
    let program = parser::parser::parse(source)?;
    let mir = optimizer::optimize(&program, optimizations);
    let body = codegen::generate(&mir, optimizations);
    Ok(codegen::assemble(&body))
}
