pub mod emit;
pub mod encoding;
pub mod module;
pub mod opcodes;

pub use emit::{disassemble, generate};
pub use module::assemble;
