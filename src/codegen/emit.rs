use crate::optimizer::{MirAstKind, MirBasicBlock, MirProgram};
use crate::Optimizations;

use super::encoding::{encode_local, encode_vector, signed_leb128, unsigned_leb128};
use super::opcodes::{op, valtype, BLOCKTYPE_VOID};

/// Local index of the tape pointer, the only local the program uses.
/// The runtime zero-initializes it, which is also the starting tape position.
const INDEX_LOCAL: u64 = 0;

/// Lowers MIR into a linear byte buffer, with an optional mnemonic listing
/// built alongside.
struct CodeGen {
    code: Vec<u8>,
    asm: Vec<String>,
    listing: bool,
    tee_fusion: bool,

    /// Byte offset of a `local.set 0` that is the last instruction emitted,
    /// the candidate for tee fusion.
    pending_set: Option<usize>,
}

impl CodeGen {
    fn new(optimizations: Optimizations, listing: bool) -> CodeGen {
        CodeGen {
            code: vec![],
            asm: vec![],
            listing,
            tee_fusion: optimizations.contains(Optimizations::LOCAL_TEE_FUSION),
            pending_set: None,
        }
    }

    /// Any opcode other than `local.set 0` ends a pending fusion.
    fn op(&mut self, opcode: u8) {
        self.pending_set = None;
        self.code.push(opcode);
    }

    fn note(&mut self, line: &str) {
        if self.listing {
            self.asm.push(line.to_string());
        }
    }

    fn load_index(&mut self) {
        if let Some(at) = self.pending_set.take() {
            // the value we just stored is what we are about to read back,
            // so keep it on the stack with a store-and-return instead
            self.code[at] = op::LOCAL_TEE;
            if self.listing {
                if let Some(last) = self.asm.last_mut() {
                    *last = "local.tee 0".to_string();
                }
            }
            return;
        }

        self.op(op::LOCAL_GET);
        self.code.extend(unsigned_leb128(INDEX_LOCAL));
        self.note("local.get 0");
    }

    fn write_index(&mut self) {
        // ($value)
        let at = self.code.len();
        self.op(op::LOCAL_SET);
        self.code.extend(unsigned_leb128(INDEX_LOCAL));
        self.note("local.set 0");
        if self.tee_fusion {
            self.pending_set = Some(at);
        }
    }

    fn load_i32(&mut self, val: i32) {
        self.op(op::I32_CONST);
        self.code.extend(signed_leb128(i64::from(val)));
        if self.listing {
            self.asm.push(format!("i32.const {val}"));
        }
    }

    fn add_i32(&mut self, val: i32) {
        // ($value) -> ($value + val)
        self.load_i32(val);
        self.op(op::I32_ADD);
        self.note("i32.add");
    }

    /// Raw 8-bit sign-extending load; the address is already on the stack.
    fn load8(&mut self, offset: u32) {
        self.op(op::I32_LOAD8_S);
        self.code.push(0x00); // alignment
        self.code.extend(unsigned_leb128(u64::from(offset)));
        if self.listing {
            if offset == 0 {
                self.asm.push("i32.load8_s".to_string());
            } else {
                self.asm.push(format!("i32.load8_s offset={offset}"));
            }
        }
    }

    fn load_cell(&mut self, offset: u32) {
        self.load_index();
        self.load8(offset);
    }

    fn write_cell(&mut self, offset: u32) {
        // ($location, $value)
        self.op(op::I32_STORE8);
        self.code.push(0x00); // alignment
        self.code.extend(unsigned_leb128(u64::from(offset)));
        if self.listing {
            if offset == 0 {
                self.asm.push("i32.store8".to_string());
            } else {
                self.asm.push(format!("i32.store8 offset={offset}"));
            }
        }
    }

    /// Push `pointer + offset` as an explicit address. Needed for negative
    /// offsets, which memarg immediates (unsigned) can't express.
    fn cell_address(&mut self, offset: i32) {
        self.load_index();
        self.add_i32(offset);
    }

    fn call_print(&mut self) {
        self.op(op::CALL);
        self.code.extend(unsigned_leb128(0));
        self.note("call 0");
    }

    /// Spell out a diagnostic through the print import, then trap.
    fn unreachable(&mut self, msg: &str) {
        for byte in format!("unreachable! {msg}\n").bytes() {
            self.load_i32(i32::from(byte));
            self.call_print();
        }
        self.op(op::UNREACHABLE);
        self.note("unreachable");
    }

    /// `mem[pointer + offset] += factor * mem[pointer]`
    fn cell_add_cell(&mut self, offset: i32, factor: i32) {
        if offset >= 0 {
            let offset = offset as u32;
            self.load_index(); // store address, offset rides in the memarg
            self.load_cell(offset);
            self.load_cell(0);
            if factor != 1 {
                self.load_i32(factor);
                self.op(op::I32_MUL);
                self.note("i32.mul");
            }
            self.op(op::I32_ADD);
            self.note("i32.add");
            self.write_cell(offset);
        } else {
            self.cell_address(offset); // store address
            self.cell_address(offset);
            self.load8(0);
            self.load_cell(0);
            if factor != 1 {
                self.load_i32(factor);
                self.op(op::I32_MUL);
                self.note("i32.mul");
            }
            self.op(op::I32_ADD);
            self.note("i32.add");
            self.write_cell(0);
        }
    }

    fn emit_block(&mut self, block: &MirBasicBlock) {
        for node in &block.instructions {
            match node {
                MirAstKind::PointerAdd(val) => {
                    self.load_index();
                    self.add_i32(*val);
                    self.write_index();
                }

                MirAstKind::PointerSet(val) => {
                    self.load_i32(*val);
                    self.write_index();
                }

                MirAstKind::CellAdd(val) => {
                    self.load_index();
                    self.load_cell(0);
                    self.add_i32(*val);
                    self.write_cell(0);
                }

                MirAstKind::CellSet(val) => {
                    self.load_index();
                    self.load_i32(*val);
                    self.write_cell(0);
                }

                MirAstKind::CellAddCell { offset, factor } => {
                    self.cell_add_cell(*offset, *factor);
                }

                MirAstKind::Output => {
                    self.load_cell(0);
                    self.call_print();
                }

                MirAstKind::Input => self.unreachable("input is not implemented"),

                MirAstKind::Loop(body) => {
                    // loop        ;; branch target for the next iteration
                    //   (cell)    ;; while (cell != 0)
                    //   if
                    //     <body>
                    //     br 1    ;; back to the loop head
                    //   end       ;; falling out of the `if` exits the loop
                    // end
                    self.op(op::LOOP);
                    self.code.push(BLOCKTYPE_VOID);
                    self.note("loop");

                    self.load_cell(0);
                    self.op(op::IF);
                    self.code.push(BLOCKTYPE_VOID);
                    self.note("if");

                    self.emit_block(body);

                    self.op(op::BR);
                    self.code.extend(unsigned_leb128(1));
                    self.note("br 1");

                    self.op(op::END);
                    self.note("end");
                    self.op(op::END);
                    self.note("end");
                }
            }
        }
    }

    fn finish(self) -> (Vec<u8>, Vec<String>) {
        // the pointer local is declared whether or not the body touches it,
        // so the function index space and body framing never vary by program
        let locals = vec![encode_local(1, valtype::I32)];

        let mut payload = encode_vector(&locals);
        payload.extend(self.code);
        payload.push(op::END);

        let mut body = unsigned_leb128(payload.len() as u64);
        body.extend(payload);
        (body, self.asm)
    }
}

/// Lower MIR to the function's complete code-section entry: body size,
/// locals vector, instructions, `end`.
pub fn generate(program: &MirProgram, optimizations: Optimizations) -> Vec<u8> {
    let mut codegen = CodeGen::new(optimizations, false);
    codegen.emit_block(program);
    codegen.finish().0
}

/// The listing twin of `generate`: the same lowering walk over the same MIR,
/// one mnemonic per line instead of bytes. Neither pass mutates the tree.
pub fn disassemble(program: &MirProgram, optimizations: Optimizations) -> String {
    let mut codegen = CodeGen::new(optimizations, true);
    codegen.emit_block(program);
    codegen.finish().1.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::optimize;
    use crate::parser::parser::parse;

    fn body(src: &str, optimizations: Optimizations) -> Vec<u8> {
        generate(&optimize(&parse(src).unwrap(), optimizations), optimizations)
    }

    #[test]
    fn pointer_local_is_declared_even_when_unused() {
        // one i32 local group, then end: the empty program still carries it
        assert_eq!(
            body("", Optimizations::default()),
            vec![0x04, 0x01, 0x01, 0x7f, 0x0b]
        );
        // same for a body that never reads the pointer
        let trap_only = body(",", Optimizations::default());
        let after_size = 1 + trap_only.iter().take_while(|b| *b & 0x80 != 0).count();
        assert_eq!(&trap_only[after_size..after_size + 3], &[0x01, 0x01, 0x7f]);
    }

    #[test]
    fn cell_set_one_golden_bytes() {
        // `+` at a fresh cell: local.get 0 / i32.const 1 / i32.store8
        assert_eq!(
            body("+", Optimizations::default()),
            vec![0x0b, 0x01, 0x01, 0x7f, 0x20, 0x00, 0x41, 0x01, 0x3a, 0x00, 0x00, 0x0b]
        );
    }

    #[test]
    fn store_then_load_fuses_into_tee() {
        // `>` then `+`: the pointer store feeds straight into the cell write
        let fused = body(">+", Optimizations::default());
        let unfused = body(">+", Optimizations::default() - Optimizations::LOCAL_TEE_FUSION);

        // i32.const 1 / local.tee 0 / i32.const 1 / i32.store8
        assert_eq!(
            fused,
            vec![0x0d, 0x01, 0x01, 0x7f, 0x41, 0x01, 0x22, 0x00, 0x41, 0x01, 0x3a, 0x00, 0x00, 0x0b]
        );
        // i32.const 1 / local.set 0 / local.get 0 / i32.const 1 / i32.store8
        assert_eq!(
            unfused,
            vec![
                0x0f, 0x01, 0x01, 0x7f, 0x41, 0x01, 0x21, 0x00, 0x20, 0x00, 0x41, 0x01, 0x3a,
                0x00, 0x00, 0x0b
            ]
        );
    }

    #[test]
    fn input_lowers_to_a_trap() {
        let bytes = body(",", Optimizations::default());
        // ends with unreachable, then the function's end
        assert_eq!(&bytes[bytes.len() - 2..], &[0x00, 0x0b]);
        // and prints through import 0 before trapping
        assert!(bytes.windows(2).any(|w| w == [0x10, 0x00]));
    }

    #[test]
    fn loop_shape_is_loop_if_br() {
        let bytes = body("[.]", Optimizations::default());
        // loop void / local.get 0 / i32.load8_s 0 0 / if void /
        //   local.get 0 / i32.load8_s 0 0 / call 0 / br 1 / end end / end
        assert_eq!(
            bytes,
            vec![
                0x18, 0x01, 0x01, 0x7f, // body size, one i32 local
                0x03, 0x40, // loop
                0x20, 0x00, 0x2c, 0x00, 0x00, // test load
                0x04, 0x40, // if
                0x20, 0x00, 0x2c, 0x00, 0x00, 0x10, 0x00, // output
                0x0c, 0x01, // br 1
                0x0b, 0x0b, // end if, end loop
                0x0b, // end function
            ]
        );
    }

    #[test]
    fn disassembly_mirrors_the_lowering() {
        let program = optimize(
            &parse(">+").unwrap(),
            Optimizations::default(),
        );
        let listing = disassemble(&program, Optimizations::default());
        assert_eq!(
            listing,
            "i32.const 1\nlocal.tee 0\ni32.const 1\ni32.store8"
        );
    }

    #[test]
    fn negative_offsets_compute_the_address_explicitly() {
        let opts = Optimizations::default() - Optimizations::LOCAL_TEE_FUSION;
        let bytes = body("[-<+>]", opts);
        // somewhere in the body: local.get 0 / i32.const -1 / i32.add
        assert!(
            bytes.windows(5).any(|w| w == [0x20, 0x00, 0x41, 0x7f, 0x6a]),
            "body: {bytes:?}"
        );
    }
}
