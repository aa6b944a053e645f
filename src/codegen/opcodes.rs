//! The slice of the wasm binary format this backend emits.
//! Numbers straight from the spec: https://webassembly.github.io/spec/core/binary/

pub const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d]; // \0asm
pub const MODULE_VERSION: [u8; 4] = [0x01, 0x00, 0x00, 0x00];

/// Section ids, in the order they must appear in a module.
pub mod section {
    pub const TYPE: u8 = 0x01;
    pub const IMPORT: u8 = 0x02;
    pub const FUNC: u8 = 0x03;
    pub const EXPORT: u8 = 0x07;
    pub const CODE: u8 = 0x0a;
}

/// Import/export descriptor tags.
pub mod desc {
    pub const FUNC: u8 = 0x00;
    pub const MEM: u8 = 0x02;
}

pub mod valtype {
    pub const I32: u8 = 0x7f;
}

pub const FUNC_TYPE: u8 = 0x60;
pub const BLOCKTYPE_VOID: u8 = 0x40;

pub mod op {
    pub const UNREACHABLE: u8 = 0x00;

    pub const LOOP: u8 = 0x03;
    pub const IF: u8 = 0x04;
    pub const END: u8 = 0x0b;
    pub const BR: u8 = 0x0c;
    pub const CALL: u8 = 0x10;

    pub const LOCAL_GET: u8 = 0x20;
    pub const LOCAL_SET: u8 = 0x21;
    pub const LOCAL_TEE: u8 = 0x22;

    pub const I32_LOAD8_S: u8 = 0x2c;
    pub const I32_STORE8: u8 = 0x3a;

    pub const I32_CONST: u8 = 0x41;

    pub const I32_ADD: u8 = 0x6a;
    pub const I32_MUL: u8 = 0x6c;
}
