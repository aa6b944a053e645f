use super::encoding::{encode_string, encode_vector, unsigned_leb128};
use super::opcodes::{desc, section, valtype, FUNC_TYPE, MAGIC, MODULE_VERSION};

fn create_section(id: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = vec![id];
    out.extend(unsigned_leb128(payload.len() as u64));
    out.extend(payload);
    out
}

/// Wrap one generated function body into a complete module.
///
/// Import order pins the function index space: index 0 is `env.print`,
/// index 1 is the compiled program; `call 0` in the generated code and the
/// `run` export both depend on it.
pub fn assemble(body: &[u8]) -> Vec<u8> {
    // (i32) -> () for print, () -> () for the program
    let print_type = {
        let mut t = vec![FUNC_TYPE];
        t.extend(encode_vector(&[vec![valtype::I32]]));
        t.push(0x00); // no results
        t
    };
    let run_type = vec![FUNC_TYPE, 0x00, 0x00];
    let type_section = create_section(section::TYPE, encode_vector(&[print_type, run_type]));

    let print_import = {
        let mut import = encode_string("env");
        import.extend(encode_string("print"));
        import.push(desc::FUNC);
        import.push(0x00); // type index 0
        import
    };
    let memory_import = {
        let mut import = encode_string("env");
        import.extend(encode_string("memory"));
        import.push(desc::MEM);
        import.extend([0x00, 0x01]); // limits: min 1 page, no max
        import
    };
    let import_section =
        create_section(section::IMPORT, encode_vector(&[print_import, memory_import]));

    // one locally defined function, type index 1
    let func_section = create_section(section::FUNC, encode_vector(&[vec![0x01]]));

    let run_export = {
        let mut export = encode_string("run");
        export.push(desc::FUNC);
        export.push(0x01); // function index 1, after the print import
        export
    };
    let export_section = create_section(section::EXPORT, encode_vector(&[run_export]));

    let code_section = create_section(section::CODE, encode_vector(&[body.to_vec()]));

    let mut module = Vec::with_capacity(8 + type_section.len() + import_section.len() + body.len());
    module.extend(MAGIC);
    module.extend(MODULE_VERSION);
    module.extend(type_section);
    module.extend(import_section);
    module.extend(func_section);
    module.extend(export_section);
    module.extend(code_section);
    module
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_golden_module() {
        // the empty program's body: one i32 local group, end
        let body = vec![0x04, 0x01, 0x01, 0x7f, 0x0b];
        assert_eq!(
            assemble(&body),
            vec![
                0x00, 0x61, 0x73, 0x6d, // \0asm
                0x01, 0x00, 0x00, 0x00, // version 1
                // type: [(i32) -> (), () -> ()]
                0x01, 0x08, 0x02, 0x60, 0x01, 0x7f, 0x00, 0x60, 0x00, 0x00,
                // import: env.print func 0, env.memory min 1 page
                0x02, 0x1b, 0x02, //
                0x03, b'e', b'n', b'v', 0x05, b'p', b'r', b'i', b'n', b't', 0x00, 0x00, //
                0x03, b'e', b'n', b'v', 0x06, b'm', b'e', b'm', b'o', b'r', b'y', 0x02, 0x00,
                0x01, //
                // func: one function, type 1
                0x03, 0x02, 0x01, 0x01, //
                // export: "run" -> func 1
                0x07, 0x07, 0x01, 0x03, b'r', b'u', b'n', 0x00, 0x01, //
                // code: the single body
                0x0a, 0x06, 0x01, 0x04, 0x01, 0x01, 0x7f, 0x0b,
            ]
        );
    }
}
