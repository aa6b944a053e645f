//! The handful of primitive encodings the binary format is built from.
//! All pure; nothing here knows about instruction trees.

/// Unsigned LEB128, any magnitude.
pub fn unsigned_leb128(value: u64) -> Vec<u8> {
    let mut out = vec![];
    let mut n = value;

    loop {
        let mut byte = (n & 0x7f) as u8;
        n >>= 7;
        if n != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if n == 0 {
            break out;
        }
    }
}

/// Signed LEB128, any magnitude.
pub fn signed_leb128(value: i64) -> Vec<u8> {
    let mut out = vec![];
    let mut n = value;

    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7; // arithmetic shift, keeps the sign
        let done = (n == 0 && byte & 0x40 == 0) || (n == -1 && byte & 0x40 != 0);
        out.push(if done { byte } else { byte | 0x80 });
        if done {
            break out;
        }
    }
}

/// A vector: element count, then the elements back to back.
pub fn encode_vector(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = unsigned_leb128(items.len() as u64);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// A name: byte length, then the UTF-8 bytes.
pub fn encode_string(s: &str) -> Vec<u8> {
    let mut out = unsigned_leb128(s.len() as u64);
    out.extend_from_slice(s.as_bytes());
    out
}

/// One local-variable group: `count` locals of `valtype`.
pub fn encode_local(count: u32, valtype: u8) -> Vec<u8> {
    let mut out = unsigned_leb128(u64::from(count));
    out.push(valtype);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_known_values() {
        assert_eq!(unsigned_leb128(0), vec![0x00]);
        assert_eq!(unsigned_leb128(127), vec![0x7f]);
        assert_eq!(unsigned_leb128(128), vec![0x80, 0x01]);
        assert_eq!(unsigned_leb128(624485), vec![0xe5, 0x8e, 0x26]);
    }

    #[test]
    fn signed_known_values() {
        assert_eq!(signed_leb128(0), vec![0x00]);
        assert_eq!(signed_leb128(-1), vec![0x7f]);
        assert_eq!(signed_leb128(-123456), vec![0xc0, 0xbb, 0x78]);
    }

    #[test]
    fn signed_sign_bit_boundaries() {
        // one byte as long as bit 6 still matches the sign
        assert_eq!(signed_leb128(63), vec![0x3f]);
        assert_eq!(signed_leb128(64), vec![0xc0, 0x00]);
        assert_eq!(signed_leb128(-64), vec![0x40]);
        assert_eq!(signed_leb128(-65), vec![0xbf, 0x7f]);
    }

    #[test]
    fn vectors_and_strings_are_length_prefixed() {
        assert_eq!(encode_vector(&[]), vec![0x00]);
        assert_eq!(
            encode_vector(&[vec![0xaa], vec![0xbb, 0xcc]]),
            vec![0x02, 0xaa, 0xbb, 0xcc]
        );
        assert_eq!(encode_string("run"), vec![0x03, b'r', b'u', b'n']);
        assert_eq!(encode_local(1, 0x7f), vec![0x01, 0x7f]);
    }
}
