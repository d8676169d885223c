//! Container loader for CPython 2.7 `.pyc` files.
//!
//! A container is a fixed 8-byte preamble (4-byte magic, 4-byte modification
//! timestamp) followed by a marshal-serialized code object graph. The loader
//! validates the magic, skips the timestamp, and unmarshals the root code
//! object. It fails fast: a malformed container never yields a partial
//! result.
//!
//! The magic bytes and preamble length are format-version constants — other
//! CPython releases use different values and are rejected here.

pub mod error;
pub mod marshal;

pub use error::FormatError;

use std::rc::Rc;

use pytrace_common::{CodeObject, Value};

/// Magic for CPython 2.7 (magic number 62211): `03 F3 0D 0A`.
pub const MAGIC: [u8; 4] = [0x03, 0xF3, 0x0D, 0x0A];

/// Preamble length: magic plus the 4-byte timestamp the loader ignores.
pub const HEADER_LEN: usize = 8;

/// Parse a container into its root code object.
///
/// # Errors
///
/// [`FormatError::HeaderMismatch`] for a foreign or corrupted magic,
/// [`FormatError::NotACodeObject`] when the marshal root is some other
/// value, and the marshal reader's errors for everything past the preamble.
pub fn load(bytes: &[u8]) -> Result<Rc<CodeObject>, FormatError> {
    if bytes.len() < HEADER_LEN {
        return Err(FormatError::TruncatedHeader { len: bytes.len() });
    }

    let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if found != MAGIC {
        return Err(FormatError::HeaderMismatch { found });
    }

    let mut reader = marshal::Reader::new(&bytes[HEADER_LEN..]);
    match reader.read_value()? {
        Value::Code(code) => Ok(code),
        _ => Err(FormatError::NotACodeObject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_input() {
        assert_eq!(
            load(&[0x03, 0xF3]),
            Err(FormatError::TruncatedHeader { len: 2 })
        );
    }

    #[test]
    fn rejects_wrong_magic() {
        let mut bytes = vec![0u8; 8];
        bytes.push(b'N');
        assert_eq!(
            load(&bytes),
            Err(FormatError::HeaderMismatch {
                found: [0, 0, 0, 0]
            })
        );
    }

    #[test]
    fn rejects_non_code_root() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]); // timestamp, ignored
        bytes.push(b'N');
        assert_eq!(load(&bytes), Err(FormatError::NotACodeObject));
    }

    #[test]
    fn timestamp_bytes_are_ignored() {
        let mut a = MAGIC.to_vec();
        a.extend_from_slice(&[0x11, 0x22, 0x33, 0x44]);
        a.push(b'N');
        let mut b = MAGIC.to_vec();
        b.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);
        b.push(b'N');
        // Both fail identically at the root-type check, proving the header
        // region itself was accepted.
        assert_eq!(load(&a), load(&b));
        assert_eq!(load(&a), Err(FormatError::NotACodeObject));
    }
}
