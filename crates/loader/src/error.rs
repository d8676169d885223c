//! Container format errors.
//!
//! Every variant is fatal: the loader never yields a partially valid code
//! object.

use thiserror::Error;

/// Errors raised while validating or deserializing a container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The 4-byte magic at offset 0 does not match this format version.
    #[error("container header mismatch: found {found:02x?}")]
    HeaderMismatch { found: [u8; 4] },

    /// Fewer bytes than the fixed preamble requires.
    #[error("container too short for header: {len} bytes")]
    TruncatedHeader { len: usize },

    /// The marshal stream ended mid-value.
    #[error("unexpected end of container at byte {at}")]
    Truncated { at: usize },

    /// A marshal type code this reader does not recognize.
    #[error("unknown marshal type code {code:#04x} at byte {at}")]
    UnknownTypeCode { code: u8, at: usize },

    /// A string back-reference past the end of the intern table.
    #[error("string reference {index} out of range")]
    BadStringRef { index: usize },

    /// A unicode value that is not valid UTF-8.
    #[error("invalid UTF-8 in unicode value at byte {at}")]
    BadUtf8 { at: usize },

    /// An ASCII float literal that does not parse.
    #[error("malformed float literal at byte {at}")]
    BadFloat { at: usize },

    /// Value graph nested beyond the reader's depth bound.
    #[error("marshal value nested too deeply")]
    NestingTooDeep,

    /// The root of the container is not a code object.
    #[error("container root is not a code object")]
    NotACodeObject,

    /// A code object field holds a value of the wrong shape.
    #[error("code object field '{field}' has wrong type")]
    BadFieldType { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_header_mismatch() {
        let e = FormatError::HeaderMismatch {
            found: [0, 0, 0, 0],
        };
        assert_eq!(
            e.to_string(),
            "container header mismatch: found [00, 00, 00, 00]"
        );
    }

    #[test]
    fn display_truncated() {
        assert_eq!(
            FormatError::Truncated { at: 12 }.to_string(),
            "unexpected end of container at byte 12"
        );
    }

    #[test]
    fn display_unknown_type_code() {
        assert_eq!(
            FormatError::UnknownTypeCode { code: 0x7A, at: 9 }.to_string(),
            "unknown marshal type code 0x7a at byte 9"
        );
    }
}
