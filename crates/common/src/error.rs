//! Decode errors for bytecode instruction streams.

use thiserror::Error;

/// Errors that occur while decoding one instruction from a code object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Byte value not assigned to any 2.7 opcode.
    ///
    /// Note the decoder itself never raises this: unknown bytes decode
    /// structurally and are flagged for the INVALID trace shape. It is the
    /// error [`crate::Opcode::try_from`] reports for callers that require a
    /// valid opcode.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u8),

    /// An opcode with an operand sits closer than 2 bytes to the end of the
    /// instruction stream.
    #[error("truncated instruction at offset {at}")]
    TruncatedInstruction { at: usize },

    /// Decode requested at an offset past the end of the instruction stream.
    #[error("offset {at} out of bounds (code length {len})")]
    OffsetOutOfBounds { at: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_opcode() {
        assert_eq!(DecodeError::UnknownOpcode(255).to_string(), "unknown opcode: 255");
    }

    #[test]
    fn display_truncated() {
        assert_eq!(
            DecodeError::TruncatedInstruction { at: 7 }.to_string(),
            "truncated instruction at offset 7"
        );
    }

    #[test]
    fn display_out_of_bounds() {
        assert_eq!(
            DecodeError::OffsetOutOfBounds { at: 10, len: 4 }.to_string(),
            "offset 10 out of bounds (code length 4)"
        );
    }
}
