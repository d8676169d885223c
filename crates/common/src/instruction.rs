//! Decoding one instruction out of a raw 2.7 bytecode stream.
//!
//! Instructions are variable-width: a single opcode byte, followed by a
//! 16-bit little-endian operand when the opcode is at or above
//! [`HAVE_ARGUMENT`](crate::opcode::HAVE_ARGUMENT).

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// A decoded view over one instruction at a given byte offset.
///
/// Constructed fresh for each traced step; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset of the opcode within the code object's instruction bytes.
    pub offset: usize,
    /// The opcode byte as it appears in the stream.
    pub raw_opcode: u8,
    /// `None` when `raw_opcode` is not an assigned 2.7 opcode. Decoding an
    /// unknown byte is not an error: hand-modified and protected streams are
    /// the expected input, and such steps get the INVALID trace shape.
    pub opcode: Option<Opcode>,
    /// The 16-bit operand, present only for known opcodes that take one.
    pub operand: Option<u16>,
}

impl Instruction {
    /// Decode the instruction starting at `offset` in `bytes`.
    ///
    /// # Errors
    ///
    /// [`DecodeError::OffsetOutOfBounds`] if `offset` is past the end of the
    /// stream, [`DecodeError::TruncatedInstruction`] if an operand-carrying
    /// opcode has fewer than 2 bytes after it.
    pub fn decode_at(bytes: &[u8], offset: usize) -> Result<Self, DecodeError> {
        let raw_opcode = *bytes.get(offset).ok_or(DecodeError::OffsetOutOfBounds {
            at: offset,
            len: bytes.len(),
        })?;

        let opcode = Opcode::try_from(raw_opcode).ok();

        let operand = match opcode {
            Some(op) if op.has_operand() => {
                if offset + 2 >= bytes.len() {
                    return Err(DecodeError::TruncatedInstruction { at: offset });
                }
                let low = bytes[offset + 1] as u16;
                let high = bytes[offset + 2] as u16;
                Some(low | (high << 8))
            }
            _ => None,
        };

        Ok(Self {
            offset,
            raw_opcode,
            opcode,
            operand,
        })
    }

    /// Total encoded width in bytes: 1 for the opcode, plus 2 if an operand
    /// was read.
    pub fn width(&self) -> usize {
        if self.operand.is_some() {
            3
        } else {
            1
        }
    }

    /// Offset of the first byte after this instruction.
    pub fn end_offset(&self) -> usize {
        self.offset + self.width()
    }
}
