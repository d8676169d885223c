//! Runtime errors for the execution engine.
//!
//! Every offset-bearing variant reports the byte offset of the faulting
//! instruction within its code object.

use pytrace_common::DecodeError;
use thiserror::Error;

use crate::hook::HookError;

/// Errors that occur while executing a code object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// The instruction stream contains a byte that is not an assigned
    /// opcode. The step hook has already observed this instruction by the
    /// time the error is raised.
    #[error("invalid opcode {opcode} at offset {at}")]
    InvalidOpcode { opcode: u8, at: usize },

    /// A real opcode outside the subset this engine executes.
    #[error("opcode {mnemonic} not supported by this engine (offset {at})")]
    UnsupportedOpcode { mnemonic: &'static str, at: usize },

    #[error("value stack underflow at offset {at}")]
    StackUnderflow { at: usize },

    #[error("block stack underflow at offset {at}")]
    BlockStackUnderflow { at: usize },

    #[error("constant index {index} out of range at offset {at}")]
    ConstOutOfRange { at: usize, index: u16 },

    #[error("name index {index} out of range at offset {at}")]
    NameOutOfRange { at: usize, index: u16 },

    #[error("local slot {index} out of range at offset {at}")]
    LocalOutOfRange { at: usize, index: u16 },

    #[error("name '{name}' is not defined")]
    UndefinedName { name: String },

    #[error("local variable '{name}' referenced before assignment")]
    UnboundLocal { name: String },

    #[error("unsupported operand types at offset {at}")]
    TypeMismatch { at: usize },

    #[error("integer division or modulo by zero at offset {at}")]
    ZeroDivision { at: usize },

    #[error("object is not callable at offset {at}")]
    NotCallable { at: usize },

    #[error("object is not iterable at offset {at}")]
    NotIterable { at: usize },

    #[error("function takes {expected} arguments ({given} given)")]
    ArgumentCount { expected: usize, given: usize },

    #[error("keyword arguments not supported (offset {at})")]
    KeywordArguments { at: usize },

    #[error("unpack expected {expected} values, got {got}")]
    UnpackMismatch { expected: usize, got: usize },

    #[error("call depth exceeded {limit} frames")]
    CallDepthExceeded { limit: usize },

    #[error("comparison operator {index} not executable at offset {at}")]
    BadCompareOp { at: usize, index: u16 },

    #[error("exception raised at offset {at}")]
    Raised { at: usize },

    /// Truncated instruction stream, surfaced from the decoder.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The registered step hook failed; execution stops immediately.
    #[error("step hook failed: {0}")]
    Hook(#[from] HookError),

    /// The print sink rejected a write.
    #[error("print failed: {0}")]
    Print(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats() {
        assert_eq!(
            RuntimeError::InvalidOpcode { opcode: 255, at: 10 }.to_string(),
            "invalid opcode 255 at offset 10"
        );
        assert_eq!(
            RuntimeError::ZeroDivision { at: 4 }.to_string(),
            "integer division or modulo by zero at offset 4"
        );
        assert_eq!(
            RuntimeError::UndefinedName { name: "spam".into() }.to_string(),
            "name 'spam' is not defined"
        );
    }

    #[test]
    fn decode_error_passthrough() {
        let e: RuntimeError = DecodeError::TruncatedInstruction { at: 3 }.into();
        assert_eq!(e.to_string(), "truncated instruction at offset 3");
    }
}
