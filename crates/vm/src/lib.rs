//! Stack-machine execution engine for 2.7 bytecode.
//!
//! The engine runs a loaded code object graph and raises a step event at
//! every instruction boundary through a registered [`StepHook`]. It executes
//! the common imperative subset of the instruction set; opcodes outside that
//! subset stop execution with [`RuntimeError::UnsupportedOpcode`] rather
//! than guessing.

mod error;
mod execute;
mod hook;
mod machine;

pub use error::RuntimeError;
pub use hook::{HookError, RecordingHook, StepHook, SENTINEL_OFFSET};
pub use machine::{Machine, MAX_CALL_DEPTH};
