//! The per-step interception contract.

use std::rc::Rc;

use pytrace_common::{CodeObject, DecodeError};
use thiserror::Error;

/// Offset reported for the step event raised on frame entry, before any
/// instruction of that frame has executed.
pub const SENTINEL_OFFSET: i64 = -1;

/// Error returned by a hook to abort execution.
///
/// The variants keep the fault attributable: the instruction stream the
/// hook was asked to observe would not decode, or the hook's own output
/// sink refused a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("{0}")]
    Decode(#[from] DecodeError),

    #[error("{0}")]
    Output(String),
}

/// Observer invoked at every instruction boundary.
///
/// A single hook instance is registered on the machine before execution and
/// observes the whole call tree: the engine dispatches to it for every frame,
/// so the hook never re-registers itself. Events arrive in-line on the
/// executing thread, in execution order:
///
/// - once per frame entry with [`SENTINEL_OFFSET`];
/// - then once per instruction, with that instruction's byte offset, before
///   the instruction executes.
pub trait StepHook {
    fn on_step(&mut self, code: &Rc<CodeObject>, last_offset: i64) -> Result<(), HookError>;
}

/// Hook that records `(code name, offset)` pairs. Used by tests.
#[derive(Debug, Default)]
pub struct RecordingHook {
    pub steps: Vec<(String, i64)>,
}

impl StepHook for RecordingHook {
    fn on_step(&mut self, code: &Rc<CodeObject>, last_offset: i64) -> Result<(), HookError> {
        self.steps.push((code.name.clone(), last_offset));
        Ok(())
    }
}
