//! Machine state: globals, frames, and the registered step hook.

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use pytrace_common::{CodeObject, Value};

use crate::error::RuntimeError;
use crate::hook::StepHook;

/// Frame recursion bound.
pub const MAX_CALL_DEPTH: usize = 512;

/// A loop block pushed by `SETUP_LOOP`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoopBlock {
    /// Offset to resume at when `BREAK_LOOP` fires.
    pub exit: usize,
}

/// One activation of a code object.
#[derive(Debug)]
pub(crate) struct Frame {
    pub code: Rc<CodeObject>,
    /// Offset of the next instruction to execute.
    pub pc: usize,
    pub stack: Vec<Value>,
    /// Fast-local slots; `None` marks an unbound slot.
    pub locals: Vec<Option<Value>>,
    pub blocks: Vec<LoopBlock>,
}

impl Frame {
    pub fn new(code: Rc<CodeObject>, args: Vec<Value>) -> Result<Self, RuntimeError> {
        let expected = code.arg_count as usize;
        if args.len() != expected {
            return Err(RuntimeError::ArgumentCount {
                expected,
                given: args.len(),
            });
        }

        let slot_count = (code.n_locals as usize)
            .max(code.var_names.len())
            .max(args.len());
        let mut locals: Vec<Option<Value>> = vec![None; slot_count];
        for (slot, arg) in locals.iter_mut().zip(args) {
            *slot = Some(arg);
        }

        Ok(Self {
            code,
            pc: 0,
            stack: Vec::new(),
            locals,
            blocks: Vec::new(),
        })
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self, at: usize) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow { at })
    }
}

/// The execution engine.
///
/// Runs a root code object and every code object it calls into, raising a
/// step event through the registered hook at each instruction boundary.
/// Single-threaded and synchronous: a hook runs to completion before the
/// traced program resumes.
pub struct Machine<'h> {
    pub(crate) globals: HashMap<String, Value>,
    pub(crate) hook: Option<&'h mut dyn StepHook>,
    pub(crate) depth: usize,
    pub(crate) print_out: Box<dyn Write>,
    /// Python print-statement softspace: pending separator before the next
    /// printed item.
    pub(crate) softspace: bool,
}

impl Default for Machine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> Machine<'h> {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            hook: None,
            depth: 0,
            print_out: Box::new(std::io::stdout()),
            softspace: false,
        }
    }

    /// Register the step hook. At most one; registered before execution.
    pub fn with_hook(mut self, hook: &'h mut dyn StepHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Redirect the traced program's `print` output.
    pub fn with_print_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.print_out = sink;
        self
    }

    /// Read back a global, mainly for tests and post-run inspection.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }
}
