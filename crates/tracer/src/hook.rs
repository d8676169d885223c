//! The tracing step hook: decode, resolve, write.

use std::io::Write;
use std::rc::Rc;

use pytrace_common::{CodeObject, Instruction};
use pytrace_vm::{HookError, StepHook};

use crate::filter::TraceFilter;
use crate::resolve::resolve;
use crate::writer::TraceWriter;

/// Step hook that appends one trace line per executed instruction.
///
/// A single instance is registered on the machine and observes the whole
/// call tree. Per step: apply the name filter, skip the frame-entry
/// sentinel, decode the instruction at the reported offset, then write one
/// of the three line shapes. With resolution off, the raw 16-bit operand is
/// written; with it on, the symbolic value, or `None` when resolution
/// fails.
pub struct Tracer<W: Write> {
    writer: TraceWriter<W>,
    filter: TraceFilter,
    resolve_operands: bool,
}

impl<W: Write> Tracer<W> {
    pub fn new(writer: TraceWriter<W>, filter: TraceFilter, resolve_operands: bool) -> Self {
        Self {
            writer,
            filter,
            resolve_operands,
        }
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    pub fn into_writer(self) -> TraceWriter<W> {
        self.writer
    }
}

impl<W: Write> StepHook for Tracer<W> {
    fn on_step(&mut self, code: &Rc<CodeObject>, last_offset: i64) -> Result<(), HookError> {
        if !self.filter.admits(&code.name) {
            return Ok(());
        }
        if last_offset < 0 {
            // Frame entry: nothing executed yet.
            return Ok(());
        }
        let at = last_offset as usize;
        let ins = Instruction::decode_at(&code.code, at).map_err(HookError::Decode)?;

        let io_result = match ins.opcode {
            None => self.writer.invalid(&code.name, at, ins.raw_opcode),
            Some(op) if ins.operand.is_none() => self.writer.plain(&code.name, at, op.mnemonic()),
            Some(op) => {
                let raw = ins.operand.unwrap_or(0);
                let text = if self.resolve_operands {
                    match resolve(code, &ins) {
                        Some(value) => value.to_string(),
                        None => "None".to_string(),
                    }
                } else {
                    raw.to_string()
                };
                self.writer.operand(&code.name, at, op.mnemonic(), &text)
            }
        };
        io_result.map_err(|e| HookError::Output(e.to_string()))
    }
}
