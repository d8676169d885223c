//! Execution tracing over the stepping engine.
//!
//! Registers a [`Tracer`] hook on the machine and turns every step event
//! into one deterministic text line: offset, mnemonic, and optionally the
//! operand resolved against the code object's symbol tables. Built for
//! instruction streams that may be corrupted on purpose: unassigned opcode
//! bytes and unresolvable operands degrade single lines, not the session.

mod filter;
mod hook;
mod resolve;
mod writer;

pub use filter::TraceFilter;
pub use hook::Tracer;
pub use resolve::{resolve, ResolvedOperand};
pub use writer::TraceWriter;
