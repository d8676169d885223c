//! Shared types for the pytrace workspace.
//!
//! This crate defines the CPython 2.7 instruction set and the data model the
//! loader, engine, and tracer all speak:
//!
//! - [`Opcode`] — all 108 assigned 2.7 opcodes, with mnemonics and
//!   [`OperandKind`] resolution classes
//! - [`Instruction`] — per-step decoded view over raw instruction bytes
//! - [`CodeObject`] — one compiled unit with its symbol tables
//! - [`Value`] — marshal constants plus runtime values
//! - [`DecodeError`] — instruction decode failures
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod code;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod value;

// Re-export commonly used types at the crate root.
pub use code::CodeObject;
pub use error::DecodeError;
pub use instruction::Instruction;
pub use opcode::{Opcode, OperandKind, CMP_OP, HAVE_ARGUMENT};
pub use value::{Builtin, Long, Value};
