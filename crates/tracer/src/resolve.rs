//! Symbolic operand resolution.
//!
//! Each opcode carries a static resolution class; the raw 16-bit operand
//! maps through that class to a symbol table entry, a jump target, or
//! itself. Lookup failures are soft: an out-of-range index degrades the one
//! trace line, never the session.

use std::fmt;

use pytrace_common::{CodeObject, Instruction, Opcode, OperandKind, Value, CMP_OP};

/// A resolved operand, borrowing from the owning code object's tables.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOperand<'a> {
    /// Constant table entry.
    Const(&'a Value),
    /// Global/attribute/import name.
    Name(&'a str),
    /// Local variable name.
    Local(&'a str),
    /// Comparison operator text.
    Compare(&'static str),
    /// Jump target as an absolute byte offset.
    Target(usize),
    /// Unclassified operand, passed through unchanged.
    Plain(u16),
}

impl fmt::Display for ResolvedOperand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedOperand::Const(v) => write!(f, "{v}"),
            ResolvedOperand::Name(s) | ResolvedOperand::Local(s) => f.write_str(s),
            ResolvedOperand::Compare(s) => f.write_str(s),
            ResolvedOperand::Target(t) => write!(f, "{t}"),
            ResolvedOperand::Plain(r) => write!(f, "{r}"),
        }
    }
}

/// Resolve a decoded instruction's operand against its code object.
///
/// Returns `None` when the instruction has no resolvable operand: an
/// unassigned opcode byte, an operand-less opcode, or an index past its
/// table's bound. Pure function of its inputs.
pub fn resolve<'a>(code: &'a CodeObject, ins: &Instruction) -> Option<ResolvedOperand<'a>> {
    let opcode: Opcode = ins.opcode?;
    let raw = ins.operand?;
    let index = raw as usize;
    match opcode.operand_kind() {
        OperandKind::Constant => code.consts.get(index).map(ResolvedOperand::Const),
        OperandKind::NameRef => code.names.get(index).map(|s| ResolvedOperand::Name(s)),
        OperandKind::Local => code.var_names.get(index).map(|s| ResolvedOperand::Local(s)),
        OperandKind::Compare => CMP_OP.get(index).map(|s| ResolvedOperand::Compare(s)),
        OperandKind::JumpAbsolute => Some(ResolvedOperand::Target(index)),
        OperandKind::JumpRelative => Some(ResolvedOperand::Target(index + ins.end_offset())),
        OperandKind::Plain => Some(ResolvedOperand::Plain(raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8], at: usize) -> Instruction {
        Instruction::decode_at(bytes, at).unwrap()
    }

    fn with_tables() -> CodeObject {
        let mut code = CodeObject::named("f");
        code.consts = vec![Value::Int(42), Value::Str(b"spam".to_vec())];
        code.names = vec!["g".into()];
        code.var_names = vec!["x".into(), "y".into()];
        code
    }

    #[test]
    fn constant_lookup() {
        let code = with_tables();
        let ins = decode(&[Opcode::LoadConst as u8, 0, 0], 0);
        assert_eq!(
            resolve(&code, &ins),
            Some(ResolvedOperand::Const(&Value::Int(42)))
        );
    }

    #[test]
    fn constant_out_of_range_is_soft() {
        let code = with_tables();
        let ins = decode(&[Opcode::LoadConst as u8, 9, 0], 0);
        assert_eq!(resolve(&code, &ins), None);
    }

    #[test]
    fn name_and_local_lookups() {
        let code = with_tables();
        let name = decode(&[Opcode::LoadGlobal as u8, 0, 0], 0);
        assert_eq!(resolve(&code, &name), Some(ResolvedOperand::Name("g")));
        let local = decode(&[Opcode::LoadFast as u8, 1, 0], 0);
        assert_eq!(resolve(&code, &local), Some(ResolvedOperand::Local("y")));
    }

    #[test]
    fn comparison_operator_text() {
        let code = with_tables();
        let ins = decode(&[Opcode::CompareOp as u8, 4, 0], 0);
        assert_eq!(resolve(&code, &ins), Some(ResolvedOperand::Compare(">")));
        let bad = decode(&[Opcode::CompareOp as u8, 200, 0], 0);
        assert_eq!(resolve(&code, &bad), None);
    }

    #[test]
    fn absolute_jump_passes_through() {
        let code = with_tables();
        let ins = decode(&[Opcode::JumpAbsolute as u8, 13, 0], 0);
        assert_eq!(resolve(&code, &ins), Some(ResolvedOperand::Target(13)));
    }

    #[test]
    fn relative_jump_adds_operand_end() {
        // Raw operand 5 at offset 20 lands on 5 + 23 = 28.
        let mut bytes = vec![Opcode::Nop as u8; 20];
        bytes.extend_from_slice(&[Opcode::JumpForward as u8, 5, 0]);
        let code = with_tables();
        let ins = decode(&bytes, 20);
        assert_eq!(resolve(&code, &ins), Some(ResolvedOperand::Target(28)));
    }

    #[test]
    fn unclassified_keeps_the_raw_value() {
        let code = with_tables();
        let ins = decode(&[Opcode::CallFunction as u8, 2, 1], 0);
        assert_eq!(resolve(&code, &ins), Some(ResolvedOperand::Plain(0x0102)));
    }

    #[test]
    fn display_renders_symbolically() {
        assert_eq!(ResolvedOperand::Const(&Value::Int(42)).to_string(), "42");
        assert_eq!(ResolvedOperand::Name("g").to_string(), "g");
        assert_eq!(ResolvedOperand::Compare("not in").to_string(), "not in");
        assert_eq!(ResolvedOperand::Target(28).to_string(), "28");
        assert_eq!(ResolvedOperand::Plain(513).to_string(), "513");
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Same (code object, instruction) twice resolves identically.
            #[test]
            fn resolution_is_deterministic(opcode in any::<u8>(), lo in any::<u8>(), hi in any::<u8>()) {
                let code = with_tables();
                let bytes = [opcode, lo, hi];
                if let Ok(ins) = Instruction::decode_at(&bytes, 0) {
                    prop_assert_eq!(resolve(&code, &ins), resolve(&code, &ins));
                }
            }
        }
    }
}
