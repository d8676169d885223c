//! Code objects: immutable compiled units of instructions plus their
//! symbol tables.

use crate::value::Value;

/// One compiled unit, as unmarshalled from a container.
///
/// Field order matches the marshal `c` record. All tables are 0-indexed;
/// operand indices that exceed a table's bound resolve softly (to nothing)
/// rather than failing the trace. Nested code objects live inside `consts`
/// and are owned hierarchically through `Rc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    /// `co_argcount`: positional parameter count.
    pub arg_count: u32,
    /// `co_nlocals`: number of local variable slots.
    pub n_locals: u32,
    /// `co_stacksize`: compiler's value-stack bound (unused by the engine).
    pub stack_size: u32,
    /// `co_flags`.
    pub flags: u32,
    /// `co_code`: the concatenated instruction bytes.
    pub code: Vec<u8>,
    /// `co_consts`: the constant table; may contain nested code objects.
    pub consts: Vec<Value>,
    /// `co_names`: globals, attributes, imports.
    pub names: Vec<String>,
    /// `co_varnames`: local variable slot names.
    pub var_names: Vec<String>,
    /// `co_freevars`.
    pub free_vars: Vec<String>,
    /// `co_cellvars`.
    pub cell_vars: Vec<String>,
    /// `co_filename`.
    pub filename: String,
    /// `co_name`: the trace filter key. Not unique across a program.
    pub name: String,
    /// `co_firstlineno`.
    pub first_line_no: u32,
    /// `co_lnotab`: line-number table (unused by the engine).
    pub lnotab: Vec<u8>,
}

impl CodeObject {
    /// An empty code object with just a name. Handy for tests and as a
    /// base for building synthetic programs.
    pub fn named(name: &str) -> Self {
        Self {
            arg_count: 0,
            n_locals: 0,
            stack_size: 0,
            flags: 0,
            code: Vec::new(),
            consts: Vec::new(),
            names: Vec::new(),
            var_names: Vec::new(),
            free_vars: Vec::new(),
            cell_vars: Vec::new(),
            filename: String::new(),
            name: name.to_string(),
            first_line_no: 1,
            lnotab: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_starts_empty() {
        let code = CodeObject::named("main");
        assert_eq!(code.name, "main");
        assert!(code.code.is_empty());
        assert!(code.consts.is_empty());
        assert!(code.names.is_empty());
        assert!(code.var_names.is_empty());
    }
}
