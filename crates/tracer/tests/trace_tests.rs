//! End-to-end tracing: machine drives the hook, hook writes lines.

use std::rc::Rc;

use pytrace_common::{CodeObject, Opcode, Value};
use pytrace_tracer::{TraceFilter, TraceWriter, Tracer};
use pytrace_vm::Machine;

fn arg(bytes: &mut Vec<u8>, op: Opcode, operand: u16) {
    bytes.push(op as u8);
    bytes.extend_from_slice(&operand.to_le_bytes());
}

fn load_const_program() -> Rc<CodeObject> {
    let mut code = CodeObject::named("test");
    code.consts = vec![Value::Int(42)];
    arg(&mut code.code, Opcode::LoadConst, 0);
    code.code.push(Opcode::ReturnValue as u8);
    Rc::new(code)
}

fn trace(code: &Rc<CodeObject>, filter: TraceFilter, resolve: bool) -> String {
    let mut tracer = Tracer::new(TraceWriter::new(Vec::new()), filter, resolve);
    Machine::new().with_hook(&mut tracer).run(code).unwrap();
    String::from_utf8(tracer.into_writer().into_inner()).unwrap()
}

#[test]
fn resolved_trace_shows_the_constant() {
    let text = trace(&load_const_program(), TraceFilter::All, true);
    assert_eq!(text, "test> 0 LOAD_CONST (42)\ntest> 3 RETURN_VALUE\n");
}

#[test]
fn unresolved_trace_shows_the_raw_operand() {
    let text = trace(&load_const_program(), TraceFilter::All, false);
    assert_eq!(text, "test> 0 LOAD_CONST (0)\ntest> 3 RETURN_VALUE\n");
}

fn call_program() -> Rc<CodeObject> {
    let mut inner = CodeObject::named("inner");
    inner.consts = vec![Value::Int(7)];
    arg(&mut inner.code, Opcode::LoadConst, 0);
    inner.code.push(Opcode::ReturnValue as u8);

    let mut module = CodeObject::named("outer");
    module.consts = vec![Value::Code(Rc::new(inner))];
    arg(&mut module.code, Opcode::LoadConst, 0);
    arg(&mut module.code, Opcode::MakeFunction, 0);
    arg(&mut module.code, Opcode::CallFunction, 0);
    module.code.push(Opcode::ReturnValue as u8);
    Rc::new(module)
}

#[test]
fn all_mode_traces_the_whole_call_tree() {
    let text = trace(&call_program(), TraceFilter::All, true);
    assert_eq!(
        text,
        "outer> 0 LOAD_CONST (<code object inner>)\n\
         outer> 3 MAKE_FUNCTION (0)\n\
         outer> 6 CALL_FUNCTION (0)\n\
         inner> 0 LOAD_CONST (7)\n\
         inner> 3 RETURN_VALUE\n\
         outer> 9 RETURN_VALUE\n"
    );
}

#[test]
fn only_mode_drops_other_code_objects() {
    let text = trace(&call_program(), TraceFilter::Only("inner".to_string()), true);
    assert_eq!(text, "inner> 0 LOAD_CONST (7)\ninner> 3 RETURN_VALUE\n");
    assert!(text.lines().all(|line| line.starts_with("inner> ")));
}

#[test]
fn jump_operands_resolve_to_byte_offsets() {
    // while-style skeleton: the trace shows resolved jump targets.
    let mut code = CodeObject::named("test");
    code.consts = vec![Value::Bool(false), Value::None];
    arg(&mut code.code, Opcode::LoadConst, 0); // 0
    arg(&mut code.code, Opcode::PopJumpIfFalse, 9); // 3
    arg(&mut code.code, Opcode::JumpForward, 0); // 6, target 9
    arg(&mut code.code, Opcode::LoadConst, 1); // 9
    code.code.push(Opcode::ReturnValue as u8); // 12

    let text = trace(&Rc::new(code), TraceFilter::All, true);
    assert_eq!(
        text,
        "test> 0 LOAD_CONST (False)\n\
         test> 3 POP_JUMP_IF_FALSE (9)\n\
         test> 9 LOAD_CONST (None)\n\
         test> 12 RETURN_VALUE\n"
    );
}

#[test]
fn one_line_per_executed_instruction() {
    // Three executed instructions in the loop body program below.
    let text = trace(&load_const_program(), TraceFilter::All, false);
    assert_eq!(text.lines().count(), 2);
    let text = trace(&call_program(), TraceFilter::All, false);
    assert_eq!(text.lines().count(), 6);
}
