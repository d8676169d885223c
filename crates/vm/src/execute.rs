//! Execution loop and opcode dispatch.
//!
//! The engine runs the subset of 2.7 bytecode that compiled programs
//! commonly consist of. Before each instruction executes, the step hook
//! observes its offset; an unassigned opcode byte therefore reaches the hook
//! (and the trace) before execution aborts on it.

use std::cmp::Ordering;
use std::rc::Rc;

use pytrace_common::{Builtin, CodeObject, Instruction, Opcode, Value};

use crate::error::RuntimeError;
use crate::hook::SENTINEL_OFFSET;
use crate::machine::{Frame, LoopBlock, Machine, MAX_CALL_DEPTH};

impl<'h> Machine<'h> {
    /// Execute a root code object to completion.
    ///
    /// Raises step events for the whole call tree through the registered
    /// hook. Returns the value of the root frame's `RETURN_VALUE`.
    pub fn run(&mut self, code: &Rc<CodeObject>) -> Result<Value, RuntimeError> {
        self.run_frame(code.clone(), Vec::new())
    }

    fn run_frame(&mut self, code: Rc<CodeObject>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::CallDepthExceeded {
                limit: MAX_CALL_DEPTH,
            });
        }
        self.depth += 1;
        let result = self.frame_loop(code, args);
        self.depth -= 1;
        result
    }

    fn emit_step(&mut self, code: &Rc<CodeObject>, offset: i64) -> Result<(), RuntimeError> {
        if let Some(hook) = self.hook.as_deref_mut() {
            hook.on_step(code, offset)?;
        }
        Ok(())
    }

    fn frame_loop(&mut self, code: Rc<CodeObject>, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut frame = Frame::new(code, args)?;
        // Frame entry: no instruction executed yet.
        self.emit_step(&frame.code, SENTINEL_OFFSET)?;

        loop {
            let at = frame.pc;
            self.emit_step(&frame.code, at as i64)?;

            let ins = Instruction::decode_at(&frame.code.code, at)?;
            let op = match ins.opcode {
                Some(op) => op,
                None => {
                    return Err(RuntimeError::InvalidOpcode {
                        opcode: ins.raw_opcode,
                        at,
                    })
                }
            };
            frame.pc = ins.end_offset();
            let arg = ins.operand.unwrap_or(0);

            match op {
                Opcode::Nop => {}
                Opcode::PopTop => {
                    frame.pop(at)?;
                }
                Opcode::RotTwo => {
                    let v = frame.pop(at)?;
                    let w = frame.pop(at)?;
                    frame.push(v);
                    frame.push(w);
                }
                Opcode::RotThree => {
                    let v = frame.pop(at)?;
                    let w = frame.pop(at)?;
                    let x = frame.pop(at)?;
                    frame.push(v);
                    frame.push(x);
                    frame.push(w);
                }
                Opcode::RotFour => {
                    let u = frame.pop(at)?;
                    let v = frame.pop(at)?;
                    let w = frame.pop(at)?;
                    let x = frame.pop(at)?;
                    frame.push(u);
                    frame.push(x);
                    frame.push(w);
                    frame.push(v);
                }
                Opcode::DupTop => {
                    let v = frame.stack.last().cloned().ok_or(RuntimeError::StackUnderflow { at })?;
                    frame.push(v);
                }
                Opcode::DupTopx => {
                    let n = arg as usize;
                    if n == 0 || n > frame.stack.len() {
                        return Err(RuntimeError::StackUnderflow { at });
                    }
                    let copies: Vec<Value> = frame.stack[frame.stack.len() - n..].to_vec();
                    frame.stack.extend(copies);
                }

                Opcode::UnaryPositive => {
                    let v = frame.pop(at)?;
                    frame.push(unary_positive(v, at)?);
                }
                Opcode::UnaryNegative => {
                    let v = frame.pop(at)?;
                    frame.push(unary_negative(v, at)?);
                }
                Opcode::UnaryNot => {
                    let v = frame.pop(at)?;
                    frame.push(Value::Bool(!truthy(&v)));
                }
                Opcode::UnaryInvert => {
                    let v = frame.pop(at)?;
                    let n = as_int(&v).ok_or(RuntimeError::TypeMismatch { at })?;
                    frame.push(Value::from_i64(!n));
                }
                Opcode::UnaryConvert => {
                    // Backquote conversion: repr() of the operand.
                    let v = frame.pop(at)?;
                    frame.push(Value::Str(v.repr().into_bytes()));
                }

                Opcode::BinaryAdd | Opcode::InplaceAdd => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(add(a, b, at)?);
                }
                Opcode::BinarySubtract | Opcode::InplaceSubtract => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(arith(a, b, at, i64::wrapping_sub, |x, y| x - y)?);
                }
                Opcode::BinaryMultiply | Opcode::InplaceMultiply => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(arith(a, b, at, i64::wrapping_mul, |x, y| x * y)?);
                }
                Opcode::BinaryDivide | Opcode::InplaceDivide | Opcode::BinaryFloorDivide
                | Opcode::InplaceFloorDivide => {
                    // Classic 2.x division: floor for ints. Floor for floats
                    // too under FLOOR_DIVIDE; classic float division stays
                    // true division.
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    let floor_floats =
                        matches!(op, Opcode::BinaryFloorDivide | Opcode::InplaceFloorDivide);
                    frame.push(divide(a, b, at, floor_floats)?);
                }
                Opcode::BinaryTrueDivide | Opcode::InplaceTrueDivide => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(true_divide(a, b, at)?);
                }
                Opcode::BinaryModulo | Opcode::InplaceModulo => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(modulo(a, b, at)?);
                }
                Opcode::BinaryPower | Opcode::InplacePower => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(power(a, b, at)?);
                }
                Opcode::BinaryLshift | Opcode::InplaceLshift => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(shift(a, b, at, true)?);
                }
                Opcode::BinaryRshift | Opcode::InplaceRshift => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(shift(a, b, at, false)?);
                }
                Opcode::BinaryAnd | Opcode::InplaceAnd => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(bitwise(a, b, at, |x, y| x & y)?);
                }
                Opcode::BinaryOr | Opcode::InplaceOr => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(bitwise(a, b, at, |x, y| x | y)?);
                }
                Opcode::BinaryXor | Opcode::InplaceXor => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(bitwise(a, b, at, |x, y| x ^ y)?);
                }
                Opcode::BinarySubscr => {
                    let key = frame.pop(at)?;
                    let obj = frame.pop(at)?;
                    frame.push(subscr(&obj, &key, at)?);
                }
                Opcode::StoreSubscr => {
                    let key = frame.pop(at)?;
                    let obj = frame.pop(at)?;
                    let value = frame.pop(at)?;
                    store_subscr(&obj, key, value, at)?;
                }
                Opcode::DeleteSubscr => {
                    let key = frame.pop(at)?;
                    let obj = frame.pop(at)?;
                    delete_subscr(&obj, &key, at)?;
                }

                Opcode::CompareOp => {
                    let b = frame.pop(at)?;
                    let a = frame.pop(at)?;
                    frame.push(compare(arg, &a, &b, at)?);
                }

                Opcode::JumpForward => {
                    frame.pc = ins.end_offset() + arg as usize;
                }
                Opcode::JumpAbsolute | Opcode::ContinueLoop => {
                    frame.pc = arg as usize;
                }
                Opcode::PopJumpIfFalse => {
                    let v = frame.pop(at)?;
                    if !truthy(&v) {
                        frame.pc = arg as usize;
                    }
                }
                Opcode::PopJumpIfTrue => {
                    let v = frame.pop(at)?;
                    if truthy(&v) {
                        frame.pc = arg as usize;
                    }
                }
                Opcode::JumpIfFalseOrPop => {
                    let stay = match frame.stack.last() {
                        Some(v) => !truthy(v),
                        None => return Err(RuntimeError::StackUnderflow { at }),
                    };
                    if stay {
                        frame.pc = arg as usize;
                    } else {
                        frame.pop(at)?;
                    }
                }
                Opcode::JumpIfTrueOrPop => {
                    let stay = match frame.stack.last() {
                        Some(v) => truthy(v),
                        None => return Err(RuntimeError::StackUnderflow { at }),
                    };
                    if stay {
                        frame.pc = arg as usize;
                    } else {
                        frame.pop(at)?;
                    }
                }

                Opcode::SetupLoop => {
                    frame.blocks.push(LoopBlock {
                        exit: ins.end_offset() + arg as usize,
                    });
                }
                Opcode::PopBlock => {
                    frame
                        .blocks
                        .pop()
                        .ok_or(RuntimeError::BlockStackUnderflow { at })?;
                }
                Opcode::BreakLoop => {
                    let block = frame
                        .blocks
                        .pop()
                        .ok_or(RuntimeError::BlockStackUnderflow { at })?;
                    frame.pc = block.exit;
                }

                Opcode::GetIter => {
                    let v = frame.pop(at)?;
                    let items = iter_items(v, at)?;
                    frame.push(Value::Iter { items, index: 0 });
                }
                Opcode::ForIter => {
                    let v = frame.pop(at)?;
                    match v {
                        Value::Iter { items, index } => {
                            if index < items.len() {
                                let item = items[index].clone();
                                frame.push(Value::Iter {
                                    items,
                                    index: index + 1,
                                });
                                frame.push(item);
                            } else {
                                frame.pc = ins.end_offset() + arg as usize;
                            }
                        }
                        _ => return Err(RuntimeError::NotIterable { at }),
                    }
                }

                Opcode::LoadConst => {
                    let v = frame
                        .code
                        .consts
                        .get(arg as usize)
                        .cloned()
                        .ok_or(RuntimeError::ConstOutOfRange { at, index: arg })?;
                    frame.push(v);
                }
                Opcode::LoadFast => {
                    let v = match frame.locals.get(arg as usize) {
                        Some(Some(v)) => v.clone(),
                        Some(None) => {
                            return Err(RuntimeError::UnboundLocal {
                                name: local_name(&frame.code, arg),
                            })
                        }
                        None => return Err(RuntimeError::LocalOutOfRange { at, index: arg }),
                    };
                    frame.push(v);
                }
                Opcode::StoreFast => {
                    let v = frame.pop(at)?;
                    let slot = frame
                        .locals
                        .get_mut(arg as usize)
                        .ok_or(RuntimeError::LocalOutOfRange { at, index: arg })?;
                    *slot = Some(v);
                }
                Opcode::DeleteFast => {
                    let slot = frame
                        .locals
                        .get_mut(arg as usize)
                        .ok_or(RuntimeError::LocalOutOfRange { at, index: arg })?;
                    if slot.take().is_none() {
                        return Err(RuntimeError::UnboundLocal {
                            name: local_name(&frame.code, arg),
                        });
                    }
                }

                Opcode::StoreName | Opcode::StoreGlobal => {
                    let name = name_at(&frame.code, arg, at)?;
                    let v = frame.pop(at)?;
                    self.globals.insert(name, v);
                }
                Opcode::DeleteName | Opcode::DeleteGlobal => {
                    let name = name_at(&frame.code, arg, at)?;
                    if self.globals.remove(&name).is_none() {
                        return Err(RuntimeError::UndefinedName { name });
                    }
                }
                Opcode::LoadName | Opcode::LoadGlobal => {
                    let name = name_at(&frame.code, arg, at)?;
                    let v = if let Some(v) = self.globals.get(&name) {
                        v.clone()
                    } else if let Some(b) = Builtin::by_name(&name) {
                        Value::Builtin(b)
                    } else {
                        return Err(RuntimeError::UndefinedName { name });
                    };
                    frame.push(v);
                }

                Opcode::BuildTuple => {
                    let items = pop_n(&mut frame, arg as usize, at)?;
                    frame.push(Value::Tuple(items));
                }
                Opcode::BuildList => {
                    let items = pop_n(&mut frame, arg as usize, at)?;
                    frame.push(Value::new_list(items));
                }
                Opcode::BuildSet => {
                    let items = pop_n(&mut frame, arg as usize, at)?;
                    frame.push(Value::Set(items));
                }
                Opcode::BuildMap => {
                    // arg is a size hint only.
                    frame.push(Value::new_dict(Vec::new()));
                }
                Opcode::StoreMap => {
                    let key = frame.pop(at)?;
                    let value = frame.pop(at)?;
                    match frame.stack.last() {
                        Some(Value::Dict(pairs)) => {
                            pairs.borrow_mut().push((key, value));
                        }
                        Some(_) => return Err(RuntimeError::TypeMismatch { at }),
                        None => return Err(RuntimeError::StackUnderflow { at }),
                    }
                }
                Opcode::ListAppend => {
                    let v = frame.pop(at)?;
                    let n = arg as usize;
                    if n == 0 || n > frame.stack.len() {
                        return Err(RuntimeError::StackUnderflow { at });
                    }
                    let idx = frame.stack.len() - n;
                    match &frame.stack[idx] {
                        Value::List(items) => items.borrow_mut().push(v),
                        _ => return Err(RuntimeError::TypeMismatch { at }),
                    }
                }
                Opcode::UnpackSequence => {
                    let v = frame.pop(at)?;
                    let items = match v {
                        Value::Tuple(items) => items,
                        Value::List(items) => items.borrow().clone(),
                        _ => return Err(RuntimeError::TypeMismatch { at }),
                    };
                    if items.len() != arg as usize {
                        return Err(RuntimeError::UnpackMismatch {
                            expected: arg as usize,
                            got: items.len(),
                        });
                    }
                    for item in items.into_iter().rev() {
                        frame.push(item);
                    }
                }

                Opcode::PrintItem => {
                    let v = frame.pop(at)?;
                    self.print_item(&v)?;
                }
                Opcode::PrintNewline => {
                    self.print_newline()?;
                }
                Opcode::PrintExpr => {
                    let v = frame.pop(at)?;
                    let line = format!("{}\n", v.repr());
                    self.print_raw(&line)?;
                }

                Opcode::MakeFunction => {
                    let code_value = frame.pop(at)?;
                    let code = match code_value {
                        Value::Code(code) => code,
                        _ => return Err(RuntimeError::TypeMismatch { at }),
                    };
                    let mut defaults = pop_n(&mut frame, arg as usize, at)?;
                    defaults.shrink_to_fit();
                    frame.push(Value::Function { code, defaults });
                }
                Opcode::CallFunction => {
                    let kw_count = (arg >> 8) as usize;
                    if kw_count != 0 {
                        return Err(RuntimeError::KeywordArguments { at });
                    }
                    let pos_count = (arg & 0xFF) as usize;
                    let mut args = pop_n(&mut frame, pos_count, at)?;
                    let callee = frame.pop(at)?;
                    let result = match callee {
                        Value::Function { code, defaults } => {
                            let expected = code.arg_count as usize;
                            if args.len() < expected
                                && args.len() + defaults.len() >= expected
                            {
                                let missing = expected - args.len();
                                args.extend_from_slice(&defaults[defaults.len() - missing..]);
                            }
                            self.run_frame(code, args)?
                        }
                        Value::Builtin(b) => call_builtin(b, args, at)?,
                        _ => return Err(RuntimeError::NotCallable { at }),
                    };
                    frame.push(result);
                }
                Opcode::ReturnValue => {
                    return frame.pop(at);
                }
                Opcode::RaiseVarargs => {
                    return Err(RuntimeError::Raised { at });
                }

                other => {
                    return Err(RuntimeError::UnsupportedOpcode {
                        mnemonic: other.mnemonic(),
                        at,
                    })
                }
            }
        }
    }

    fn print_item(&mut self, v: &Value) -> Result<(), RuntimeError> {
        let text = if self.softspace {
            format!(" {v}")
        } else {
            v.to_string()
        };
        self.softspace = true;
        self.print_raw(&text)
    }

    fn print_newline(&mut self) -> Result<(), RuntimeError> {
        self.softspace = false;
        self.print_raw("\n")
    }

    fn print_raw(&mut self, text: &str) -> Result<(), RuntimeError> {
        self.print_out
            .write_all(text.as_bytes())
            .map_err(|e| RuntimeError::Print(e.to_string()))
    }
}

// --- value helpers ---

enum Num {
    I(i64),
    F(f64),
}

fn as_num(v: &Value) -> Option<Num> {
    match v {
        Value::Int(n) => Some(Num::I(*n as i64)),
        Value::Int64(n) => Some(Num::I(*n)),
        Value::Bool(b) => Some(Num::I(*b as i64)),
        Value::Long(l) => l.to_i64().map(Num::I),
        Value::Float(f) => Some(Num::F(*f)),
        _ => None,
    }
}

fn as_int(v: &Value) -> Option<i64> {
    match as_num(v)? {
        Num::I(n) => Some(n),
        Num::F(_) => None,
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(n) => *n != 0,
        Value::Int64(n) => *n != 0,
        Value::Long(l) => l.digits.iter().any(|&d| d != 0),
        Value::Float(f) => *f != 0.0,
        Value::Complex(re, im) => *re != 0.0 || *im != 0.0,
        Value::Str(bytes) => !bytes.is_empty(),
        Value::Unicode(s) => !s.is_empty(),
        Value::Tuple(items) => !items.is_empty(),
        Value::List(items) => !items.borrow().is_empty(),
        Value::Dict(pairs) => !pairs.borrow().is_empty(),
        Value::Set(items) | Value::FrozenSet(items) => !items.is_empty(),
        _ => true,
    }
}

fn local_name(code: &CodeObject, index: u16) -> String {
    code.var_names
        .get(index as usize)
        .cloned()
        .unwrap_or_else(|| format!("slot {index}"))
}

fn name_at(code: &CodeObject, index: u16, at: usize) -> Result<String, RuntimeError> {
    code.names
        .get(index as usize)
        .cloned()
        .ok_or(RuntimeError::NameOutOfRange { at, index })
}

fn pop_n(frame: &mut Frame, n: usize, at: usize) -> Result<Vec<Value>, RuntimeError> {
    if frame.stack.len() < n {
        return Err(RuntimeError::StackUnderflow { at });
    }
    Ok(frame.stack.split_off(frame.stack.len() - n))
}

fn unary_positive(v: Value, at: usize) -> Result<Value, RuntimeError> {
    // +x normalizes bools to ints, as it does in Python.
    match as_num(&v) {
        Some(Num::I(n)) => Ok(Value::from_i64(n)),
        Some(Num::F(f)) => Ok(Value::Float(f)),
        None => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn unary_negative(v: Value, at: usize) -> Result<Value, RuntimeError> {
    match as_num(&v) {
        Some(Num::I(n)) => Ok(Value::from_i64(n.wrapping_neg())),
        Some(Num::F(f)) => Ok(Value::Float(-f)),
        None => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// Numeric op with int/float overloads; ints wrap on overflow.
fn arith(
    a: Value,
    b: Value,
    at: usize,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (as_num(&a), as_num(&b)) {
        (Some(Num::I(x)), Some(Num::I(y))) => Ok(Value::from_i64(int_op(x, y))),
        (Some(Num::F(x)), Some(Num::F(y))) => Ok(Value::Float(float_op(x, y))),
        (Some(Num::I(x)), Some(Num::F(y))) => Ok(Value::Float(float_op(x as f64, y))),
        (Some(Num::F(x)), Some(Num::I(y))) => Ok(Value::Float(float_op(x, y as f64))),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// `+` also concatenates sequences.
fn add(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        (Value::Str(x), Value::Str(y)) => {
            let mut out = x.clone();
            out.extend_from_slice(y);
            Ok(Value::Str(out))
        }
        (Value::Unicode(x), Value::Unicode(y)) => Ok(Value::Unicode(format!("{x}{y}"))),
        (Value::Tuple(x), Value::Tuple(y)) => {
            let mut out = x.clone();
            out.extend_from_slice(y);
            Ok(Value::Tuple(out))
        }
        (Value::List(x), Value::List(y)) => {
            let mut out = x.borrow().clone();
            out.extend_from_slice(&y.borrow());
            Ok(Value::new_list(out))
        }
        _ => arith(a, b, at, i64::wrapping_add, |x, y| x + y),
    }
}

/// Python floor division: quotient rounded toward negative infinity.
fn floor_div_i(a: i64, b: i64, at: usize) -> Result<i64, RuntimeError> {
    if b == 0 {
        return Err(RuntimeError::ZeroDivision { at });
    }
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Python modulo: result takes the divisor's sign.
fn mod_i(a: i64, b: i64, at: usize) -> Result<i64, RuntimeError> {
    if b == 0 {
        return Err(RuntimeError::ZeroDivision { at });
    }
    let r = a.wrapping_rem(b);
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn divide(a: Value, b: Value, at: usize, floor_floats: bool) -> Result<Value, RuntimeError> {
    match (as_num(&a), as_num(&b)) {
        (Some(Num::I(x)), Some(Num::I(y))) => Ok(Value::from_i64(floor_div_i(x, y, at)?)),
        (Some(xa), Some(xb)) => {
            let x = num_f(xa);
            let y = num_f(xb);
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision { at });
            }
            let q = x / y;
            Ok(Value::Float(if floor_floats { q.floor() } else { q }))
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn true_divide(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (as_num(&a), as_num(&b)) {
        (Some(xa), Some(xb)) => {
            let x = num_f(xa);
            let y = num_f(xb);
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision { at });
            }
            Ok(Value::Float(x / y))
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn modulo(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (as_num(&a), as_num(&b)) {
        (Some(Num::I(x)), Some(Num::I(y))) => Ok(Value::from_i64(mod_i(x, y, at)?)),
        (Some(xa), Some(xb)) => {
            let x = num_f(xa);
            let y = num_f(xb);
            if y == 0.0 {
                return Err(RuntimeError::ZeroDivision { at });
            }
            // Same sign rule as ints.
            let r = x % y;
            Ok(Value::Float(if r != 0.0 && (r < 0.0) != (y < 0.0) {
                r + y
            } else {
                r
            }))
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn power(a: Value, b: Value, at: usize) -> Result<Value, RuntimeError> {
    match (as_num(&a), as_num(&b)) {
        (Some(Num::I(x)), Some(Num::I(y))) => {
            if y >= 0 {
                let exp = u32::try_from(y).map_err(|_| RuntimeError::TypeMismatch { at })?;
                Ok(Value::from_i64(x.wrapping_pow(exp)))
            } else {
                Ok(Value::Float((x as f64).powf(y as f64)))
            }
        }
        (Some(xa), Some(xb)) => Ok(Value::Float(num_f(xa).powf(num_f(xb)))),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn num_f(n: Num) -> f64 {
    match n {
        Num::I(x) => x as f64,
        Num::F(x) => x,
    }
}

fn bitwise(a: Value, b: Value, at: usize, op: fn(i64, i64) -> i64) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        (Value::Bool(x), Value::Bool(y)) => {
            let r = op(*x as i64, *y as i64);
            Ok(Value::Bool(r != 0))
        }
        _ => {
            let x = as_int(&a).ok_or(RuntimeError::TypeMismatch { at })?;
            let y = as_int(&b).ok_or(RuntimeError::TypeMismatch { at })?;
            Ok(Value::from_i64(op(x, y)))
        }
    }
}

fn shift(a: Value, b: Value, at: usize, left: bool) -> Result<Value, RuntimeError> {
    let x = as_int(&a).ok_or(RuntimeError::TypeMismatch { at })?;
    let y = as_int(&b).ok_or(RuntimeError::TypeMismatch { at })?;
    if !(0..64).contains(&y) {
        return Err(RuntimeError::TypeMismatch { at });
    }
    let r = if left { x.wrapping_shl(y as u32) } else { x >> y };
    Ok(Value::from_i64(r))
}

/// Normalize a (possibly negative) Python index against a length.
fn norm_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if i < 0 { i + len } else { i };
    if (0..len).contains(&idx) {
        Some(idx as usize)
    } else {
        None
    }
}

fn subscr(obj: &Value, key: &Value, at: usize) -> Result<Value, RuntimeError> {
    match obj {
        Value::Tuple(items) => {
            let i = as_int(key).ok_or(RuntimeError::TypeMismatch { at })?;
            norm_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or(RuntimeError::TypeMismatch { at })
        }
        Value::List(items) => {
            let items = items.borrow();
            let i = as_int(key).ok_or(RuntimeError::TypeMismatch { at })?;
            norm_index(i, items.len())
                .map(|i| items[i].clone())
                .ok_or(RuntimeError::TypeMismatch { at })
        }
        Value::Str(bytes) => {
            let i = as_int(key).ok_or(RuntimeError::TypeMismatch { at })?;
            norm_index(i, bytes.len())
                .map(|i| Value::Str(vec![bytes[i]]))
                .ok_or(RuntimeError::TypeMismatch { at })
        }
        Value::Dict(pairs) => pairs
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or(RuntimeError::TypeMismatch { at }),
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn store_subscr(obj: &Value, key: Value, value: Value, at: usize) -> Result<(), RuntimeError> {
    match obj {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let i = as_int(&key).ok_or(RuntimeError::TypeMismatch { at })?;
            let i = norm_index(i, len).ok_or(RuntimeError::TypeMismatch { at })?;
            items[i] = value;
            Ok(())
        }
        Value::Dict(pairs) => {
            let mut pairs = pairs.borrow_mut();
            if let Some(slot) = pairs.iter_mut().find(|(k, _)| *k == key) {
                slot.1 = value;
            } else {
                pairs.push((key, value));
            }
            Ok(())
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

fn delete_subscr(obj: &Value, key: &Value, at: usize) -> Result<(), RuntimeError> {
    match obj {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            let i = as_int(key).ok_or(RuntimeError::TypeMismatch { at })?;
            let i = norm_index(i, len).ok_or(RuntimeError::TypeMismatch { at })?;
            items.remove(i);
            Ok(())
        }
        Value::Dict(pairs) => {
            let mut pairs = pairs.borrow_mut();
            let pos = pairs
                .iter()
                .position(|(k, _)| k == key)
                .ok_or(RuntimeError::TypeMismatch { at })?;
            pairs.remove(pos);
            Ok(())
        }
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// Numeric equality crosses int/float, then falls back to structural.
fn values_eq(a: &Value, b: &Value) -> bool {
    match (as_num(a), as_num(b)) {
        (Some(x), Some(y)) => num_f(x) == num_f(y),
        _ => a == b,
    }
}

fn cmp_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Unicode(x), Value::Unicode(y)) => Some(x.cmp(y)),
        _ => match (as_num(a), as_num(b)) {
            (Some(Num::I(x)), Some(Num::I(y))) => Some(x.cmp(&y)),
            (Some(x), Some(y)) => num_f(x).partial_cmp(&num_f(y)),
            _ => None,
        },
    }
}

fn contains(needle: &Value, hay: &Value, at: usize) -> Result<bool, RuntimeError> {
    match hay {
        Value::Tuple(items) | Value::Set(items) | Value::FrozenSet(items) => {
            Ok(items.iter().any(|v| values_eq(v, needle)))
        }
        Value::List(items) => Ok(items.borrow().iter().any(|v| values_eq(v, needle))),
        Value::Dict(pairs) => Ok(pairs.borrow().iter().any(|(k, _)| values_eq(k, needle))),
        Value::Str(bytes) => match needle {
            Value::Str(sub) => {
                Ok(sub.is_empty() || bytes.windows(sub.len().max(1)).any(|w| w == &sub[..]))
            }
            _ => Err(RuntimeError::TypeMismatch { at }),
        },
        Value::Unicode(s) => match needle {
            Value::Unicode(sub) => Ok(s.contains(sub.as_str())),
            _ => Err(RuntimeError::TypeMismatch { at }),
        },
        _ => Err(RuntimeError::TypeMismatch { at }),
    }
}

/// `COMPARE_OP` semantics for the executable `cmp_op` entries.
fn compare(index: u16, a: &Value, b: &Value, at: usize) -> Result<Value, RuntimeError> {
    let result = match index {
        2 => values_eq(a, b),
        3 => !values_eq(a, b),
        0 | 1 | 4 | 5 => {
            let ord = cmp_values(a, b).ok_or(RuntimeError::TypeMismatch { at })?;
            match index {
                0 => ord == Ordering::Less,
                1 => ord != Ordering::Greater,
                4 => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }
        }
        6 => contains(a, b, at)?,
        7 => !contains(a, b, at)?,
        // Identity approximated structurally; interned scalars behave the
        // same either way.
        8 => values_eq(a, b),
        9 => !values_eq(a, b),
        other => return Err(RuntimeError::BadCompareOp { at, index: other }),
    };
    Ok(Value::Bool(result))
}

fn iter_items(v: Value, at: usize) -> Result<Vec<Value>, RuntimeError> {
    match v {
        Value::Tuple(items) | Value::Set(items) | Value::FrozenSet(items) => Ok(items),
        Value::List(items) => Ok(items.borrow().clone()),
        Value::Str(bytes) => Ok(bytes.iter().map(|&b| Value::Str(vec![b])).collect()),
        Value::Unicode(s) => Ok(s.chars().map(|c| Value::Unicode(c.to_string())).collect()),
        Value::Dict(pairs) => Ok(pairs.borrow().iter().map(|(k, _)| k.clone()).collect()),
        Value::Iter { items, index } => Ok(items[index..].to_vec()),
        _ => Err(RuntimeError::NotIterable { at }),
    }
}

fn range_args(args: &[Value], at: usize) -> Result<(i64, i64, i64), RuntimeError> {
    let get = |v: &Value| as_int(v).ok_or(RuntimeError::TypeMismatch { at });
    match args {
        [stop] => Ok((0, get(stop)?, 1)),
        [start, stop] => Ok((get(start)?, get(stop)?, 1)),
        [start, stop, step] => {
            let step = get(step)?;
            if step == 0 {
                return Err(RuntimeError::TypeMismatch { at });
            }
            Ok((get(start)?, get(stop)?, step))
        }
        _ => Err(RuntimeError::ArgumentCount {
            expected: 3,
            given: args.len(),
        }),
    }
}

fn call_builtin(b: Builtin, args: Vec<Value>, at: usize) -> Result<Value, RuntimeError> {
    match b {
        Builtin::Range | Builtin::Xrange => {
            let (start, stop, step) = range_args(&args, at)?;
            let mut items = Vec::new();
            let mut i = start;
            while (step > 0 && i < stop) || (step < 0 && i > stop) {
                items.push(Value::from_i64(i));
                i += step;
            }
            Ok(Value::new_list(items))
        }
        Builtin::Len => match args.as_slice() {
            [Value::Str(bytes)] => Ok(Value::from_i64(bytes.len() as i64)),
            [Value::Unicode(s)] => Ok(Value::from_i64(s.chars().count() as i64)),
            [Value::Tuple(items)] | [Value::Set(items)] | [Value::FrozenSet(items)] => {
                Ok(Value::from_i64(items.len() as i64))
            }
            [Value::List(items)] => Ok(Value::from_i64(items.borrow().len() as i64)),
            [Value::Dict(pairs)] => Ok(Value::from_i64(pairs.borrow().len() as i64)),
            [_] => Err(RuntimeError::TypeMismatch { at }),
            _ => Err(RuntimeError::ArgumentCount {
                expected: 1,
                given: args.len(),
            }),
        },
        Builtin::Abs => match args.as_slice() {
            [v] => match as_num(v).ok_or(RuntimeError::TypeMismatch { at })? {
                Num::I(n) => Ok(Value::from_i64(n.wrapping_abs())),
                Num::F(f) => Ok(Value::Float(f.abs())),
            },
            _ => Err(RuntimeError::ArgumentCount {
                expected: 1,
                given: args.len(),
            }),
        },
        Builtin::Chr => match args.as_slice() {
            [v] => {
                let n = as_int(v).ok_or(RuntimeError::TypeMismatch { at })?;
                let byte = u8::try_from(n).map_err(|_| RuntimeError::TypeMismatch { at })?;
                Ok(Value::Str(vec![byte]))
            }
            _ => Err(RuntimeError::ArgumentCount {
                expected: 1,
                given: args.len(),
            }),
        },
        Builtin::Ord => match args.as_slice() {
            [Value::Str(bytes)] if bytes.len() == 1 => Ok(Value::Int(bytes[0] as i32)),
            [_] => Err(RuntimeError::TypeMismatch { at }),
            _ => Err(RuntimeError::ArgumentCount {
                expected: 1,
                given: args.len(),
            }),
        },
    }
}
