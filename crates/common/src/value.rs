//! Runtime and marshal value representation.
//!
//! Everything the 2.7 marshal format can carry in a constant table, plus the
//! handful of variants that only exist at runtime (functions, builtins,
//! loop iterators). Display output follows Python's `str()`, with container
//! elements rendered as `repr()` — this is what the trace file shows for
//! resolved constant operands.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::code::CodeObject;

/// An arbitrary-precision integer as marshal stores it: sign plus
/// little-endian base-2^15 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Long {
    pub negative: bool,
    pub digits: Vec<u16>,
}

impl Long {
    /// Decimal rendering without sign handling quirks: an empty digit vector
    /// is zero, and `-0` never prints a sign.
    fn to_decimal(&self) -> String {
        // Repeated short division of the base-2^15 digit vector by 10.
        let mut digits: Vec<u32> = self.digits.iter().rev().map(|&d| d as u32).collect();
        while digits.first() == Some(&0) {
            digits.remove(0);
        }
        if digits.is_empty() {
            return "0".to_string();
        }

        let mut out = Vec::new();
        while !digits.is_empty() {
            let mut rem: u32 = 0;
            let mut next = Vec::with_capacity(digits.len());
            for &d in &digits {
                let cur = (rem << 15) | d;
                next.push(cur / 10);
                rem = cur % 10;
            }
            while next.first() == Some(&0) {
                next.remove(0);
            }
            out.push(char::from(b'0' + rem as u8));
            digits = next;
        }

        let sign = if self.negative { "-" } else { "" };
        let body: String = out.into_iter().rev().collect();
        format!("{sign}{body}")
    }
}

impl Long {
    /// The value as an `i64`, when it fits.
    pub fn to_i64(&self) -> Option<i64> {
        let mut acc: i64 = 0;
        for &d in self.digits.iter().rev() {
            acc = acc.checked_mul(1 << 15)?.checked_add(d as i64)?;
        }
        if self.negative {
            Some(-acc)
        } else {
            Some(acc)
        }
    }
}

impl fmt::Display for Long {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// The built-in functions the execution engine provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Range,
    Xrange,
    Len,
    Abs,
    Chr,
    Ord,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Range => "range",
            Builtin::Xrange => "xrange",
            Builtin::Len => "len",
            Builtin::Abs => "abs",
            Builtin::Chr => "chr",
            Builtin::Ord => "ord",
        }
    }

    /// Look up a builtin by its global name.
    pub fn by_name(name: &str) -> Option<Builtin> {
        match name {
            "range" => Some(Builtin::Range),
            "xrange" => Some(Builtin::Xrange),
            "len" => Some(Builtin::Len),
            "abs" => Some(Builtin::Abs),
            "chr" => Some(Builtin::Chr),
            "ord" => Some(Builtin::Ord),
            _ => None,
        }
    }
}

/// A Python 2.7 value.
///
/// The first group of variants round-trips through marshal; `Function`,
/// `Builtin` and `Iter` exist only at runtime and never appear in a
/// constant table.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    StopIteration,
    Ellipsis,
    Bool(bool),
    /// Plain int (marshal `i`).
    Int(i32),
    /// 64-bit int (marshal `I`).
    Int64(i64),
    /// Arbitrary-precision long (marshal `l`).
    Long(Long),
    Float(f64),
    Complex(f64, f64),
    /// Byte string. Python 2 `str` is a byte string; `co_code` itself
    /// arrives as one of these.
    Str(Vec<u8>),
    Unicode(String),
    Tuple(Vec<Value>),
    /// Mutable, aliasable: clones share the backing store, as assignment
    /// does in Python.
    List(Rc<RefCell<Vec<Value>>>),
    /// Mutable, aliasable, insertion-ordered.
    Dict(Rc<RefCell<Vec<(Value, Value)>>>),
    Set(Vec<Value>),
    FrozenSet(Vec<Value>),
    Code(Rc<CodeObject>),

    /// Runtime only: a function made by `MAKE_FUNCTION`.
    Function {
        code: Rc<CodeObject>,
        defaults: Vec<Value>,
    },
    /// Runtime only: an engine-provided builtin.
    Builtin(Builtin),
    /// Runtime only: a materialized loop iterator (`GET_ITER`/`FOR_ITER`).
    Iter { items: Vec<Value>, index: usize },
}

// Bitwise equality for floats keeps Value well-behaved in Rust while the
// engine never produces NaN through marshal-loaded constants.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::StopIteration, Value::StopIteration) => true,
            (Value::Ellipsis, Value::Ellipsis) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Complex(ar, ai), Value::Complex(br, bi)) => {
                ar.to_bits() == br.to_bits() && ai.to_bits() == bi.to_bits()
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Unicode(a), Value::Unicode(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::List(a), Value::List(b)) => *a.borrow() == *b.borrow(),
            (Value::Dict(a), Value::Dict(b)) => *a.borrow() == *b.borrow(),
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::FrozenSet(a), Value::FrozenSet(b)) => a == b,
            (Value::Code(a), Value::Code(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (
                Value::Function { code: ca, .. },
                Value::Function { code: cb, .. },
            ) => Rc::ptr_eq(ca, cb),
            _ => false,
        }
    }
}

impl Value {
    /// Narrowest integer representation: plain int when the value fits,
    /// 64-bit otherwise.
    pub fn from_i64(n: i64) -> Value {
        match i32::try_from(n) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::Int64(n),
        }
    }

    pub fn new_list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn new_dict(pairs: Vec<(Value, Value)>) -> Value {
        Value::Dict(Rc::new(RefCell::new(pairs)))
    }

    /// Python `repr()`-style rendering, used for container elements.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(bytes) => repr_bytes(bytes),
            Value::Unicode(s) => format!("u{}", repr_bytes(s.as_bytes())),
            Value::Long(l) => format!("{l}L"),
            _ => self.to_string(),
        }
    }

    fn fmt_float(f: f64, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
            write!(out, "{f:.1}")
        } else {
            write!(out, "{f}")
        }
    }

    fn fmt_seq(items: &[Value], open: &str, close: &str, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        out.write_str(open)?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            out.write_str(&item.repr())?;
        }
        out.write_str(close)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::StopIteration => f.write_str("StopIteration"),
            Value::Ellipsis => f.write_str("Ellipsis"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Long(l) => write!(f, "{l}"),
            Value::Float(x) => Value::fmt_float(*x, f),
            Value::Complex(re, im) => {
                if *re == 0.0 {
                    write!(f, "{im}j")
                } else {
                    write!(f, "({re}{im:+}j)")
                }
            }
            Value::Str(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
            Value::Unicode(s) => f.write_str(s),
            Value::Tuple(items) => {
                if items.len() == 1 {
                    write!(f, "({},)", items[0].repr())
                } else {
                    Value::fmt_seq(items, "(", ")", f)
                }
            }
            Value::List(items) => Value::fmt_seq(&items.borrow(), "[", "]", f),
            Value::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k.repr(), v.repr())?;
                }
                f.write_str("}")
            }
            Value::Set(items) => Value::fmt_seq(items, "set([", "])", f),
            Value::FrozenSet(items) => Value::fmt_seq(items, "frozenset([", "])", f),
            Value::Code(code) => write!(f, "<code object {}>", code.name),
            Value::Function { code, .. } => write!(f, "<function {}>", code.name),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name()),
            Value::Iter { .. } => f.write_str("<iterator>"),
        }
    }
}

/// Python 2 `repr()` of a byte string: single quotes, backslash escapes,
/// `\xNN` for bytes outside printable ASCII.
fn repr_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('\'');
    for &b in bytes {
        match b {
            b'\'' => out.push_str("\\'"),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Bool(false).to_string(), "False");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Int(-13).to_string(), "-13");
        assert_eq!(Value::Int64(1 << 40).to_string(), "1099511627776");
    }

    #[test]
    fn display_float_keeps_point() {
        assert_eq!(Value::Float(42.0).to_string(), "42.0");
        assert_eq!(Value::Float(3.25).to_string(), "3.25");
        assert_eq!(Value::Float(-1.0).to_string(), "-1.0");
    }

    #[test]
    fn display_strings_unquoted() {
        // str() of a string is its raw contents.
        assert_eq!(Value::Str(b"hello".to_vec()).to_string(), "hello");
        assert_eq!(Value::Unicode("caf\u{e9}".into()).to_string(), "caf\u{e9}");
    }

    #[test]
    fn repr_strings_quoted() {
        assert_eq!(Value::Str(b"hello".to_vec()).repr(), "'hello'");
        assert_eq!(Value::Str(b"a'b\n".to_vec()).repr(), "'a\\'b\\n'");
        assert_eq!(Value::Str(vec![0x00, 0xFF]).repr(), "'\\x00\\xff'");
    }

    #[test]
    fn display_tuple_uses_repr_of_elements() {
        let t = Value::Tuple(vec![Value::Int(1), Value::Str(b"x".to_vec())]);
        assert_eq!(t.to_string(), "(1, 'x')");
    }

    #[test]
    fn display_single_element_tuple() {
        let t = Value::Tuple(vec![Value::Int(7)]);
        assert_eq!(t.to_string(), "(7,)");
    }

    #[test]
    fn display_empty_tuple_and_list() {
        assert_eq!(Value::Tuple(vec![]).to_string(), "()");
        assert_eq!(Value::new_list(vec![]).to_string(), "[]");
    }

    #[test]
    fn display_dict() {
        let d = Value::new_dict(vec![(Value::Str(b"k".to_vec()), Value::Int(1))]);
        assert_eq!(d.to_string(), "{'k': 1}");
    }

    #[test]
    fn list_clones_alias_the_store() {
        let a = Value::new_list(vec![Value::Int(1)]);
        let b = a.clone();
        if let Value::List(items) = &a {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(b.to_string(), "[1, 2]");
    }

    #[test]
    fn long_zero() {
        let l = Long {
            negative: false,
            digits: vec![],
        };
        assert_eq!(l.to_string(), "0");
    }

    #[test]
    fn long_small() {
        let l = Long {
            negative: false,
            digits: vec![12345],
        };
        assert_eq!(l.to_string(), "12345");
    }

    #[test]
    fn long_multi_digit() {
        // 3 * 2^15 + 9 = 98313
        let l = Long {
            negative: false,
            digits: vec![9, 3],
        };
        assert_eq!(l.to_string(), "98313");
    }

    #[test]
    fn long_negative_with_suffix_in_repr() {
        let l = Long {
            negative: true,
            digits: vec![1],
        };
        assert_eq!(l.to_string(), "-1");
        assert_eq!(Value::Long(l).repr(), "-1L");
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
        assert_ne!(Value::Float(1.5), Value::Float(2.5));
    }

    #[test]
    fn code_equality_is_identity() {
        let a = Rc::new(CodeObject::named("f"));
        let b = Rc::new(CodeObject::named("f"));
        assert_eq!(Value::Code(a.clone()), Value::Code(a.clone()));
        assert_ne!(Value::Code(a), Value::Code(b));
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(Builtin::by_name("range"), Some(Builtin::Range));
        assert_eq!(Builtin::by_name("len"), Some(Builtin::Len));
        assert_eq!(Builtin::by_name("open"), None);
    }
}
