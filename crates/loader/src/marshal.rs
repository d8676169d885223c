//! Reader for the CPython 2.7 marshal serialization.
//!
//! Marshal is a one-pass, type-code-prefixed format. Interned strings (`t`)
//! accumulate in a reference table that later `R` records index into; that is
//! the only sharing the format supports, so the value graph stays a tree.

use std::rc::Rc;

use pytrace_common::{CodeObject, Long, Value};

use crate::error::FormatError;

// 2.7 Python/marshal.c type codes.
const TYPE_NULL: u8 = b'0';
const TYPE_NONE: u8 = b'N';
const TYPE_FALSE: u8 = b'F';
const TYPE_TRUE: u8 = b'T';
const TYPE_STOPITER: u8 = b'S';
const TYPE_ELLIPSIS: u8 = b'.';
const TYPE_INT: u8 = b'i';
const TYPE_INT64: u8 = b'I';
const TYPE_LONG: u8 = b'l';
const TYPE_FLOAT: u8 = b'f';
const TYPE_BINARY_FLOAT: u8 = b'g';
const TYPE_COMPLEX: u8 = b'x';
const TYPE_BINARY_COMPLEX: u8 = b'y';
const TYPE_STRING: u8 = b's';
const TYPE_INTERNED: u8 = b't';
const TYPE_STRINGREF: u8 = b'R';
const TYPE_UNICODE: u8 = b'u';
const TYPE_TUPLE: u8 = b'(';
const TYPE_LIST: u8 = b'[';
const TYPE_DICT: u8 = b'{';
const TYPE_SET: u8 = b'<';
const TYPE_FROZENSET: u8 = b'>';
const TYPE_CODE: u8 = b'c';

/// Bound on value-graph nesting. Corrupted containers are expected input;
/// this turns a would-be stack overflow into a clean error.
const MAX_DEPTH: usize = 256;

/// One-pass reader over a marshal byte stream.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    interned: Vec<Vec<u8>>,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            interned: Vec::new(),
            depth: 0,
        }
    }

    /// Read the next complete value.
    ///
    /// A `NULL` record at the top level is malformed (it only terminates
    /// dict key streams).
    pub fn read_value(&mut self) -> Result<Value, FormatError> {
        match self.read_raw()? {
            Some(value) => Ok(value),
            None => Err(FormatError::UnknownTypeCode {
                code: TYPE_NULL,
                at: self.pos - 1,
            }),
        }
    }

    /// Read one record; `Ok(None)` is the `NULL` terminator.
    fn read_raw(&mut self) -> Result<Option<Value>, FormatError> {
        if self.depth >= MAX_DEPTH {
            return Err(FormatError::NestingTooDeep);
        }

        let at = self.pos;
        let code = self.read_u8()?;
        self.depth += 1;
        let value = match code {
            TYPE_NULL => {
                self.depth -= 1;
                return Ok(None);
            }
            TYPE_NONE => Value::None,
            TYPE_FALSE => Value::Bool(false),
            TYPE_TRUE => Value::Bool(true),
            TYPE_STOPITER => Value::StopIteration,
            TYPE_ELLIPSIS => Value::Ellipsis,
            TYPE_INT => Value::Int(self.read_i32()?),
            TYPE_INT64 => Value::Int64(self.read_i64()?),
            TYPE_LONG => self.read_long()?,
            TYPE_FLOAT => Value::Float(self.read_ascii_float()?),
            TYPE_BINARY_FLOAT => Value::Float(self.read_f64()?),
            TYPE_COMPLEX => {
                let re = self.read_ascii_float()?;
                let im = self.read_ascii_float()?;
                Value::Complex(re, im)
            }
            TYPE_BINARY_COMPLEX => {
                let re = self.read_f64()?;
                let im = self.read_f64()?;
                Value::Complex(re, im)
            }
            TYPE_STRING => Value::Str(self.read_len_bytes()?),
            TYPE_INTERNED => {
                let bytes = self.read_len_bytes()?;
                self.interned.push(bytes.clone());
                Value::Str(bytes)
            }
            TYPE_STRINGREF => {
                let index = self.read_i32()? as usize;
                let bytes = self
                    .interned
                    .get(index)
                    .ok_or(FormatError::BadStringRef { index })?;
                Value::Str(bytes.clone())
            }
            TYPE_UNICODE => {
                let bytes = self.read_len_bytes()?;
                let s = String::from_utf8(bytes).map_err(|_| FormatError::BadUtf8 { at })?;
                Value::Unicode(s)
            }
            TYPE_TUPLE => Value::Tuple(self.read_seq()?),
            TYPE_LIST => Value::new_list(self.read_seq()?),
            TYPE_SET => Value::Set(self.read_seq()?),
            TYPE_FROZENSET => Value::FrozenSet(self.read_seq()?),
            TYPE_DICT => {
                let mut pairs = Vec::new();
                loop {
                    let key = match self.read_raw()? {
                        Some(k) => k,
                        None => break,
                    };
                    let value = self.read_value()?;
                    pairs.push((key, value));
                }
                Value::new_dict(pairs)
            }
            TYPE_CODE => Value::Code(Rc::new(self.read_code()?)),
            other => return Err(FormatError::UnknownTypeCode { code: other, at }),
        };
        self.depth -= 1;
        Ok(Some(value))
    }

    /// Read the 14 fields of a `c` record in marshal order.
    fn read_code(&mut self) -> Result<CodeObject, FormatError> {
        let arg_count = self.read_i32()? as u32;
        let n_locals = self.read_i32()? as u32;
        let stack_size = self.read_i32()? as u32;
        let flags = self.read_i32()? as u32;
        let code = self.expect_bytes("code")?;
        let consts = self.expect_tuple("consts")?;
        let names = self.expect_name_tuple("names")?;
        let var_names = self.expect_name_tuple("varnames")?;
        let free_vars = self.expect_name_tuple("freevars")?;
        let cell_vars = self.expect_name_tuple("cellvars")?;
        let filename = self.expect_string("filename")?;
        let name = self.expect_string("name")?;
        let first_line_no = self.read_i32()? as u32;
        let lnotab = self.expect_bytes("lnotab")?;

        Ok(CodeObject {
            arg_count,
            n_locals,
            stack_size,
            flags,
            code,
            consts,
            names,
            var_names,
            free_vars,
            cell_vars,
            filename,
            name,
            first_line_no,
            lnotab,
        })
    }

    // --- field shape helpers ---

    fn expect_bytes(&mut self, field: &'static str) -> Result<Vec<u8>, FormatError> {
        match self.read_value()? {
            Value::Str(bytes) => Ok(bytes),
            _ => Err(FormatError::BadFieldType { field }),
        }
    }

    fn expect_string(&mut self, field: &'static str) -> Result<String, FormatError> {
        match self.read_value()? {
            Value::Str(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Value::Unicode(s) => Ok(s),
            _ => Err(FormatError::BadFieldType { field }),
        }
    }

    fn expect_tuple(&mut self, field: &'static str) -> Result<Vec<Value>, FormatError> {
        match self.read_value()? {
            Value::Tuple(items) => Ok(items),
            _ => Err(FormatError::BadFieldType { field }),
        }
    }

    fn expect_name_tuple(&mut self, field: &'static str) -> Result<Vec<String>, FormatError> {
        let items = self.expect_tuple(field)?;
        items
            .into_iter()
            .map(|item| match item {
                Value::Str(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Value::Unicode(s) => Ok(s),
                _ => Err(FormatError::BadFieldType { field }),
            })
            .collect()
    }

    // --- primitive readers ---

    fn read_u8(&mut self) -> Result<u8, FormatError> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or(FormatError::Truncated { at: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(FormatError::Truncated { at: self.pos })?;
        if end > self.bytes.len() {
            return Err(FormatError::Truncated { at: self.pos });
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, FormatError> {
        let b = self.read_exact(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_i64(&mut self) -> Result<i64, FormatError> {
        let b = self.read_exact(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_u16(&mut self) -> Result<u16, FormatError> {
        let b = self.read_exact(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn read_f64(&mut self) -> Result<f64, FormatError> {
        let b = self.read_exact(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// `f`/`x` float payload: one length byte, then an ASCII literal.
    fn read_ascii_float(&mut self) -> Result<f64, FormatError> {
        let at = self.pos;
        let len = self.read_u8()? as usize;
        let bytes = self.read_exact(len)?;
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or(FormatError::BadFloat { at })
    }

    /// `l` payload: signed digit count, then base-2^15 digits little-endian.
    fn read_long(&mut self) -> Result<Value, FormatError> {
        let n = self.read_i32()?;
        let negative = n < 0;
        let count = n.unsigned_abs() as usize;
        let mut digits = Vec::with_capacity(count);
        for _ in 0..count {
            digits.push(self.read_u16()?);
        }
        Ok(Value::Long(Long { negative, digits }))
    }

    fn read_len_bytes(&mut self) -> Result<Vec<u8>, FormatError> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(FormatError::Truncated { at: self.pos });
        }
        Ok(self.read_exact(len as usize)?.to_vec())
    }

    fn read_seq(&mut self) -> Result<Vec<Value>, FormatError> {
        let len = self.read_i32()?;
        if len < 0 {
            return Err(FormatError::Truncated { at: self.pos });
        }
        let mut items = Vec::with_capacity((len as usize).min(4096));
        for _ in 0..len {
            items.push(self.read_value()?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_one(bytes: &[u8]) -> Result<Value, FormatError> {
        Reader::new(bytes).read_value()
    }

    #[test]
    fn read_none_and_bools() {
        assert_eq!(read_one(b"N").unwrap(), Value::None);
        assert_eq!(read_one(b"T").unwrap(), Value::Bool(true));
        assert_eq!(read_one(b"F").unwrap(), Value::Bool(false));
    }

    #[test]
    fn read_int() {
        assert_eq!(read_one(b"i\x2a\x00\x00\x00").unwrap(), Value::Int(42));
        assert_eq!(
            read_one(b"i\xff\xff\xff\xff").unwrap(),
            Value::Int(-1)
        );
    }

    #[test]
    fn read_int64() {
        let mut bytes = vec![b'I'];
        bytes.extend_from_slice(&(1i64 << 40).to_le_bytes());
        assert_eq!(read_one(&bytes).unwrap(), Value::Int64(1 << 40));
    }

    #[test]
    fn read_long_digits() {
        // 98313 = 3 * 2^15 + 9, two digits
        let mut bytes = vec![b'l'];
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&9u16.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes());
        let v = read_one(&bytes).unwrap();
        assert_eq!(v.to_string(), "98313");
    }

    #[test]
    fn read_negative_long() {
        let mut bytes = vec![b'l'];
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&7u16.to_le_bytes());
        assert_eq!(read_one(&bytes).unwrap().to_string(), "-7");
    }

    #[test]
    fn read_binary_float() {
        let mut bytes = vec![b'g'];
        bytes.extend_from_slice(&3.5f64.to_le_bytes());
        assert_eq!(read_one(&bytes).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn read_ascii_float_record() {
        assert_eq!(read_one(b"f\x043.25").unwrap(), Value::Float(3.25));
    }

    #[test]
    fn bad_ascii_float() {
        assert!(matches!(
            read_one(b"f\x03abc"),
            Err(FormatError::BadFloat { .. })
        ));
    }

    #[test]
    fn read_string() {
        let v = read_one(b"s\x05\x00\x00\x00hello").unwrap();
        assert_eq!(v, Value::Str(b"hello".to_vec()));
    }

    #[test]
    fn read_unicode() {
        let v = read_one(b"u\x04\x00\x00\x00caf\xc3").err();
        // truncated multi-byte sequence is invalid UTF-8
        assert!(matches!(v, Some(FormatError::BadUtf8 { .. })));

        let v = read_one(b"u\x05\x00\x00\x00caf\xc3\xa9").unwrap();
        assert_eq!(v, Value::Unicode("caf\u{e9}".into()));
    }

    #[test]
    fn interned_string_back_reference() {
        // ('abc', 'abc') with the second element a stringref
        let mut bytes = vec![b'('];
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.push(b't');
        bytes.extend_from_slice(&3i32.to_le_bytes());
        bytes.extend_from_slice(b"abc");
        bytes.push(b'R');
        bytes.extend_from_slice(&0i32.to_le_bytes());

        let v = read_one(&bytes).unwrap();
        assert_eq!(
            v,
            Value::Tuple(vec![
                Value::Str(b"abc".to_vec()),
                Value::Str(b"abc".to_vec())
            ])
        );
    }

    #[test]
    fn dangling_string_reference() {
        let mut bytes = vec![b'R'];
        bytes.extend_from_slice(&5i32.to_le_bytes());
        assert_eq!(
            read_one(&bytes),
            Err(FormatError::BadStringRef { index: 5 })
        );
    }

    #[test]
    fn read_nested_tuple() {
        // ((1,), 2)
        let mut bytes = vec![b'('];
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.push(b'(');
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'i');
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'i');
        bytes.extend_from_slice(&2i32.to_le_bytes());

        let v = read_one(&bytes).unwrap();
        assert_eq!(
            v,
            Value::Tuple(vec![
                Value::Tuple(vec![Value::Int(1)]),
                Value::Int(2)
            ])
        );
    }

    #[test]
    fn read_dict_null_terminated() {
        // {'a': 1}
        let mut bytes = vec![b'{'];
        bytes.push(b's');
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'a');
        bytes.push(b'i');
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'0');

        let v = read_one(&bytes).unwrap();
        assert_eq!(
            v,
            Value::new_dict(vec![(Value::Str(b"a".to_vec()), Value::Int(1))])
        );
    }

    #[test]
    fn unknown_type_code() {
        assert_eq!(
            read_one(b"z"),
            Err(FormatError::UnknownTypeCode { code: b'z', at: 0 })
        );
    }

    #[test]
    fn truncated_stream() {
        assert_eq!(read_one(b""), Err(FormatError::Truncated { at: 0 }));
        assert!(matches!(
            read_one(b"i\x01\x02"),
            Err(FormatError::Truncated { .. })
        ));
        assert!(matches!(
            read_one(b"s\x0a\x00\x00\x00hi"),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn deep_nesting_rejected() {
        // 300 nested single-element tuples
        let mut bytes = Vec::new();
        for _ in 0..300 {
            bytes.push(b'(');
            bytes.extend_from_slice(&1i32.to_le_bytes());
        }
        bytes.push(b'N');
        assert_eq!(read_one(&bytes), Err(FormatError::NestingTooDeep));
    }
}
