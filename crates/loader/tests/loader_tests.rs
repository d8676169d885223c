//! End-to-end loader tests over hand-built containers.
//!
//! The helpers here encode marshal records byte by byte, independent of the
//! reader under test.

use pytrace_common::Value;
use pytrace_loader::{load, FormatError, HEADER_LEN, MAGIC};

// ---- marshal encoding helpers ----

fn m_int(n: i32) -> Vec<u8> {
    let mut out = vec![b'i'];
    out.extend_from_slice(&n.to_le_bytes());
    out
}

fn m_str(s: &[u8]) -> Vec<u8> {
    let mut out = vec![b's'];
    out.extend_from_slice(&(s.len() as i32).to_le_bytes());
    out.extend_from_slice(s);
    out
}

fn m_tuple(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = vec![b'('];
    out.extend_from_slice(&(items.len() as i32).to_le_bytes());
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// Encode a `c` record with the given name, instruction bytes, constant
/// records, and name/varname tables.
fn m_code(name: &str, code: &[u8], consts: &[Vec<u8>], names: &[&str], var_names: &[&str]) -> Vec<u8> {
    let mut out = vec![b'c'];
    out.extend_from_slice(&0i32.to_le_bytes()); // argcount
    out.extend_from_slice(&(var_names.len() as i32).to_le_bytes()); // nlocals
    out.extend_from_slice(&4i32.to_le_bytes()); // stacksize
    out.extend_from_slice(&64i32.to_le_bytes()); // flags
    out.extend_from_slice(&m_str(code));
    out.extend_from_slice(&m_tuple(consts));
    let names: Vec<Vec<u8>> = names.iter().map(|n| m_str(n.as_bytes())).collect();
    out.extend_from_slice(&m_tuple(&names));
    let var_names: Vec<Vec<u8>> = var_names.iter().map(|n| m_str(n.as_bytes())).collect();
    out.extend_from_slice(&m_tuple(&var_names));
    out.extend_from_slice(&m_tuple(&[])); // freevars
    out.extend_from_slice(&m_tuple(&[])); // cellvars
    out.extend_from_slice(&m_str(b"test.py"));
    out.extend_from_slice(&m_str(name.as_bytes()));
    out.extend_from_slice(&1i32.to_le_bytes()); // firstlineno
    out.extend_from_slice(&m_str(b"")); // lnotab
    out
}

fn container(root: &[u8]) -> Vec<u8> {
    let mut out = MAGIC.to_vec();
    out.extend_from_slice(&[0x5E, 0x00, 0x00, 0x00]); // timestamp
    out.extend_from_slice(root);
    out
}

// ---- tests ----

#[test]
fn loads_flat_code_object() {
    // LOAD_CONST 0; RETURN_VALUE
    let code_bytes = [100, 0, 0, 83];
    let pyc = container(&m_code(
        "<module>",
        &code_bytes,
        &[m_int(42)],
        &["x"],
        &[],
    ));

    let code = load(&pyc).unwrap();
    assert_eq!(code.name, "<module>");
    assert_eq!(code.code, code_bytes);
    assert_eq!(code.consts, vec![Value::Int(42)]);
    assert_eq!(code.names, vec!["x".to_string()]);
    assert!(code.var_names.is_empty());
    assert_eq!(code.filename, "test.py");
}

#[test]
fn loads_nested_code_object() {
    let inner = m_code("helper", &[83], &[], &[], &["arg"]);
    let pyc = container(&m_code(
        "<module>",
        &[100, 0, 0, 83],
        &[inner, m_int(7)],
        &[],
        &[],
    ));

    let root = load(&pyc).unwrap();
    assert_eq!(root.consts.len(), 2);
    match &root.consts[0] {
        Value::Code(inner) => {
            assert_eq!(inner.name, "helper");
            assert_eq!(inner.code, vec![83]);
            assert_eq!(inner.var_names, vec!["arg".to_string()]);
        }
        other => panic!("expected nested code object, got {other:?}"),
    }
    assert_eq!(root.consts[1], Value::Int(7));
}

#[test]
fn mismatched_magic_fails_before_unmarshal() {
    let mut pyc = container(&m_code("<module>", &[83], &[], &[], &[]));
    pyc[0] = 0x00;
    pyc[1] = 0x00;
    assert!(matches!(
        load(&pyc),
        Err(FormatError::HeaderMismatch { .. })
    ));
}

#[test]
fn all_zero_header_is_rejected() {
    let pyc = vec![0u8; 32];
    assert_eq!(
        load(&pyc),
        Err(FormatError::HeaderMismatch {
            found: [0, 0, 0, 0]
        })
    );
}

#[test]
fn truncated_body_fails_cleanly() {
    let full = container(&m_code("<module>", &[83], &[], &[], &[]));
    // Chop the container anywhere after the preamble: always a clean error.
    for end in HEADER_LEN..full.len() {
        let err = load(&full[..end]).unwrap_err();
        assert!(
            matches!(
                err,
                FormatError::Truncated { .. } | FormatError::TruncatedHeader { .. }
            ),
            "unexpected error at cut {end}: {err:?}"
        );
    }
}

#[test]
fn garbage_after_magic_is_an_unmarshal_error() {
    let mut pyc = MAGIC.to_vec();
    pyc.extend_from_slice(&[0, 0, 0, 0]);
    pyc.push(0xEE);
    assert!(matches!(
        load(&pyc),
        Err(FormatError::UnknownTypeCode { code: 0xEE, .. })
    ));
}

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Arbitrary bytes never panic the loader; they either parse or
        /// produce a specific FormatError.
        #[test]
        fn random_containers_fail_cleanly(mut bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = load(&bytes);
            // Same with a valid preamble stapled on, to reach the reader.
            if bytes.len() >= HEADER_LEN {
                bytes[..4].copy_from_slice(&MAGIC);
                let _ = load(&bytes);
            }
        }
    }
}

#[test]
fn mixed_constant_types_survive() {
    let consts = [
        m_int(-5),
        vec![b'N'],
        vec![b'T'],
        m_str(b"spam"),
        m_tuple(&[m_int(1), m_int(2)]),
    ];
    let pyc = container(&m_code("<module>", &[83], &consts, &[], &[]));

    let code = load(&pyc).unwrap();
    assert_eq!(code.consts[0], Value::Int(-5));
    assert_eq!(code.consts[1], Value::None);
    assert_eq!(code.consts[2], Value::Bool(true));
    assert_eq!(code.consts[3], Value::Str(b"spam".to_vec()));
    assert_eq!(
        code.consts[4],
        Value::Tuple(vec![Value::Int(1), Value::Int(2)])
    );
}
