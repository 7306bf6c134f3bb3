use std::sync::Arc;

use bagtype_cdr::{deserialize, deserialize_with, serialize};
use bagtype_core::{Mode, TypeSysError, Value};
use bagtype_store::{Preset, SchemaFormat, Typestore};

// ── helpers ──────────────────────────────────────────────────────────────────

fn store_with(text: &str, name: &str) -> Typestore {
    let mut store = Typestore::new(Preset::Ros2Defaults);
    store
        .register_text(SchemaFormat::Msg, text, Some(name))
        .expect("registration should succeed");
    store
}

fn msg(fields: &[(&str, Value)]) -> Value {
    Value::Message(
        fields
            .iter()
            .map(|(n, v)| (Arc::from(*n), v.clone()))
            .collect(),
    )
}

/// Little-endian encapsulation header + payload.
fn cdr_le(payload: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x00, 0x01, 0x00, 0x00];
    buf.extend_from_slice(payload);
    buf
}

// ── byte layout ──────────────────────────────────────────────────────────────

#[test]
fn serializes_uint32_and_string_with_terminator() {
    let store = store_with("uint32 a\nstring b", "p/msg/Foo");
    let value = msg(&[("a", Value::U32(1)), ("b", Value::string("hi"))]);
    let bytes = serialize(&store, "p/msg/Foo", &value).expect("serialize");
    assert_eq!(
        bytes,
        [0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 3, 0, 0, 0, 0x68, 0x69, 0x00]
    );
}

#[test]
fn empty_sequence_is_just_the_count() {
    let store = store_with("uint8[] xs", "p/msg/E");
    let bytes =
        serialize(&store, "p/msg/E", &msg(&[("xs", Value::bytes([]))])).expect("serialize");
    assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00, 0, 0, 0, 0]);
}

#[test]
fn empty_string_is_length_one_and_nul() {
    let store = store_with("string s", "p/msg/S");
    let bytes =
        serialize(&store, "p/msg/S", &msg(&[("s", Value::string(""))])).expect("serialize");
    assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 0]);
}

#[test]
fn empty_struct_occupies_zero_bytes() {
    let store = store_with("# intentionally empty", "p/msg/Empty");
    let bytes = serialize(&store, "p/msg/Empty", &msg(&[])).expect("serialize");
    assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00]);
    deserialize(&store, "p/msg/Empty", &bytes).expect("deserialize");
}

#[test]
fn aligns_f64_after_u8() {
    let store = store_with("uint8 flag\nfloat64 value", "p/msg/A");
    let value = msg(&[("flag", Value::U8(7)), ("value", Value::F64(1.25))]);
    let bytes = serialize(&store, "p/msg/A", &value).expect("serialize");

    let mut expected = cdr_le(&[7]);
    expected.extend_from_slice(&[0; 7]);
    expected.extend_from_slice(&1.25f64.to_le_bytes());
    assert_eq!(bytes, expected);

    let back = deserialize(&store, "p/msg/A", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

/// Alignment is relative to the payload start, not the buffer start.
#[test]
fn alignment_excludes_the_encapsulation_header() {
    let store = store_with("uint32 a", "p/msg/A");
    let bytes =
        serialize(&store, "p/msg/A", &msg(&[("a", Value::U32(9))])).expect("serialize");
    // No padding between the 4-byte header and the first word.
    assert_eq!(bytes.len(), 8);
}

#[test]
fn stamps_encode_as_sec_nanosec() {
    let store = store_with("time t", "p/msg/T");
    let value = msg(&[(
        "t",
        msg(&[("sec", Value::I32(1)), ("nanosec", Value::U32(2))]),
    )]);
    let bytes = serialize(&store, "p/msg/T", &value).expect("serialize");
    assert_eq!(bytes, cdr_le(&[1, 0, 0, 0, 2, 0, 0, 0]));

    let back = deserialize(&store, "p/msg/T", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

// ── endianness ───────────────────────────────────────────────────────────────

#[test]
fn reads_big_endian_when_the_header_says_so() {
    let store = store_with("uint32 a\nuint16 b", "p/msg/BE");
    let bytes = [0x00, 0x00, 0x00, 0x00, 0, 0, 0, 1, 0, 2];
    let value = deserialize(&store, "p/msg/BE", &bytes).expect("deserialize");
    assert_eq!(
        value,
        msg(&[("a", Value::U32(1)), ("b", Value::U16(2))])
    );
}

#[test]
fn rejects_unknown_representation_identifiers() {
    let store = store_with("uint8 x", "p/msg/A");
    let err = deserialize(&store, "p/msg/A", &[0x7F, 0x7F, 0, 0, 5]).expect_err("must fail");
    assert!(matches!(err, TypeSysError::ValueMismatch { .. }));
}

// ── round trips ──────────────────────────────────────────────────────────────

#[test]
fn round_trips_mixed_message() {
    let store = store_with(
        "bool ok\nint64 big\nstring label\nuint8[] data\nfloat32[2] pair\nuint16[<=3] shorts",
        "p/msg/M",
    );
    let value = msg(&[
        ("ok", Value::Bool(true)),
        ("big", Value::I64(-1234567890123)),
        ("label", Value::string("hello")),
        ("data", Value::bytes([1, 2, 3, 4, 5])),
        ("pair", Value::Array(vec![Value::F32(0.5), Value::F32(1.5)])),
        ("shorts", Value::List(vec![Value::U16(7), Value::U16(8)])),
    ]);
    let bytes = serialize(&store, "p/msg/M", &value).expect("serialize");
    let back = deserialize(&store, "p/msg/M", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

#[test]
fn round_trips_nested_messages() {
    let store = store_with(
        "std_msgs/Header header\nuint8 v",
        "p/msg/N",
    );
    let value = msg(&[
        (
            "header",
            msg(&[
                (
                    "stamp",
                    msg(&[("sec", Value::I32(10)), ("nanosec", Value::U32(20))]),
                ),
                ("frame_id", Value::string("base")),
            ]),
        ),
        ("v", Value::U8(1)),
    ]);
    let bytes = serialize(&store, "p/msg/N", &value).expect("serialize");
    let back = deserialize(&store, "p/msg/N", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

#[test]
fn round_trips_wstring() {
    let store = store_with("wstring w\nuint8 tail", "p/msg/W");
    let value = msg(&[("w", Value::string("héllo")), ("tail", Value::U8(9))]);
    let bytes = serialize(&store, "p/msg/W", &value).expect("serialize");
    let back = deserialize(&store, "p/msg/W", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

// ── failure modes ────────────────────────────────────────────────────────────

#[test]
fn string_without_terminator_is_an_encoding_error() {
    let store = store_with("string s", "p/msg/A");
    let bytes = cdr_le(&[2, 0, 0, 0, 0x61, 0x62]);
    assert!(matches!(
        deserialize(&store, "p/msg/A", &bytes),
        Err(TypeSysError::EncodingError { .. })
    ));
}

#[test]
fn bounded_string_overflow_is_caught_on_both_sides() {
    let store = store_with("string<=3 s", "p/msg/B");
    let long = msg(&[("s", Value::string("toolong"))]);
    assert!(matches!(
        serialize(&store, "p/msg/B", &long),
        Err(TypeSysError::BoundViolation { .. })
    ));

    let mut wire = cdr_le(&[8, 0, 0, 0]);
    wire.extend_from_slice(b"toolong\0");
    assert!(matches!(
        deserialize(&store, "p/msg/B", &wire),
        Err(TypeSysError::BoundViolation { .. })
    ));
}

#[test]
fn sequence_bound_overflow_is_caught() {
    let store = store_with("uint8[<=1] xs", "p/msg/B");
    let wire = cdr_le(&[2, 0, 0, 0, 1, 2]);
    assert!(matches!(
        deserialize(&store, "p/msg/B", &wire),
        Err(TypeSysError::BoundViolation { len: 2, bound: 1, .. })
    ));
}

#[test]
fn truncated_padding_is_reported() {
    let store = store_with("uint8 a\nuint32 b", "p/msg/A");
    let bytes = cdr_le(&[1, 0]);
    assert!(matches!(
        deserialize(&store, "p/msg/A", &bytes),
        Err(TypeSysError::Truncated { .. })
    ));
}

#[test]
fn strict_mode_flags_trailing_bytes() {
    let store = store_with("uint8 x", "p/msg/A");
    let bytes = cdr_le(&[5, 6, 7]);
    deserialize(&store, "p/msg/A", &bytes).expect("lenient deserialize");
    let err =
        deserialize_with(&store, "p/msg/A", &bytes, Mode::Strict).expect_err("strict must fail");
    assert!(matches!(err, TypeSysError::Overlong { remaining: 2, .. }));
}
