use std::sync::Arc;

use bagtype_core::{Mode, TypeSysError, Value};
use bagtype_ros1::{deserialize, deserialize_with, fixed_size, serialize, size};
use bagtype_store::{Preset, SchemaFormat, Typestore};

// ── helpers ──────────────────────────────────────────────────────────────────

fn store_with(text: &str, name: &str) -> Typestore {
    let mut store = Typestore::new(Preset::Ros1Defaults);
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

// ── byte layout ──────────────────────────────────────────────────────────────

#[test]
fn serializes_uint32_and_string_packed() {
    let store = store_with("uint32 a\nstring b", "p/msg/Foo");
    let value = msg(&[("a", Value::U32(1)), ("b", Value::string("hi"))]);
    let bytes = serialize(&store, "p/msg/Foo", &value).expect("serialize");
    assert_eq!(bytes, [0x01, 0, 0, 0, 0x02, 0, 0, 0, 0x68, 0x69]);
}

#[test]
fn empty_sequence_is_a_zero_count() {
    let store = store_with("uint8[] xs", "p/msg/E");
    let value = msg(&[("xs", Value::bytes([]))]);
    let bytes = serialize(&store, "p/msg/E", &value).expect("serialize");
    assert_eq!(bytes, [0, 0, 0, 0]);
}

#[test]
fn fixed_array_has_no_count_prefix() {
    let store = store_with("uint16[3] xs", "p/msg/A");
    let value = msg(&[(
        "xs",
        Value::Array(vec![Value::U16(1), Value::U16(2), Value::U16(3)]),
    )]);
    let bytes = serialize(&store, "p/msg/A", &value).expect("serialize");
    assert_eq!(bytes, [1, 0, 2, 0, 3, 0]);
}

#[test]
fn time_is_two_unsigned_words() {
    let store = store_with("time stamp", "p/msg/T");
    let value = msg(&[(
        "stamp",
        msg(&[("sec", Value::U32(1)), ("nsec", Value::U32(2))]),
    )]);
    let bytes = serialize(&store, "p/msg/T", &value).expect("serialize");
    assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0]);
}

/// The `nanosec` spelling is accepted on the way in.
#[test]
fn stamp_spelling_is_bridged() {
    let store = store_with("time stamp", "p/msg/T");
    let value = msg(&[(
        "stamp",
        msg(&[("sec", Value::I32(1)), ("nanosec", Value::U32(2))]),
    )]);
    let bytes = serialize(&store, "p/msg/T", &value).expect("serialize");
    assert_eq!(bytes, [1, 0, 0, 0, 2, 0, 0, 0]);
}

#[test]
fn nested_messages_inline() {
    let store = store_with("std_msgs/Header header\nuint8 v", "p/msg/N");
    let value = msg(&[
        (
            "header",
            msg(&[
                ("seq", Value::U32(7)),
                (
                    "stamp",
                    msg(&[("sec", Value::U32(1)), ("nsec", Value::U32(2))]),
                ),
                ("frame_id", Value::string("m")),
            ]),
        ),
        ("v", Value::U8(9)),
    ]);
    let bytes = serialize(&store, "p/msg/N", &value).expect("serialize");
    assert_eq!(
        bytes,
        [7, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 0x6D, 9]
    );
}

// ── round trips ──────────────────────────────────────────────────────────────

#[test]
fn round_trips_mixed_message() {
    let store = store_with(
        "bool ok\nint16 a\nfloat64 b\nstring label\nuint8[] data\nint32[2] pair",
        "p/msg/M",
    );
    let value = msg(&[
        ("ok", Value::Bool(true)),
        ("a", Value::I16(-5)),
        ("b", Value::F64(1.25)),
        ("label", Value::string("hello")),
        ("data", Value::bytes([1, 2, 3])),
        ("pair", Value::Array(vec![Value::I32(-1), Value::I32(1)])),
    ]);
    let bytes = serialize(&store, "p/msg/M", &value).expect("serialize");
    let back = deserialize(&store, "p/msg/M", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

#[test]
fn round_trips_nested_and_wstring() {
    let store = store_with("wstring w\ntime t\nduration d", "p/msg/W");
    let value = msg(&[
        ("w", Value::string("héllo")),
        ("t", msg(&[("sec", Value::U32(3)), ("nsec", Value::U32(4))])),
        ("d", msg(&[("sec", Value::I32(-1)), ("nsec", Value::I32(5))])),
    ]);
    let bytes = serialize(&store, "p/msg/W", &value).expect("serialize");
    let back = deserialize(&store, "p/msg/W", &bytes).expect("deserialize");
    assert_eq!(back, value);
}

#[test]
fn size_matches_serialized_length() {
    let store = store_with(
        "string label\nuint8[] data\nfloat32 f\nstd_msgs/Header header",
        "p/msg/S",
    );
    let value = msg(&[
        ("label", Value::string("abc")),
        ("data", Value::bytes([9; 17])),
        ("f", Value::F32(0.5)),
        (
            "header",
            msg(&[
                ("seq", Value::U32(1)),
                (
                    "stamp",
                    msg(&[("sec", Value::U32(0)), ("nsec", Value::U32(0))]),
                ),
                ("frame_id", Value::string("map")),
            ]),
        ),
    ]);
    let bytes = serialize(&store, "p/msg/S", &value).expect("serialize");
    assert_eq!(size(&store, "p/msg/S", &value).expect("size"), bytes.len());
}

// ── defaults ─────────────────────────────────────────────────────────────────

#[test]
fn missing_field_with_default_serializes_the_default() {
    let store = store_with("uint8 x=7\nstring s=\"hi\"", "p/msg/D");
    let bytes = serialize(&store, "p/msg/D", &msg(&[])).expect("serialize");
    assert_eq!(bytes, [7, 2, 0, 0, 0, 0x68, 0x69]);
}

#[test]
fn missing_field_without_default_is_an_error() {
    let store = store_with("uint8 x", "p/msg/D");
    let err = serialize(&store, "p/msg/D", &msg(&[])).expect_err("must fail");
    assert!(matches!(err, TypeSysError::MissingValue { .. }));
}

// ── failure modes ────────────────────────────────────────────────────────────

#[test]
fn truncated_input_reports_offset() {
    let store = store_with("uint32 a", "p/msg/A");
    let err = deserialize(&store, "p/msg/A", &[1, 2]).expect_err("must fail");
    assert!(matches!(err, TypeSysError::Truncated { offset: 0, .. }));
}

#[test]
fn trailing_bytes_are_lenient_by_default_and_strict_on_request() {
    let store = store_with("uint8 x", "p/msg/A");
    let bytes = [5, 0xFF];
    deserialize(&store, "p/msg/A", &bytes).expect("lenient deserialize");
    let err =
        deserialize_with(&store, "p/msg/A", &bytes, Mode::Strict).expect_err("strict must fail");
    assert!(matches!(err, TypeSysError::Overlong { remaining: 1, .. }));
}

#[test]
fn sequence_bound_is_enforced_both_ways() {
    let store = store_with("uint8[<=2] xs", "p/msg/B");
    let long = msg(&[("xs", Value::bytes([1, 2, 3]))]);
    assert!(matches!(
        serialize(&store, "p/msg/B", &long),
        Err(TypeSysError::BoundViolation { len: 3, bound: 2, .. })
    ));
    let wire = [3, 0, 0, 0, 1, 2, 3];
    assert!(matches!(
        deserialize(&store, "p/msg/B", &wire),
        Err(TypeSysError::BoundViolation { len: 3, bound: 2, .. })
    ));
}

#[test]
fn invalid_utf8_string_is_an_encoding_error() {
    let store = store_with("string s", "p/msg/A");
    let wire = [2, 0, 0, 0, 0xFF, 0xFE];
    assert!(matches!(
        deserialize(&store, "p/msg/A", &wire),
        Err(TypeSysError::EncodingError { .. })
    ));
}

// ── fixed size ───────────────────────────────────────────────────────────────

#[test]
fn fixed_size_covers_closed_layouts_only() {
    let fixed = store_with("uint32 a\nfloat64 b\nuint8[4] pad", "p/msg/F");
    assert_eq!(fixed_size(&fixed, "p/msg/F").expect("fixed"), Some(16));

    let open = store_with("uint32 a\nstring s", "p/msg/O");
    assert_eq!(fixed_size(&open, "p/msg/O").expect("fixed"), None);
}
