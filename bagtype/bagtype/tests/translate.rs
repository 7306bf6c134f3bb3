use std::sync::Arc;

use bagtype::{Preset, SchemaFormat, TypeSysError, Typestore, Value, cdr, cdr_to_ros1, ros1, ros1_to_cdr};

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

// ── Header bridging ──────────────────────────────────────────────────────────

/// wire1 Header carries `seq`; the CDR rendition drops it.
#[test]
fn header_seq_is_dropped_towards_cdr() {
    let store = Typestore::new(Preset::Ros1Defaults);
    let wire1 = [
        0x07, 0, 0, 0, // seq
        0x01, 0, 0, 0, // stamp.sec
        0x02, 0, 0, 0, // stamp.nsec
        0x01, 0, 0, 0, // frame_id length
        0x6D, // "m"
    ];
    let out = ros1_to_cdr(&store, "std_msgs/msg/Header", &wire1).expect("translate");
    assert_eq!(
        out,
        [
            0x00, 0x01, 0x00, 0x00, // encapsulation
            0x01, 0, 0, 0, // stamp.sec
            0x02, 0, 0, 0, // stamp.nanosec
            0x02, 0, 0, 0, // frame_id length incl. terminator
            0x6D, 0x00,
        ]
    );
}

/// Coming back, `seq` is synthesized as zero.
#[test]
fn header_seq_is_synthesized_towards_wire1() {
    let store = Typestore::new(Preset::Ros1Defaults);
    let cdr_bytes = [
        0x00, 0x01, 0x00, 0x00, 0x01, 0, 0, 0, 0x02, 0, 0, 0, 0x02, 0, 0, 0, 0x6D, 0x00,
    ];
    let out = cdr_to_ros1(&store, "std_msgs/msg/Header", &cdr_bytes).expect("translate");
    assert_eq!(
        out,
        [0, 0, 0, 0, 0x01, 0, 0, 0, 0x02, 0, 0, 0, 0x01, 0, 0, 0, 0x6D]
    );
}

// ── bijectivity ──────────────────────────────────────────────────────────────

#[test]
fn non_header_types_translate_bijectively() {
    let store = store_with(
        "uint8 a\nfloat64 b\nstring s\nuint16[] xs\nint32[2] pair",
        "p/msg/M",
    );
    let value = msg(&[
        ("a", Value::U8(3)),
        ("b", Value::F64(0.125)),
        ("s", Value::string("frame")),
        ("xs", Value::List(vec![Value::U16(1), Value::U16(2)])),
        ("pair", Value::Array(vec![Value::I32(-9), Value::I32(9)])),
    ]);

    let wire1 = ros1::serialize(&store, "p/msg/M", &value).expect("wire1 serialize");
    let to_cdr = ros1_to_cdr(&store, "p/msg/M", &wire1).expect("to cdr");
    assert_eq!(
        to_cdr,
        cdr::serialize(&store, "p/msg/M", &value).expect("cdr serialize")
    );
    let back = cdr_to_ros1(&store, "p/msg/M", &to_cdr).expect("back to wire1");
    assert_eq!(back, wire1);
}

#[test]
fn nested_messages_translate_through_both_wires() {
    let mut store = store_with("p/Inner inner\nuint8 tail", "p/msg/Outer");
    store
        .register_text(
            SchemaFormat::Msg,
            "uint8 small\nfloat64 wide\nstring name",
            Some("p/msg/Inner"),
        )
        .expect("inner registration");

    let value = msg(&[
        (
            "inner",
            msg(&[
                ("small", Value::U8(1)),
                ("wide", Value::F64(2.5)),
                ("name", Value::string("x")),
            ]),
        ),
        ("tail", Value::U8(0xEE)),
    ]);

    let wire1 = ros1::serialize(&store, "p/msg/Outer", &value).expect("wire1 serialize");
    let to_cdr = ros1_to_cdr(&store, "p/msg/Outer", &wire1).expect("to cdr");
    let decoded = cdr::deserialize(&store, "p/msg/Outer", &to_cdr).expect("cdr deserialize");
    assert_eq!(decoded, value);
    assert_eq!(
        cdr_to_ros1(&store, "p/msg/Outer", &to_cdr).expect("round trip"),
        wire1
    );
}

#[test]
fn time_fields_translate_without_renaming_bytes() {
    let store = store_with("time stamp\nuint8 v", "p/msg/T");
    let wire1 = [1, 0, 0, 0, 2, 0, 0, 0, 9];
    let to_cdr = ros1_to_cdr(&store, "p/msg/T", &wire1).expect("to cdr");
    assert_eq!(to_cdr, [0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 2, 0, 0, 0, 9]);
    assert_eq!(
        cdr_to_ros1(&store, "p/msg/T", &to_cdr).expect("back"),
        wire1
    );
}

#[test]
fn empty_string_translates_in_both_directions() {
    let store = store_with("string s\nuint8 v", "p/msg/E");
    let wire1 = [0, 0, 0, 0, 5];
    let to_cdr = ros1_to_cdr(&store, "p/msg/E", &wire1).expect("to cdr");
    assert_eq!(to_cdr, [0x00, 0x01, 0x00, 0x00, 1, 0, 0, 0, 0, 5]);
    assert_eq!(
        cdr_to_ros1(&store, "p/msg/E", &to_cdr).expect("back"),
        wire1
    );
}

// ── failure context ──────────────────────────────────────────────────────────

#[test]
fn translation_errors_carry_direction_and_field() {
    let store = store_with("uint32 a\nstring s", "p/msg/M");
    // `a` present, string length runs past the end.
    let wire1 = [1, 0, 0, 0, 9, 0, 0, 0, 0x61];
    let err = ros1_to_cdr(&store, "p/msg/M", &wire1).expect_err("must fail");
    let TypeSysError::Truncated { path, .. } = err else {
        panic!("expected truncation");
    };
    assert!(path.contains("wire1 to cdr"));
    assert!(path.contains(".s"));
}
