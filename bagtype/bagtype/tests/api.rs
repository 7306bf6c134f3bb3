//! End-to-end coverage of the public surface: text in, bytes out, and the
//! invariants collaborators rely on.

use std::sync::Arc;

use bagtype::{
    BaseType, Descriptor, DescriptorKind, Field, Mode, Preset, SchemaFormat, TypeName, TypeSpec,
    Typestore, Value, cdr, ros1,
};

fn msg(fields: &[(&str, Value)]) -> Value {
    Value::Message(
        fields
            .iter()
            .map(|(n, v)| (Arc::from(*n), v.clone()))
            .collect(),
    )
}

#[test]
fn round_trip_holds_in_both_codecs() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(
            SchemaFormat::Msg,
            "bool ok\nuint32 id\nstring label\nfloat64[] samples",
            Some("p/msg/Reading"),
        )
        .expect("registration");

    let value = msg(&[
        ("ok", Value::Bool(false)),
        ("id", Value::U32(42)),
        ("label", Value::string("volts")),
        (
            "samples",
            Value::List(vec![Value::F64(0.25), Value::F64(-3.5)]),
        ),
    ]);

    let wire1 = ros1::serialize(&store, "p/msg/Reading", &value).expect("wire1");
    assert_eq!(
        ros1::deserialize(&store, "p/msg/Reading", &wire1).expect("wire1 back"),
        value
    );
    assert_eq!(
        ros1::size(&store, "p/msg/Reading", &value).expect("size"),
        wire1.len()
    );

    let cdr_bytes = cdr::serialize(&store, "p/msg/Reading", &value).expect("cdr");
    assert_eq!(
        cdr::deserialize_with(&store, "p/msg/Reading", &cdr_bytes, Mode::Strict)
            .expect("cdr back, strict"),
        value
    );
}

#[test]
fn idl_and_msg_definitions_meet_in_one_store() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(
            SchemaFormat::Idl,
            "module p {\n  module msg {\n    struct Inner {\n      uint32 v;\n    };\n  };\n};\n",
            None,
        )
        .expect("idl registration");
    store
        .register_text(SchemaFormat::Msg, "p/Inner inner", Some("p/msg/Outer"))
        .expect("msg registration");

    let value = msg(&[("inner", msg(&[("v", Value::U32(5))]))]);
    let bytes = cdr::serialize(&store, "p/msg/Outer", &value).expect("serialize");
    assert_eq!(bytes, [0x00, 0x01, 0x00, 0x00, 5, 0, 0, 0]);
}

/// Keyword-colliding field names gain a suffixed alias while the descriptor
/// keeps the original spelling.
#[test]
fn keyword_field_names_are_aliased_deterministically() {
    let field = Field {
        name: "type".to_string(),
        ty: TypeSpec::Base(BaseType::U8),
        default: None,
    };
    assert_eq!(field.safe_name(), "type_");

    let plain = Field {
        name: "kind".to_string(),
        ty: TypeSpec::Base(BaseType::U8),
        default: None,
    };
    assert_eq!(plain.safe_name(), "kind");
}

#[test]
fn descriptors_register_directly() {
    let mut store = Typestore::new(Preset::Empty);
    let desc = Descriptor {
        name: TypeName::parse("p/msg/Raw").expect("name"),
        kind: DescriptorKind::Message,
        fields: vec![Field {
            name: "payload".to_string(),
            ty: TypeSpec::Sequence {
                elem: Box::new(TypeSpec::Base(BaseType::U8)),
                bound: None,
            },
            default: None,
        }],
        constants: Vec::new(),
    };
    store.register(desc.clone()).expect("register");
    store.register(desc).expect("identical re-registration");

    let value = msg(&[("payload", Value::bytes([1, 2]))]);
    let bytes = ros1::serialize(&store, "p/msg/Raw", &value).expect("serialize");
    assert_eq!(bytes, [2, 0, 0, 0, 1, 2]);
}

#[test]
fn two_stores_coexist_with_different_header_flavors() {
    let ros1_store = Typestore::new(Preset::Ros1Defaults);
    let ros2_store = Typestore::new(Preset::Ros2Defaults);
    let a = ros1_store.lookup("std_msgs/msg/Header").expect("ros1");
    let b = ros2_store.lookup("std_msgs/msg/Header").expect("ros2");
    assert_ne!(a.fields.len(), b.fields.len());
}
