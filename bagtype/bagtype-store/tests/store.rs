use bagtype_core::{BaseType, Descriptor, DescriptorKind, Field, TypeName, TypeSpec, TypeSysError};
use bagtype_store::{Preset, SchemaFormat, Typestore};

// ── helpers ──────────────────────────────────────────────────────────────────

fn descriptor(name: &str, fields: Vec<(&str, TypeSpec)>) -> Descriptor {
    Descriptor {
        name: TypeName::parse(name).expect("test type name"),
        kind: DescriptorKind::Message,
        fields: fields
            .into_iter()
            .map(|(n, ty)| Field {
                name: n.to_string(),
                ty,
                default: None,
            })
            .collect(),
        constants: Vec::new(),
    }
}

fn named(name: &str) -> TypeSpec {
    TypeSpec::Named(TypeName::parse(name).expect("test type name"))
}

// ── registration ─────────────────────────────────────────────────────────────

#[test]
fn register_text_is_idempotent() {
    let mut store = Typestore::new(Preset::Empty);
    let text = "uint32 a\nstring b";
    let first = store
        .register_text(SchemaFormat::Msg, text, Some("p/msg/Foo"))
        .expect("first registration");
    let second = store
        .register_text(SchemaFormat::Msg, text, Some("p/msg/Foo"))
        .expect("second registration");
    assert_eq!(first, second);
    assert_eq!(store.names().count(), 1);
}

/// Field order is part of a type's identity.
#[test]
fn reordered_fields_conflict() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "int32 x\nint32 y", Some("p/msg/A"))
        .expect("first registration");
    let err = store
        .register_text(SchemaFormat::Msg, "int32 y\nint32 x", Some("p/msg/A"))
        .expect_err("reordered registration must fail");
    assert!(matches!(err, TypeSysError::TypeConflict { name } if name == "p/msg/A"));
}

#[test]
fn comment_and_whitespace_edits_do_not_conflict() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "int32 x\nint32 y", Some("p/msg/A"))
        .expect("first registration");
    store
        .register_text(
            SchemaFormat::Msg,
            "# comment\nint32   x\n\nint32 y  # more\n",
            Some("p/msg/A"),
        )
        .expect("equivalent registration is a no-op");
}

#[test]
fn failed_registration_leaves_store_unchanged() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "int32 x", Some("p/msg/A"))
        .expect("seed registration");
    let text = format!(
        "p/A a\n{}\nMSG: p/A\nint32 y\n",
        "=".repeat(80)
    );
    store
        .register_text(SchemaFormat::Msg, &text, Some("p/msg/Outer"))
        .expect_err("conflicting dependency must fail");
    assert!(store.get("p/msg/Outer").is_none());
}

#[test]
fn lookup_canonicalizes_two_segment_names() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "int32 x", Some("p/msg/A"))
        .expect("registration");
    assert!(store.lookup("p/A").is_ok());
    assert!(matches!(
        store.lookup("q/msg/Missing"),
        Err(TypeSysError::UnknownType { .. })
    ));
}

#[test]
fn presets_seed_the_expected_headers() {
    let ros1 = Typestore::new(Preset::Ros1Defaults);
    let header = ros1.lookup("std_msgs/msg/Header").expect("ros1 header");
    assert_eq!(header.fields[0].name, "seq");

    let ros2 = Typestore::new(Preset::Ros2Defaults);
    let header = ros2.lookup("std_msgs/msg/Header").expect("ros2 header");
    assert_eq!(header.fields[0].name, "stamp");
    assert!(ros2.lookup("builtin_interfaces/msg/Time").is_ok());
}

#[test]
fn register_text_accepts_idl() {
    let mut store = Typestore::new(Preset::Empty);
    let names = store
        .register_text(
            SchemaFormat::Idl,
            "module ex {\n  module msg {\n    struct A {\n      uint32 x;\n    };\n  };\n};\n",
            None,
        )
        .expect("idl registration");
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].as_str(), "ex/msg/A");
}

// ── closure ──────────────────────────────────────────────────────────────────

#[test]
fn closure_is_postorder_with_root_last() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register(descriptor("p/msg/Leaf", vec![("v", TypeSpec::Base(BaseType::U8))]))
        .expect("leaf");
    store
        .register(descriptor("p/msg/Mid", vec![("leaf", named("p/msg/Leaf"))]))
        .expect("mid");
    store
        .register(descriptor(
            "p/msg/Root",
            vec![("mid", named("p/msg/Mid")), ("leaf", named("p/msg/Leaf"))],
        ))
        .expect("root");

    let order: Vec<&str> = store
        .closure("p/msg/Root")
        .expect("closure")
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(order, vec!["p/msg/Leaf", "p/msg/Mid", "p/msg/Root"]);
}

#[test]
fn closure_rejects_cycles() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register(descriptor("p/msg/A", vec![("b", named("p/msg/B"))]))
        .expect("a");
    store
        .register(descriptor("p/msg/B", vec![("a", named("p/msg/A"))]))
        .expect("b");
    assert!(matches!(
        store.closure("p/msg/A"),
        Err(TypeSysError::CyclicType { .. })
    ));
}

#[test]
fn closure_reports_unresolved_references() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register(descriptor("p/msg/A", vec![("m", named("p/msg/Missing"))]))
        .expect("a");
    assert!(matches!(
        store.closure("p/msg/A"),
        Err(TypeSysError::UnknownType { name }) if name == "p/msg/Missing"
    ));
}

// ── normalization ────────────────────────────────────────────────────────────

#[test]
fn relative_references_resolve_to_the_defining_package() {
    let mut store = Typestore::new(Preset::Empty);
    let text = format!(
        "Inner nested\nHeader header\n{sep}\nMSG: p/Inner\nint32 v\n{sep}\nMSG: std_msgs/Header\nuint32 seq\ntime stamp\nstring frame_id\n",
        sep = "=".repeat(80)
    );
    store
        .register_text(SchemaFormat::Msg, &text, Some("p/msg/Outer"))
        .expect("registration");
    let outer = store.lookup("p/msg/Outer").expect("outer");
    assert_eq!(outer.fields[0].ty, named("p/msg/Inner"));
    assert_eq!(outer.fields[1].ty, named("std_msgs/msg/Header"));
}

/// A bare name that matches nothing in its own package still resolves when
/// exactly one known type ends with it.
#[test]
fn unique_suffix_resolves_across_packages() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "float64 x\nfloat64 y", Some("geometry_msgs/msg/Point"))
        .expect("point registration");
    store
        .register_text(SchemaFormat::Msg, "Point p", Some("nav/msg/Path"))
        .expect("path registration");
    let path = store.lookup("nav/msg/Path").expect("path");
    assert_eq!(path.fields[0].ty, named("geometry_msgs/msg/Point"));
}

/// Two candidates make the suffix ambiguous; the reference keeps its
/// package-relative spelling instead of picking one.
#[test]
fn ambiguous_suffix_falls_back_to_the_defining_package() {
    let mut store = Typestore::new(Preset::Empty);
    store
        .register_text(SchemaFormat::Msg, "float64 x", Some("a/msg/Point"))
        .expect("first point");
    store
        .register_text(SchemaFormat::Msg, "float32 x", Some("b/msg/Point"))
        .expect("second point");
    store
        .register_text(SchemaFormat::Msg, "Point p", Some("c/msg/Holder"))
        .expect("holder registration");
    let holder = store.lookup("c/msg/Holder").expect("holder");
    assert_eq!(holder.fields[0].ty, named("c/msg/Point"));
}

#[test]
fn default_overflow_is_bad_literal() {
    let mut store = Typestore::new(Preset::Empty);
    let err = store
        .register_text(SchemaFormat::Msg, "uint8 x=256", Some("p/msg/A"))
        .expect_err("overflow must fail");
    assert!(matches!(err, TypeSysError::BadLiteral { .. }));
}

#[test]
fn constant_overflow_is_bad_literal() {
    let mut store = Typestore::new(Preset::Empty);
    let err = store
        .register_text(SchemaFormat::Msg, "int8 BIG=1000", Some("p/msg/A"))
        .expect_err("overflow must fail");
    assert!(matches!(err, TypeSysError::BadLiteral { .. }));
}
