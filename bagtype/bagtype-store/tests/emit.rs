use bagtype_store::{Preset, SchemaFormat, Typestore};

// ── helpers ──────────────────────────────────────────────────────────────────

fn sep() -> String {
    "=".repeat(80)
}

fn store_with(text: &str, name: &str) -> Typestore {
    let mut store = Typestore::new(Preset::Ros1Defaults);
    store
        .register_text(SchemaFormat::Msg, text, Some(name))
        .expect("registration should succeed");
    store
}

// ── emission ─────────────────────────────────────────────────────────────────

#[test]
fn emits_flat_message_verbatim() {
    let store = store_with("uint32 a\nstring b", "p/msg/Foo");
    assert_eq!(store.emit_msg("p/msg/Foo").expect("emit"), "uint32 a\nstring b\n");
}

#[test]
fn emits_dependencies_behind_separators() {
    let store = store_with("std_msgs/Header header\nuint8[] data", "p/msg/Scan");
    let expected = format!(
        "std_msgs/Header header\nuint8[] data\n{}\nMSG: std_msgs/Header\nuint32 seq\ntime stamp\nstring frame_id\n",
        sep()
    );
    assert_eq!(store.emit_msg("p/msg/Scan").expect("emit"), expected);
}

#[test]
fn emits_constants_then_fields() {
    let store = store_with("uint8 KIND=3\nstring NAME=plain text\nuint8 kind", "p/msg/C");
    assert_eq!(
        store.emit_msg("p/msg/C").expect("emit"),
        "uint8 KIND=3\nstring NAME=plain text\nuint8 kind\n"
    );
}

#[test]
fn emits_quoted_string_defaults() {
    let store = store_with("string s=\"with space\"\nuint8 x=5", "p/msg/D");
    assert_eq!(
        store.emit_msg("p/msg/D").expect("emit"),
        "string s=\"with space\"\nuint8 x=5\n"
    );
}

#[test]
fn emits_bounded_and_array_types() {
    let store = store_with("string<=10 s\nfloat64[9] mat\nint32[<=4] few", "p/msg/B");
    assert_eq!(
        store.emit_msg("p/msg/B").expect("emit"),
        "string<=10 s\nfloat64[9] mat\nint32[<=4] few\n"
    );
}

/// Emitted text re-registers to identical descriptors and hashes.
#[test]
fn emission_round_trips_through_the_parser() {
    let store = store_with("std_msgs/Header header\nuint8 KIND=3\nuint8[] data", "p/msg/Scan");
    let emitted = store.emit_msg("p/msg/Scan").expect("emit");

    let mut rehydrated = Typestore::new(Preset::Empty);
    rehydrated
        .register_text(SchemaFormat::Msg, &emitted, Some("p/msg/Scan"))
        .expect("re-registration");
    assert_eq!(
        rehydrated.lookup("p/msg/Scan").expect("descriptor"),
        store.lookup("p/msg/Scan").expect("descriptor")
    );
    assert_eq!(
        rehydrated.md5("p/msg/Scan").expect("md5"),
        store.md5("p/msg/Scan").expect("md5")
    );
    assert_eq!(
        rehydrated.emit_msg("p/msg/Scan").expect("emit"),
        emitted
    );
}
