//! Built-in default type catalogs.
//!
//! A store may be seeded with the handful of well-known types that appear
//! in virtually every recorded stream but are rarely bundled with other
//! packages' definitions. Catalogs are explicit constructors on a freshly
//! created store, never process-wide state.
//!
//! The wire1 and CDR worlds disagree about `std_msgs/msg/Header`: the wire1
//! shape carries a leading `seq` counter, the CDR shape does not. The two
//! presets seed the matching flavor.

use bagtype_core::{BaseType, Descriptor, DescriptorKind, Field, TypeName, TypeSpec};

/// Initial content of a [`crate::Typestore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    Empty,
    /// wire1-flavored catalog: `Header` with `seq`, `time`/`duration`
    /// primitives.
    Ros1Defaults,
    /// CDR-flavored catalog: `builtin_interfaces` stamps, `Header` without
    /// `seq`.
    Ros2Defaults,
}

pub(crate) fn catalog(preset: Preset) -> Vec<Descriptor> {
    match preset {
        Preset::Empty => Vec::new(),
        Preset::Ros1Defaults => vec![header_ros1()],
        Preset::Ros2Defaults => vec![time_ros2(), duration_ros2(), header_ros2()],
    }
}

fn name(s: &str) -> TypeName {
    TypeName::parse(s).expect("builtin type name is canonical")
}

fn field(field_name: &str, ty: TypeSpec) -> Field {
    Field {
        name: field_name.to_string(),
        ty,
        default: None,
    }
}

fn message(type_name: &str, fields: Vec<Field>) -> Descriptor {
    Descriptor {
        name: name(type_name),
        kind: DescriptorKind::Message,
        fields,
        constants: Vec::new(),
    }
}

fn header_ros1() -> Descriptor {
    message(
        "std_msgs/msg/Header",
        vec![
            field("seq", TypeSpec::Base(BaseType::U32)),
            field("stamp", TypeSpec::Base(BaseType::Time)),
            field("frame_id", TypeSpec::Base(BaseType::String(None))),
        ],
    )
}

fn header_ros2() -> Descriptor {
    message(
        "std_msgs/msg/Header",
        vec![
            field("stamp", TypeSpec::Named(name("builtin_interfaces/msg/Time"))),
            field("frame_id", TypeSpec::Base(BaseType::String(None))),
        ],
    )
}

fn time_ros2() -> Descriptor {
    message(
        "builtin_interfaces/msg/Time",
        vec![
            field("sec", TypeSpec::Base(BaseType::I32)),
            field("nanosec", TypeSpec::Base(BaseType::U32)),
        ],
    )
}

fn duration_ros2() -> Descriptor {
    message(
        "builtin_interfaces/msg/Duration",
        vec![
            field("sec", TypeSpec::Base(BaseType::I32)),
            field("nanosec", TypeSpec::Base(BaseType::U32)),
        ],
    )
}
