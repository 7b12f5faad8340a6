use crate::error::PropertyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Type descriptor of a property, using the names understood by the
/// declarative configuration format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "uint32")]
    U32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "uint64")]
    U64,
    #[serde(rename = "float")]
    F32,
    #[serde(rename = "double")]
    F64,
    #[serde(rename = "string")]
    Str,
}

impl PropertyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::Bool => "bool",
            PropertyKind::I32 => "int32",
            PropertyKind::U32 => "uint32",
            PropertyKind::I64 => "int64",
            PropertyKind::U64 => "uint64",
            PropertyKind::F32 => "float",
            PropertyKind::F64 => "double",
            PropertyKind::Str => "string",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value: closed union over the supported primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::I32(_) => PropertyKind::I32,
            PropertyValue::U32(_) => PropertyKind::U32,
            PropertyValue::I64(_) => PropertyKind::I64,
            PropertyValue::U64(_) => PropertyKind::U64,
            PropertyValue::F32(_) => PropertyKind::F32,
            PropertyValue::F64(_) => PropertyKind::F64,
            PropertyValue::Str(_) => PropertyKind::Str,
        }
    }
}

/// Rust-side view of one supported primitive.
pub trait PropertyPrimitive: Sized {
    const KIND: PropertyKind;

    fn into_value(self) -> PropertyValue;
    fn from_value(value: &PropertyValue) -> Option<Self>;
}

macro_rules! impl_property_primitive {
    ($ty:ty, $kind:ident) => {
        impl PropertyPrimitive for $ty {
            const KIND: PropertyKind = PropertyKind::$kind;

            fn into_value(self) -> PropertyValue {
                PropertyValue::$kind(self)
            }

            fn from_value(value: &PropertyValue) -> Option<Self> {
                match value {
                    PropertyValue::$kind(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_property_primitive!(bool, Bool);
impl_property_primitive!(i32, I32);
impl_property_primitive!(u32, U32);
impl_property_primitive!(i64, I64);
impl_property_primitive!(u64, U64);
impl_property_primitive!(f32, F32);
impl_property_primitive!(f64, F64);
impl_property_primitive!(String, Str);

/// Typed dynamic property store.
///
/// Names and kinds are declared up front by the owning component;
/// configuration then writes through [`set`](PropertySet::set). A write
/// against an unknown name or a different kind is a silent no-op (the
/// mismatch is a caller error in the configuration, not a runtime
/// fault), while [`get`](PropertySet::get) fails loudly.
#[derive(Debug, Default, Clone)]
pub struct PropertySet {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property with its default value; the default fixes the
    /// kind. The first declaration of a name wins.
    pub fn register(&mut self, name: impl Into<String>, default: impl PropertyPrimitive) {
        self.entries
            .entry(name.into())
            .or_insert(default.into_value());
    }

    /// Checked, kind-matched write. Unknown names and kind mismatches
    /// are ignored.
    pub fn set_value(&mut self, name: &str, value: PropertyValue) {
        match self.entries.get_mut(name) {
            Some(slot) if slot.kind() == value.kind() => *slot = value,
            Some(slot) => {
                tracing::debug!(
                    name,
                    stored = %slot.kind(),
                    offered = %value.kind(),
                    "property write ignored, kind mismatch"
                );
            }
            None => {
                tracing::debug!(name, "property write ignored, unknown name");
            }
        }
    }

    pub fn set<P: PropertyPrimitive>(&mut self, name: &str, value: P) {
        self.set_value(name, value.into_value());
    }

    /// Checked read.
    pub fn get<P: PropertyPrimitive>(&self, name: &str) -> Result<P, PropertyError> {
        let value = self.entries.get(name).ok_or_else(|| PropertyError::Unknown {
            name: name.to_string(),
        })?;
        P::from_value(value).ok_or_else(|| PropertyError::KindMismatch {
            name: name.to_string(),
            stored: value.kind(),
            requested: P::KIND,
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Declared names with their kinds, values withheld.
    pub fn iter(&self) -> impl Iterator<Item = (&str, PropertyKind)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v.kind()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> PropertySet {
        let mut props = PropertySet::new();
        props.register("enabled", false);
        props.register("offset", 0i32);
        props.register("count", 0u32);
        props.register("total", 0i64);
        props.register("bytes", 0u64);
        props.register("gain", 0.0f32);
        props.register("rate", 0.0f64);
        props.register("label", String::new());
        props
    }

    #[test]
    fn round_trip_every_primitive() {
        let mut props = populated();
        props.set("enabled", true);
        props.set("offset", -3i32);
        props.set("count", 7u32);
        props.set("total", -9_000_000_000i64);
        props.set("bytes", 12_000_000_000u64);
        props.set("gain", 1.5f32);
        props.set("rate", 44_100.5f64);
        props.set("label", "rx0".to_string());

        assert!(props.get::<bool>("enabled").unwrap());
        assert_eq!(props.get::<i32>("offset").unwrap(), -3);
        assert_eq!(props.get::<u32>("count").unwrap(), 7);
        assert_eq!(props.get::<i64>("total").unwrap(), -9_000_000_000);
        assert_eq!(props.get::<u64>("bytes").unwrap(), 12_000_000_000);
        assert_eq!(props.get::<f32>("gain").unwrap(), 1.5);
        assert_eq!(props.get::<f64>("rate").unwrap(), 44_100.5);
        assert_eq!(props.get::<String>("label").unwrap(), "rx0");
    }

    #[test]
    fn get_unknown_name_fails() {
        let props = populated();
        assert!(matches!(
            props.get::<bool>("missing"),
            Err(PropertyError::Unknown { .. })
        ));
    }

    #[test]
    fn get_with_wrong_kind_fails() {
        let props = populated();
        let err = props.get::<u64>("offset").unwrap_err();
        assert_eq!(
            err,
            PropertyError::KindMismatch {
                name: "offset".to_string(),
                stored: PropertyKind::I32,
                requested: PropertyKind::U64,
            }
        );
    }

    #[test]
    fn mismatched_set_is_silent_noop() {
        let mut props = populated();
        props.set("offset", "oops".to_string());
        props.set("unknown", 1i32);
        assert_eq!(props.get::<i32>("offset").unwrap(), 0);
        assert!(!props.contains("unknown"));
    }

    #[test]
    fn first_registration_fixes_kind() {
        let mut props = PropertySet::new();
        props.register("x", 1u32);
        props.register("x", "other".to_string());
        assert_eq!(props.get::<u32>("x").unwrap(), 1);
    }

    #[test]
    fn iter_exposes_names_and_kinds_only() {
        let props = populated();
        let kinds: Vec<_> = props.iter().collect();
        assert_eq!(kinds.len(), 8);
        assert!(kinds.contains(&("rate", PropertyKind::F64)));
    }
}
