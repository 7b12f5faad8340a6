use crate::component::Connection;
use crate::error::ConfigError;
use crate::properties::{PropertyKind, PropertyValue};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One `(name, type, value)` configuration triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    pub value: Value,
}

impl PropertySpec {
    /// Decode the JSON value under the declared kind.
    pub fn to_value(&self) -> Result<PropertyValue, ConfigError> {
        let bad = || ConfigError::BadValue {
            name: self.name.clone(),
            kind: self.kind,
        };
        let value = match self.kind {
            PropertyKind::Bool => PropertyValue::Bool(self.value.as_bool().ok_or_else(bad)?),
            PropertyKind::I32 => PropertyValue::I32(
                self.value
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(bad)?,
            ),
            PropertyKind::U32 => PropertyValue::U32(
                self.value
                    .as_u64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(bad)?,
            ),
            PropertyKind::I64 => PropertyValue::I64(self.value.as_i64().ok_or_else(bad)?),
            PropertyKind::U64 => PropertyValue::U64(self.value.as_u64().ok_or_else(bad)?),
            PropertyKind::F32 => PropertyValue::F32(self.value.as_f64().ok_or_else(bad)? as f32),
            PropertyKind::F64 => PropertyValue::F64(self.value.as_f64().ok_or_else(bad)?),
            PropertyKind::Str => {
                PropertyValue::Str(self.value.as_str().ok_or_else(bad)?.to_string())
            }
        };
        Ok(value)
    }
}

/// One component entry in the wiring description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    /// Factory name of the implementation to instantiate.
    pub name: String,
    /// Optional override for the wiring id; defaults to the name.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

/// Declarative description of a whole application: components to
/// instantiate, properties to apply and edges to wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    /// Application-wide properties, offered to every component.
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    #[serde(default)]
    pub components: Vec<ComponentConfig>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Ok(Self::from_json(&text)?)
    }
}
