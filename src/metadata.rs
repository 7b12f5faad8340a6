//! Descriptors for sample-stream payloads, carried alongside buffers by
//! convention between signal-processing components.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    I8,
    U8,
    I16,
    U16,
    #[default]
    I32,
    U32,
    F32,
    F64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

impl Default for Endianness {
    fn default() -> Self {
        Self::native()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFormat {
    pub is_complex: bool,
    pub data_type: DataType,
    pub endianness: Endianness,
}

/// Stream-level description: sample format, rate and free-form tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub format: DataFormat,
    pub sample_rate: f32,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_round_trip() {
        let mut meta = Metadata {
            format: DataFormat {
                is_complex: true,
                data_type: DataType::F32,
                endianness: Endianness::Little,
            },
            sample_rate: 2_048_000.0,
            tags: BTreeMap::new(),
        };
        meta.tags.insert("antenna".to_string(), "rx0".to_string());

        let text = serde_json::to_string(&meta).unwrap();
        let back: Metadata = serde_json::from_str(&text).unwrap();
        assert_eq!(back, meta);
    }
}
