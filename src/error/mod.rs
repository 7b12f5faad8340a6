use crate::properties::PropertyKind;
use std::{error::Error, fmt};

/// Failure while applying a declarative wiring description.
///
/// `Component::connect` itself reports failure as a plain `false`; this
/// type carries enough context for the assembling caller to name the
/// offending edge and abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// No component with this id is registered in the application.
    NoSuchComponent { id: String },
    /// The named component exists but has no port with this name.
    NoSuchPort { component: String, port: String },
    /// Both ports exist but their payload type tags differ, or the
    /// output-side connect rejected the target.
    Rejected {
        output_component: String,
        output_port: String,
        input_component: String,
        input_port: String,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::NoSuchComponent { id } => {
                write!(f, "no component with id {id:?}")
            }
            WireError::NoSuchPort { component, port } => {
                write!(f, "component {component:?} has no port {port:?}")
            }
            WireError::Rejected {
                output_component,
                output_port,
                input_component,
                input_port,
            } => write!(
                f,
                "cannot connect {output_component}:{output_port} to {input_component}:{input_port}"
            ),
        }
    }
}

impl Error for WireError {}

/// Failure reading a property from a [`PropertySet`](crate::properties::PropertySet).
///
/// Writes never produce this; a mismatched `set` is a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    Unknown {
        name: String,
    },
    KindMismatch {
        name: String,
        stored: PropertyKind,
        requested: PropertyKind,
    },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::Unknown { name } => write!(f, "unknown property {name:?}"),
            PropertyError::KindMismatch {
                name,
                stored,
                requested,
            } => write!(
                f,
                "property {name:?} holds {stored} but {requested} was requested"
            ),
        }
    }
}

impl Error for PropertyError {}

/// Failure decoding a configuration file into runtime values.
#[derive(Debug)]
pub enum ConfigError {
    /// A property value does not decode as its declared kind.
    BadValue { name: String, kind: PropertyKind },
    /// The file did not parse as a wiring description.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::BadValue { name, kind } => {
                write!(f, "property {name:?} value does not decode as {kind}")
            }
            ConfigError::Parse(err) => write!(f, "invalid wiring description: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
