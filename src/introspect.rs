//! Read-only snapshots of a running graph, consumed by external
//! reporting layers. Property values are withheld; only names and kinds
//! are exposed.

use crate::component::Connection;
use crate::port::{OwnershipMode, PortDirection};
use crate::properties::PropertyKind;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub mode: OwnershipMode,
    pub direction: PortDirection,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentInfo {
    pub id: String,
    pub name: String,
    pub ports: Vec<PortInfo>,
    pub connections: Vec<Connection>,
    pub properties: Vec<PropertyInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: String,
    pub components: Vec<ComponentInfo>,
    /// Every edge in the graph, collected across components.
    pub connections: Vec<Connection>,
}
