pub use crate::app::{Application, ComponentFactory};
pub use crate::component::{Component, Connection, Endpoint, Status, Worker};
pub use crate::config::{AppConfig, ComponentConfig, PropertySpec};
pub use crate::error::{PropertyError, WireError};
pub use crate::lifecycle::Lifecycle;
pub use crate::port::{
    Buffer, InputPort, OutputPort, OwnershipMode, Port, PortSet, Timestamp,
};
pub use crate::properties::{PropertyKind, PropertySet, PropertyValue};
pub use crate::utils::CancelToken;
