pub use buffer::{Buffer, OwnershipMode, Timestamp};
pub use input::InputPort;
pub use output::OutputPort;
pub use set::PortSet;

pub mod buffer;
pub mod input;
pub mod output;
pub mod set;

use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Stable identifier of a port's payload type, compared by value.
pub type TypeTag = TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Type-erased connection endpoint on a component.
///
/// Identity is the name, unique within the owning component. The tag and
/// ownership mode are fixed at construction. Wiring compares tags by
/// value; none of these operations panic, mismatches surface as `false`.
pub trait Port: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn type_tag(&self) -> TypeTag;

    /// Human-readable payload type, for introspection only. Matching is
    /// done on [`type_tag`](Port::type_tag).
    fn type_name(&self) -> &'static str;

    fn mode(&self) -> OwnershipMode;

    fn direction(&self) -> PortDirection;

    /// Register `target` as a downstream consumer of this port.
    /// Meaningful on outputs; the default rejects.
    fn connect(&self, target: Arc<dyn Port>) -> bool {
        let _ = target;
        false
    }

    /// Upcast used by the fan-out engine to recover the concrete input
    /// port type behind a wiring-time `Arc<dyn Port>`.
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
