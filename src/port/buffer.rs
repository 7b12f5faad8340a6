use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// How a consumer holds a delivered payload.
///
/// The mode is fixed per port at construction; the fan-out engine
/// reconciles mismatched producer/consumer modes at delivery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipMode {
    /// Single unique owner; the consumer may mutate in place.
    Exclusive,
    /// Reference-counted; any number of concurrent read-only holders.
    Shared,
}

impl OwnershipMode {
    #[inline]
    pub fn is_shared(self) -> bool {
        matches!(self, OwnershipMode::Shared)
    }
}

/// Wall-clock tag attached to every buffer crossing a port boundary.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Timestamp {
    pub seconds: u32,
    pub picoseconds: u64,
}

impl Timestamp {
    pub fn new(seconds: u32, picoseconds: u64) -> Self {
        Self {
            seconds,
            picoseconds,
        }
    }

    /// Current system time. Sub-second precision is whatever the clock
    /// gives us, widened to picoseconds.
    pub fn now() -> Self {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            seconds: elapsed.as_secs() as u32,
            picoseconds: u64::from(elapsed.subsec_nanos()) * 1_000,
        }
    }
}

/// A payload wrapped in exactly one ownership mode.
///
/// `Exclusive` buffers own their allocation and may be handed to exactly
/// one consumer; `Shared` buffers are reference-counted views that any
/// number of consumers may hold concurrently.
#[derive(Debug)]
pub enum Buffer<T> {
    Exclusive(Box<T>),
    Shared(Arc<T>),
}

impl<T> Buffer<T> {
    #[inline]
    pub fn exclusive(value: T) -> Self {
        Buffer::Exclusive(Box::new(value))
    }

    #[inline]
    pub fn shared(value: T) -> Self {
        Buffer::Shared(Arc::new(value))
    }

    #[inline]
    pub fn mode(&self) -> OwnershipMode {
        match self {
            Buffer::Exclusive(_) => OwnershipMode::Exclusive,
            Buffer::Shared(_) => OwnershipMode::Shared,
        }
    }

    /// Mutable access to the payload. `None` for shared buffers with
    /// more than one live handle.
    #[inline]
    pub fn payload_mut(&mut self) -> Option<&mut T> {
        match self {
            Buffer::Exclusive(b) => Some(b.as_mut()),
            Buffer::Shared(a) => Arc::get_mut(a),
        }
    }

    /// Convert into a reference-counted handle. Exclusive buffers give
    /// up their allocation without copying the payload.
    #[inline]
    pub fn into_shared(self) -> Arc<T> {
        match self {
            Buffer::Exclusive(b) => Arc::from(b),
            Buffer::Shared(a) => a,
        }
    }
}

impl<T: Clone> Buffer<T> {
    /// Take the payload by value, cloning only when other shared
    /// holders still exist.
    pub fn into_owned(self) -> T {
        match self {
            Buffer::Exclusive(b) => *b,
            Buffer::Shared(a) => Arc::try_unwrap(a).unwrap_or_else(|a| (*a).clone()),
        }
    }
}

impl<T> Deref for Buffer<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self {
            Buffer::Exclusive(b) => b,
            Buffer::Shared(a) => a,
        }
    }
}
