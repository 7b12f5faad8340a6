use crate::port::{Buffer, InputPort, OwnershipMode, Port, PortDirection, Timestamp, TypeTag};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Bounded wait inside the relay loop so the thread notices shutdown
/// even when no data flows.
const RELAY_WAIT: Duration = Duration::from_secs(1);

type Targets<T> = Arc<RwLock<Vec<Arc<InputPort<T>>>>>;

struct Relay<T> {
    tx: Sender<(Buffer<T>, Timestamp)>,
    join: JoinHandle<()>,
}

/// Sending endpoint: delivers each produced buffer to every connected
/// input, duplicating or moving the payload according to each target's
/// ownership mode.
///
/// The target list is kept sorted with exclusive-mode inputs at the
/// tail, which pins down which target receives the original payload by
/// move when copies have to be made for the others.
///
/// Fan-out patterns that force deep copies are decoupled from the
/// producer through an internal relay thread with an unbounded queue;
/// the thread is spawned lazily by the first connection that needs it
/// and joined on [`disconnect`](OutputPort::disconnect) or drop. Either
/// way, `send` never blocks on a slow consumer.
pub struct OutputPort<T> {
    name: String,
    mode: OwnershipMode,
    targets: Targets<T>,
    relay: Mutex<Option<Relay<T>>>,
}

impl<T: Clone + Send + Sync + 'static> OutputPort<T> {
    pub fn new(name: impl Into<String>, mode: OwnershipMode) -> Self {
        Self {
            name: name.into(),
            mode,
            targets: Arc::new(RwLock::new(Vec::new())),
            relay: Mutex::new(None),
        }
    }

    /// Port producing uniquely owned payloads.
    pub fn exclusive(name: impl Into<String>) -> Self {
        Self::new(name, OwnershipMode::Exclusive)
    }

    /// Port producing reference-counted payloads.
    pub fn shared(name: impl Into<String>) -> Self {
        Self::new(name, OwnershipMode::Shared)
    }

    pub fn is_connected(&self) -> bool {
        !self.targets.read().is_empty()
    }

    /// Send one value, wrapped in this port's ownership mode and stamped
    /// with `ts`. With no connections this is a no-op; with a relay
    /// running it enqueues and returns immediately.
    pub fn send(&self, value: T, ts: Timestamp) {
        let buffer = match self.mode {
            OwnershipMode::Exclusive => Buffer::exclusive(value),
            OwnershipMode::Shared => Buffer::shared(value),
        };
        self.send_buffer(buffer, ts);
    }

    /// Send an already-wrapped buffer.
    pub fn send_buffer(&self, buffer: Buffer<T>, ts: Timestamp) {
        let relay = self.relay.lock();
        if let Some(relay) = relay.as_ref() {
            // Unbounded queue: only fails if the relay died, in which
            // case the entry is dropped like any other overflow.
            let _ = relay.tx.send((buffer, ts));
            return;
        }
        drop(relay);
        fan_out(&self.targets.read(), buffer, ts);
    }

    /// Propagate end-of-stream to every currently connected input.
    pub fn set_eos(&self, value: bool) {
        for target in self.targets.read().iter() {
            target.set_eos(value);
        }
    }

    /// Drop all connections and stop the relay thread, draining entries
    /// it still holds.
    pub fn disconnect(&self) {
        if let Some(Relay { tx, join }) = self.relay.lock().take() {
            drop(tx);
            let _ = join.join();
        }
        self.targets.write().clear();
    }

    fn ensure_relay(&self) {
        let mut relay = self.relay.lock();
        if relay.is_some() {
            return;
        }
        let (tx, rx) = channel::unbounded();
        let targets = self.targets.clone();
        let spawned = thread::Builder::new()
            .name(format!("relay-{}", self.name))
            .spawn(move || relay_loop(rx, targets));
        match spawned {
            Ok(join) => *relay = Some(Relay { tx, join }),
            Err(err) => {
                tracing::error!(port = %self.name, %err, "failed to spawn relay thread");
            }
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Port for OutputPort<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> TypeTag {
        TypeTag::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn mode(&self) -> OwnershipMode {
        self.mode
    }

    fn direction(&self) -> PortDirection {
        PortDirection::Output
    }

    fn connect(&self, target: Arc<dyn Port>) -> bool {
        if target.type_tag() != TypeTag::of::<T>() {
            return false;
        }
        let Ok(input) = target.as_any_arc().downcast::<InputPort<T>>() else {
            return false;
        };

        let needs_relay = {
            let mut targets = self.targets.write();
            targets.push(input);
            // stable sort, exclusive targets last
            targets.sort_by_key(|t| !t.mode().is_shared());
            let any_exclusive = targets.iter().any(|t| !t.mode().is_shared());
            any_exclusive && (self.mode.is_shared() || targets.len() > 1)
        };
        if needs_relay {
            self.ensure_relay();
        }
        true
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T> Drop for OutputPort<T> {
    fn drop(&mut self) {
        if let Some(Relay { tx, join }) = self.relay.lock().take() {
            drop(tx);
            let _ = join.join();
        }
    }
}

fn relay_loop<T: Clone + Send + Sync + 'static>(
    rx: Receiver<(Buffer<T>, Timestamp)>,
    targets: Targets<T>,
) {
    loop {
        match rx.recv_timeout(RELAY_WAIT) {
            Ok((buffer, ts)) => {
                let targets = targets.read();
                fan_out(&targets, buffer, ts);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            // Sender gone and queue drained: the port disconnected.
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Deliver one buffer to every target, resolved against the target list
/// as it stands right now.
///
/// Shared-mode targets all receive handles onto a single allocation.
/// Exclusive-mode targets each receive an independently owned payload;
/// the last of them (deterministic thanks to the sort order) takes the
/// original by move so one copy fewer is made.
fn fan_out<T: Clone + Send + Sync + 'static>(
    targets: &[Arc<InputPort<T>>],
    buffer: Buffer<T>,
    ts: Timestamp,
) {
    let total = targets.len();
    if total == 0 {
        return;
    }
    let exclusive = targets.iter().filter(|t| !t.mode().is_shared()).count();

    if exclusive == 0 {
        // Handle clones only, no payload duplication. A single exclusive
        // buffer converts into the handle without copying.
        let handle = buffer.into_shared();
        for target in targets {
            target.add_data(Buffer::Shared(handle.clone()), ts);
        }
        return;
    }

    let (shared_targets, exclusive_targets) = targets.split_at(total - exclusive);
    match buffer {
        Buffer::Exclusive(original) => {
            if !shared_targets.is_empty() {
                let handle = Arc::new((*original).clone());
                for target in shared_targets {
                    target.add_data(Buffer::Shared(handle.clone()), ts);
                }
            }
            if let Some((last, rest)) = exclusive_targets.split_last() {
                for target in rest {
                    target.add_data(Buffer::Exclusive(Box::new((*original).clone())), ts);
                }
                last.add_data(Buffer::Exclusive(original), ts);
            }
        }
        Buffer::Shared(handle) => {
            for target in shared_targets {
                target.add_data(Buffer::Shared(handle.clone()), ts);
            }
            if let Some((last, rest)) = exclusive_targets.split_last() {
                for target in rest {
                    target.add_data(Buffer::Exclusive(Box::new((*handle).clone())), ts);
                }
                // Reuse the allocation when no other holder is left.
                let boxed = Arc::try_unwrap(handle)
                    .map(Box::new)
                    .unwrap_or_else(|h| Box::new((*h).clone()));
                last.add_data(Buffer::Exclusive(boxed), ts);
            }
        }
    }
}
