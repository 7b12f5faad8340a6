use crate::error::PropertyError;
use crate::introspect::{ComponentInfo, PortInfo, PropertyInfo};
use crate::lifecycle::Lifecycle;
use crate::port::{Port, PortSet};
use crate::properties::{PropertyPrimitive, PropertySet, PropertyValue};
use crate::utils::CancelToken;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Property controlling the sleep between polls when the worker reports
/// no work, in nanoseconds. Registered on every component.
pub const THREAD_DELAY_PROPERTY: &str = "thread_delay";

const DEFAULT_THREAD_DELAY_NS: u64 = 1_000_000;

/// Outcome of one `process` call, steering the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Work was done; yield the scheduling quantum.
    Normal,
    /// Nothing to do; sleep the poll delay before the next call.
    Noop,
    /// Terminate the worker loop permanently.
    Finish,
    /// Work was done; go straight into the next call.
    NoYield,
}

/// Processing logic hosted by a [`Component`].
///
/// Implementations hold `Arc` clones of their own ports and do all data
/// movement inside [`process`](Worker::process). A `process` that blocks
/// must use the ports' bounded receives so cancellation is observed.
pub trait Worker: Send + 'static {
    /// Declare configurable properties and their defaults.
    fn declare_properties(&self, props: &mut PropertySet) {
        let _ = props;
    }

    /// One-time setup before the worker thread starts. Runs after
    /// configuration has been applied to `props`.
    fn initialize(&mut self, props: &PropertySet) {
        let _ = props;
    }

    /// One scheduling quantum.
    fn process(&mut self) -> Status;
}

/// One side of a graph edge: a component id plus one of its port names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub component: String,
    pub port: String,
}

/// A wired edge, recorded on the output-side component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub output: Endpoint,
    pub input: Endpoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Created,
    Initialized,
    Running,
    Stopped,
}

enum WorkerSlot {
    Idle(Box<dyn Worker>),
    Running(JoinHandle<Box<dyn Worker>>),
    /// Worker lost to a failed spawn or a panicked thread.
    Gone,
}

/// A processing unit: a [`Worker`] plus its ports, properties, recorded
/// connections and a dedicated worker thread.
///
/// States run Created → Initialized → Running → Stopped, with Stopped
/// terminal. Wiring and property configuration happen before `start`;
/// only introspection reads these records afterwards.
pub struct Component {
    name: String,
    id: Mutex<String>,
    ports: PortSet,
    props: Mutex<PropertySet>,
    connections: Mutex<Vec<Connection>>,
    state: Mutex<LifecycleState>,
    slot: Mutex<WorkerSlot>,
    cancel: CancelToken,
}

impl Component {
    pub fn new(name: impl Into<String>, worker: impl Worker) -> Self {
        let name = name.into();
        let mut props = PropertySet::new();
        props.register(THREAD_DELAY_PROPERTY, DEFAULT_THREAD_DELAY_NS);
        worker.declare_properties(&mut props);
        Self {
            id: Mutex::new(name.clone()),
            name,
            ports: PortSet::new(),
            props: Mutex::new(props),
            connections: Mutex::new(Vec::new()),
            state: Mutex::new(LifecycleState::Created),
            slot: Mutex::new(WorkerSlot::Idle(Box::new(worker))),
            cancel: CancelToken::new_root(),
        }
    }

    /// Builder-style port registration.
    pub fn with_port(mut self, port: Arc<dyn Port>) -> Self {
        self.ports.add(port);
        self
    }

    pub fn add_port(&mut self, port: Arc<dyn Port>) {
        self.ports.add(port);
    }

    pub fn get_port(&self, name: &str) -> Option<Arc<dyn Port>> {
        self.ports.get(name)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier used for wiring lookups. Defaults to the name.
    pub fn id(&self) -> String {
        self.id.lock().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.id.lock() = id.into();
    }

    pub fn set_property<P: PropertyPrimitive>(&self, name: &str, value: P) {
        self.props.lock().set(name, value);
    }

    pub fn set_property_value(&self, name: &str, value: PropertyValue) {
        self.props.lock().set_value(name, value);
    }

    pub fn get_property<P: PropertyPrimitive>(&self, name: &str) -> Result<P, PropertyError> {
        self.props.lock().get(name)
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.connections.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        *self.state.lock() == LifecycleState::Running
    }

    /// Wire the named output of this component into the named input of
    /// `other`. Fails without side effects when either port is missing
    /// or the payload type tags differ.
    pub fn connect(&self, output_port: &str, other: &Component, input_port: &str) -> bool {
        let Some(out) = self.ports.get(output_port) else {
            tracing::warn!(component = %self.id(), port = output_port, "no such output port");
            return false;
        };
        let Some(input) = other.ports.get(input_port) else {
            tracing::warn!(component = %other.id(), port = input_port, "no such input port");
            return false;
        };
        if out.type_tag() != input.type_tag() {
            tracing::warn!(
                output = %format!("{}:{}", self.id(), output_port),
                output_type = out.type_name(),
                input = %format!("{}:{}", other.id(), input_port),
                input_type = input.type_name(),
                "port type mismatch"
            );
            return false;
        }
        if !out.connect(input) {
            tracing::warn!(
                output = %format!("{}:{}", self.id(), output_port),
                "output rejected the connection"
            );
            return false;
        }
        self.connections.lock().push(Connection {
            output: Endpoint {
                component: self.id(),
                port: output_port.to_string(),
            },
            input: Endpoint {
                component: other.id(),
                port: input_port.to_string(),
            },
        });
        true
    }

    pub fn describe(&self) -> ComponentInfo {
        ComponentInfo {
            id: self.id(),
            name: self.name.clone(),
            ports: self
                .ports
                .iter()
                .map(|p| PortInfo {
                    name: p.name().to_string(),
                    type_name: p.type_name().to_string(),
                    mode: p.mode(),
                    direction: p.direction(),
                })
                .collect(),
            connections: self.connections(),
            properties: self
                .props
                .lock()
                .iter()
                .map(|(name, kind)| PropertyInfo {
                    name: name.to_string(),
                    kind,
                })
                .collect(),
        }
    }
}

impl Lifecycle for Component {
    fn initialize(&self) {
        let mut state = self.state.lock();
        if *state != LifecycleState::Created {
            return;
        }
        if let WorkerSlot::Idle(worker) = &mut *self.slot.lock() {
            worker.initialize(&self.props.lock());
        }
        *state = LifecycleState::Initialized;
    }

    fn start(&self) {
        let mut state = self.state.lock();
        match *state {
            LifecycleState::Running => {
                tracing::warn!(component = %self.id(), "already running");
                return;
            }
            LifecycleState::Stopped => {
                tracing::warn!(component = %self.id(), "already stopped, not restarting");
                return;
            }
            LifecycleState::Created | LifecycleState::Initialized => {}
        }

        let mut slot = self.slot.lock();
        let WorkerSlot::Idle(worker) = std::mem::replace(&mut *slot, WorkerSlot::Gone) else {
            return;
        };
        let delay_ns = self
            .props
            .lock()
            .get::<u64>(THREAD_DELAY_PROPERTY)
            .unwrap_or(DEFAULT_THREAD_DELAY_NS);
        let delay = Duration::from_nanos(delay_ns);
        let cancel = self.cancel.clone();
        let id = self.id();

        let spawned = thread::Builder::new()
            .name(format!("component-{id}"))
            .spawn(move || worker_loop(worker, cancel, delay, id));
        match spawned {
            Ok(join) => {
                *slot = WorkerSlot::Running(join);
                *state = LifecycleState::Running;
            }
            Err(err) => {
                tracing::error!(component = %self.id(), %err, "failed to spawn worker thread");
            }
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        if *state == LifecycleState::Stopped {
            return;
        }
        self.cancel.cancel();
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, WorkerSlot::Gone) {
            WorkerSlot::Running(join) => match join.join() {
                Ok(worker) => *slot = WorkerSlot::Idle(worker),
                Err(_) => {
                    tracing::error!(component = %self.id(), "worker thread panicked");
                }
            },
            other => *slot = other,
        }
        *state = LifecycleState::Stopped;
    }
}

impl Drop for Component {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    mut worker: Box<dyn Worker>,
    cancel: CancelToken,
    delay: Duration,
    id: String,
) -> Box<dyn Worker> {
    let span = tracing::info_span!("component", %id);
    let _guard = span.enter();
    tracing::debug!("worker loop started");
    while !cancel.is_cancelled() {
        match worker.process() {
            Status::Normal => thread::yield_now(),
            Status::Noop => {
                cancel.sleep_cancellable(delay);
            }
            Status::Finish => {
                tracing::debug!("worker finished");
                break;
            }
            Status::NoYield => {}
        }
    }
    tracing::debug!("worker loop exited");
    worker
}
