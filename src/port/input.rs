use crate::port::{Buffer, OwnershipMode, Port, PortDirection, Timestamp, TypeTag};
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Upper bound on a single `get_data` wait. Short enough that the owning
/// worker thread observes cancellation while idle.
const RECV_WAIT: Duration = Duration::from_secs(2);

struct Queue<T> {
    entries: VecDeque<(Buffer<T>, Timestamp)>,
    depth: usize,
}

/// Receiving endpoint: a bounded FIFO of timestamped buffers.
///
/// Producers enqueue through the owning output port and never block;
/// once the queue holds `depth` entries the newest arrival is discarded,
/// keeping the oldest unread data. The owning component's worker drains
/// it with a bounded blocking receive.
pub struct InputPort<T> {
    name: String,
    mode: OwnershipMode,
    queue: Mutex<Queue<T>>,
    available: Condvar,
    eos: AtomicBool,
    dropped: AtomicU64,
}

impl<T: Send + Sync + 'static> InputPort<T> {
    pub fn new(name: impl Into<String>, mode: OwnershipMode) -> Self {
        Self {
            name: name.into(),
            mode,
            queue: Mutex::new(Queue {
                entries: VecDeque::new(),
                depth: usize::MAX,
            }),
            available: Condvar::new(),
            eos: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        }
    }

    /// Port whose consumer takes each payload as its unique owner.
    pub fn exclusive(name: impl Into<String>) -> Self {
        Self::new(name, OwnershipMode::Exclusive)
    }

    /// Port whose consumer holds a reference-counted view.
    pub fn shared(name: impl Into<String>) -> Self {
        Self::new(name, OwnershipMode::Shared)
    }

    /// Maximum number of buffered entries before arrivals are dropped.
    /// Unbounded by default.
    pub fn set_depth(&self, depth: usize) {
        self.queue.lock().depth = depth;
    }

    pub fn depth(&self) -> usize {
        self.queue.lock().depth
    }

    pub fn len(&self) -> usize {
        self.queue.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().entries.is_empty()
    }

    /// Entries discarded because the queue was at capacity.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drop all buffered entries.
    pub fn clear(&self) {
        self.queue.lock().entries.clear();
    }

    #[inline]
    pub fn eos(&self) -> bool {
        self.eos.load(Ordering::Acquire)
    }

    /// Oldest buffered entry, waiting up to [`RECV_WAIT`] for one to
    /// arrive. `None` means the wait timed out or EOS was raised with an
    /// empty queue; callers treat it as a normal poll result and check
    /// for cancellation.
    pub fn get_data(&self) -> Option<(Buffer<T>, Timestamp)> {
        let mut queue = self.queue.lock();
        let deadline = Instant::now() + RECV_WAIT;
        while queue.entries.is_empty() && !self.eos() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            if self.available.wait_for(&mut queue, deadline - now).timed_out() {
                break;
            }
        }
        queue.entries.pop_front()
    }

    /// Enqueue one entry, waking one waiting receiver. At capacity the
    /// entry is discarded; the producer is never blocked.
    pub(crate) fn add_data(&self, buffer: Buffer<T>, ts: Timestamp) {
        debug_assert_eq!(buffer.mode(), self.mode);
        let mut queue = self.queue.lock();
        if queue.entries.len() < queue.depth {
            queue.entries.push_back((buffer, ts));
            drop(queue);
            self.available.notify_one();
        } else {
            drop(queue);
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(port = %self.name, total, "input queue full, entry discarded");
        }
    }

    /// Raise or clear end-of-stream and wake every waiter. Monotonic in
    /// practice: the framework only ever raises it.
    pub(crate) fn set_eos(&self, value: bool) {
        self.eos.store(value, Ordering::Release);
        self.available.notify_all();
    }
}

impl<T: Send + Sync + 'static> Port for InputPort<T> {
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
        PortDirection::Input
    }

    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<T> Drop for InputPort<T> {
    fn drop(&mut self) {
        self.eos.store(true, Ordering::Release);
        self.available.notify_all();
    }
}
