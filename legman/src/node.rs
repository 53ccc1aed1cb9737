use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;
use legman_core::{Fields, LegmanConfig, LegmanError, Message, NodeId, Phase, Record, Transform};
use tokio::sync::Notify;

use crate::listener::{DataFn, DrainFn, ErrorFn, ListenerId, Listeners};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// A bidirectional record stream: a writable side accepting raw messages and a
/// readable side producing records, with back-pressure between the two.
///
/// `Legman` is a cheap handle; clones refer to the same node. Every node runs one
/// [`Transform`]: nodes built with [`Legman::new`] normalize, nodes returned by
/// [`Legman::filter`] and [`Legman::map`] filter or map, and all of them expose
/// the same composition surface.
///
/// Flow control follows a pull model:
/// - writes land in a backlog and pass the transform while the readable buffer
///   is below the high-water mark;
/// - `write` returns `false` once the backlog reaches the high-water mark, and a
///   drain notification fires when it empties again;
/// - with pipes or data listeners attached the node is flowing and hands every
///   record to all of them, pausing while a piped destination is back-pressured;
/// - without any consumer, records accumulate. Nothing drains a node on its own.
#[derive(Clone)]
pub struct Legman {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    pub(crate) id: NodeId,
    pub(crate) transform: Transform,
    pub(crate) config: LegmanConfig,
    state: Mutex<State>,
    pub(crate) readable: Notify,
    pub(crate) drained: Notify,
}

pub(crate) struct State {
    pub(crate) phase: Phase,
    /// Writable side: accepted messages not yet transformed.
    pub(crate) backlog: VecDeque<Message>,
    /// Readable side: transformed records not yet consumed.
    pub(crate) buffer: VecDeque<Record>,
    /// Outgoing pipe edges.
    pub(crate) outputs: Vec<Legman>,
    /// Piped destinations we are paused on.
    pub(crate) awaiting: Vec<NodeId>,
    /// Upstream nodes paused on us.
    drain_waiters: Vec<Weak<Inner>>,
    pub(crate) listeners: Listeners,
    pub(crate) error: Option<LegmanError>,
    pub(crate) need_drain: bool,
    pumping: bool,
    pub(crate) close_when_drained: bool,
    pub(crate) end_signaled: bool,
}

enum Step {
    Deliver {
        record: Record,
        outputs: Vec<Legman>,
        data: Vec<DataFn>,
    },
    Transform(Message),
    Idle(Settled),
}

#[derive(Default)]
struct Settled {
    drained: bool,
    drain_waiters: Vec<Weak<Inner>>,
    drain_fns: Vec<DrainFn>,
    closed: Vec<Legman>,
    end_downstream: Vec<Legman>,
}

impl Default for Legman {
    fn default() -> Self {
        Self::new()
    }
}

impl Legman {
    /// Create a normalizing node without default fields.
    #[must_use]
    pub fn new() -> Self {
        Self::with_defaults(Fields::new())
    }

    /// Create a normalizing node whose records carry `defaults` unless the
    /// message overrides them.
    #[must_use]
    pub fn with_defaults(defaults: impl Into<Fields>) -> Self {
        Self::from_parts(Transform::normalize(defaults.into()), LegmanConfig::default())
    }

    /// Start building a node with custom defaults and configuration.
    #[must_use]
    pub fn builder() -> crate::LegmanBuilder {
        crate::LegmanBuilder::new()
    }

    /// The caller guarantees `config` is valid.
    pub(crate) fn from_parts(transform: Transform, config: LegmanConfig) -> Self {
        let id = NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(node = %id, transform = transform.kind(), "created node");
        Self {
            inner: Arc::new(Inner {
                id,
                transform,
                config,
                state: Mutex::new(State::new()),
                readable: Notify::new(),
                drained: Notify::new(),
            }),
        }
    }

    /// Process-unique identity of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Configuration this node runs with.
    #[must_use]
    pub fn config(&self) -> &LegmanConfig {
        &self.inner.config
    }

    /// Default fields of a normalizing node; `None` for filter and map nodes.
    #[must_use]
    pub fn defaults(&self) -> Option<&Fields> {
        self.inner.transform.defaults()
    }

    /// The transform strategy this node runs.
    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.inner.transform
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// The failure that stopped this node, if any.
    #[must_use]
    pub fn error(&self) -> Option<LegmanError> {
        self.inner.lock().error.clone()
    }

    /// Items held by the node: untransformed backlog plus unread records.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        let st = self.inner.lock();
        st.backlog.len() + st.buffer.len()
    }

    /// Records waiting on the readable side.
    #[must_use]
    pub fn readable_len(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    /// Messages waiting on the writable side.
    #[must_use]
    pub fn writable_len(&self) -> usize {
        self.inner.lock().backlog.len()
    }

    /// True while a writer has been told to stop and no drain has fired yet.
    #[must_use]
    pub fn is_backpressured(&self) -> bool {
        self.inner.lock().need_drain
    }

    /// True when pipes or data listeners consume records as they are produced.
    #[must_use]
    pub fn is_flowing(&self) -> bool {
        let st = self.inner.lock();
        !st.outputs.is_empty() || st.listeners.has_data()
    }

    /// Ids of the nodes this node currently pipes into.
    #[must_use]
    pub fn piped_to(&self) -> Vec<NodeId> {
        self.inner.lock().outputs.iter().map(Self::id).collect()
    }

    /// Write one raw message.
    ///
    /// Returns `Ok(false)` when the writable backlog reached the high-water mark:
    /// the message was accepted, but the caller should wait for a drain before
    /// writing more (see [`Legman::drained`] and [`Legman::on_drain`]).
    ///
    /// # Errors
    /// `WriteAfterEnd` once the node is ending or ended, `Failed` once a transform
    /// step has failed.
    pub fn write(&self, message: impl Into<Message>) -> Result<bool, LegmanError> {
        self.inner.accept(message.into(), None, false)
    }

    /// Take the next readable record without waiting.
    pub fn read(&self) -> Option<Record> {
        let record = self.inner.lock().buffer.pop_front();
        self.inner.pump();
        record
    }

    /// Pipe this node's records into `dest`, returning `dest` for chaining.
    ///
    /// The edge respects back-pressure: when `dest.write` reports back-pressure
    /// this node pauses until `dest` drains. Several pipes broadcast every record.
    /// If this node reaches end-of-stream while still piped, `dest` is ended too.
    pub fn pipe(&self, dest: &Self) -> Self {
        if dest.id() == self.id() {
            tracing::warn!(node = %self.id(), "refusing to pipe a node into itself");
            return dest.clone();
        }
        let already_ended = {
            let mut st = self.inner.lock();
            if st.end_signaled {
                true
            } else {
                if !st.outputs.iter().any(|o| o.id() == dest.id()) {
                    st.outputs.push(dest.clone());
                }
                false
            }
        };
        tracing::debug!(node = %self.id(), dest = %dest.id(), "piped");
        if already_ended {
            dest.end();
        } else {
            self.inner.pump();
        }
        dest.clone()
    }

    /// Sever the edge to `dest`, or every outgoing edge when `dest` is `None`.
    /// Returns how many edges were removed.
    pub fn unpipe(&self, dest: Option<&Self>) -> usize {
        let removed = {
            let mut st = self.inner.lock();
            let before = st.outputs.len();
            match dest {
                Some(d) => {
                    let id = d.id();
                    st.outputs.retain(|o| o.id() != id);
                    st.awaiting.retain(|a| *a != id);
                }
                None => {
                    st.outputs.clear();
                    st.awaiting.clear();
                }
            }
            before - st.outputs.len()
        };
        tracing::debug!(node = %self.id(), removed, "unpiped");
        self.inner.pump();
        removed
    }

    /// Receive every record as it is produced. Attaching a data listener makes
    /// the node flowing.
    pub fn on_data<F>(&self, f: F) -> ListenerId
    where
        F: Fn(Record) + Send + Sync + 'static,
    {
        let id = self.inner.lock().listeners.add_data(Arc::new(f));
        self.inner.pump();
        id
    }

    /// Observe the failure that stops this node.
    pub fn on_error<F>(&self, f: F) -> ListenerId
    where
        F: Fn(&LegmanError) + Send + Sync + 'static,
    {
        self.inner.lock().listeners.add_error(Arc::new(f))
    }

    /// Called whenever a back-pressured backlog has emptied.
    pub fn on_drain<F>(&self, f: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.lock().listeners.add_drain(Arc::new(f))
    }

    /// Detach a callback. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.lock().listeners.remove(id)
    }
}

impl PartialEq for Legman {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Legman {}

impl fmt::Debug for Legman {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Legman")
            .field("id", &self.inner.id)
            .field("transform", &self.inner.transform.kind())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl State {
    fn new() -> Self {
        Self {
            phase: Phase::Open,
            backlog: VecDeque::new(),
            buffer: VecDeque::new(),
            outputs: Vec::new(),
            awaiting: Vec::new(),
            drain_waiters: Vec::new(),
            listeners: Listeners::default(),
            error: None,
            need_drain: false,
            pumping: false,
            close_when_drained: false,
            end_signaled: false,
        }
    }
}

impl Inner {
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a message on the writable side. `last` moves the node to `Ending`.
    pub(crate) fn accept(
        self: &Arc<Self>,
        message: Message,
        upstream: Option<Weak<Self>>,
        last: bool,
    ) -> Result<bool, LegmanError> {
        {
            let mut st = self.lock();
            match st.phase {
                Phase::Open => {}
                Phase::Ending | Phase::Ended => return Err(LegmanError::write_after_end(self.id)),
                Phase::Failed => {
                    return Err(st.error.as_ref().map_or_else(
                        || LegmanError::write_after_end(self.id),
                        |e| e.as_failed(self.id),
                    ));
                }
            }
            st.backlog.push_back(message);
            if last {
                st.phase = Phase::Ending;
            }
        }
        self.pump();

        let mut st = self.lock();
        let ok = st.backlog.len() < self.config.high_water_mark;
        if !ok {
            st.need_drain = true;
            if let Some(up) = upstream {
                st.drain_waiters.push(up);
            }
            tracing::trace!(node = %self.id, backlog = st.backlog.len(), "back-pressure");
        }
        Ok(ok)
    }

    /// Move items through the node until nothing can progress.
    ///
    /// Only one caller pumps at a time; concurrent or re-entrant callers return
    /// immediately and the active pump picks up their work before it settles.
    pub(crate) fn pump(self: &Arc<Self>) {
        {
            let mut st = self.lock();
            if st.pumping {
                return;
            }
            st.pumping = true;
        }
        loop {
            let step = {
                let mut st = self.lock();
                self.next_step(&mut st)
            };
            match step {
                Step::Deliver {
                    record,
                    outputs,
                    data,
                } => self.deliver(&record, &outputs, &data),
                Step::Transform(message) => self.run_transform(message),
                Step::Idle(settled) => {
                    self.fire(settled);
                    break;
                }
            }
        }
    }

    fn next_step(&self, st: &mut State) -> Step {
        if st.phase != Phase::Failed {
            let flowing = !st.outputs.is_empty() || st.listeners.has_data();
            if flowing
                && st.awaiting.is_empty()
                && let Some(record) = st.buffer.pop_front()
            {
                return Step::Deliver {
                    record,
                    outputs: st.outputs.clone(),
                    data: st.listeners.data_fns(),
                };
            }
            if st.buffer.len() < self.config.high_water_mark
                && let Some(message) = st.backlog.pop_front()
            {
                return Step::Transform(message);
            }
        }
        Step::Idle(Self::settle(st))
    }

    fn settle(st: &mut State) -> Settled {
        let mut settled = Settled::default();
        if st.need_drain && st.backlog.is_empty() {
            st.need_drain = false;
            settled.drained = true;
            settled.drain_waiters = mem::take(&mut st.drain_waiters);
            settled.drain_fns = st.listeners.drain_fns();
        }
        if st.close_when_drained && st.phase == Phase::Ending && st.backlog.is_empty() {
            st.close_when_drained = false;
            st.phase = Phase::Ended;
            st.awaiting.clear();
            settled.closed = mem::take(&mut st.outputs);
        }
        if st.phase == Phase::Ended
            && !st.end_signaled
            && st.backlog.is_empty()
            && st.buffer.is_empty()
        {
            st.end_signaled = true;
            settled.end_downstream = st.outputs.clone();
        }
        st.pumping = false;
        settled
    }

    fn fire(&self, settled: Settled) {
        self.readable.notify_waiters();
        if settled.drained {
            self.drained.notify_waiters();
            for waiter in settled.drain_waiters {
                if let Some(up) = waiter.upgrade() {
                    up.downstream_drained(self.id);
                }
            }
            for f in settled.drain_fns {
                f();
            }
        }
        if !settled.closed.is_empty() {
            tracing::debug!(node = %self.id, edges = settled.closed.len(), "closed after drain");
        }
        for dest in settled.end_downstream {
            tracing::debug!(node = %self.id, dest = %dest.id(), "end-of-stream reached a piped destination");
            dest.end();
        }
    }

    fn deliver(self: &Arc<Self>, record: &Record, outputs: &[Legman], data: &[DataFn]) {
        for f in data {
            if catch_unwind(AssertUnwindSafe(|| f(record.clone()))).is_err() {
                tracing::warn!(node = %self.id, "data listener panicked");
            }
        }
        for dest in outputs {
            match dest.inner.accept(
                Message::Record(record.clone()),
                Some(Arc::downgrade(self)),
                false,
            ) {
                Ok(true) => {}
                Ok(false) => self.pause_on(dest),
                Err(err) => {
                    tracing::warn!(node = %self.id, dest = %dest.id(), error = %err, "destination rejected record; unpiping");
                    let mut st = self.lock();
                    st.outputs.retain(|o| o.id() != dest.id());
                    st.awaiting.retain(|a| *a != dest.id());
                }
            }
        }
    }

    /// Pause on `dest` until it drains. The drain may already have happened
    /// between the rejected write and this call, so check again after recording.
    fn pause_on(&self, dest: &Legman) {
        let id = dest.id();
        self.lock().awaiting.push(id);
        if !dest.is_backpressured() {
            self.lock().awaiting.retain(|a| *a != id);
        }
    }

    fn downstream_drained(self: &Arc<Self>, from: NodeId) {
        self.lock().awaiting.retain(|a| *a != from);
        self.pump();
    }

    fn run_transform(&self, message: Message) {
        let outcome = self.transform.apply(message, Utc::now());
        let failure = {
            let mut st = self.lock();
            match outcome {
                Ok(Some(record)) => {
                    st.buffer.push_back(record);
                    None
                }
                Ok(None) => None,
                Err(err) => {
                    let err = LegmanError::transform(self.id, err.to_string());
                    st.phase = Phase::Failed;
                    st.backlog.clear();
                    st.close_when_drained = false;
                    st.error = Some(err.clone());
                    Some((err, st.listeners.error_fns()))
                }
            }
        };
        if let Some((err, handlers)) = failure {
            self.report(&err, &handlers);
        }
    }

    fn report(&self, err: &LegmanError, handlers: &[ErrorFn]) {
        for h in handlers {
            h(err);
        }
        if handlers.is_empty() && self.config.log_unhandled_errors {
            tracing::error!(node = %self.id, error = %err, "unhandled legman error");
        }
    }
}
