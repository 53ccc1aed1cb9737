//! Callback registrations on a node.

use std::sync::Arc;

use legman_core::{LegmanError, Record};

pub(crate) type DataFn = Arc<dyn Fn(Record) + Send + Sync>;
pub(crate) type ErrorFn = Arc<dyn Fn(&LegmanError) + Send + Sync>;
pub(crate) type DrainFn = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by `on_data`, `on_error` and `on_drain`, used to detach the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct Listeners {
    next: u64,
    data: Vec<(ListenerId, DataFn)>,
    error: Vec<(ListenerId, ErrorFn)>,
    drain: Vec<(ListenerId, DrainFn)>,
}

impl Listeners {
    fn next_id(&mut self) -> ListenerId {
        self.next += 1;
        ListenerId(self.next)
    }

    pub(crate) fn add_data(&mut self, f: DataFn) -> ListenerId {
        let id = self.next_id();
        self.data.push((id, f));
        id
    }

    pub(crate) fn add_error(&mut self, f: ErrorFn) -> ListenerId {
        let id = self.next_id();
        self.error.push((id, f));
        id
    }

    pub(crate) fn add_drain(&mut self, f: DrainFn) -> ListenerId {
        let id = self.next_id();
        self.drain.push((id, f));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.data.len() + self.error.len() + self.drain.len();
        self.data.retain(|(i, _)| *i != id);
        self.error.retain(|(i, _)| *i != id);
        self.drain.retain(|(i, _)| *i != id);
        before != self.data.len() + self.error.len() + self.drain.len()
    }

    pub(crate) fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub(crate) fn data_fns(&self) -> Vec<DataFn> {
        self.data.iter().map(|(_, f)| Arc::clone(f)).collect()
    }

    pub(crate) fn error_fns(&self) -> Vec<ErrorFn> {
        self.error.iter().map(|(_, f)| Arc::clone(f)).collect()
    }

    pub(crate) fn drain_fns(&self) -> Vec<DrainFn> {
        self.drain.iter().map(|(_, f)| Arc::clone(f)).collect()
    }
}
