//! Building graphs out of nodes: influx, filter and map.

use legman_core::{BoxError, Fields, InfluxMode, Record, Transform};

use crate::node::Legman;

impl Legman {
    /// Create a child node that feeds its records into this one.
    ///
    /// The child is configured with `defaults` only; this node adds its own
    /// defaults when it normalizes the forwarded records, so message keys and then
    /// the child's defaults win over them. The child inherits this node's
    /// configuration and stays independent: ending it does not end this node.
    #[must_use]
    pub fn influx(&self, defaults: impl Into<Fields>) -> Self {
        self.influx_with_mode(defaults, InfluxMode::default())
    }

    /// Like [`Legman::influx`], with an explicit forwarding strategy.
    ///
    /// Behavior and trade-offs:
    /// - `Backpressured` pipes the child into this node. When this node's backlog
    ///   is full the child pauses, and once the child fills up too its own writers
    ///   see `write` return `false`.
    /// - `Unbounded` writes every child record into this node directly. Producers
    ///   never stall, but nothing bounds this node's backlog when it is not consumed.
    #[must_use]
    pub fn influx_with_mode(&self, defaults: impl Into<Fields>, mode: InfluxMode) -> Self {
        let child = Self::from_parts(Transform::normalize(defaults.into()), self.config().clone());
        tracing::debug!(base = %self.id(), child = %child.id(), ?mode, "influx");
        match mode {
            InfluxMode::Unbounded => {
                let base = self.clone();
                child.on_data(move |record| {
                    if let Err(err) = base.write(record) {
                        tracing::warn!(base = %base.id(), error = %err, "influx record dropped");
                    }
                });
            }
            _ => {
                child.pipe(self);
            }
        }
        child
    }

    /// Pipe into a new node that forwards only records matching `predicate`.
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.attach(Transform::filter(predicate))
    }

    /// Fallible [`Legman::filter`]. An `Err` fails the filter node.
    #[must_use]
    pub fn try_filter<F, E>(&self, predicate: F) -> Self
    where
        F: Fn(&Record) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.attach(Transform::try_filter(predicate))
    }

    /// Pipe into a new node that replaces each record with `map_fn(record)`.
    #[must_use]
    pub fn map<F>(&self, map_fn: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        self.attach(Transform::map(map_fn))
    }

    /// Fallible [`Legman::map`]. An `Err` fails the map node.
    #[must_use]
    pub fn try_map<F, E>(&self, map_fn: F) -> Self
    where
        F: Fn(Record) -> Result<Record, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.attach(Transform::try_map(map_fn))
    }

    fn attach(&self, transform: Transform) -> Self {
        let node = Self::from_parts(transform, self.config().clone());
        self.pipe(&node)
    }
}
