use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use legman_types::{Fields, LegmanError, Message, Record};

use crate::normalize::{coerce, normalize};

/// Boxed error returned by fallible predicates and mapping functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type PredicateFn = dyn Fn(&Record) -> Result<bool, BoxError> + Send + Sync;
type MapFn = dyn Fn(Record) -> Result<Record, BoxError> + Send + Sync;

/// The per-item step a node runs on everything written into it.
///
/// Every node is the same concrete type; only this strategy differs, so filtered
/// and mapped nodes keep the full composition surface.
#[derive(Clone)]
pub enum Transform {
    /// Normalize raw messages and merge the node's default fields.
    Normalize {
        /// Default fields merged under every message.
        defaults: Arc<Fields>,
    },
    /// Forward records unchanged when the predicate holds, drop them otherwise.
    Filter(Arc<PredicateFn>),
    /// Replace each record with the function's output, pushed as-is.
    Map(Arc<MapFn>),
}

impl Transform {
    /// Normalizing strategy with the given default fields.
    #[must_use]
    pub fn normalize(defaults: Fields) -> Self {
        Self::Normalize {
            defaults: Arc::new(defaults),
        }
    }

    /// Filtering strategy from an infallible predicate.
    pub fn filter<F>(predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self::Filter(Arc::new(move |r: &Record| Ok(predicate(r))))
    }

    /// Filtering strategy from a fallible predicate; an `Err` fails the node.
    pub fn try_filter<F, E>(predicate: F) -> Self
    where
        F: Fn(&Record) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::Filter(Arc::new(move |r: &Record| predicate(r).map_err(Into::into)))
    }

    /// Mapping strategy from an infallible function.
    pub fn map<F>(map_fn: F) -> Self
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        Self::Map(Arc::new(move |r: Record| Ok(map_fn(r))))
    }

    /// Mapping strategy from a fallible function; an `Err` fails the node.
    pub fn try_map<F, E>(map_fn: F) -> Self
    where
        F: Fn(Record) -> Result<Record, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::Map(Arc::new(move |r: Record| map_fn(r).map_err(Into::into)))
    }

    /// Short label used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Normalize { .. } => "normalize",
            Self::Filter(_) => "filter",
            Self::Map(_) => "map",
        }
    }

    /// Default fields of a normalizing strategy.
    #[must_use]
    pub fn defaults(&self) -> Option<&Fields> {
        match self {
            Self::Normalize { defaults } => Some(defaults),
            Self::Filter(_) | Self::Map(_) => None,
        }
    }

    /// Run the strategy on one item.
    ///
    /// `Ok(None)` means the item was dropped by a filter. Filter and map nodes do
    /// not normalize: records pass through untouched, and other raw shapes written
    /// straight into them are only coerced (no defaults, no timestamp).
    ///
    /// # Errors
    /// Returns `Malformed` for unsupported message shapes and `Callback` when a
    /// user predicate or mapping function fails or panics.
    pub fn apply(&self, message: Message, now: DateTime<Utc>) -> Result<Option<Record>, LegmanError> {
        match self {
            Self::Normalize { defaults } => normalize(message, defaults, now).map(Some),
            Self::Filter(predicate) => {
                let record = coerce(message)?;
                let keep = guarded(|| predicate(&record))?;
                Ok(keep.then_some(record))
            }
            Self::Map(map_fn) => {
                let record = coerce(message)?;
                guarded(|| map_fn(record)).map(Some)
            }
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normalize { defaults } => f
                .debug_struct("Normalize")
                .field("defaults", defaults)
                .finish(),
            Self::Filter(_) => f.write_str("Filter(..)"),
            Self::Map(_) => f.write_str("Map(..)"),
        }
    }
}

fn guarded<T>(f: impl FnOnce() -> Result<T, BoxError>) -> Result<T, LegmanError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(v)) => Ok(v),
        Ok(Err(e)) => Err(LegmanError::callback(e.to_string())),
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            #[cfg(feature = "tracing")]
            tracing::warn!(reason = %reason, "user callback panicked");
            Err(LegmanError::callback(reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
