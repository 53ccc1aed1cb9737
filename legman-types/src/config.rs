//! Configuration types shared by every node of a graph.

use serde::{Deserialize, Serialize};

use crate::error::LegmanError;

/// Forwarding strategy used by an influx node to feed its base node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum InfluxMode {
    /// Pipe into the base node: the influx node pauses when the base signals
    /// back-pressure, so an unconsumed base eventually stalls its producers.
    #[default]
    Backpressured,
    /// Write every record into the base node directly, ignoring back-pressure.
    /// The producer never stalls, but an unconsumed base grows without bound.
    Unbounded,
}

/// Configuration for a node. Nodes created through composition inherit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegmanConfig {
    /// Number of buffered items at which back-pressure is signaled, applied to
    /// both the writable backlog and the readable buffer.
    pub high_water_mark: usize,
    /// Log transform failures through `tracing` at `error` level when no error
    /// listener is attached. Independent of the `tracing` cargo feature.
    pub log_unhandled_errors: bool,
}

impl LegmanConfig {
    /// Object-mode high-water mark used when none is configured.
    pub const DEFAULT_HIGH_WATER_MARK: usize = 16;

    /// Reject configurations a node cannot run with.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when `high_water_mark` is zero.
    pub fn validate(&self) -> Result<(), LegmanError> {
        if self.high_water_mark == 0 {
            return Err(LegmanError::InvalidConfig(
                "high_water_mark must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LegmanConfig {
    fn default() -> Self {
        Self {
            high_water_mark: Self::DEFAULT_HIGH_WATER_MARK,
            log_unhandled_errors: true,
        }
    }
}
