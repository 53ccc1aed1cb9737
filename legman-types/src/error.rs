use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node_id::NodeId;

/// Unified error type for the legman workspace.
///
/// Covers writes rejected by a node's lifecycle, per-item transform failures,
/// malformed raw messages and invalid configuration.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LegmanError {
    /// A write reached a node that is ending or has ended.
    #[error("write after end: {node}")]
    WriteAfterEnd {
        /// Node that rejected the write.
        node: NodeId,
    },

    /// A node's transform step failed on one item; the node stops processing.
    #[error("transform failed on {node}: {reason}")]
    Transform {
        /// Node whose transform failed.
        node: NodeId,
        /// Underlying failure description.
        reason: String,
    },

    /// A write reached a node that already failed.
    #[error("{node} failed earlier: {reason}")]
    Failed {
        /// Node that failed.
        node: NodeId,
        /// The original failure description.
        reason: String,
    },

    /// The raw message does not have one of the supported shapes.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A user supplied predicate or mapping function failed or panicked.
    #[error("callback failed: {0}")]
    Callback(String),

    /// Configuration rejected by validation.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl LegmanError {
    /// Helper: build a `WriteAfterEnd` error.
    #[must_use]
    pub const fn write_after_end(node: NodeId) -> Self {
        Self::WriteAfterEnd { node }
    }

    /// Helper: build a `Transform` error tagged with the failing node.
    pub fn transform(node: NodeId, reason: impl Into<String>) -> Self {
        Self::Transform {
            node,
            reason: reason.into(),
        }
    }

    /// Helper: build a `Malformed` error.
    pub fn malformed(what: impl Into<String>) -> Self {
        Self::Malformed(what.into())
    }

    /// Helper: build a `Callback` error.
    pub fn callback(reason: impl Into<String>) -> Self {
        Self::Callback(reason.into())
    }

    /// The error a write observes on a node that already failed with `self`.
    #[must_use]
    pub fn as_failed(&self, node: NodeId) -> Self {
        let reason = match self {
            Self::Transform { reason, .. } | Self::Failed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        Self::Failed { node, reason }
    }

    /// Returns true for errors raised by the transform stage of a node.
    #[must_use]
    pub const fn is_transform_failure(&self) -> bool {
        matches!(self, Self::Transform { .. } | Self::Failed { .. })
    }
}
