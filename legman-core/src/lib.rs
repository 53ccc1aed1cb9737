//! legman-core
//!
//! The pure parts of a Legman node, independent of any stream machinery.
//!
//! - `normalize`: turn a raw [`Message`] into a canonical [`Record`], merging a
//!   node's default fields and stamping provenance.
//! - `transform`: the per-item strategy a node runs (`Normalize`, `Filter`, `Map`).
#![warn(missing_docs)]

/// Record normalizer.
pub mod normalize;
/// Per-item transform strategies.
pub mod transform;

pub use normalize::{coerce, normalize};
pub use transform::{BoxError, Transform};

pub use legman_types::*;
