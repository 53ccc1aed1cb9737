//! Legman-specific data transfer objects and configuration primitives.
//!
//! - `value`: dynamically typed field values and the `Fields` map.
//! - `record`: the canonical normalized record with its provenance slot.
//! - `message`: raw messages accepted by a node before normalization.
//! - `config`: node configuration and influx forwarding modes.
#![warn(missing_docs)]

mod config;
mod error;
mod macros;
mod message;
mod node_id;
mod phase;
mod record;
mod value;

pub use config::{InfluxMode, LegmanConfig};
pub use error::LegmanError;
pub use message::{ErrorMessage, Message};
pub use node_id::NodeId;
pub use phase::Phase;
pub use record::{Provenance, Record};
pub use value::{Fields, Value};

/// Reserved field names produced by the normalizer when wrapping non-record messages.
pub mod keys {
    /// Field holding the log level of a wrapped string or error.
    pub const LOGLEVEL: &str = "loglevel";
    /// Field holding the message payload (text, error message or blob).
    pub const MSG: &str = "msg";
    /// Field holding the error name of a wrapped error.
    pub const NAME: &str = "name";
    /// Field holding the rendered stack of a wrapped error.
    pub const STACK: &str = "stack";

    /// Log level assigned to plain strings.
    pub const LEVEL_LOG: &str = "log";
    /// Log level assigned to errors.
    pub const LEVEL_ERROR: &str = "error";
}
