//! Raw messages accepted by a node before normalization.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::record::Record;
use crate::value::{Fields, Value};

/// A message of arbitrary shape written into a node.
///
/// The normalizer classifies variants in this priority order: blob, error,
/// text, structured record. `Json` is classified by its JSON shape.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Message {
    /// An already structured record.
    Record(Record),
    /// A binary blob.
    Blob(Arc<[u8]>),
    /// A plain string.
    Text(String),
    /// An error-like object.
    Error(ErrorMessage),
    /// A JSON document, typically from an embedding application's parser.
    Json(serde_json::Value),
}

impl Message {
    /// Capture a Rust error as an error-like message.
    pub fn error<E: StdError + 'static>(err: &E) -> Self {
        Self::Error(ErrorMessage::from_error(err))
    }

    /// True when the message is already a structured record.
    #[must_use]
    pub const fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}

impl From<Record> for Message {
    fn from(r: Record) -> Self {
        Self::Record(r)
    }
}

impl From<Fields> for Message {
    fn from(f: Fields) -> Self {
        Self::Record(Record::from(f))
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Message {
    fn from(b: Vec<u8>) -> Self {
        Self::Blob(Arc::from(b))
    }
}

impl From<&[u8]> for Message {
    fn from(b: &[u8]) -> Self {
        Self::Blob(Arc::from(b))
    }
}

impl From<ErrorMessage> for Message {
    fn from(e: ErrorMessage) -> Self {
        Self::Error(e)
    }
}

impl From<serde_json::Value> for Message {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

/// An error-like message: name, message, rendered stack and extra own fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    /// Error kind name, e.g. `"Error"` or the Rust type name.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Rendered stack / cause chain.
    pub stack: String,
    /// Additional fields carried by the error; spread before the derived fields.
    pub fields: Fields,
}

impl ErrorMessage {
    /// Build an error message with a single-line stack `"{name}: {message}"`.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = format!("{name}: {message}");
        Self {
            name,
            message,
            stack,
            fields: Fields::new(),
        }
    }

    /// Replace the rendered stack.
    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    /// Attach an extra field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Capture a Rust error. The name is the error's type name without its module
    /// path; the stack lists the `source()` chain below the first line.
    pub fn from_error<E: StdError + 'static>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        let mut out = Self::new(name, err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            out.stack.push_str("\n    caused by: ");
            out.stack.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
