//! The canonical record emitted by every Legman node.

use chrono::{DateTime, Utc};

use crate::value::{Fields, Value};

/// Per-message metadata kept outside the user field map.
///
/// The timestamp lives here rather than under a field name so it can never
/// collide with user keys and can never be supplied by a node's default fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Provenance {
    /// When the message was normalized, or the timestamp it already carried.
    pub timestamp: Option<DateTime<Utc>>,
}

/// A structured record: user fields plus provenance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Fields,
    provenance: Provenance,
}

impl Record {
    /// An empty record without a timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from fields and provenance.
    #[must_use]
    pub const fn from_parts(fields: Fields, provenance: Provenance) -> Self {
        Self { fields, provenance }
    }

    /// Split into fields and provenance.
    #[must_use]
    pub fn into_parts(self) -> (Fields, Provenance) {
        (self.fields, self.provenance)
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Builder-style timestamp assignment.
    #[must_use]
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.provenance.timestamp = Some(ts);
        self
    }

    /// Insert a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a text field.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// True if the field is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// User fields.
    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Mutable user fields.
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    /// Provenance metadata.
    #[must_use]
    pub const fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// The provenance timestamp, if set.
    #[must_use]
    pub const fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.provenance.timestamp
    }

    /// Overwrite the provenance timestamp.
    pub fn set_timestamp(&mut self, ts: Option<DateTime<Utc>>) {
        self.provenance.timestamp = ts;
    }

    /// Number of user fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when there are no user fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Fields> for Record {
    fn from(fields: Fields) -> Self {
        Self {
            fields,
            provenance: Provenance::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<Fields>(),
        )
    }
}
