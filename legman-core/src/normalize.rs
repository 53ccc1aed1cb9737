use chrono::{DateTime, Utc};
use legman_types::{Fields, LegmanError, Message, Provenance, Record, Value, keys};

/// Wrap a raw message into a record, without defaults and without stamping a timestamp.
///
/// - blob: `{ msg: <blob> }` (no `loglevel`)
/// - error: own fields, then `{ loglevel: "error", msg, name, stack }` on top
/// - text: `{ loglevel: "log", msg: <text> }`
/// - record: unchanged, provenance included
/// - JSON: objects are records, strings are text, anything else is malformed
///
/// # Errors
/// Returns `LegmanError::Malformed` for JSON documents that are neither an object
/// nor a string.
pub fn coerce(message: Message) -> Result<Record, LegmanError> {
    match message {
        Message::Blob(blob) => Ok(Record::new().with(keys::MSG, Value::Bytes(blob))),
        Message::Error(err) => {
            let mut fields = err.fields;
            fields.insert(keys::LOGLEVEL.into(), keys::LEVEL_ERROR.into());
            fields.insert(keys::MSG.into(), err.message.into());
            fields.insert(keys::NAME.into(), err.name.into());
            fields.insert(keys::STACK.into(), err.stack.into());
            Ok(Record::from(fields))
        }
        Message::Text(text) => Ok(Record::new()
            .with(keys::LOGLEVEL, keys::LEVEL_LOG)
            .with(keys::MSG, text)),
        Message::Record(record) => Ok(record),
        Message::Json(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Message::Json(serde_json::Value::String(text)) => coerce(Message::Text(text)),
        Message::Json(other) => Err(LegmanError::malformed(format!(
            "unsupported JSON message shape: {}",
            json_kind(&other)
        ))),
        // `Message` is non_exhaustive; no current variant reaches this arm.
        _ => Err(LegmanError::malformed("unsupported message variant")),
    }
}

/// Normalize a raw message into a canonical record.
///
/// The result is `defaults ⊕ coerce(message)`, with message keys winning over
/// defaults. The provenance timestamp is the one the message already carried,
/// or `now`. Defaults are plain fields and can never supply a timestamp.
///
/// # Errors
/// Propagates `LegmanError::Malformed` from [`coerce`].
pub fn normalize(
    message: Message,
    defaults: &Fields,
    now: DateTime<Utc>,
) -> Result<Record, LegmanError> {
    let (fields, provenance) = coerce(message)?.into_parts();
    let mut merged = defaults.clone();
    merged.extend(fields);
    let timestamp = provenance.timestamp.unwrap_or(now);
    Ok(Record::from_parts(
        merged,
        Provenance {
            timestamp: Some(timestamp),
        },
    ))
}

const fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
