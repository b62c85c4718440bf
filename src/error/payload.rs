//! Conversion of remote error payloads into [`Error`] values.
//!
//! The remote identity service answers failures in one of two shapes:
//!
//! - a JSON:API-style envelope, `{"errors": [{"title": "NoPermissionError", "detail": "...",
//!   "meta": {"help": "...", "context": "..."}}, ...]}`;
//! - a single error object, either the service's own (`{"errorType": "ValidationError",
//!   "message": "..."}`) or an RFC 6749 body (`{"error": "invalid_client", "error_description":
//!   "..."}`).
//!
//! The envelope is only considered when its `errors` field is present and holds a non-empty
//! array; the first entry is the representative error. Everything here is pure and never fails:
//! undecodable input becomes [`ErrorKind::MalformedResponse`].

// self
use crate::_prelude::*;

const NAME_FIELDS: &[&str] = &["errorType", "name", "title", "error"];
const MESSAGE_FIELDS: &[&str] = &["detail", "message", "error_description"];
const STATUS_FIELDS: &[&str] = &["statusCode", "status"];

/// Decodes a raw remote error payload into its representative [`Error`].
pub fn deserialize(raw: &str) -> Error {
	deserialize_with_status(raw, None)
}

/// Same as [`deserialize`], using `status` to classify payloads that carry neither an error
/// name nor a status field of their own.
pub fn deserialize_with_status(raw: &str, status: Option<u16>) -> Error {
	let value = match serde_json::from_str::<Value>(raw) {
		Ok(value) => value,
		Err(e) => return Error::malformed_response(raw).with_source(e),
	};

	match envelope_entries(&value).and_then(|entries| entries.first()) {
		Some(entry) => deserialize_entry(entry, raw, status),
		None => deserialize_entry(&value, raw, status),
	}
}

/// Decodes every error carried by a raw remote payload.
///
/// Returns one error per envelope entry, or a single error for any other payload.
pub fn deserialize_all(raw: &str) -> Vec<Error> {
	let value = match serde_json::from_str::<Value>(raw) {
		Ok(value) => value,
		Err(e) => return vec![Error::malformed_response(raw).with_source(e)],
	};

	match envelope_entries(&value) {
		Some(entries) => entries.iter().map(|entry| deserialize_entry(entry, raw, None)).collect(),
		None => vec![deserialize_entry(&value, raw, None)],
	}
}

fn envelope_entries(value: &Value) -> Option<&Vec<Value>> {
	value.get("errors").and_then(Value::as_array).filter(|entries| !entries.is_empty())
}

fn deserialize_entry(entry: &Value, raw: &str, fallback_status: Option<u16>) -> Error {
	let Some(object) = entry.as_object() else {
		let message = entry
			.as_str()
			.map(str::to_owned)
			.unwrap_or_else(|| ErrorKind::InternalServerError.default_message().to_owned());

		return Error::new(ErrorKind::InternalServerError, message).with_context(raw);
	};
	let meta = object.get("meta").and_then(Value::as_object);
	let name = first_text(object, NAME_FIELDS)
		.or_else(|| meta.and_then(|meta| first_text(meta, &["errorType"])));
	let kind = match name.as_deref() {
		Some(name) => ErrorKind::from_name(name).unwrap_or(ErrorKind::InternalServerError),
		None => status_of(object)
			.or(fallback_status)
			.and_then(ErrorKind::from_status)
			.unwrap_or(ErrorKind::InternalServerError),
	};
	let message =
		first_text(object, MESSAGE_FIELDS).unwrap_or_else(|| kind.default_message().to_owned());
	let mut err = Error::new(kind, message);

	if let Some(help) =
		first_text(object, &["help"]).or_else(|| meta.and_then(|meta| first_text(meta, &["help"])))
	{
		err = err.with_help(help);
	}
	if let Some(context) = first_text(object, &["context"])
		.or_else(|| meta.and_then(|meta| first_text(meta, &["context"])))
	{
		err = err.with_context(context);
	}

	err
}

fn first_text(object: &Map<String, Value>, fields: &[&str]) -> Option<String> {
	fields.iter().find_map(|field| object.get(*field).and_then(text))
}

fn text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) if s.trim().is_empty() => None,
		Value::String(s) => Some(s.clone()),
		other => Some(other.to_string()),
	}
}

fn status_of(object: &Map<String, Value>) -> Option<u16> {
	STATUS_FIELDS.iter().find_map(|field| match object.get(*field)? {
		Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	})
}
