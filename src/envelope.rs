//! Typed decoding of backend response bodies.
//!
//! The backend wraps payloads as `{ "data": ..., "message": ... }`. Callers choose explicitly
//! between decoding the raw body ([`decode_json`]) and unwrapping the envelope
//! ([`decode_data`]); decode failures carry the JSON path that did not match.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Standard response envelope returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
	/// Payload, absent for bodiless acknowledgements.
	pub data: Option<T>,
	/// Human-readable message supplied by the backend.
	#[serde(default)]
	pub message: Option<String>,
}

/// Failures raised while decoding response bodies.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body is not valid JSON for the requested type.
	#[error("Response body is malformed at `{path}`.")]
	Json {
		/// JSON path where decoding stopped.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Envelope decoded but carried no `data` field.
	#[error("Response envelope is missing its data field.")]
	MissingData,
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Json { path, source: e.into_inner() }
	}
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
	#[serde(default)]
	message: Option<String>,
}

/// Decodes `body` as `T` without unwrapping any envelope.
pub fn decode_json<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	Ok(serde_path_to_error::deserialize(&mut de)?)
}

/// Decodes `body` as an [`ApiEnvelope`] and returns its payload.
pub fn decode_data<T>(body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	decode_json::<ApiEnvelope<T>>(body)?.data.ok_or(DecodeError::MissingData)
}

/// Extracts a server-supplied error message (`message` or `error.message`), if any.
pub fn server_message(body: &[u8]) -> Option<String> {
	let parsed: ErrorBody = serde_json::from_slice(body).ok()?;

	parsed
		.message
		.or_else(|| parsed.error.and_then(|detail| detail.message))
		.filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Debug, PartialEq, Deserialize)]
	struct Cafe {
		id: u64,
		name: String,
	}

	#[test]
	fn data_unwraps_envelope() {
		let cafe: Cafe = decode_data(br#"{"data":{"id":7,"name":"Fritz"},"message":"ok"}"#)
			.expect("Envelope payload should decode.");

		assert_eq!(cafe, Cafe { id: 7, name: "Fritz".into() });
	}

	#[test]
	fn missing_data_is_reported() {
		let err = decode_data::<Cafe>(br#"{"message":"ok"}"#)
			.expect_err("Envelope without data should fail.");

		assert!(matches!(err, DecodeError::MissingData));
	}

	#[test]
	fn json_errors_carry_path() {
		let err = decode_data::<Vec<Cafe>>(br#"{"data":[{"id":1,"name":"A"},{"id":"x","name":"B"}]}"#)
			.expect_err("Mistyped field should fail.");

		match err {
			DecodeError::Json { path, .. } => assert_eq!(path, "data[1].id"),
			other => panic!("Unexpected decode error: {other:?}"),
		}
	}

	#[test]
	fn server_message_prefers_top_level() {
		assert_eq!(
			server_message(br#"{"message":"Nickname taken.","error":{"message":"dup"}}"#),
			Some("Nickname taken.".into())
		);
		assert_eq!(server_message(br#"{"error":{"message":"dup"}}"#), Some("dup".into()));
		assert_eq!(server_message(br#"{"message":" "}"#), None);
		assert_eq!(server_message(b"<html>502</html>"), None);
	}
}
