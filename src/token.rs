//! Bearer token wrapper that redacts sensitive material.

// crates.io
use http::HeaderValue;
// self
use crate::_prelude::*;

const SCHEME: &str = "Bearer";

/// Errors raised when a raw string cannot serve as a bearer token.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenError {
	/// Token is empty after trimming the scheme prefix.
	#[error("Bearer token must not be empty.")]
	Empty,
	/// Token contains characters that cannot travel in an HTTP header.
	#[error("Bearer token contains characters that are not valid in an HTTP header.")]
	InvalidCharacters,
}

/// Opaque bearer credential issued by the backend at login or refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a raw token after validation.
	pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
		let value = value.into();

		if value.trim().is_empty() {
			return Err(TokenError::Empty);
		}
		if value.chars().any(|c| c.is_whitespace() || c.is_control() || !c.is_ascii()) {
			return Err(TokenError::InvalidCharacters);
		}

		Ok(Self(value))
	}

	/// Parses a scheme-prefixed header value (`Bearer <token>`) into a token.
	///
	/// Values without the prefix are accepted verbatim, matching backends that rotate tokens with
	/// a bare value. A bare scheme with no credential is [`TokenError::Empty`].
	pub fn from_header_value(value: &HeaderValue) -> Result<Self, TokenError> {
		let raw = value.to_str().map_err(|_| TokenError::InvalidCharacters)?.trim();
		let credential = match raw.strip_prefix(SCHEME) {
			Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) =>
				rest.trim_start(),
			_ => raw,
		};

		Self::new(credential)
	}

	/// Renders the `Authorization` header value for this token.
	pub fn to_header_value(&self) -> HeaderValue {
		let mut value = HeaderValue::try_from(format!("{SCHEME} {}", self.0))
			.unwrap_or_else(|_| HeaderValue::from_static(SCHEME));

		value.set_sensitive(true);

		value
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl TryFrom<String> for BearerToken {
	type Error = TokenError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<BearerToken> for String {
	fn from(value: BearerToken) -> Self {
		value.0
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
