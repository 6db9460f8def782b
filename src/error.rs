//! Client-level error types shared across the pipeline, the refresh coordinator, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response was received from the backend.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Terminal authentication failure; the caller must sign in again.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Response body did not match the expected envelope.
	#[error(transparent)]
	Decode(#[from] crate::envelope::DecodeError),

	/// Backend answered with a 4xx/5xx status.
	#[error("Request to {url} failed with status {status}.")]
	Application {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Request URL.
		url: String,
		/// Server-supplied message extracted from the body, if any.
		message: Option<String>,
	},
	/// The refresh wait queue is full.
	#[error("Too many requests are waiting for the session refresh (capacity {capacity}).")]
	Capacity {
		/// Configured wait-queue capacity.
		capacity: usize,
	},
}
impl Error {
	/// Returns the HTTP status associated with the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Application { status, .. } => Some(*status),
			Self::Auth(AuthError::RetryRejected { .. }) => Some(401),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Request path could not be joined onto the base URL.
	#[error("Request path `{path}` is invalid.")]
	InvalidPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[source] serde_json::Error),
	/// Client configuration failed validation.
	#[error(transparent)]
	Client(#[from] crate::config::ClientConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures where the backend never produced a response.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// The call exceeded the configured timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Request URL.
		url: String,
	},
	/// The connection failed before a response arrived.
	#[error("Request to {url} could not reach the server.")]
	Connection {
		/// Request URL.
		url: String,
		/// Transport-specific failure.
		#[source]
		source: crate::transport::TransportError,
	},
}

/// Terminal authentication failures returned once refresh cannot or did not help.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// The request was rejected and no session token is held.
	#[error("Request to {url} requires authentication and no session token is held.")]
	MissingToken {
		/// Request URL.
		url: String,
	},
	/// The endpoint never triggers a refresh (refresh and logout calls).
	#[error("Request to {url} was rejected and the endpoint is exempt from session refresh.")]
	Exempt {
		/// Request URL.
		url: String,
	},
	/// The request was already replayed once after a refresh and was rejected again.
	#[error("Request to {url} was rejected again after the session refresh.")]
	RetryRejected {
		/// Request URL.
		url: String,
	},
	/// The refresh call failed; every waiter observes the same failure.
	#[error("Session refresh failed.")]
	RefreshFailed {
		/// Failure reported by the refresh call.
		#[source]
		source: Arc<Error>,
	},
	/// The refresh call succeeded without returning a rotated token.
	#[error("Refresh response did not carry a rotated token.")]
	MissingRotatedToken,
	/// The refresh in flight was dropped before it settled.
	#[error("Session refresh was abandoned before it settled.")]
	RefreshAbandoned,
}
