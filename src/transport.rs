//! Transport primitives for the authenticated pipeline.
//!
//! The module exposes [`HttpTransport`], the pipeline's only dependency on an HTTP stack, along
//! with the [`HttpRequest`]/[`HttpResponse`] aliases it speaks. Implementations report failures
//! where no response was received as [`TransportError`]; any HTTP status (including 4xx/5xx) is
//! a successful transport call and is classified further up.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Outbound request handed to a transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Response produced by a transport.
pub type HttpResponse = http::Response<Vec<u8>>;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Abstraction over HTTP stacks capable of executing pipeline requests.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back a shared
/// client, and the futures they return must be `Send` so callers can drive them from any
/// executor thread. The pipeline applies its own timeout around every call; transports may
/// enforce a tighter one and report it as [`TransportError::Timeout`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request`, returning the backend response regardless of its status.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Transport-level failures where no response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The transport gave up waiting for the backend.
	#[error("Transport timed out.")]
	Timeout,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Whether the failure is a timeout rather than a connection problem.
	pub fn is_timeout(&self) -> bool {
		match self {
			Self::Timeout => true,
			Self::Io(e) => e.kind() == std::io::ErrorKind::TimedOut,
			Self::Network { .. } => false,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::new`] enables the cookie store, which carries the backend's refresh
/// cookie on the refresh call. Clients passed to [`ReqwestTransport::with_client`] should do the
/// same when the backend relies on cookie credentials.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie-enabled reqwest client.
	pub fn new() -> Result<Self> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let request = reqwest::Request::try_from(request)?;
			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn io_timeouts_count_as_timeouts() {
		let timed_out = TransportError::from(std::io::Error::from(std::io::ErrorKind::TimedOut));
		let refused =
			TransportError::from(std::io::Error::from(std::io::ErrorKind::ConnectionRefused));

		assert!(TransportError::Timeout.is_timeout());
		assert!(timed_out.is_timeout());
		assert!(!refused.is_timeout());
		assert!(!TransportError::network(std::fmt::Error).is_timeout());
	}
}
