//! Request/response interception shared by every call.
//!
//! Outbound, the current token is attached as a bearer header. Inbound, successful responses may
//! rotate the token, and failures are classified: network problems and application errors are
//! surfaced and returned, a first 401 hands the request to the refresh protocol.

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	classify::{self, Classification, Failure, NetworkKind, UNAUTHORIZED},
	client::{ApiClient, ApiRequest, ApiResponse},
	envelope,
	error::{AuthError, NetworkError},
	token::BearerToken,
	transport::{HttpRequest, HttpResponse, HttpTransport, TransportError},
};

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		let url = request.resolve(&self.config)?;
		let outbound = self.authorize(&request, &url)?;
		let response = match self.transmit(outbound).await {
			Ok(response) if response.status().as_u16() < 400 => {
				self.rotate_from(&response);

				return Ok(ApiResponse::from_http(url, response));
			},
			Ok(response) => response,
			Err(e) => {
				let kind = match classify::classify(Failure::Transport(&e), request.is_retried()) {
					Classification::Network(kind) => kind,
					_ => NetworkKind::Connection,
				};

				return Err(self.surface_network(url, kind, e));
			},
		};
		let status = response.status().as_u16();

		match classify::classify(Failure::Status(status), request.is_retried()) {
			Classification::AuthExpired => self.recover(request, url).await,
			_ if status == UNAUTHORIZED => Err(self.surface_retry_rejected(url)),
			_ => Err(self.surface_application(url, status, response.body())),
		}
	}

	/// Outbound hook: renders the request, attaching the replay token or the stored token.
	pub(crate) fn authorize(&self, request: &ApiRequest, url: &Url) -> Result<HttpRequest> {
		let token = request.bearer.clone().or_else(|| self.store.get());

		Ok(request.to_http(url, token.as_ref())?)
	}

	/// Runs one transport call under the configured timeout.
	pub(crate) async fn transmit(
		&self,
		request: HttpRequest,
	) -> std::result::Result<HttpResponse, TransportError> {
		tokio::time::timeout(self.config.timeout.unsigned_abs(), self.transport.execute(request))
			.await
			.unwrap_or(Err(TransportError::Timeout))
	}

	/// Inbound success hook: adopts a rotated token when the response carries one.
	pub(crate) fn rotate_from(&self, response: &HttpResponse) {
		let Some(value) = response.headers().get(AUTHORIZATION) else {
			return;
		};

		match BearerToken::from_header_value(value) {
			Ok(token) =>
				if let Err(e) = self.store.set(&token) {
					tracing::warn!(error = %e, "Failed to store the rotated token.");
				} else {
					tracing::debug!("Adopted a rotated token from the response headers.");
				},
			Err(e) => tracing::debug!(error = %e, "Ignored an unusable rotated token header."),
		}
	}

	pub(crate) fn network_error(url: Url, kind: NetworkKind, source: TransportError) -> Error {
		let url = url.to_string();

		match kind {
			NetworkKind::Timeout => NetworkError::Timeout { url },
			NetworkKind::Connection => NetworkError::Connection { url, source },
		}
		.into()
	}

	fn surface_network(&self, url: Url, kind: NetworkKind, source: TransportError) -> Error {
		tracing::warn!(%url, error = %source, "Request failed without a response.");
		self.notifier.warning(classify::network_message(kind));

		Self::network_error(url, kind, source)
	}

	fn surface_retry_rejected(&self, url: Url) -> Error {
		tracing::warn!(%url, "Request was rejected again after the session refresh.");

		if !self.config.is_silent(url.as_str()) {
			self.notifier.error(classify::status_message(UNAUTHORIZED));
		}

		AuthError::RetryRejected { url: url.to_string() }.into()
	}

	fn surface_application(&self, url: Url, status: u16, body: &[u8]) -> Error {
		let message = envelope::server_message(body);

		tracing::debug!(%url, status, "Request failed with an application error.");

		if !self.config.is_silent(url.as_str()) {
			self.notifier
				.error(message.as_deref().unwrap_or_else(|| classify::status_message(status)));
		}

		Error::Application { status, url: url.to_string(), message }
	}
}
