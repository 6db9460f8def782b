//! Single-flight token refresh with a bounded waiter queue.
//!
//! A first 401 enters [`ApiClient::recover`]. Requests without a held token, and requests to
//! refresh-exempt endpoints, fail immediately. Otherwise the coordinator decides atomically
//! whether the caller leads a new refresh or queues behind the one in flight. The leader issues
//! exactly one refresh call, returns the coordinator to idle, then either resumes every waiter
//! with a replay carrying the rotated token, or rejects them all with the same shared error and
//! tears the session down once.

mod metrics;
mod queue;

pub use metrics::RefreshMetrics;
pub use queue::{RefreshCoordinator, RefreshPhase};

// crates.io
use http::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	classify::{self, Classification, Failure, NetworkKind},
	client::{ApiClient, ApiRequest, ApiResponse},
	envelope,
	error::AuthError,
	ext::SessionExpired,
	obs::{self, CallKind, CallOutcome, CallSpan},
	token::BearerToken,
	transport::HttpTransport,
};
use queue::{Entry, Flight};

/// Warning shown once per terminal refresh failure.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Absorbs a first 401 for `request`, returning its replayed outcome or a terminal error.
	pub(crate) async fn recover(&self, request: ApiRequest, url: Url) -> Result<ApiResponse> {
		if self.store.get().is_none() {
			return Err(AuthError::MissingToken { url: url.to_string() }.into());
		}
		if self.config.is_refresh_exempt(url.as_str()) {
			return Err(AuthError::Exempt { url: url.to_string() }.into());
		}

		let entry = self.coordinator.enter(request.clone()).inspect_err(|_| {
			self.refresh_metrics.record_rejected();
			tracing::warn!(%url, "Refresh wait queue is full; rejecting the request.");
		})?;

		match entry {
			Entry::Lead(flight) => self.lead_refresh(flight, request).await,
			Entry::Wait(settlement) => {
				self.refresh_metrics.record_queued();
				tracing::debug!(%url, "Waiting on the refresh in flight.");

				match settlement.await {
					Ok(Ok(replay)) => self.send(replay).await,
					Ok(Err(source)) => Err(AuthError::RefreshFailed { source }.into()),
					Err(_) => Err(AuthError::RefreshAbandoned.into()),
				}
			},
		}
	}

	async fn lead_refresh(
		&self,
		flight: Flight<'_>,
		mut request: ApiRequest,
	) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Refresh;

		request.retried = true;

		self.refresh_metrics.record_attempt();
		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let outcome = CallSpan::new(KIND, "refresh").instrument(self.refresh_token()).await;
		let waiters = flight.settle();

		match outcome {
			Ok(token) => {
				self.refresh_metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
				tracing::debug!(waiters = waiters.len(), "Session refreshed; replaying requests.");

				waiters.resolve_all(&token);
				request.prepare_replay(&token);

				self.send(request).await
			},
			Err(e) => {
				self.refresh_metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);
				tracing::warn!(error = %e, waiters = waiters.len(), "Session refresh failed.");

				let source = Arc::new(e);

				waiters.reject_all(&source);
				self.expire_session(&source);

				Err(AuthError::RefreshFailed { source }.into())
			},
		}
	}

	/// Issues the refresh call and stores the rotated token.
	///
	/// The call bypasses the failure hook: it never surfaces notifications of its own and never
	/// re-enters the refresh protocol.
	async fn refresh_token(&self) -> Result<BearerToken> {
		let request = ApiRequest::post(self.config.refresh_path.clone());
		let url = request.resolve(&self.config)?;
		let outbound = self.authorize(&request, &url)?;
		let response = match self.transmit(outbound).await {
			Ok(response) => response,
			Err(e) => {
				let kind = match classify::classify(Failure::Transport(&e), false) {
					Classification::Network(kind) => kind,
					_ => NetworkKind::Connection,
				};

				return Err(Self::network_error(url, kind, e));
			},
		};

		if !response.status().is_success() {
			return Err(Error::Application {
				status: response.status().as_u16(),
				url: url.to_string(),
				message: envelope::server_message(response.body()),
			});
		}

		let token = response
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| BearerToken::from_header_value(value).ok())
			.ok_or(AuthError::MissingRotatedToken)?;

		if let Err(e) = self.store.set(&token) {
			tracing::warn!(error = %e, "Failed to store the refreshed token.");
		}

		Ok(token)
	}

	fn expire_session(&self, reason: &Error) {
		if let Err(e) = self.store.remove() {
			tracing::warn!(error = %e, "Failed to remove the expired token.");
		}

		self.notifier.warning(SESSION_EXPIRED_MESSAGE);

		*self.last_expiry.lock() =
			Some(SessionExpired { at: OffsetDateTime::now_utc(), reason: reason.to_string() });

		let clear = self.session.clear_session();

		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(clear);
			},
			Err(_) => tracing::warn!("No async runtime is available; skipped the session clear."),
		}

		self.session.redirect_to_login(&self.config.login_path);
	}
}
