//! The authenticated API client and its request pipeline.
//!
//! [`ApiClient`] owns the transport, the token store, the collaborator hooks, and one
//! [`RefreshCoordinator`]. Independent clients never share refresh state, which keeps tests and
//! multi-account embeddings isolated.

mod pipeline;
pub mod refresh;
pub mod request;

pub use refresh::*;
pub use request::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	ext::{NoopSessionListener, Notifier, SessionExpired, SessionListener, TracingNotifier},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::TokenStore,
	transport::HttpTransport,
};
#[cfg(feature = "reqwest")] use crate::transport::ReqwestTransport;

/// Boxed future returned by [`ApiClient::send`].
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestTransport>;

/// Authenticated client for the Comeet backend.
pub struct ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Configuration the pipeline runs under.
	pub config: ClientConfig,
	/// Transport used for every outbound call.
	pub transport: Arc<T>,
	/// Holder of the current bearer token.
	pub store: Arc<dyn TokenStore>,
	/// Sink for user-facing messages.
	pub notifier: Arc<dyn Notifier>,
	/// Application session torn down on terminal refresh failures.
	pub session: Arc<dyn SessionListener>,
	/// Counters for the refresh protocol.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
	last_expiry: Arc<Mutex<Option<SessionExpired>>>,
}
impl<T> ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client around a caller-provided transport.
	///
	/// Notifications default to [`TracingNotifier`] and session teardown to
	/// [`NoopSessionListener`].
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		store: Arc<dyn TokenStore>,
	) -> Self {
		let coordinator = Arc::new(RefreshCoordinator::new(config.queue_capacity));

		Self {
			config,
			transport: transport.into(),
			store,
			notifier: Arc::new(TracingNotifier),
			session: Arc::new(NoopSessionListener),
			refresh_metrics: Default::default(),
			coordinator,
			last_expiry: Default::default(),
		}
	}

	/// Replaces the notification sink.
	pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = notifier;

		self
	}

	/// Replaces the session listener.
	pub fn with_session_listener(mut self, session: Arc<dyn SessionListener>) -> Self {
		self.session = session;

		self
	}

	/// Current refresh phase.
	pub fn refresh_phase(&self) -> RefreshPhase {
		self.coordinator.phase()
	}

	/// Most recent terminal refresh failure, if the session has expired since creation.
	pub fn last_session_expiry(&self) -> Option<SessionExpired> {
		self.last_expiry.lock().clone()
	}

	/// Sends `request` through the pipeline.
	///
	/// A first 401 is absorbed by the refresh protocol: the caller sees either the outcome of
	/// the replayed request or a terminal [`AuthError`](crate::error::AuthError).
	pub fn send(&self, request: ApiRequest) -> ClientFuture<'_, ApiResponse> {
		let kind = if request.is_retried() { CallKind::Replay } else { CallKind::Request };
		let span = CallSpan::new(kind, "send");

		Box::pin(span.instrument(async move {
			obs::record_call_outcome(kind, CallOutcome::Attempt);

			let result = self.dispatch(request).await;

			match &result {
				Ok(_) => obs::record_call_outcome(kind, CallOutcome::Success),
				Err(_) => obs::record_call_outcome(kind, CallOutcome::Failure),
			}

			result
		}))
	}

	/// Sends a `GET` for `path` and decodes the enveloped payload.
	pub async fn fetch_data<D>(&self, path: &str) -> Result<D>
	where
		D: DeserializeOwned,
	{
		self.send(ApiRequest::get(path)).await?.data()
	}

	/// Logs out: notifies the backend, then forgets the token and clears the session.
	///
	/// Local state is cleared even when the backend call fails; that failure is still returned.
	pub async fn logout(&self) -> Result<()> {
		let result = self.send(ApiRequest::post(self.config.logout_path.clone())).await;

		if let Err(e) = self.store.remove() {
			tracing::warn!(error = %e, "Failed to remove the token during logout.");
		}

		self.session.clear_session().await;

		result.map(|_| ())
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestTransport> {
	/// Creates a client with its own cookie-enabled reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
		Ok(Self::with_transport(config, ReqwestTransport::new()?, store))
	}
}
impl<T> Clone for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			store: self.store.clone(),
			notifier: self.notifier.clone(),
			session: self.session.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
			last_expiry: self.last_expiry.clone(),
		}
	}
}
impl<T> Debug for ApiClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("config", &self.config)
			.field("refresh_phase", &self.coordinator.phase())
			.field("token_held", &self.store.get().is_some())
			.finish()
	}
}
