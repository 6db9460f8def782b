//! Session teardown contract invoked when the refresh protocol gives up.

// self
use crate::_prelude::*;

/// Boxed future returned by [`SessionListener::clear_session`].
pub type SessionFuture = Pin<Box<dyn Future<Output = ()> + 'static + Send>>;

/// Application-level session state that must follow the client's logged-out state.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// Returns a future that clears logged-in application state.
	///
	/// On session expiry the client spawns the future without awaiting it, so it must own
	/// everything it touches. [`ApiClient::logout`](crate::client::ApiClient::logout) awaits it.
	fn clear_session(&self) -> SessionFuture;

	/// Sends the user agent to the login entry point.
	fn redirect_to_login(&self, login_path: &str);
}

/// Listener that does nothing; used when the embedding application has no session state.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionListener;
impl SessionListener for NoopSessionListener {
	fn clear_session(&self) -> SessionFuture {
		Box::pin(async {})
	}

	fn redirect_to_login(&self, login_path: &str) {
		tracing::debug!(login_path, "Session expired; no listener is registered for redirects.");
	}
}

/// Terminal-failure record kept by the client for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionExpired {
	/// Instant the refresh failure was observed.
	pub at: OffsetDateTime,
	/// Rendered refresh failure.
	pub reason: String,
}
