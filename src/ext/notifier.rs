//! User-facing notification contract.

/// Fire-and-forget sink for messages the user should see (toasts, banners, status lines).
///
/// Implementations must return promptly; the pipeline calls them inline.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Shows a warning (session expiry, connectivity problems).
	fn warning(&self, message: &str);

	/// Shows an error (surfaced application failures).
	fn error(&self, message: &str);
}

/// Default notifier that forwards messages to `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;
impl Notifier for TracingNotifier {
	fn warning(&self, message: &str) {
		tracing::warn!(target: "comeet_http::notify", "{message}");
	}

	fn error(&self, message: &str) {
		tracing::error!(target: "comeet_http::notify", "{message}");
	}
}
