//! Authenticated HTTP core for the Comeet client: bearer injection, token rotation, and a
//! single-flight refresh coordinator that replays queued requests once a new token lands.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod classify;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ext;
pub mod obs;
pub mod store;
pub mod token;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use tokio::sync::Notify;
	// self
	use crate::{
		client::ApiClient,
		config::ClientConfig,
		ext::{Notifier, SessionFuture, SessionListener},
		store::{MemoryStore, TokenStore},
		token::BearerToken,
		transport::{HttpRequest, HttpResponse, HttpTransport, TransportError, TransportFuture},
	};

	/// Base URL used by the scripted transport fixtures.
	pub const TEST_BASE_URL: &str = "http://comeet.test";

	/// Notifier that records every message so tests can assert on user-facing output.
	#[derive(Debug, Default)]
	pub struct RecordingNotifier {
		warnings: Mutex<Vec<String>>,
		errors: Mutex<Vec<String>>,
	}
	impl RecordingNotifier {
		/// Returns the recorded warning messages.
		pub fn warnings(&self) -> Vec<String> {
			self.warnings.lock().clone()
		}

		/// Returns the recorded error messages.
		pub fn errors(&self) -> Vec<String> {
			self.errors.lock().clone()
		}
	}
	impl Notifier for RecordingNotifier {
		fn warning(&self, message: &str) {
			self.warnings.lock().push(message.to_owned());
		}

		fn error(&self, message: &str) {
			self.errors.lock().push(message.to_owned());
		}
	}

	/// Session listener that counts clear/redirect requests.
	#[derive(Debug, Default)]
	pub struct RecordingSession {
		cleared: Arc<AtomicUsize>,
		cleared_signal: Arc<Notify>,
		redirects: Mutex<Vec<String>>,
	}
	impl RecordingSession {
		/// Number of completed session-clear futures.
		pub fn cleared(&self) -> usize {
			self.cleared.load(Ordering::SeqCst)
		}

		/// Waits until at least one session-clear future has completed.
		pub async fn wait_cleared(&self) {
			loop {
				let notified = self.cleared_signal.notified();

				if self.cleared() > 0 {
					return;
				}

				notified.await;
			}
		}

		/// Login paths passed to [`SessionListener::redirect_to_login`].
		pub fn redirects(&self) -> Vec<String> {
			self.redirects.lock().clone()
		}
	}
	impl SessionListener for RecordingSession {
		fn clear_session(&self) -> SessionFuture {
			let cleared = self.cleared.clone();
			let signal = self.cleared_signal.clone();

			Box::pin(async move {
				cleared.fetch_add(1, Ordering::SeqCst);
				signal.notify_waiters();
			})
		}

		fn redirect_to_login(&self, login_path: &str) {
			self.redirects.lock().push(login_path.to_owned());
		}
	}

	type Responder =
		Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

	/// In-process transport that answers through a closure and records every request.
	///
	/// Requests whose path equals the gated path park until [`ScriptedTransport::open_gate`] is
	/// called, so tests can hold a refresh call in flight deterministically.
	pub struct ScriptedTransport {
		responder: Responder,
		log: Mutex<VecDeque<HttpRequest>>,
		gate: Option<(String, Arc<Notify>)>,
		gated_arrivals: Arc<Notify>,
	}
	impl ScriptedTransport {
		/// Builds a transport answering every request through `responder`.
		pub fn new<F>(responder: F) -> Self
		where
			F: 'static + Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
		{
			Self {
				responder: Box::new(responder),
				log: Default::default(),
				gate: None,
				gated_arrivals: Default::default(),
			}
		}

		/// Holds requests to `path` until the gate opens.
		pub fn gated(mut self, path: &str) -> Self {
			self.gate = Some((path.to_owned(), Arc::new(Notify::new())));

			self
		}

		/// Releases every request parked at the gate.
		pub fn open_gate(&self) {
			if let Some((_, notify)) = &self.gate {
				notify.notify_one();
			}
		}

		/// Resolves once a request reaches the gate.
		pub async fn gate_reached(&self) {
			self.gated_arrivals.notified().await;
		}

		/// Snapshot of every request observed so far.
		pub fn requests(&self) -> Vec<HttpRequest> {
			self.log.lock().iter().cloned().collect()
		}

		/// Number of observed requests whose path equals `path`.
		pub fn calls_to(&self, path: &str) -> usize {
			self.log.lock().iter().filter(|request| request.uri().path() == path).count()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				self.log.lock().push_back(request.clone());

				if let Some((path, notify)) = &self.gate {
					if request.uri().path() == path {
						self.gated_arrivals.notify_one();
						notify.notified().await;
					}
				}

				(self.responder)(&request)
			})
		}
	}

	/// Builds a plain response with the given status and optional `Authorization` header.
	pub fn response(status: u16, authorization: Option<&str>, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() =
			http::StatusCode::from_u16(status).expect("Test status code should be valid.");

		if let Some(value) = authorization {
			response.headers_mut().insert(
				http::header::AUTHORIZATION,
				value.parse().expect("Test authorization header should be valid."),
			);
		}

		response
	}

	/// Returns the bearer token carried by a recorded request, if any.
	pub fn bearer_of(request: &HttpRequest) -> Option<String> {
		request
			.headers()
			.get(http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.map(str::to_owned)
	}

	/// Fixture bundle returned by [`build_scripted_client`].
	pub struct ScriptedFixture {
		/// Client under test.
		pub client: ApiClient<ScriptedTransport>,
		/// Shared transport handle.
		pub transport: Arc<ScriptedTransport>,
		/// Token store seeded by the fixture.
		pub store: Arc<MemoryStore>,
		/// Recorded notifications.
		pub notifier: Arc<RecordingNotifier>,
		/// Recorded session callbacks.
		pub session: Arc<RecordingSession>,
	}

	/// Wires a client around a scripted transport, a memory store seeded with `token`, and
	/// recording hooks.
	pub fn build_scripted_client(
		transport: ScriptedTransport,
		token: Option<&str>,
		config: ClientConfig,
	) -> ScriptedFixture {
		let transport = Arc::new(transport);
		let store = Arc::new(MemoryStore::default());

		if let Some(value) = token {
			let token = BearerToken::new(value).expect("Fixture token should be valid.");

			store.set(&token).expect("Memory store writes should succeed.");
		}

		let notifier = Arc::new(RecordingNotifier::default());
		let session = Arc::new(RecordingSession::default());
		let client = ApiClient::with_transport(config, transport.clone(), store.clone())
			.with_notifier(notifier.clone())
			.with_session_listener(session.clone());

		ScriptedFixture { client, transport, store, notifier, session }
	}

	/// Default configuration pointing at [`TEST_BASE_URL`].
	pub fn test_config() -> ClientConfig {
		ClientConfig::builder(Url::parse(TEST_BASE_URL).expect("Test base URL should parse."))
			.build()
			.expect("Default test configuration should be valid.")
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
