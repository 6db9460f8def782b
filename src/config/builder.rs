// self
use crate::{
	_prelude::*,
	config::{
		ClientConfig, DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_QUEUE_CAPACITY,
		DEFAULT_REFRESH_PATH, DEFAULT_TIMEOUT,
	},
};

/// Errors raised while constructing or validating client configurations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Base URL must use HTTP or HTTPS.
	#[error("Base URL must use http or https: {url}.")]
	InvalidBaseUrl {
		/// Base URL that failed validation.
		url: String,
	},
	/// Timeout must be positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// The refresh wait queue must admit at least one waiter.
	#[error("Refresh queue capacity must be at least 1.")]
	ZeroQueueCapacity,
	/// Endpoint paths must be absolute.
	#[error("The {endpoint} path must start with `/`: {path}.")]
	RelativePath {
		/// Which path failed validation.
		endpoint: &'static str,
		/// Path that failed validation.
		path: String,
	},
	/// A required environment variable is absent.
	#[error("Environment variable {name} is not set.")]
	MissingVariable {
		/// Variable name.
		name: &'static str,
	},
	/// An environment variable could not be parsed.
	#[error("Environment variable {name} has an invalid value: {value}.")]
	InvalidVariable {
		/// Variable name.
		name: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend base URL.
	pub base_url: Url,
	/// Per-call timeout.
	pub timeout: Duration,
	/// Refresh wait-queue capacity.
	pub queue_capacity: usize,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Login entry point.
	pub login_path: String,
	/// Extra refresh-exempt URL substrings (the refresh and logout paths are always exempt).
	pub extra_exempt: Vec<String>,
	/// Extra silent URL substrings (the refresh path is always silent).
	pub extra_silent: Vec<String>,
}
impl ClientConfigBuilder {
	/// Creates a new builder seeded with defaults.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			timeout: DEFAULT_TIMEOUT,
			queue_capacity: DEFAULT_QUEUE_CAPACITY,
			refresh_path: DEFAULT_REFRESH_PATH.into(),
			logout_path: DEFAULT_LOGOUT_PATH.into(),
			login_path: DEFAULT_LOGIN_PATH.into(),
			extra_exempt: Vec::new(),
			extra_silent: Vec::new(),
		}
	}

	/// Overrides the per-call timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the refresh wait-queue capacity.
	pub fn queue_capacity(mut self, capacity: usize) -> Self {
		self.queue_capacity = capacity;

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the login entry point.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Adds a URL substring whose 401s never trigger a refresh.
	pub fn exempt(mut self, needle: impl Into<String>) -> Self {
		self.extra_exempt.push(needle.into());

		self
	}

	/// Adds a URL substring whose application errors are not surfaced (e.g. benign 404s).
	pub fn silence(mut self, needle: impl Into<String>) -> Self {
		self.extra_silent.push(needle.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base()
		{
			return Err(ClientConfigError::InvalidBaseUrl { url: self.base_url.to_string() });
		}
		if !self.timeout.is_positive() {
			return Err(ClientConfigError::NonPositiveTimeout);
		}
		if self.queue_capacity == 0 {
			return Err(ClientConfigError::ZeroQueueCapacity);
		}

		for (endpoint, path) in [
			("refresh", &self.refresh_path),
			("logout", &self.logout_path),
			("login", &self.login_path),
		] {
			if !path.starts_with('/') {
				return Err(ClientConfigError::RelativePath { endpoint, path: path.clone() });
			}
		}

		let mut refresh_exempt = vec![self.refresh_path.clone(), self.logout_path.clone()];

		refresh_exempt.extend(self.extra_exempt);

		let mut silent = vec![self.refresh_path.clone()];

		silent.extend(self.extra_silent);

		Ok(ClientConfig {
			base_url: self.base_url,
			timeout: self.timeout,
			queue_capacity: self.queue_capacity,
			refresh_path: self.refresh_path,
			logout_path: self.logout_path,
			login_path: self.login_path,
			refresh_exempt,
			silent,
		})
	}
}
