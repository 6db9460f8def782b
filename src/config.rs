//! Client configuration: backend location, timeouts, refresh policy, and URL allow-lists.
//!
//! Configurations are assembled through [`ClientConfigBuilder`], which validates every knob,
//! or loaded from `COMEET_*` environment variables via [`ClientConfig::from_env`].

/// Builder API and validation errors for client configurations.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Default per-call timeout applied to every transport call, including refresh.
pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);
/// Default bound on the number of requests queued behind an in-flight refresh.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
/// Default path of the token refresh endpoint.
pub const DEFAULT_REFRESH_PATH: &str = "/api/auth/reissue";
/// Default path of the logout endpoint.
pub const DEFAULT_LOGOUT_PATH: &str = "/api/auth/logout";
/// Default login entry point used for redirects after the session expires.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "COMEET_API_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "COMEET_API_TIMEOUT_MS";
/// Environment variable holding the refresh wait-queue capacity.
pub const ENV_QUEUE_CAPACITY: &str = "COMEET_REFRESH_QUEUE_CAPACITY";

/// Immutable client configuration consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Backend base URL that request paths are joined onto.
	pub base_url: Url,
	/// Per-call timeout.
	pub timeout: Duration,
	/// Maximum number of requests waiting on an in-flight refresh.
	pub queue_capacity: usize,
	/// Path of the token refresh endpoint.
	pub refresh_path: String,
	/// Path of the logout endpoint.
	pub logout_path: String,
	/// Login entry point handed to the session listener on terminal failures.
	pub login_path: String,
	/// URL substrings whose 401s never trigger a refresh.
	pub refresh_exempt: Vec<String>,
	/// URL substrings whose application errors are not surfaced to the user.
	pub silent: Vec<String>,
}
impl ClientConfig {
	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ClientConfigBuilder {
		ClientConfigBuilder::new(base_url)
	}

	/// Loads a configuration from the process environment.
	pub fn from_env() -> Result<Self, ClientConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Loads a configuration through `lookup`, which maps `COMEET_*` keys to values.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw_base = lookup(ENV_BASE_URL)
			.ok_or(ClientConfigError::MissingVariable { name: ENV_BASE_URL })?;
		let base_url = Url::parse(&raw_base)
			.map_err(|_| ClientConfigError::InvalidBaseUrl { url: raw_base.clone() })?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
			let millis = raw.trim().parse::<i64>().map_err(|_| {
				ClientConfigError::InvalidVariable { name: ENV_TIMEOUT_MS, value: raw.clone() }
			})?;

			builder = builder.timeout(Duration::milliseconds(millis));
		}
		if let Some(raw) = lookup(ENV_QUEUE_CAPACITY) {
			let capacity = raw.trim().parse::<usize>().map_err(|_| {
				ClientConfigError::InvalidVariable { name: ENV_QUEUE_CAPACITY, value: raw.clone() }
			})?;

			builder = builder.queue_capacity(capacity);
		}

		builder.build()
	}

	/// Whether a 401 from `url` must skip the refresh protocol.
	pub fn is_refresh_exempt(&self, url: &str) -> bool {
		self.refresh_exempt.iter().any(|needle| url.contains(needle.as_str()))
	}

	/// Whether application errors from `url` stay out of user notifications.
	pub fn is_silent(&self, url: &str) -> bool {
		self.silent.iter().any(|needle| url.contains(needle.as_str()))
	}

	/// Joins `path` (optionally carrying a query string) onto the base URL.
	pub fn resolve(&self, path: &str) -> Result<Url, crate::error::ConfigError> {
		self.base_url.join(path).map_err(|source| crate::error::ConfigError::InvalidPath {
			path: path.to_owned(),
			source,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn lookup_from(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<&'static str, &'static str> = pairs.iter().copied().collect();

		move |key: &str| map.get(key).map(|value| (*value).to_owned())
	}

	#[test]
	fn defaults_cover_refresh_and_logout() {
		let config = ClientConfig::builder(Url::parse("https://api.comeet.kr").unwrap())
			.build()
			.expect("Default configuration should be valid.");

		assert_eq!(config.timeout, DEFAULT_TIMEOUT);
		assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
		assert!(config.is_refresh_exempt("https://api.comeet.kr/api/auth/reissue"));
		assert!(config.is_refresh_exempt("https://api.comeet.kr/api/auth/logout"));
		assert!(!config.is_refresh_exempt("https://api.comeet.kr/api/cafes"));
		assert!(config.is_silent("https://api.comeet.kr/api/auth/reissue"));
		assert!(!config.is_silent("https://api.comeet.kr/api/cafes"));
	}

	#[test]
	fn resolve_joins_paths_and_queries() {
		let config = ClientConfig::builder(Url::parse("http://localhost:8080").unwrap())
			.build()
			.expect("Default configuration should be valid.");
		let url = config.resolve("/api/cafes?lat=37.5&lng=126.9").expect("Path should resolve.");

		assert_eq!(url.as_str(), "http://localhost:8080/api/cafes?lat=37.5&lng=126.9");
	}

	#[test]
	fn lookup_reads_overrides() {
		let config = ClientConfig::from_lookup(lookup_from(&[
			(ENV_BASE_URL, "http://localhost:8080"),
			(ENV_TIMEOUT_MS, "10000"),
			(ENV_QUEUE_CAPACITY, "3"),
		]))
		.expect("Lookup configuration should be valid.");

		assert_eq!(config.timeout, Duration::seconds(10));
		assert_eq!(config.queue_capacity, 3);
	}

	#[test]
	fn lookup_rejects_missing_and_malformed_values() {
		assert_eq!(
			ClientConfig::from_lookup(lookup_from(&[])),
			Err(ClientConfigError::MissingVariable { name: ENV_BASE_URL })
		);
		assert_eq!(
			ClientConfig::from_lookup(lookup_from(&[
				(ENV_BASE_URL, "http://localhost:8080"),
				(ENV_TIMEOUT_MS, "soon"),
			])),
			Err(ClientConfigError::InvalidVariable { name: ENV_TIMEOUT_MS, value: "soon".into() })
		);
		assert_eq!(
			ClientConfig::from_lookup(lookup_from(&[(ENV_BASE_URL, "not a url")])),
			Err(ClientConfigError::InvalidBaseUrl { url: "not a url".into() })
		);
	}
}
