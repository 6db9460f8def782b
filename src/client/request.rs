//! Request and response descriptors exchanged with callers.

// std
use std::borrow::Cow;
// crates.io
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	envelope,
	error::ConfigError,
	token::BearerToken,
	transport::{HttpRequest, HttpResponse},
};

/// Replayable description of a backend call.
///
/// The descriptor is owned by the pipeline for the whole life of the call so it can be replayed
/// verbatim after a refresh.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL; may carry a query string.
	pub path: String,
	/// Extra query pairs appended to the path.
	pub query: Vec<(String, String)>,
	/// Caller-supplied headers.
	pub headers: HeaderMap,
	/// Request body, if any.
	pub body: Option<Vec<u8>>,
	pub(crate) retried: bool,
	pub(crate) bearer: Option<BearerToken>,
}
impl ApiRequest {
	/// Creates a request for `method` against `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			retried: false,
			bearer: None,
		}
	}

	/// Creates a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Creates a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Creates a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Creates a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Creates a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Adds a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Sets a JSON body and the matching content type.
	pub fn json<T>(mut self, body: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body).map_err(ConfigError::Body)?);
		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(self)
	}

	/// Whether this request is a replay issued after a refresh.
	pub fn is_retried(&self) -> bool {
		self.retried
	}

	/// Marks the request as a post-refresh replay carrying `token`.
	pub(crate) fn prepare_replay(&mut self, token: &BearerToken) {
		self.retried = true;
		self.bearer = Some(token.clone());
	}

	/// Absolute URL of the request under `config`.
	pub fn resolve(&self, config: &ClientConfig) -> Result<Url, ConfigError> {
		let mut url = config.resolve(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		Ok(url)
	}

	pub(crate) fn to_http(
		&self,
		url: &Url,
		bearer: Option<&BearerToken>,
	) -> Result<HttpRequest, ConfigError> {
		let mut builder = http::Request::builder().method(self.method.clone()).uri(url.as_str());

		if let Some(headers) = builder.headers_mut() {
			headers.extend(self.headers.clone());

			if let Some(token) = bearer {
				headers.insert(http::header::AUTHORIZATION, token.to_header_value());
			}
		}

		Ok(builder.body(self.body.clone().unwrap_or_default())?)
	}
}

/// Successful (status < 400) backend response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Final request URL.
	pub url: Url,
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	pub(crate) fn from_http(url: Url, response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { url, status: parts.status, headers: parts.headers, body }
	}

	/// Decodes the raw body as `T`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		Ok(envelope::decode_json(&self.body)?)
	}

	/// Decodes the body as an [`ApiEnvelope`](crate::envelope::ApiEnvelope) and returns its payload.
	pub fn data<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		Ok(envelope::decode_data(&self.body)?)
	}

	/// Body as text, replacing invalid UTF-8.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_config;

	#[test]
	fn resolve_appends_query_pairs() {
		let request = ApiRequest::get("/api/cafes/nearby").query("lat", 37.5665).query("lng", 126.978);
		let url = request.resolve(&test_config()).expect("Request URL should resolve.");

		assert_eq!(url.as_str(), "http://comeet.test/api/cafes/nearby?lat=37.5665&lng=126.978");
	}

	#[test]
	fn to_http_attaches_bearer_and_body() {
		let request = ApiRequest::post("/api/reviews")
			.json(&serde_json::json!({ "rating": 5 }))
			.expect("JSON body should serialize.");
		let url = request.resolve(&test_config()).expect("Request URL should resolve.");
		let token = BearerToken::new("T1").expect("Fixture token should be valid.");
		let http_request = request.to_http(&url, Some(&token)).expect("Request should build.");

		assert_eq!(http_request.method(), Method::POST);
		assert_eq!(http_request.headers()[http::header::AUTHORIZATION], "Bearer T1");
		assert_eq!(http_request.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(http_request.body(), br#"{"rating":5}"#);
	}

	#[test]
	fn replay_preparation_stamps_retry() {
		let mut request = ApiRequest::get("/user");
		let token = BearerToken::new("T2").expect("Fixture token should be valid.");

		assert!(!request.is_retried());

		request.prepare_replay(&token);

		assert!(request.is_retried());
		assert_eq!(request.bearer, Some(token));
	}
}
