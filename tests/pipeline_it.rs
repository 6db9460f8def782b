// crates.io
use httpmock::prelude::*;
// self
use comeet_http::{
	_preludet::*,
	classify::{self, NetworkKind},
	client::{ApiRequest, ReqwestApiClient},
	config::ClientConfig,
	error::NetworkError,
	store::{MemoryStore, TokenStore},
	token::BearerToken,
};

#[derive(Debug, PartialEq, Deserialize)]
struct Profile {
	id: u64,
	nickname: String,
}

fn build_client(
	base_url: &str,
	timeout: Duration,
	token: Option<&str>,
) -> (ReqwestApiClient, Arc<MemoryStore>, Arc<RecordingNotifier>) {
	let config = ClientConfig::builder(Url::parse(base_url).expect("Base URL should parse."))
		.timeout(timeout)
		.build()
		.expect("Client configuration should be valid.");
	let store = Arc::new(MemoryStore::default());

	if let Some(value) = token {
		store
			.set(&BearerToken::new(value).expect("Seed token should be valid."))
			.expect("Memory store should accept the seed token.");
	}

	let notifier = Arc::new(RecordingNotifier::default());
	let client = ReqwestApiClient::new(config, store.clone())
		.expect("Reqwest transport should build.")
		.with_notifier(notifier.clone());

	(client, store, notifier)
}

#[tokio::test]
async fn bearer_is_attached_and_rotated_token_is_adopted() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/members/me").header("authorization", "Bearer T1");
			then.status(200)
				.header("content-type", "application/json")
				.header("authorization", "Bearer T2")
				.body("{\"data\":{\"id\":7,\"nickname\":\"latte\"},\"message\":null}");
		})
		.await;
	let (client, store, notifier) =
		build_client(&server.base_url(), Duration::seconds(5), Some("T1"));
	let profile: Profile =
		client.fetch_data("/api/members/me").await.expect("Profile fetch should succeed.");

	assert_eq!(profile, Profile { id: 7, nickname: "latte".into() });
	assert_eq!(store.get().map(|token| token.expose().to_owned()).as_deref(), Some("T2"));
	assert!(notifier.errors().is_empty());

	mock.assert_async().await;
}

#[tokio::test]
async fn application_error_surfaces_server_message() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/reviews/3");
			then.status(403)
				.header("content-type", "application/json")
				.body("{\"message\":\"Only the author can delete this review.\"}");
		})
		.await;
	let (client, _, notifier) =
		build_client(&server.base_url(), Duration::seconds(5), Some("T1"));
	let err = client
		.send(ApiRequest::delete("/api/reviews/3"))
		.await
		.expect_err("Forbidden responses should fail.");

	match err {
		Error::Application { status, message, .. } => {
			assert_eq!(status, 403);
			assert_eq!(message.as_deref(), Some("Only the author can delete this review."));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(notifier.errors(), ["Only the author can delete this review."]);

	mock.assert_async().await;
}

#[tokio::test]
async fn application_error_without_message_uses_status_text() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cafes/404");
			then.status(404);
		})
		.await;
	let (client, _, notifier) = build_client(&server.base_url(), Duration::seconds(5), None);
	let err = client
		.send(ApiRequest::get("/api/cafes/404"))
		.await
		.expect_err("Missing resources should fail.");

	assert_eq!(err.status(), Some(404));
	assert_eq!(notifier.errors(), [classify::status_message(404)]);

	mock.assert_async().await;
}

#[tokio::test]
async fn slow_backend_times_out() {
	let server = MockServer::start_async().await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/cafes");
			then.status(200).delay(std::time::Duration::from_millis(800)).body("{}");
		})
		.await;

	let (client, _, notifier) =
		build_client(&server.base_url(), Duration::milliseconds(100), Some("T1"));
	let err = client.send(ApiRequest::get("/api/cafes")).await.expect_err("Call should time out.");

	assert!(matches!(err, Error::Network(NetworkError::Timeout { .. })));
	assert_eq!(notifier.warnings(), [classify::network_message(NetworkKind::Timeout)]);
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_failure() {
	let (client, store, notifier) =
		build_client("http://127.0.0.1:9", Duration::seconds(5), Some("T1"));
	let err =
		client.send(ApiRequest::get("/api/cafes")).await.expect_err("Call should not connect.");

	assert!(matches!(err, Error::Network(NetworkError::Connection { .. })));
	assert_eq!(notifier.warnings(), [classify::network_message(NetworkKind::Connection)]);
	assert!(store.get().is_some());
}
