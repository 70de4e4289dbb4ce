#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
use reqwest::{
	Method,
	header::{HeaderMap, HeaderValue},
};
use serde_json::json;
// self
use catalog_proxy::{
	_preludet::*,
	auth,
	http::RedirectPolicy,
	proxy::{ErrorBody, ProxyRequest},
	store::{KvStore, MemoryStore},
	upstream::{BROWSER_ACCEPT_LANGUAGE, PREVIEW_LIMIT},
};

async fn seed_token(store: &MemoryStore) {
	let expires_at = OffsetDateTime::now_utc() + Duration::hours(12);

	store.set("token", "cached".into()).await.expect("Seeding the token should succeed.");
	store
		.set("token_expiry", auth::to_millis(expires_at).to_string())
		.await
		.expect("Seeding the expiry should succeed.");
}

fn diagnostic(body: &Bytes) -> ErrorBody {
	serde_json::from_slice(body).expect("Diagnostic body should be JSON.")
}

#[tokio::test]
async fn forwards_stripped_path_query_and_static_headers() {
	let server = MockServer::start_async().await;
	let catalog = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/anime/123/reviews")
				.query_param("limit", "5")
				.query_param("q", "a b")
				.header("authorization", "Bearer cached")
				.header("x-application", TEST_APP_TOKEN)
				.header("lang", "ru")
				.header("accept", "image/avif,image/webp");
			then.status(200).json_body(json!({ "response": [] }));
		})
		.await;
	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let request =
		ProxyRequest::new(Method::GET, "/api/anime/123/reviews").with_query("limit=5&q=a%20b");
	let response = forwarder.forward(request).await;

	assert_eq!(response.status, 200);
	assert_eq!(response.body, Bytes::from_static(br#"{"response":[]}"#));

	catalog.assert_calls_async(1).await;
}

#[tokio::test]
async fn inbound_lang_overrides_the_default_and_emulation_is_off() {
	let server = MockServer::start_async().await;
	let catalog = server
		.mock_async(|when, then| {
			when.method(GET).path("/anime").header("lang", "en");
			then.status(200).json_body(json!({ "ok": true }));
		})
		.await;
	let emulated = server
		.mock_async(|when, then| {
			when.method(GET).path("/anime").header("accept-language", BROWSER_ACCEPT_LANGUAGE);
			then.status(500);
		})
		.await;
	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);
	let mut headers = HeaderMap::new();

	headers.insert("lang", HeaderValue::from_static("en"));
	seed_token(&store).await;

	let response =
		forwarder.forward(ProxyRequest::new(Method::GET, "/api/anime").with_headers(headers)).await;

	assert_eq!(response.status, 200);

	catalog.assert_calls_async(1).await;
	emulated.assert_calls_async(0).await;
}

#[tokio::test]
async fn upstream_json_errors_keep_their_status_and_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/profile/me");
			then.status(403)
				.header("content-type", "application/json; charset=utf-8")
				.body(r#"{"error":"forbidden","code":403}"#);
		})
		.await;

	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let response = forwarder.forward(ProxyRequest::new(Method::GET, "/api/profile/me")).await;

	assert_eq!(response.status, 403);
	assert_eq!(response.body, Bytes::from_static(br#"{"error":"forbidden","code":403}"#));
	assert_eq!(response.content_type.as_deref(), Some("application/json; charset=utf-8"));
}

#[tokio::test]
async fn structured_bodies_are_sent_as_json() {
	let server = MockServer::start_async().await;
	let catalog = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/anime/7/rate")
				.header("content-type", "application/json")
				.json_body(json!({ "rating": 9 }));
			then.status(201).json_body(json!({ "saved": true }));
		})
		.await;
	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let request =
		ProxyRequest::new(Method::POST, "/api/anime/7/rate").with_body(json!({ "rating": 9 }));
	let response = forwarder.forward(request).await;

	assert_eq!(response.status, 201);

	catalog.assert_calls_async(1).await;
}

#[tokio::test]
async fn html_pages_become_bounded_diagnostics() {
	let server = MockServer::start_async().await;
	let page = format!("<html><body>{}</body></html>", "blocked ".repeat(200));

	server
		.mock_async(|when, then| {
			when.method(GET).path("/anime");
			then.status(200).header("content-type", "text/html; charset=utf-8").body(&page);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/missing");
			then.status(404).header("content-type", "text/html").body("<html>Not Found</html>");
		})
		.await;

	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let blocked = forwarder.forward(ProxyRequest::new(Method::GET, "/api/anime")).await;
	let body = diagnostic(&blocked.body);

	assert_eq!(blocked.status, 502);
	assert_eq!(blocked.content_type.as_deref(), Some("application/json"));
	assert_eq!(body.error, "Upstream Error");
	assert_eq!(body.status, Some(200));
	assert_eq!(body.preview.map(|preview| preview.chars().count()), Some(PREVIEW_LIMIT));

	let missing = forwarder.forward(ProxyRequest::new(Method::GET, "/api/missing")).await;

	assert_eq!(missing.status, 404);
	assert_eq!(diagnostic(&missing.body).preview.as_deref(), Some("<html>Not Found</html>"));
}

#[tokio::test]
async fn redirects_are_reported_or_followed_per_policy() {
	let server = MockServer::start_async().await;
	let target = server.url("/anime/new");

	server
		.mock_async(|when, then| {
			when.method(GET).path("/anime/old");
			then.status(302).header("location", &target);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/anime/new");
			then.status(200).json_body(json!({ "moved": true }));
		})
		.await;

	let (reporting, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let reported = reporting.forward(ProxyRequest::new(Method::GET, "/api/anime/old")).await;
	let body = diagnostic(&reported.body);

	assert_eq!(reported.status, 502);
	assert_eq!(body.status, Some(302));
	assert_eq!(body.location.as_deref(), Some(target.as_str()));

	let (following, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Follow);

	seed_token(&store).await;

	let followed = following.forward(ProxyRequest::new(Method::GET, "/api/anime/old")).await;

	assert_eq!(followed.status, 200);
	assert_eq!(followed.body, Bytes::from_static(br#"{"moved":true}"#));
}

#[tokio::test]
async fn non_json_bodies_pass_through_raw() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/posters/1.webp");
			then.status(200).header("content-type", "image/webp").body(b"RIFF\x00\x01WEBP");
		})
		.await;

	let (forwarder, store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);

	seed_token(&store).await;

	let response = forwarder.forward(ProxyRequest::new(Method::GET, "/api/posters/1.webp")).await;

	assert_eq!(response.status, 200);
	assert_eq!(response.content_type.as_deref(), Some("image/webp"));
	assert_eq!(response.body, Bytes::from_static(b"RIFF\x00\x01WEBP"));
}

#[tokio::test]
async fn auth_failure_short_circuits_the_upstream_call() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/profile/login");
			then.status(401).body("denied");
		})
		.await;

	let catalog = server
		.mock_async(|when, then| {
			when.method(GET).path("/anime");
			then.status(200).json_body(json!({}));
		})
		.await;
	let (forwarder, _store) = build_test_forwarder(&server.base_url(), RedirectPolicy::Report);
	let response = forwarder.forward(ProxyRequest::new(Method::GET, "/api/anime")).await;
	let body = diagnostic(&response.body);

	assert_eq!(response.status, 500);
	assert_eq!(body.error, "Auth Error");
	assert!(body.message.contains("401"));

	catalog.assert_calls_async(0).await;
}

#[tokio::test]
async fn connection_failures_become_internal_errors() {
	let (forwarder, store) = build_test_forwarder("http://127.0.0.1:1", RedirectPolicy::Report);

	seed_token(&store).await;

	let response = forwarder.forward(ProxyRequest::new(Method::GET, "/api/anime")).await;
	let body = diagnostic(&response.body);

	assert_eq!(response.status, 500);
	assert_eq!(body.error, "Proxy Error");
	assert!(body.message.contains("http://127.0.0.1:1/anime"));
}
