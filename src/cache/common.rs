//! Request helpers shared by the login, refresh, and session calls.

// crates.io
use reqwest::{
	Method, RequestBuilder, StatusCode,
	header::{HeaderMap, SET_COOKIE, USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	error::{AuthError, NetworkError},
	obs::AcquireKind,
};

/// Status, session cookies, and raw body of an auth endpoint response.
pub(crate) struct AuthReply {
	pub(crate) status: StatusCode,
	pub(crate) cookies: Option<String>,
	pub(crate) body: Bytes,
}
impl AuthReply {
	/// Parses the body as JSON, attributing failures to `stage`.
	pub(crate) fn json(&self, stage: AcquireKind) -> Result<Value, AuthError> {
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| AuthError::MalformedResponse { stage, source })
	}
}

impl TokenCache {
	/// Starts an auth request carrying the application identifier and browser user agent.
	pub(crate) fn auth_request(&self, method: Method, url: &str) -> RequestBuilder {
		self.http_client
			.request(method, url)
			.header("X-Application", &self.upstream.app_token)
			.header(USER_AGENT, &self.upstream.user_agent)
	}

	/// Sends an auth request and buffers the response.
	pub(crate) async fn send_auth(&self, request: RequestBuilder, url: &str) -> Result<AuthReply> {
		let response = request.send().await.map_err(|e| NetworkError::network(url, e))?;
		let status = response.status();
		let cookies = session_cookies(response.headers());
		let body = response.bytes().await.map_err(|e| NetworkError::network(url, e))?;

		Ok(AuthReply { status, cookies, body })
	}
}

/// Folds every `Set-Cookie` header into a single `Cookie` request header value.
pub(crate) fn session_cookies(headers: &HeaderMap) -> Option<String> {
	let pairs = headers
		.get_all(SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.filter_map(|raw| raw.split(';').next())
		.map(str::trim)
		.filter(|pair| pair.contains('='))
		.collect::<Vec<_>>();

	(!pairs.is_empty()).then(|| pairs.join("; "))
}
