//! Reverse-proxy forwarding with bearer-token injection.
//!
//! [`Forwarder::forward`] never fails: token, transport, and upstream-shape problems are all
//! rendered as JSON diagnostics through [`ProxyResponse::from_error`].

mod request;
mod response;

pub use request::*;
pub use response::*;

// crates.io
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
// self
use crate::{
	_prelude::*,
	cache::TokenCache,
	error::{ConfigError, NetworkError},
	http::ReqwestHttpClient,
	upstream::{self, UpstreamDescriptor},
};

/// Rewrites inbound requests onto the upstream and relays the answer.
#[derive(Clone, Debug)]
pub struct Forwarder {
	/// Token source shared with every request.
	pub cache: Arc<TokenCache>,
	/// Upstream origin and static headers.
	pub upstream: Arc<UpstreamDescriptor>,
	/// Client used for forwarded calls; its redirect policy applies.
	pub http_client: ReqwestHttpClient,
	/// Prefix removed from inbound paths.
	pub route_prefix: RoutePrefix,
}
impl Forwarder {
	/// Creates a forwarder mounted at the root.
	pub fn new(
		cache: Arc<TokenCache>,
		upstream: Arc<UpstreamDescriptor>,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self { cache, upstream, http_client, route_prefix: RoutePrefix::default() }
	}

	/// Sets the prefix stripped from inbound paths.
	pub fn with_route_prefix(mut self, route_prefix: RoutePrefix) -> Self {
		self.route_prefix = route_prefix;

		self
	}

	/// Forwards `request`, converting every failure into a diagnostic response.
	pub async fn forward(&self, request: ProxyRequest) -> ProxyResponse {
		let method = request.method.clone();
		let path = request.path.clone();

		match self.try_forward(request).await {
			Ok(response) => response,
			Err(e) => {
				if matches!(e, Error::Upstream(_)) {
					tracing::warn!(%method, %path, error = %e, "Upstream response rejected.");
				} else {
					tracing::error!(%method, %path, error = %e, "Proxy request failed.");
				}

				ProxyResponse::from_error(&e)
			},
		}
	}

	/// Forwards `request`, returning failures as errors.
	pub async fn try_forward(&self, request: ProxyRequest) -> Result<ProxyResponse> {
		let path = self.route_prefix.strip(&request.path);
		let url = request::upstream_url(&self.upstream, path, request.query.as_deref());

		tracing::debug!(method = %request.method, %url, "Forwarding request.");

		let token = self.cache.valid_token().await?;
		let lang = request.lang().unwrap_or(&self.upstream.default_lang).to_owned();
		let mut builder = self
			.http_client
			.request(request.method.clone(), &url)
			.header(AUTHORIZATION, token.bearer())
			.header("X-Application", &self.upstream.app_token)
			.header("Lang", lang)
			.header(ACCEPT, &self.upstream.accept);

		if self.upstream.browser_emulation {
			builder = builder
				.header(USER_AGENT, &self.upstream.user_agent)
				.header(ACCEPT_LANGUAGE, upstream::BROWSER_ACCEPT_LANGUAGE);
		}
		if request.carries_body() && !request.body.is_empty() {
			let body = request
				.body
				.into_bytes()
				.map_err(|source| ConfigError::InvalidRequestBody { source })?;

			builder = builder.header(CONTENT_TYPE, ProxyResponse::JSON).body(body);
		}

		let response = builder.send().await.map_err(|e| NetworkError::network(&url, e))?;
		let status = response.status();
		let headers = response.headers().clone();
		let body = response.bytes().await.map_err(|e| NetworkError::network(&url, e))?;

		response::classify(status, &headers, body)
	}
}
