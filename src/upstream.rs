//! Upstream API description: origin, auth endpoints, static headers, and token extraction.
//!
//! The descriptor is validated once at build time so the forwarder and token cache can
//! assume every header value it carries is well formed.

pub mod builder;
pub mod extract;

pub use builder::*;
pub use extract::*;

// self
use crate::_prelude::*;

/// Browser `User-Agent` sent on auth calls and, when emulation is on, on forwarded calls.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// `Accept-Language` added to forwarded requests when browser emulation is on.
pub const BROWSER_ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7";

/// Maximum number of characters of an upstream body echoed back in diagnostics.
pub const PREVIEW_LIMIT: usize = 500;

/// Returns at most [`PREVIEW_LIMIT`] characters of `body`, decoded lossily as UTF-8.
pub fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(PREVIEW_LIMIT).collect()
}

/// Immutable upstream descriptor consumed by the token cache and the forwarder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamDescriptor {
	/// Scheme + authority (+ optional base path) without a trailing slash.
	pub origin: String,
	/// Value of the `X-Application` header identifying this client to the upstream.
	pub app_token: String,
	/// Path of the credential login endpoint.
	pub login_path: String,
	/// Path of the token refresh / session token endpoint.
	pub token_path: String,
	/// `Lang` header value used when the inbound request does not carry one.
	pub default_lang: String,
	/// `Accept` header value sent on forwarded requests.
	pub accept: String,
	/// `User-Agent` used for auth calls and browser emulation.
	pub user_agent: String,
	/// Adds browser-like headers to forwarded requests.
	pub browser_emulation: bool,
}
impl UpstreamDescriptor {
	/// Creates a new builder for the provided origin.
	pub fn builder(origin: impl Into<String>) -> UpstreamDescriptorBuilder {
		UpstreamDescriptorBuilder::new(origin)
	}

	/// Joins the origin with an already formed path (and query), byte-for-byte.
	pub fn url_for(&self, path_and_query: &str) -> String {
		format!("{}{path_and_query}", self.origin)
	}

	/// Absolute login endpoint URL.
	pub fn login_url(&self) -> String {
		self.url_for(&self.login_path)
	}

	/// Absolute token endpoint URL.
	pub fn token_url(&self) -> String {
		self.url_for(&self.token_path)
	}
}
