//! Outbound HTTP transport shared by the token cache, the Upstash store, and the forwarder.
//!
//! Every client carries an explicit request timeout and a [`RedirectPolicy`] fixed at
//! construction, so a deployment either follows upstream redirects transparently or reports
//! them, never both.

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use reqwest::redirect::Policy;
// self
use crate::{_prelude::*, error::ConfigError};

/// How the forwarder treats upstream 3xx responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectPolicy {
	/// Follow redirects transparently (bounded hop count).
	Follow,
	#[default]
	/// Do not follow; surface the `Location` header as a diagnostic instead.
	Report,
}
impl RedirectPolicy {
	/// Maximum hops followed under [`RedirectPolicy::Follow`].
	pub const FOLLOW_LIMIT: usize = 10;

	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Follow => "follow",
			Self::Report => "report",
		}
	}

	fn to_reqwest(self) -> Policy {
		match self {
			Self::Follow => Policy::limited(Self::FOLLOW_LIMIT),
			Self::Report => Policy::none(),
		}
	}
}
impl Display for RedirectPolicy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for RedirectPolicy {
	type Err = RedirectPolicyParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"follow" => Ok(Self::Follow),
			"report" | "manual" => Ok(Self::Report),
			_ => Err(RedirectPolicyParseError { value: s.to_owned() }),
		}
	}
}

/// Raised when a redirect policy label is unknown.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unknown redirect policy `{value}`; expected `follow` or `report`.")]
pub struct RedirectPolicyParseError {
	/// Rejected input.
	pub value: String,
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	redirects: RedirectPolicy,
}
impl ReqwestHttpClient {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Starts a builder with the default timeout and [`RedirectPolicy::Report`].
	pub fn builder() -> ReqwestHttpClientBuilder {
		ReqwestHttpClientBuilder::default()
	}

	/// Redirect policy the client was built with.
	pub fn redirects(&self) -> RedirectPolicy {
		self.redirects
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}

/// Builder for [`ReqwestHttpClient`].
#[derive(Clone, Debug)]
pub struct ReqwestHttpClientBuilder {
	timeout: StdDuration,
	redirects: RedirectPolicy,
}
impl Default for ReqwestHttpClientBuilder {
	fn default() -> Self {
		Self { timeout: ReqwestHttpClient::DEFAULT_TIMEOUT, redirects: RedirectPolicy::default() }
	}
}
impl ReqwestHttpClientBuilder {
	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the redirect policy.
	pub fn redirects(mut self, redirects: RedirectPolicy) -> Self {
		self.redirects = redirects;

		self
	}

	/// Builds the underlying reqwest client.
	pub fn build(self) -> Result<ReqwestHttpClient, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(self.timeout)
			.redirect(self.redirects.to_reqwest())
			.build()?;

		Ok(ReqwestHttpClient { client, redirects: self.redirects })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn redirect_policy_parses_known_labels() {
		assert_eq!("follow".parse::<RedirectPolicy>(), Ok(RedirectPolicy::Follow));
		assert_eq!(" Report ".parse::<RedirectPolicy>(), Ok(RedirectPolicy::Report));
		assert_eq!("manual".parse::<RedirectPolicy>(), Ok(RedirectPolicy::Report));

		let err = "bounce".parse::<RedirectPolicy>().expect_err("Unknown labels must fail.");

		assert_eq!(err.value, "bounce");
		assert_eq!(RedirectPolicy::default(), RedirectPolicy::Report);
	}

	#[test]
	fn builder_keeps_the_policy() {
		let client = ReqwestHttpClient::builder()
			.redirects(RedirectPolicy::Follow)
			.timeout(StdDuration::from_secs(1))
			.build()
			.expect("Reqwest client should build.");

		assert_eq!(client.redirects(), RedirectPolicy::Follow);
	}
}
