//! Proxy-level error types shared across the token cache, stores, and forwarder.

// self
use crate::{_prelude::*, obs::AcquireKind};

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Key-value store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition exhausted every fallback.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Upstream answered with something the proxy cannot relay as data.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Network(#[from] NetworkError),
}
impl Error {
	/// HTTP status the proxy answers with when this error ends a request.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Upstream(err) => err.status_code(),
			_ => 500,
		}
	}

	/// Short category label used in diagnostic response bodies.
	pub const fn category(&self) -> &'static str {
		match self {
			Self::Storage(_) => "Store Error",
			Self::Config(_) => "Config Error",
			Self::Auth(_) => "Auth Error",
			Self::Upstream(_) => "Upstream Error",
			Self::Network(_) => "Proxy Error",
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Login or password is not configured.
	#[error("Upstream credentials are not configured; set both login and password.")]
	MissingCredentials,
	/// Upstream descriptor failed validation.
	#[error(transparent)]
	InvalidUpstream(#[from] crate::upstream::UpstreamDescriptorError),
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// A store backend setting is missing.
	#[error("Store backend `{backend}` requires `{setting}`.")]
	MissingStoreSetting {
		/// Backend label.
		backend: &'static str,
		/// Missing setting name.
		setting: &'static str,
	},
	/// Inbound structured body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	InvalidRequestBody {
		/// Underlying encoding failure.
		#[source]
		source: serde_json::Error,
	},
	/// A store endpoint cannot be parsed.
	#[error("Store endpoint is invalid.")]
	InvalidStoreEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token acquisition failures that survived the refresh-then-login fallback.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Login endpoint answered with a non-success status.
	#[error("Login failed with status {status}: {preview}")]
	LoginRejected {
		/// HTTP status returned by the login endpoint.
		status: u16,
		/// Bounded preview of the response body.
		preview: String,
	},
	/// Token endpoint answered with a non-success status.
	#[error("The {stage} call failed with status {status}.")]
	TokenRejected {
		/// Call that was rejected.
		stage: AcquireKind,
		/// HTTP status returned by the token endpoint.
		status: u16,
	},
	/// No non-empty token could be extracted from the response.
	#[error("The {stage} response did not contain a token.")]
	MissingToken {
		/// Call whose response lacked a token.
		stage: AcquireKind,
	},
	/// Response body was not valid JSON.
	#[error("The {stage} response is not valid JSON.")]
	MalformedResponse {
		/// Call whose response failed to parse.
		stage: AcquireKind,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Upstream responses that cannot be relayed as-is.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Upstream served an HTML page (documentation or anti-bot block) instead of data.
	#[error("Upstream returned HTML instead of data (status {status}).")]
	HtmlResponse {
		/// Upstream HTTP status.
		status: u16,
		/// Bounded preview of the HTML body.
		preview: String,
	},
	/// Upstream declared JSON but the body does not parse.
	#[error("Upstream returned malformed JSON (status {status}).")]
	MalformedJson {
		/// Upstream HTTP status.
		status: u16,
		/// Bounded preview of the body.
		preview: String,
	},
	/// Upstream redirected while redirects are reported rather than followed.
	#[error("Upstream redirected with status {status}.")]
	Redirect {
		/// Upstream 3xx status.
		status: u16,
		/// `Location` header value, when present.
		location: Option<String>,
	},
}
impl UpstreamError {
	/// Status code relayed to the caller.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::HtmlResponse { status: 404, .. } => 404,
			_ => 502,
		}
	}

	/// Upstream status that triggered the error.
	pub fn upstream_status(&self) -> u16 {
		match self {
			Self::HtmlResponse { status, .. }
			| Self::MalformedJson { status, .. }
			| Self::Redirect { status, .. } => *status,
		}
	}

	/// Body preview attached to the error, if any.
	pub fn preview(&self) -> Option<&str> {
		match self {
			Self::HtmlResponse { preview, .. } | Self::MalformedJson { preview, .. } =>
				Some(preview),
			Self::Redirect { .. } => None,
		}
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error while calling {target}: {source}")]
	Network {
		/// Endpoint being called.
		target: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while proxying.")]
	Io(#[from] std::io::Error),
}
impl NetworkError {
	/// Wraps a transport-specific network error raised while calling `target`.
	pub fn network(
		target: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { target: target.into(), source: Box::new(src) }
	}
}
