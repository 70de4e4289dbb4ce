//! Validating builder for [`UpstreamDescriptor`].

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, upstream::{BROWSER_USER_AGENT, UpstreamDescriptor}};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum UpstreamDescriptorError {
	/// Origin is not a parseable absolute URL.
	#[error("Upstream origin `{origin}` is not a valid URL.")]
	InvalidOrigin {
		/// Rejected origin.
		origin: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Origin must be plain HTTP(S).
	#[error("Upstream origin must use http or https: {origin}.")]
	UnsupportedScheme {
		/// Rejected origin.
		origin: String,
	},
	/// Origin must not carry a query or fragment; both belong to forwarded requests.
	#[error("Upstream origin must not contain a query or fragment: {origin}.")]
	OriginHasQuery {
		/// Rejected origin.
		origin: String,
	},
	/// The application identifier header is mandatory.
	#[error("Upstream application token is missing.")]
	MissingAppToken,
	/// Endpoint paths must be absolute.
	#[error("Endpoint path `{path}` must start with `/`.")]
	InvalidPath {
		/// Rejected path.
		path: String,
	},
	/// A configured header value contains characters HTTP forbids.
	#[error("The {header} header value is not a valid HTTP header value.")]
	InvalidHeaderValue {
		/// Header whose value failed validation.
		header: &'static str,
	},
}

/// Builder for [`UpstreamDescriptor`] values.
#[derive(Debug)]
pub struct UpstreamDescriptorBuilder {
	/// Origin being configured.
	pub origin: String,
	/// `X-Application` header value.
	pub app_token: Option<String>,
	/// Login endpoint path.
	pub login_path: String,
	/// Token endpoint path.
	pub token_path: String,
	/// Default `Lang` header value.
	pub default_lang: String,
	/// `Accept` header value.
	pub accept: String,
	/// `User-Agent` header value.
	pub user_agent: String,
	/// Browser emulation toggle.
	pub browser_emulation: bool,
}
impl UpstreamDescriptorBuilder {
	/// Default login endpoint path.
	pub const LOGIN_PATH: &'static str = "/profile/login";
	/// Default token endpoint path.
	pub const TOKEN_PATH: &'static str = "/profile/token";
	/// Default `Lang` header value.
	pub const DEFAULT_LANG: &'static str = "ru";
	/// Default `Accept` header value; the catalog negotiates poster formats through it.
	pub const DEFAULT_ACCEPT: &'static str = "image/avif,image/webp";

	/// Creates a new builder seeded with the provided origin.
	pub fn new(origin: impl Into<String>) -> Self {
		Self {
			origin: origin.into(),
			app_token: None,
			login_path: Self::LOGIN_PATH.into(),
			token_path: Self::TOKEN_PATH.into(),
			default_lang: Self::DEFAULT_LANG.into(),
			accept: Self::DEFAULT_ACCEPT.into(),
			user_agent: BROWSER_USER_AGENT.into(),
			browser_emulation: false,
		}
	}

	/// Sets the `X-Application` header value.
	pub fn app_token(mut self, token: impl Into<String>) -> Self {
		self.app_token = Some(token.into());

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the default `Lang` header value.
	pub fn default_lang(mut self, lang: impl Into<String>) -> Self {
		self.default_lang = lang.into();

		self
	}

	/// Toggles browser-emulation headers on forwarded requests.
	pub fn browser_emulation(mut self, enabled: bool) -> Self {
		self.browser_emulation = enabled;

		self
	}

	/// Validates the configuration and produces a descriptor.
	pub fn build(self) -> Result<UpstreamDescriptor, UpstreamDescriptorError> {
		let origin = normalize_origin(&self.origin)?;
		let app_token = self
			.app_token
			.map(|token| token.trim().to_owned())
			.filter(|token| !token.is_empty())
			.ok_or(UpstreamDescriptorError::MissingAppToken)?;

		validate_path(&self.login_path)?;
		validate_path(&self.token_path)?;
		validate_header("X-Application", &app_token)?;
		validate_header("Lang", &self.default_lang)?;
		validate_header("Accept", &self.accept)?;
		validate_header("User-Agent", &self.user_agent)?;

		Ok(UpstreamDescriptor {
			origin,
			app_token,
			login_path: self.login_path,
			token_path: self.token_path,
			default_lang: self.default_lang,
			accept: self.accept,
			user_agent: self.user_agent,
			browser_emulation: self.browser_emulation,
		})
	}
}

fn normalize_origin(origin: &str) -> Result<String, UpstreamDescriptorError> {
	let url = Url::parse(origin.trim()).map_err(|source| {
		UpstreamDescriptorError::InvalidOrigin { origin: origin.to_owned(), source }
	})?;

	if !matches!(url.scheme(), "http" | "https") {
		return Err(UpstreamDescriptorError::UnsupportedScheme { origin: origin.to_owned() });
	}
	if url.query().is_some() || url.fragment().is_some() {
		return Err(UpstreamDescriptorError::OriginHasQuery { origin: origin.to_owned() });
	}

	Ok(url.as_str().trim_end_matches('/').to_owned())
}

fn validate_path(path: &str) -> Result<(), UpstreamDescriptorError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(UpstreamDescriptorError::InvalidPath { path: path.to_owned() })
	}
}

fn validate_header(header: &'static str, value: &str) -> Result<(), UpstreamDescriptorError> {
	HeaderValue::from_str(value)
		.map(|_| ())
		.map_err(|_| UpstreamDescriptorError::InvalidHeaderValue { header })
}
