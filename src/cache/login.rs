//! Full login with the configured credentials, plus the session-cookie follow-up used when
//! the login response only reports success.

// crates.io
use reqwest::{Method, header::COOKIE};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	cache::TokenCache,
	error::{AuthError, ConfigError},
	obs::{self, AcquireKind, AcquireOutcome, AcquireSpan},
	upstream,
};

impl TokenCache {
	/// Posts the credentials to the login endpoint and extracts a token from the reply.
	pub async fn login(&self) -> Result<TokenSecret> {
		const KIND: AcquireKind = AcquireKind::Login;

		let credentials = self.credentials.as_ref().ok_or(ConfigError::MissingCredentials)?;
		let span = AcquireSpan::new(KIND, "login");

		obs::record_acquisition(KIND, AcquireOutcome::Attempt);
		self.metrics.record_login();

		let result = span
			.instrument(async move {
				let url = self.upstream.login_url();
				let request = self.auth_request(Method::POST, &url).json(&credentials.login_body());
				let reply = self.send_auth(request, &url).await?;

				if !reply.status.is_success() {
					return Err(Error::from(AuthError::LoginRejected {
						status: reply.status.as_u16(),
						preview: upstream::body_preview(&reply.body),
					}));
				}

				let body = reply.json(KIND)?;

				if let Some(token) = self.extractor.extract_token(&body) {
					return Ok(TokenSecret::new(token));
				}
				if !self.extractor.indicates_success(&body) {
					return Err(Error::from(AuthError::MissingToken { stage: KIND }));
				}

				let cookie = reply.cookies.ok_or(AuthError::MissingToken { stage: KIND })?;

				tracing::debug!("Login succeeded without a token; trying the session cookie.");

				self.session_token(&cookie).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_acquisition(KIND, AcquireOutcome::Success),
			Err(_) => obs::record_acquisition(KIND, AcquireOutcome::Failure),
		}

		result
	}

	async fn session_token(&self, cookie: &str) -> Result<TokenSecret> {
		const KIND: AcquireKind = AcquireKind::Session;

		obs::record_acquisition(KIND, AcquireOutcome::Attempt);

		let url = self.upstream.token_url();
		let request = self.auth_request(Method::GET, &url).header(COOKIE, cookie);
		let result = async {
			let reply = self.send_auth(request, &url).await?;

			if !reply.status.is_success() {
				return Err(Error::from(AuthError::TokenRejected {
					stage: KIND,
					status: reply.status.as_u16(),
				}));
			}

			let body = reply.json(KIND)?;
			let token =
				self.extractor.extract_token(&body).ok_or(AuthError::MissingToken { stage: KIND })?;

			Ok(TokenSecret::new(token))
		}
		.await;

		match &result {
			Ok(_) => obs::record_acquisition(KIND, AcquireOutcome::Success),
			Err(_) => obs::record_acquisition(KIND, AcquireOutcome::Failure),
		}

		result
	}
}
