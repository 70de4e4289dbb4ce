//! Lightweight refresh: `GET <token_path>` authorized by the previous token.

// crates.io
use reqwest::{Method, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	cache::TokenCache,
	error::AuthError,
	obs::{self, AcquireKind, AcquireOutcome, AcquireSpan},
};

impl TokenCache {
	/// Exchanges `previous` for a new token without sending credentials.
	///
	/// Any failure is returned to the caller, which falls back to a full login.
	pub async fn refresh(&self, previous: &TokenSecret) -> Result<TokenSecret> {
		const KIND: AcquireKind = AcquireKind::Refresh;

		let span = AcquireSpan::new(KIND, "refresh");

		obs::record_acquisition(KIND, AcquireOutcome::Attempt);
		self.metrics.record_refresh();

		let result = span
			.instrument(async move {
				let url = self.upstream.token_url();
				let request = self
					.auth_request(Method::GET, &url)
					.header(AUTHORIZATION, previous.bearer());
				let reply = self.send_auth(request, &url).await?;

				if !reply.status.is_success() {
					return Err(Error::from(AuthError::TokenRejected {
						stage: KIND,
						status: reply.status.as_u16(),
					}));
				}

				let body = reply.json(KIND)?;
				let token = self
					.extractor
					.extract_token(&body)
					.ok_or(AuthError::MissingToken { stage: KIND })?;

				Ok(TokenSecret::new(token))
			})
			.await;

		match &result {
			Ok(_) => obs::record_acquisition(KIND, AcquireOutcome::Success),
			Err(_) => obs::record_acquisition(KIND, AcquireOutcome::Failure),
		}

		result
	}
}
