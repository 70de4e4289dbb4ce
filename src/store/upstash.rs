//! [`KvStore`] backed by an Upstash-compatible Redis REST endpoint.
//!
//! Commands are posted as JSON arrays (`["GET", key]`, `["SET", key, value]`) to the base
//! URL with a bearer token; the endpoint answers `{"result": ...}` or `{"error": "..."}`.

// crates.io
use reqwest::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	http::ReqwestHttpClient,
	store::{KvStore, StoreError, StoreFuture},
};

#[derive(Debug, Deserialize)]
struct CommandReply {
	#[serde(default)]
	result: Value,
	#[serde(default)]
	error: Option<String>,
}

/// Redis REST client speaking the Upstash command protocol.
#[derive(Clone, Debug)]
pub struct UpstashStore {
	endpoint: Url,
	token: TokenSecret,
	http_client: ReqwestHttpClient,
}
impl UpstashStore {
	/// Creates a store for `endpoint` authorized by `token`.
	pub fn new(endpoint: Url, token: impl Into<String>, http_client: ReqwestHttpClient) -> Self {
		Self { endpoint, token: TokenSecret::new(token), http_client }
	}

	async fn command(&self, args: &[&str]) -> Result<Value, StoreError> {
		let response = self
			.http_client
			.post(self.endpoint.clone())
			.header(AUTHORIZATION, self.token.bearer())
			.json(&args)
			.send()
			.await
			.map_err(|e| StoreError::Backend {
				message: format!("Redis REST call to {} failed: {e}", self.endpoint),
			})?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(|e| StoreError::Backend {
			message: format!("Failed to read Redis REST response: {e}"),
		})?;
		let reply = serde_json::from_slice::<CommandReply>(&bytes).map_err(|e| {
			StoreError::Serialization {
				message: format!("Redis REST response (status {status}) is not valid JSON: {e}"),
			}
		})?;

		if let Some(error) = reply.error {
			return Err(StoreError::Backend {
				message: format!("Redis rejected {}: {error}", args[0]),
			});
		}
		if !status.is_success() {
			return Err(StoreError::Backend {
				message: format!("Redis REST endpoint answered with status {status}"),
			});
		}

		Ok(reply.result)
	}
}
impl KvStore for UpstashStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			match self.command(&["GET", key]).await? {
				Value::Null => Ok(None),
				Value::String(value) => Ok(Some(value)),
				// Some clients store numbers without quoting; keep their textual form.
				Value::Number(value) => Ok(Some(value.to_string())),
				other => Err(StoreError::Serialization {
					message: format!("Unexpected GET result for `{key}`: {other}"),
				}),
			}
		})
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.command(&["SET", key, &value]).await?;

			Ok(())
		})
	}
}
