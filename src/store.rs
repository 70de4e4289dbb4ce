//! Key-value storage contract and the token record layout kept on top of it.

pub mod file;
pub mod memory;
pub mod upstash;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use upstash::UpstashStore;

// self
use crate::{
	_prelude::*,
	auth::{self, TokenRecord, TokenSecret},
};

/// Boxed future returned by [`KvStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Minimal string key-value backend: get and set, no transactions, no native TTL.
pub trait KvStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`KvStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// The two keys holding a token record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenKeys {
	/// Key holding the bearer token.
	pub token: String,
	/// Key holding the expiry in milliseconds since the Unix epoch.
	pub expiry: String,
}
impl TokenKeys {
	/// Default token key.
	pub const TOKEN: &'static str = "token";
	/// Default expiry key.
	pub const EXPIRY: &'static str = "token_expiry";

	/// Prefixes both keys with `<namespace>:` so several deployments can share a store.
	pub fn namespaced(namespace: &str) -> Self {
		let namespace = namespace.trim().trim_end_matches(':');

		if namespace.is_empty() {
			return Self::default();
		}

		Self {
			token: format!("{namespace}:{}", Self::TOKEN),
			expiry: format!("{namespace}:{}", Self::EXPIRY),
		}
	}
}
impl Default for TokenKeys {
	fn default() -> Self {
		Self { token: Self::TOKEN.into(), expiry: Self::EXPIRY.into() }
	}
}

/// Token + expiry pair as read back from the store.
///
/// The expiry may be missing or unreadable when a previous writer was interrupted between
/// its two `set` calls; the token is still worth offering to the refresh endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredToken {
	/// Previously issued bearer token (never blank).
	pub token: TokenSecret,
	/// Parsed expiry, if the expiry key held a valid millisecond timestamp.
	pub expires_at: Option<OffsetDateTime>,
}
impl StoredToken {
	/// Returns the record when it can be reused at `now`.
	pub fn usable_at(&self, now: OffsetDateTime) -> Option<TokenRecord> {
		let expires_at = self.expires_at?;
		let record = TokenRecord { token: self.token.clone(), expires_at };

		(!record.is_expired_at(now)).then_some(record)
	}
}

/// Reads and writes [`TokenRecord`]s through a [`KvStore`] under fixed [`TokenKeys`].
#[derive(Clone)]
pub struct TokenRecordStore {
	backend: Arc<dyn KvStore>,
	keys: TokenKeys,
}
impl TokenRecordStore {
	/// Wraps a backend using the provided key layout.
	pub fn new(backend: Arc<dyn KvStore>, keys: TokenKeys) -> Self {
		Self { backend, keys }
	}

	/// Swaps the key layout while keeping the backend.
	pub fn with_keys(mut self, keys: TokenKeys) -> Self {
		self.keys = keys;

		self
	}

	/// Key layout in use.
	pub fn keys(&self) -> &TokenKeys {
		&self.keys
	}

	/// Loads the current token and expiry; blank tokens read as absent.
	pub async fn load(&self) -> Result<Option<StoredToken>, StoreError> {
		let Some(token) = self.backend.get(&self.keys.token).await? else {
			return Ok(None);
		};
		let token = TokenSecret::new(token);

		if token.is_blank() {
			return Ok(None);
		}

		let expires_at = match self.backend.get(&self.keys.expiry).await? {
			Some(raw) => {
				let parsed = raw.trim().parse::<i64>().ok().and_then(auth::from_millis);

				if parsed.is_none() {
					tracing::warn!(key = %self.keys.expiry, "Ignoring unreadable token expiry.");
				}

				parsed
			},
			None => None,
		};

		Ok(Some(StoredToken { token, expires_at }))
	}

	/// Overwrites both keys with `record`, token first.
	pub async fn save(&self, record: &TokenRecord) -> Result<(), StoreError> {
		self.backend.set(&self.keys.token, record.token.expose().to_owned()).await?;
		self.backend.set(&self.keys.expiry, record.expires_at_millis().to_string()).await
	}
}
impl Debug for TokenRecordStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecordStore").field("keys", &self.keys).finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::error::Error;

	fn record_store() -> (TokenRecordStore, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());

		(TokenRecordStore::new(backend.clone(), TokenKeys::default()), backend)
	}

	#[test]
	fn store_error_converts_into_proxy_error_with_source() {
		let store_error = StoreError::Backend { message: "redis unreachable".into() };
		let proxy_error: Error = store_error.clone().into();

		assert!(matches!(proxy_error, Error::Storage(_)));
		assert!(proxy_error.to_string().contains("redis unreachable"));

		let source = StdError::source(&proxy_error)
			.expect("Proxy error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn namespaced_keys_prefix_both_entries() {
		let keys = TokenKeys::namespaced("yummy:");

		assert_eq!(keys.token, "yummy:token");
		assert_eq!(keys.expiry, "yummy:token_expiry");
		assert_eq!(TokenKeys::namespaced("  "), TokenKeys::default());
	}

	#[tokio::test]
	async fn save_writes_token_and_millisecond_expiry() {
		let (store, backend) = record_store();
		let record = TokenRecord::builder()
			.token("token-1")
			.expires_at(macros::datetime!(2025-01-03 00:00 UTC))
			.build()
			.expect("Record fixture should build.");

		store.save(&record).await.expect("Saving the record should succeed.");

		assert_eq!(
			backend.get("token").await.expect("Get should succeed."),
			Some("token-1".into())
		);
		assert_eq!(
			backend.get("token_expiry").await.expect("Get should succeed."),
			Some("1735862400000".into()),
		);

		let loaded = store
			.load()
			.await
			.expect("Loading should succeed.")
			.expect("Saved record should be present.");

		assert_eq!(loaded.usable_at(macros::datetime!(2025-01-02 00:00 UTC)), Some(record));
		assert_eq!(loaded.usable_at(macros::datetime!(2025-01-03 00:00 UTC)), None);
	}

	#[tokio::test]
	async fn blank_token_reads_as_absent_and_bad_expiry_as_unknown() {
		let (store, backend) = record_store();

		backend.set("token", String::new()).await.expect("Set should succeed.");

		assert_eq!(store.load().await.expect("Loading should succeed."), None);

		backend.set("token", "orphan".into()).await.expect("Set should succeed.");
		backend.set("token_expiry", "tomorrow".into()).await.expect("Set should succeed.");

		let loaded = store
			.load()
			.await
			.expect("Loading should succeed.")
			.expect("Orphaned token should still load.");

		assert_eq!(loaded.token.expose(), "orphan");
		assert_eq!(loaded.expires_at, None);
		assert_eq!(loaded.usable_at(OffsetDateTime::now_utc()), None);
	}
}
