//! Store-backed cache for the single upstream bearer token.
//!
//! [`TokenCache::valid_token`] returns the cached token while its record is unexpired and
//! otherwise acquires a new one: a refresh call when an old token exists, falling back to a
//! full login on any refresh failure. Acquisition runs behind an in-process singleflight
//! guard and re-reads the store once the guard is held, so concurrent callers that observed
//! the same expired record share one acquisition. Separate processes sharing the store can
//! still race; the last writer wins.

mod common;
mod login;
mod metrics;
mod refresh;

pub use metrics::AcquisitionMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenRecord, TokenSecret},
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::{self, AcquireKind, AcquireOutcome, AcquireSpan},
	store::{KvStore, TokenKeys, TokenRecordStore},
	upstream::{TokenExtractor, UpstreamDescriptor},
};

/// Owns the lifecycle of the one upstream credential.
#[derive(Clone)]
pub struct TokenCache {
	/// HTTP client used for login, refresh, and session calls.
	pub http_client: ReqwestHttpClient,
	/// Token record persistence.
	pub store: TokenRecordStore,
	/// Upstream endpoints and static headers.
	pub upstream: Arc<UpstreamDescriptor>,
	/// Account credentials; login fails with a configuration error without them.
	pub credentials: Option<Credentials>,
	/// Ordered token extraction strategies for auth responses.
	pub extractor: TokenExtractor,
	/// Shared counters for cache hits and acquisition outcomes.
	pub metrics: Arc<AcquisitionMetrics>,
	singleflight: Arc<AsyncMutex<()>>,
}
impl TokenCache {
	/// Creates a cache over `store` using the default key layout and two-day lifetime.
	pub fn new(
		store: Arc<dyn KvStore>,
		upstream: Arc<UpstreamDescriptor>,
		http_client: ReqwestHttpClient,
	) -> Self {
		Self {
			http_client,
			store: TokenRecordStore::new(store, TokenKeys::default()),
			upstream,
			credentials: None,
			extractor: TokenExtractor::default(),
			metrics: Default::default(),
			singleflight: Default::default(),
		}
	}

	/// Sets the account credentials used for full logins.
	pub fn with_credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = Some(credentials);

		self
	}

	/// Replaces the key layout while keeping the same backend.
	pub fn with_keys(mut self, keys: TokenKeys) -> Self {
		self.store = self.store.with_keys(keys);

		self
	}

	/// Returns a token that is valid right now, acquiring and storing a new one if needed.
	pub async fn valid_token(&self) -> Result<TokenSecret> {
		if let Some(record) = self.cached_record().await? {
			self.record_cache_hit();

			return Ok(record.token);
		}

		let span = AcquireSpan::new(AcquireKind::Cache, "valid_token");

		span.instrument(async move {
			let _singleflight = self.singleflight.lock().await;
			let now = OffsetDateTime::now_utc();
			let current = self.store.load().await?;

			if let Some(record) = current.as_ref().and_then(|stored| stored.usable_at(now)) {
				self.record_cache_hit();

				return Ok(record.token);
			}

			let token = self
				.acquire(current.map(|stored| stored.token))
				.await
				.inspect_err(|_| self.metrics.record_failure())?;
			let record = TokenRecord::builder()
				.secret(token)
				.issued_at(OffsetDateTime::now_utc())
				.expires_in(TokenRecord::LIFETIME)
				.build()
				.map_err(ConfigError::from)?;

			self.store.save(&record).await?;

			tracing::info!(expires_at = %record.expires_at, "Stored a freshly acquired token.");

			Ok(record.token)
		})
		.await
	}

	async fn cached_record(&self) -> Result<Option<TokenRecord>> {
		let now = OffsetDateTime::now_utc();

		Ok(self.store.load().await?.and_then(|stored| stored.usable_at(now)))
	}

	fn record_cache_hit(&self) {
		self.metrics.record_cache_hit();
		obs::record_acquisition(AcquireKind::Cache, AcquireOutcome::Success);
	}

	async fn acquire(&self, previous: Option<TokenSecret>) -> Result<TokenSecret> {
		if let Some(previous) = previous {
			match self.refresh(&previous).await {
				Ok(token) => return Ok(token),
				Err(e) => {
					tracing::warn!(error = %e, "Token refresh failed; falling back to login.");
				},
			}
		}

		self.login().await
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("upstream", &self.upstream.origin)
			.field("store", &self.store)
			.field("credentials_set", &self.credentials.is_some())
			.finish()
	}
}
