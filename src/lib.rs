//! Single-upstream reverse proxy that injects a store-cached bearer token into every forwarded
//! request, with refresh-or-relogin token acquisition and table-driven token extraction.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
#[cfg(feature = "server")] pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod proxy;
#[cfg(feature = "server")] pub mod server;
pub mod store;
pub mod upstream;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		cache::TokenCache,
		http::{RedirectPolicy, ReqwestHttpClient},
		proxy::{Forwarder, RoutePrefix},
		store::{KvStore, MemoryStore},
		upstream::UpstreamDescriptor,
	};

	/// Application token sent as `X-Application` by test fixtures.
	pub const TEST_APP_TOKEN: &str = "app-token-test";
	/// Login sent by test fixtures.
	pub const TEST_LOGIN: &str = "reader@example.com";
	/// Password sent by test fixtures.
	pub const TEST_PASSWORD: &str = "hunter2";

	/// Builds a reqwest-backed HTTP client with the requested redirect policy and a short
	/// timeout suited to mock servers.
	pub fn test_http_client(redirects: RedirectPolicy) -> ReqwestHttpClient {
		ReqwestHttpClient::builder()
			.redirects(redirects)
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Failed to build Reqwest client for tests.")
	}

	/// Builds an upstream descriptor rooted at the provided mock origin.
	pub fn test_descriptor(origin: &str) -> UpstreamDescriptor {
		UpstreamDescriptor::builder(origin)
			.app_token(TEST_APP_TOKEN)
			.build()
			.expect("Test upstream descriptor should build.")
	}

	/// Constructs a [`TokenCache`] backed by an in-memory store and the fixture credentials.
	pub fn build_test_cache(origin: &str) -> (TokenCache, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn KvStore> = store_backend.clone();
		let cache = TokenCache::new(
			store,
			Arc::new(test_descriptor(origin)),
			test_http_client(RedirectPolicy::Report),
		)
		.with_credentials(Credentials::new(TEST_LOGIN, TEST_PASSWORD));

		(cache, store_backend)
	}

	/// Constructs a [`Forwarder`] under the `/api` prefix together with its backing store.
	pub fn build_test_forwarder(
		origin: &str,
		redirects: RedirectPolicy,
	) -> (Forwarder, Arc<MemoryStore>) {
		let (cache, store) = build_test_cache(origin);
		let forwarder = Forwarder::new(
			Arc::new(cache),
			Arc::new(test_descriptor(origin)),
			test_http_client(redirects),
		)
		.with_route_prefix(RoutePrefix::new("/api"));

		(forwarder, store)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use bytes::Bytes;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(feature = "server")] use color_eyre as _;
#[cfg(test)] use {httpmock as _, tower as _};
