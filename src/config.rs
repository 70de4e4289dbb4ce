//! Command-line and environment configuration for the proxy binary.

// std
use std::{net::SocketAddr, path::PathBuf, time::Duration as StdDuration};
// crates.io
use clap::{Parser, ValueEnum};
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	cache::TokenCache,
	error::ConfigError,
	http::{RedirectPolicy, ReqwestHttpClient},
	proxy::{Forwarder, RoutePrefix},
	store::{FileStore, KvStore, MemoryStore, TokenKeys, UpstashStore},
	upstream::UpstreamDescriptor,
};

/// Key-value backend holding the token record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
	/// Process memory; tokens are lost on restart.
	#[default]
	Memory,
	/// JSON file on local disk.
	File,
	/// Upstash-compatible Redis REST endpoint.
	Upstash,
}
impl StoreKind {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Memory => "memory",
			Self::File => "file",
			Self::Upstash => "upstash",
		}
	}
}

/// Reverse proxy for the catalog API with a store-cached bearer token.
#[derive(Clone, Debug, Parser)]
#[command(name = "catalog-proxy", version, about)]
pub struct Config {
	/// Address the proxy listens on.
	#[arg(long, env = "CATALOG_PROXY_BIND", default_value = "127.0.0.1:8080")]
	pub bind: SocketAddr,
	/// Inbound path prefix removed before forwarding.
	#[arg(long, env = "CATALOG_PROXY_ROUTE_PREFIX", default_value = "/api")]
	pub route_prefix: String,
	/// Upstream origin.
	#[arg(long, env = "CATALOG_PROXY_UPSTREAM", default_value = "https://api.yani.tv")]
	pub upstream_origin: String,
	/// Application identifier sent as `X-Application`.
	#[arg(long, env = "YUMMY_APP_TOKEN", hide_env_values = true)]
	pub app_token: String,
	/// Account login.
	#[arg(long, env = "YUMMY_EMAIL")]
	pub login: Option<String>,
	/// Account password.
	#[arg(long, env = "YUMMY_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,
	/// Token store backend.
	#[arg(long, env = "CATALOG_PROXY_STORE", value_enum, default_value_t = StoreKind::Memory)]
	pub store: StoreKind,
	/// File used by the `file` store.
	#[arg(long, env = "CATALOG_PROXY_STORE_PATH", default_value = ".catalog-proxy/token.json")]
	pub store_path: PathBuf,
	/// Redis REST URL used by the `upstash` store.
	#[arg(long, env = "UPSTASH_REDIS_REST_URL")]
	pub upstash_url: Option<String>,
	/// Redis REST token used by the `upstash` store.
	#[arg(long, env = "UPSTASH_REDIS_REST_TOKEN", hide_env_values = true)]
	pub upstash_token: Option<String>,
	/// Prefix applied to the store keys.
	#[arg(long, env = "CATALOG_PROXY_KEY_NAMESPACE")]
	pub key_namespace: Option<String>,
	/// Upstream redirect handling: `follow` or `report`.
	#[arg(long, env = "CATALOG_PROXY_REDIRECTS", default_value = "report")]
	pub redirects: RedirectPolicy,
	/// Timeout applied to every outbound call, in seconds.
	#[arg(long, env = "CATALOG_PROXY_TIMEOUT_SECS", default_value_t = 30)]
	pub timeout_secs: u64,
	/// Default `Lang` header value.
	#[arg(long, env = "CATALOG_PROXY_LANG", default_value = "ru")]
	pub lang: String,
	/// Adds browser-like headers to forwarded requests.
	#[arg(long, env = "CATALOG_PROXY_BROWSER_EMULATION")]
	pub browser_emulation: bool,
	/// Emits JSON log lines.
	#[arg(long, env = "CATALOG_PROXY_JSON_LOGS")]
	pub json_logs: bool,
}
impl Config {
	/// Builds the HTTP client for auth, store, and forwarded calls.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		ReqwestHttpClient::builder()
			.timeout(StdDuration::from_secs(self.timeout_secs.max(1)))
			.redirects(self.redirects)
			.build()
	}

	/// Validates and builds the upstream descriptor.
	pub fn descriptor(&self) -> Result<UpstreamDescriptor, ConfigError> {
		Ok(UpstreamDescriptor::builder(&self.upstream_origin)
			.app_token(&self.app_token)
			.default_lang(&self.lang)
			.browser_emulation(self.browser_emulation)
			.build()?)
	}

	/// Credentials, when both login and password are set.
	pub fn credentials(&self) -> Option<Credentials> {
		Credentials::from_parts(self.login.as_deref(), self.password.as_deref())
	}

	/// Store key layout.
	pub fn keys(&self) -> TokenKeys {
		self.key_namespace.as_deref().map(TokenKeys::namespaced).unwrap_or_default()
	}

	/// Opens the configured store backend.
	pub fn store(&self, http_client: &ReqwestHttpClient) -> Result<Arc<dyn KvStore>> {
		let backend = self.store.as_str();

		let store: Arc<dyn KvStore> = match self.store {
			StoreKind::Memory => Arc::new(MemoryStore::default()),
			StoreKind::File => Arc::new(FileStore::open(&self.store_path)?),
			StoreKind::Upstash => {
				let url = self
					.upstash_url
					.as_deref()
					.ok_or(ConfigError::MissingStoreSetting { backend, setting: "upstash-url" })?;
				let token = self
					.upstash_token
					.as_deref()
					.ok_or(ConfigError::MissingStoreSetting { backend, setting: "upstash-token" })?;
				let endpoint = Url::parse(url)
					.map_err(|source| ConfigError::InvalidStoreEndpoint { source })?;

				Arc::new(UpstashStore::new(endpoint, token, http_client.clone()))
			},
		};

		Ok(store)
	}

	/// Wires store, token cache, and forwarder together.
	pub fn forwarder(&self) -> Result<Forwarder> {
		let http_client = self.http_client()?;
		let upstream = Arc::new(self.descriptor()?);
		let store = self.store(&http_client)?;
		let mut cache =
			TokenCache::new(store, upstream.clone(), http_client.clone()).with_keys(self.keys());

		match self.credentials() {
			Some(credentials) => cache = cache.with_credentials(credentials),
			None => tracing::warn!("No upstream credentials configured; logins will fail."),
		}

		Ok(Forwarder::new(Arc::new(cache), upstream, http_client)
			.with_route_prefix(RoutePrefix::new(&self.route_prefix)))
	}
}
