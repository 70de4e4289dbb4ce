//! Inbound request model and route-prefix handling.

// crates.io
use reqwest::{Method, header::HeaderMap};
// self
use crate::{_prelude::*, upstream::UpstreamDescriptor};

/// Inbound request body as handed to the forwarder.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ProxyBody {
	/// No body.
	#[default]
	Empty,
	/// Raw bytes, forwarded verbatim.
	Raw(Bytes),
	/// Structured value, serialized to JSON before forwarding.
	Json(Value),
}
impl ProxyBody {
	/// Returns `true` when nothing would be sent.
	pub fn is_empty(&self) -> bool {
		match self {
			Self::Empty => true,
			Self::Raw(bytes) => bytes.is_empty(),
			Self::Json(value) => value.is_null(),
		}
	}

	/// Bytes sent upstream, serializing structured values.
	pub fn into_bytes(self) -> Result<Bytes, serde_json::Error> {
		match self {
			Self::Empty => Ok(Bytes::new()),
			Self::Raw(bytes) => Ok(bytes),
			Self::Json(value) => serde_json::to_vec(&value).map(Bytes::from),
		}
	}
}
impl From<Bytes> for ProxyBody {
	fn from(bytes: Bytes) -> Self {
		if bytes.is_empty() { Self::Empty } else { Self::Raw(bytes) }
	}
}
impl From<Value> for ProxyBody {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}

/// Method, path, query, headers, and body of an inbound request.
#[derive(Clone, Debug)]
pub struct ProxyRequest {
	/// HTTP method, copied upstream.
	pub method: Method,
	/// Inbound path, including the route prefix.
	pub path: String,
	/// Raw query string without the leading `?`.
	pub query: Option<String>,
	/// Inbound headers; only `lang` is consulted.
	pub headers: HeaderMap,
	/// Inbound body.
	pub body: ProxyBody,
}
impl ProxyRequest {
	/// Inbound header naming the catalog language.
	pub const LANG_HEADER: &'static str = "lang";

	/// Creates a request with no query, headers, or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: None,
			headers: HeaderMap::new(),
			body: ProxyBody::Empty,
		}
	}

	/// Sets the raw query string; an empty string clears it.
	pub fn with_query(mut self, query: impl Into<String>) -> Self {
		let query = query.into();

		self.query = (!query.is_empty()).then_some(query);

		self
	}

	/// Replaces the inbound headers.
	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;

		self
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<ProxyBody>) -> Self {
		self.body = body.into();

		self
	}

	/// Language requested by the caller, if any.
	pub fn lang(&self) -> Option<&str> {
		self.headers
			.get(Self::LANG_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|lang| !lang.is_empty())
	}

	/// Returns `true` for methods whose body is forwarded.
	pub fn carries_body(&self) -> bool {
		matches!(self.method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
	}
}

/// Path prefix under which the proxy is mounted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutePrefix(String);
impl RoutePrefix {
	/// Normalizes `prefix` to a leading slash without a trailing one; `/` and `""` mean none.
	pub fn new(prefix: impl AsRef<str>) -> Self {
		let trimmed = prefix.as_ref().trim().trim_matches('/');

		if trimmed.is_empty() { Self::default() } else { Self(format!("/{trimmed}")) }
	}

	/// Normalized prefix, empty when the proxy is mounted at the root.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Removes the prefix on a segment boundary.
	///
	/// A path equal to the prefix maps to `/`; paths outside the prefix are unchanged.
	pub fn strip<'a>(&self, path: &'a str) -> &'a str {
		if self.0.is_empty() {
			return path;
		}

		match path.strip_prefix(self.0.as_str()) {
			Some("") => "/",
			Some(rest) if rest.starts_with('/') => rest,
			_ => path,
		}
	}
}

/// Builds the upstream URL: origin, stripped path, and the query exactly as received.
pub fn upstream_url(upstream: &UpstreamDescriptor, path: &str, query: Option<&str>) -> String {
	let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };

	match query {
		Some(query) if !query.is_empty() => upstream.url_for(&format!("{path}?{query}")),
		_ => upstream.url_for(&path),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn prefix_is_stripped_on_segment_boundaries() {
		let prefix = RoutePrefix::new("/api/");

		assert_eq!(prefix.as_str(), "/api");
		assert_eq!(prefix.strip("/api/anime/123"), "/anime/123");
		assert_eq!(prefix.strip("/api"), "/");
		assert_eq!(prefix.strip("/apiary/bees"), "/apiary/bees");
		assert_eq!(prefix.strip("/healthz"), "/healthz");
		assert_eq!(RoutePrefix::new("/").strip("/anime"), "/anime");
	}

	#[test]
	fn upstream_url_keeps_the_query_byte_for_byte() {
		let upstream = UpstreamDescriptor::builder("https://api.example.com/")
			.app_token("app")
			.build()
			.expect("Descriptor fixture should build.");

		assert_eq!(
			upstream_url(&upstream, "/anime", Some("q=%D0%B0+b&limit=5&limit=6")),
			"https://api.example.com/anime?q=%D0%B0+b&limit=5&limit=6",
		);
		assert_eq!(upstream_url(&upstream, "/anime", Some("")), "https://api.example.com/anime");
		assert_eq!(upstream_url(&upstream, "anime", None), "https://api.example.com/anime");
	}

	#[test]
	fn lang_header_and_body_rules() {
		let mut headers = HeaderMap::new();

		headers.insert("lang", HeaderValue::from_static("en"));

		let request = ProxyRequest::new(Method::POST, "/api/anime")
			.with_headers(headers)
			.with_body(json!({ "title": "x" }));

		assert_eq!(request.lang(), Some("en"));
		assert!(request.carries_body());
		assert!(!request.body.is_empty());
		assert!(!ProxyRequest::new(Method::GET, "/").carries_body());
		assert!(ProxyBody::from(Bytes::new()).is_empty());
		assert_eq!(
			ProxyBody::Json(json!({ "a": 1 })).into_bytes().expect("Serialization should succeed."),
			Bytes::from_static(br#"{"a":1}"#),
		);
	}
}
