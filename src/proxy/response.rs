//! Outbound response model, upstream response classification, and diagnostic bodies.

// crates.io
use reqwest::{
	StatusCode,
	header::{CONTENT_TYPE, HeaderMap, LOCATION},
};
// self
use crate::{_prelude::*, error::UpstreamError, obs, upstream};

/// Response returned to the inbound caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header value, if any.
	pub content_type: Option<String>,
	/// Response body.
	pub body: Bytes,
}
impl ProxyResponse {
	/// Content type of diagnostic bodies.
	pub const JSON: &'static str = "application/json";

	/// Builds a diagnostic response for a failed request.
	pub fn from_error(err: &Error) -> Self {
		let diagnostic = ErrorBody::from(err);
		let body = serde_json::to_vec(&diagnostic).map(Bytes::from).unwrap_or_else(|_| {
			Bytes::from_static(br#"{"error":"Proxy Error","message":"Unserializable error."}"#)
		});

		Self { status: err.status_code(), content_type: Some(Self::JSON.into()), body }
	}

	/// Builds an empty `200` response, as answered to preflight requests.
	pub fn empty() -> Self {
		Self { status: 200, content_type: None, body: Bytes::new() }
	}
}

/// JSON body describing why a request failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Error category, for example `Auth Error`.
	pub error: String,
	/// Human-readable message.
	pub message: String,
	/// Upstream status that triggered the error.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<u16>,
	/// Bounded preview of the offending upstream body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub preview: Option<String>,
	/// Redirect target reported by the upstream.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
}
impl From<&Error> for ErrorBody {
	fn from(err: &Error) -> Self {
		let mut body = Self {
			error: err.category().into(),
			message: err.to_string(),
			status: None,
			preview: None,
			location: None,
		};

		if let Error::Upstream(upstream) = err {
			body.status = Some(upstream.upstream_status());
			body.preview = upstream.preview().map(ToOwned::to_owned);

			if let UpstreamError::Redirect { location, .. } = upstream {
				body.location = location.clone();
			}
		}

		body
	}
}

/// Declared content family of an upstream response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentClass {
	/// `application/json` or any `+json` type.
	Json,
	/// `text/html` or XHTML.
	Html,
	/// Anything else, including a missing content type.
	Other,
}
impl ContentClass {
	/// Classifies a `Content-Type` header value.
	pub fn of(content_type: Option<&str>) -> Self {
		let Some(content_type) = content_type else {
			return Self::Other;
		};
		let essence =
			content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

		if essence == "application/json" || essence.ends_with("+json") {
			Self::Json
		} else if essence == "text/html" || essence == "application/xhtml+xml" {
			Self::Html
		} else {
			Self::Other
		}
	}

	/// Returns a stable label suitable for metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Html => "html",
			Self::Other => "other",
		}
	}
}

/// Translates a buffered upstream response into the response relayed to the caller.
pub fn classify(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Result<ProxyResponse> {
	let code = status.as_u16();

	if status.is_redirection() && status != StatusCode::NOT_MODIFIED {
		let location =
			headers.get(LOCATION).and_then(|value| value.to_str().ok()).map(ToOwned::to_owned);

		tracing::warn!(status = code, location = ?location, "Upstream redirect reported.");
		obs::record_forward("redirect");

		return Err(UpstreamError::Redirect { status: code, location }.into());
	}

	let content_type =
		headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).map(ToOwned::to_owned);
	let class = ContentClass::of(content_type.as_deref());

	obs::record_forward(class.as_str());

	match class {
		ContentClass::Json if !body.is_empty() => {
			serde_json::from_slice::<serde::de::IgnoredAny>(&body).map_err(|_| {
				UpstreamError::MalformedJson {
					status: code,
					preview: upstream::body_preview(&body),
				}
			})?;

			Ok(ProxyResponse { status: code, content_type, body })
		},
		ContentClass::Html => {
			tracing::warn!(status = code, "Upstream returned HTML instead of data.");

			Err(UpstreamError::HtmlResponse { status: code, preview: upstream::body_preview(&body) }
				.into())
		},
		_ => Ok(ProxyResponse { status: code, content_type, body }),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;
	use crate::error::AuthError;

	fn headers(content_type: &'static str) -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

		headers
	}

	#[test]
	fn content_types_are_classified_by_essence() {
		assert_eq!(ContentClass::of(Some("application/json; charset=utf-8")), ContentClass::Json);
		assert_eq!(ContentClass::of(Some("application/problem+json")), ContentClass::Json);
		assert_eq!(ContentClass::of(Some("TEXT/HTML; charset=UTF-8")), ContentClass::Html);
		assert_eq!(ContentClass::of(Some("image/webp")), ContentClass::Other);
		assert_eq!(ContentClass::of(None), ContentClass::Other);
	}

	#[test]
	fn json_bodies_pass_through_with_status() {
		let body = Bytes::from_static(br#"{"error":"forbidden"}"#);
		let response = classify(StatusCode::FORBIDDEN, &headers("application/json"), body.clone())
			.expect("Valid JSON should be relayed.");

		assert_eq!(response.status, 403);
		assert_eq!(response.body, body);
		assert_eq!(response.content_type.as_deref(), Some("application/json"));
	}

	#[test]
	fn malformed_json_and_html_become_upstream_errors() {
		let err = classify(StatusCode::OK, &headers("application/json"), Bytes::from_static(b"{"))
			.expect_err("Truncated JSON must be rejected.");

		assert_eq!(err.status_code(), 502);

		let page = format!("<html>{}</html>", "x".repeat(2_000));
		let err = classify(StatusCode::NOT_FOUND, &headers("text/html"), Bytes::from(page))
			.expect_err("HTML must be reported.");
		let diagnostic = ErrorBody::from(&err);

		assert_eq!(err.status_code(), 404);
		assert_eq!(diagnostic.status, Some(404));
		assert_eq!(diagnostic.preview.map(|p| p.chars().count()), Some(upstream::PREVIEW_LIMIT));
	}

	#[test]
	fn redirects_surface_the_location() {
		let mut headers = HeaderMap::new();

		headers.insert(LOCATION, HeaderValue::from_static("https://elsewhere.example.com/"));

		let err = classify(StatusCode::FOUND, &headers, Bytes::new())
			.expect_err("Redirects must be reported.");
		let response = ProxyResponse::from_error(&err);
		let diagnostic = serde_json::from_slice::<ErrorBody>(&response.body)
			.expect("Diagnostic body should be JSON.");

		assert_eq!(response.status, 502);
		assert_eq!(diagnostic.location.as_deref(), Some("https://elsewhere.example.com/"));
		assert_eq!(diagnostic.status, Some(302));
	}

	#[test]
	fn other_content_passes_through_raw() {
		let response = classify(StatusCode::OK, &headers("image/webp"), Bytes::from_static(b"RIFF"))
			.expect("Binary bodies should be relayed.");

		assert_eq!(response.body, Bytes::from_static(b"RIFF"));
		assert_eq!(response.content_type.as_deref(), Some("image/webp"));
	}

	#[test]
	fn auth_failures_render_as_internal_errors() {
		let err = Error::from(AuthError::MissingToken { stage: crate::obs::AcquireKind::Login });
		let response = ProxyResponse::from_error(&err);
		let diagnostic = serde_json::from_slice::<ErrorBody>(&response.body)
			.expect("Diagnostic body should be JSON.");

		assert_eq!(response.status, 500);
		assert_eq!(diagnostic.error, "Auth Error");
		assert_eq!(diagnostic.status, None);
	}
}
