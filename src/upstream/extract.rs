//! Table-driven token extraction from upstream auth responses.
//!
//! The login and token endpoints have answered with several body shapes over time: a
//! top-level `token`, the same field nested under a `data` or `response` wrapper, or only a
//! success flag with the token delivered through a session cookie. [`TokenExtractor`]
//! walks an ordered list of field paths and returns the first non-empty string.

// self
use crate::_prelude::*;

/// Path of object keys leading to a JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldPath(pub &'static [&'static str]);
impl FieldPath {
	/// Resolves the path against `body`.
	pub fn resolve(self, body: &Value) -> Option<&Value> {
		self.0.iter().try_fold(body, |value, segment| value.get(segment))
	}
}
impl Display for FieldPath {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join("."))
	}
}

/// Field that signals a successful login even when no token is present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuccessMarker {
	/// Field must be the boolean `true`.
	Flag(FieldPath),
	/// Field must be a string equal (case-insensitively) to one of the values.
	Text(FieldPath, &'static [&'static str]),
}
impl SuccessMarker {
	fn matches(self, body: &Value) -> bool {
		match self {
			Self::Flag(path) => path.resolve(body).and_then(Value::as_bool).unwrap_or(false),
			Self::Text(path, accepted) => path
				.resolve(body)
				.and_then(Value::as_str)
				.is_some_and(|text| accepted.iter().any(|a| a.eq_ignore_ascii_case(text.trim()))),
		}
	}
}

/// Token field paths tried in order.
pub const DEFAULT_TOKEN_PATHS: &[FieldPath] = &[
	FieldPath(&["token"]),
	FieldPath(&["data", "token"]),
	FieldPath(&["response", "token"]),
	FieldPath(&["access_token"]),
	FieldPath(&["data", "access_token"]),
	FieldPath(&["response", "access_token"]),
];

/// Success markers consulted when no token field is present.
pub const DEFAULT_SUCCESS_MARKERS: &[SuccessMarker] = &[
	SuccessMarker::Flag(FieldPath(&["success"])),
	SuccessMarker::Flag(FieldPath(&["ok"])),
	SuccessMarker::Text(FieldPath(&["status"]), &["ok", "success"]),
	SuccessMarker::Flag(FieldPath(&["response", "success"])),
	SuccessMarker::Flag(FieldPath(&["data", "success"])),
];

/// Ordered extraction strategies for auth response bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenExtractor {
	token_paths: Vec<FieldPath>,
	success_markers: Vec<SuccessMarker>,
}
impl TokenExtractor {
	/// Builds an extractor from explicit tables.
	pub fn new(token_paths: Vec<FieldPath>, success_markers: Vec<SuccessMarker>) -> Self {
		Self { token_paths, success_markers }
	}

	/// Returns the first non-empty string found along the token paths.
	pub fn extract_token(&self, body: &Value) -> Option<String> {
		self.token_paths.iter().find_map(|path| {
			path.resolve(body)
				.and_then(Value::as_str)
				.map(str::trim)
				.filter(|token| !token.is_empty())
				.map(ToOwned::to_owned)
		})
	}

	/// Returns `true` when any success marker matches.
	pub fn indicates_success(&self, body: &Value) -> bool {
		self.success_markers.iter().any(|marker| marker.matches(body))
	}
}
impl Default for TokenExtractor {
	fn default() -> Self {
		Self::new(DEFAULT_TOKEN_PATHS.to_vec(), DEFAULT_SUCCESS_MARKERS.to_vec())
	}
}
