//! Account credentials posted to the upstream login endpoint.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Login + password pair for the single upstream account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
	/// Account login (the upstream expects an e-mail address here).
	pub login: String,
	/// Account password; redacted in `Debug`.
	pub password: TokenSecret,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
		Self { login: login.into(), password: TokenSecret::new(password) }
	}

	/// Builds credentials only when both halves are present and non-blank.
	pub fn from_parts(login: Option<&str>, password: Option<&str>) -> Option<Self> {
		let login = login.map(str::trim).filter(|value| !value.is_empty())?;
		let password = password.filter(|value| !value.trim().is_empty())?;

		Some(Self::new(login, password))
	}

	/// JSON body expected by `POST /profile/login`.
	pub(crate) fn login_body(&self) -> Value {
		serde_json::json!({ "login": self.login, "password": self.password.expose() })
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("login", &self.login)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_hides_password() {
		let credentials = Credentials::new("reader@example.com", "hunter2");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("reader@example.com"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn from_parts_requires_both_halves() {
		assert!(Credentials::from_parts(Some("reader"), None).is_none());
		assert!(Credentials::from_parts(None, Some("pw")).is_none());
		assert!(Credentials::from_parts(Some("  "), Some("pw")).is_none());

		let credentials = Credentials::from_parts(Some(" reader "), Some("pw"))
			.expect("Both halves should produce credentials.");

		assert_eq!(credentials.login, "reader");
		assert_eq!(
			credentials.login_body(),
			serde_json::json!({ "login": "reader", "password": "pw" })
		);
	}
}
