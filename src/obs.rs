//! Observability helpers for token acquisition and forwarding.
//!
//! # Feature Flags
//!
//! - Spans named `catalog_proxy.token` carry the `kind` (refresh/login/session or cache) and
//!   `stage` (call site) fields and are always emitted through `tracing`.
//! - Enable `metrics` to increment the `catalog_proxy_token_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`, and the
//!   `catalog_proxy_forward_total` counter labeled by response `class`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Upstream calls that can produce a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcquireKind {
	/// Cache lookup that may short-circuit acquisition entirely.
	Cache,
	/// `GET /profile/token` with the previous bearer token.
	Refresh,
	/// `POST /profile/login` with the configured credentials.
	Login,
	/// `GET /profile/token` with the session cookie issued by a login.
	Session,
}
impl AcquireKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireKind::Cache => "cache",
			AcquireKind::Refresh => "refresh",
			AcquireKind::Login => "login",
			AcquireKind::Session => "session",
		}
	}
}
impl Display for AcquireKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// Entry to an acquisition step.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller or absorbed by a fallback.
	Failure,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Attempt => "attempt",
			AcquireOutcome::Success => "success",
			AcquireOutcome::Failure => "failure",
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
