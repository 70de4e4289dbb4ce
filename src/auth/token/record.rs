//! Immutable token record, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is still inside its lifetime.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no token value was provided.
	#[error("Token value is required.")]
	MissingToken,
	/// Issued when the token value is empty; empty tokens are never cached.
	#[error("Token value must not be empty.")]
	EmptyToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Cached bearer token together with the instant it stops being reused.
///
/// Records are replaced wholesale on every acquisition and never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Bearer token; callers must avoid logging it.
	pub token: TokenSecret,
	/// Instant after which the record must be replaced.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Fixed lifetime granted to freshly acquired tokens.
	pub const LIFETIME: Duration = Duration::days(2);

	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Expiry expressed as milliseconds since the Unix epoch, the store's wire format.
	pub fn expires_at_millis(&self) -> i64 {
		to_millis(self.expires_at)
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	/// Sets the issued-at instant used for relative expiry.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the token value.
	pub fn token(mut self, token: impl Into<String>) -> Self {
		self.token = Some(TokenSecret::new(token));

		self
	}

	/// Provides an already wrapped token value.
	pub fn secret(mut self, token: TokenSecret) -> Self {
		self.token = Some(token);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let token = self.token.ok_or(TokenRecordBuilderError::MissingToken)?;

		if token.is_blank() {
			return Err(TokenRecordBuilderError::EmptyToken);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord { token, expires_at })
	}
}

/// Converts an instant into whole milliseconds since the Unix epoch.
pub fn to_millis(instant: OffsetDateTime) -> i64 {
	let millis = instant.unix_timestamp_nanos() / 1_000_000;

	i64::try_from(millis).unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX })
}

/// Converts milliseconds since the Unix epoch into an instant, if representable.
pub fn from_millis(millis: i64) -> Option<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn status_flips_at_expiry() {
		let record = TokenRecord::builder()
			.token("token")
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Token record builder should succeed for status transitions.");

		assert_eq!(record.status_at(macros::datetime!(2025-01-01 00:59 UTC)), TokenStatus::Active);
		assert_eq!(record.status_at(macros::datetime!(2025-01-01 01:00 UTC)), TokenStatus::Expired);
		assert!(record.is_expired_at(macros::datetime!(2025-01-01 02:00 UTC)));
	}

	#[test]
	fn builder_applies_the_fixed_lifetime() {
		let record = TokenRecord::builder()
			.token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(TokenRecord::LIFETIME)
			.build()
			.expect("Token record builder should support relative expiry calculations.");

		assert_eq!(record.expires_at, macros::datetime!(2025-01-03 00:00 UTC));
	}

	#[test]
	fn builder_rejects_empty_tokens() {
		let err = TokenRecord::builder()
			.token("   ")
			.expires_in(TokenRecord::LIFETIME)
			.build()
			.expect_err("Blank tokens must never become records.");

		assert_eq!(err, TokenRecordBuilderError::EmptyToken);
		assert_eq!(
			TokenRecord::builder().token("t").build().expect_err("Expiry is mandatory."),
			TokenRecordBuilderError::MissingExpiry,
		);
	}

	#[test]
	fn millis_conversion_is_lossless_at_millisecond_precision() {
		let instant = macros::datetime!(2025-06-01 12:30:15.250 UTC);
		let millis = to_millis(instant);

		assert_eq!(millis, 1_748_781_015_250);
		assert_eq!(from_millis(millis), Some(instant));
	}
}
