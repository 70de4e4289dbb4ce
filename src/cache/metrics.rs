// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for cache lookups and acquisition calls.
#[derive(Debug, Default)]
pub struct AcquisitionMetrics {
	cache_hits: AtomicU64,
	refreshes: AtomicU64,
	logins: AtomicU64,
	failures: AtomicU64,
}
impl AcquisitionMetrics {
	/// Returns the number of lookups answered from the store.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls issued.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of login calls issued.
	pub fn logins(&self) -> u64 {
		self.logins.load(Ordering::Relaxed)
	}

	/// Returns the number of acquisitions that ended without a token.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_login(&self) {
		self.logins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
