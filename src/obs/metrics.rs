// self
use crate::obs::{AcquireKind, AcquireOutcome};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_acquisition(kind: AcquireKind, outcome: AcquireOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"catalog_proxy_token_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how a forwarded response was classified (when metrics are enabled).
pub fn record_forward(class: &'static str) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("catalog_proxy_forward_total", "class" => class).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = class;
	}
}
