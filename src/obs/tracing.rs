// crates.io
use tracing::{Instrument, instrument::Instrumented};
// self
use crate::{_prelude::*, obs::AcquireKind};

/// A span builder used around token acquisition steps.
#[derive(Clone, Debug)]
pub struct AcquireSpan {
	span: tracing::Span,
}
impl AcquireSpan {
	/// Creates a new span tagged with the provided acquisition kind + stage.
	pub fn new(kind: AcquireKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("catalog_proxy.token", kind = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// Installs the global `tracing` subscriber for the proxy binary.
///
/// `RUST_LOG` overrides `default_level`; `json` switches to structured JSON lines.
#[cfg(feature = "server")]
pub fn init_subscriber(default_level: &str, json: bool) {
	// crates.io
	use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	let registry = tracing_subscriber::registry().with(filter);
	let result = if json {
		registry.with(fmt::layer().json().with_target(true)).try_init()
	} else {
		registry.with(fmt::layer().with_target(false)).try_init()
	};

	if let Err(e) = result {
		eprintln!("Tracing subscriber was already installed: {e}.");
	}
}
