//! Catalog proxy binary.

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use color_eyre::Result;
// self
use catalog_proxy::{config::Config, obs, server};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = Config::parse();

	obs::init_subscriber("info", config.json_logs);

	let forwarder = config.forwarder()?;

	server::serve(config.bind, server::router(Arc::new(forwarder))).await?;

	Ok(())
}
