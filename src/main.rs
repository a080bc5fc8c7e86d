//! `oauth2-relay` server binary.

// std
use std::process::ExitCode;
// crates.io
use oauth2_relay::{config::RelayConfig, obs, relay};

#[tokio::main]
async fn main() -> ExitCode {
	obs::init_subscriber();

	let config = match RelayConfig::load() {
		Ok(config) => config,
		Err(e) => {
			tracing::error!(error = %e, "Invalid configuration.");

			return ExitCode::FAILURE;
		},
	};

	match relay::serve(config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			tracing::error!(error = %e, source = ?std::error::Error::source(&e), "Relay failed.");

			ExitCode::FAILURE
		},
	}
}
