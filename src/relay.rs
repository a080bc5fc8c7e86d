//! HTTP surface: the shared [`Relay`] handle, router construction, and the server loop.

pub mod callback;
pub mod connect;
pub mod health;
pub mod refresh;

// crates.io
use axum::{
	Router,
	http::{StatusCode, header::LOCATION},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	error::StartupError,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{BasicFacade, ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{DefaultProviderStrategy, ProviderStrategy},
};

/// Immutable state shared by every handler.
///
/// Cloning is cheap; every field sits behind an [`Arc`].
pub struct Relay<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	config: Arc<RelayConfig>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	strategy: Arc<dyn ProviderStrategy>,
}
impl Relay {
	/// Builds a relay backed by reqwest, honoring the configured provider timeout.
	pub fn new(config: RelayConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.provider_timeout)?;

		Ok(Self::with_http_client(config, http_client, ReqwestTransportErrorMapper))
	}
}
impl<C, M> Relay<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Builds a relay over a caller-supplied transport and error mapper.
	pub fn with_http_client(config: RelayConfig, http_client: C, transport_mapper: M) -> Self {
		Self {
			config: Arc::new(config),
			http_client: Arc::new(http_client),
			transport_mapper: Arc::new(transport_mapper),
			strategy: Arc::new(DefaultProviderStrategy),
		}
	}

	/// Replaces the provider error classifier.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Shared configuration.
	pub fn config(&self) -> &RelayConfig {
		&self.config
	}

	pub(crate) fn facade(&self) -> BasicFacade<'_, C, M> {
		BasicFacade {
			http_client: &self.http_client,
			error_mapper: &self.transport_mapper,
			strategy: self.strategy.as_ref(),
			config: &self.config,
		}
	}
}
impl<C, M> Clone for Relay<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			config: Arc::clone(&self.config),
			http_client: Arc::clone(&self.http_client),
			transport_mapper: Arc::clone(&self.transport_mapper),
			strategy: Arc::clone(&self.strategy),
		}
	}
}
impl<C, M> Debug for Relay<C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay").field("config", &self.config).finish_non_exhaustive()
	}
}

/// `302 Found` pointing at an absolute URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Found(pub Url);
impl IntoResponse for Found {
	fn into_response(self) -> Response {
		(StatusCode::FOUND, [(LOCATION, String::from(self.0))]).into_response()
	}
}

/// Builds the router serving `/`, `/connect`, `/callback`, and `/refresh`.
pub fn router<C, M>(relay: Relay<C, M>) -> Router
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	Router::new()
		.route("/", get(health::health))
		.route("/connect", get(connect::connect::<C, M>))
		.route("/callback", get(callback::callback::<C, M>))
		.route("/refresh", post(refresh::refresh::<C, M>))
		.layer(TraceLayer::new_for_http())
		.with_state(relay)
}

/// Binds the configured address and serves until Ctrl-C or SIGTERM.
pub async fn serve(config: RelayConfig) -> Result<()> {
	let addr = config.bind_addr;
	let relay = Relay::new(config)?;
	let listener =
		TcpListener::bind(addr).await.map_err(|source| StartupError::Bind { addr, source })?;

	tracing::info!(%addr, providers = ?relay.config().providers, "Relay listening.");

	axum::serve(listener, router(relay))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(StartupError::Serve)?;

	tracing::info!("Relay stopped.");

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::warn!(error = %e, "Failed to listen for Ctrl-C.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(e) => {
				tracing::warn!(error = %e, "Failed to listen for SIGTERM.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => (),
		_ = terminate => (),
	}

	tracing::info!("Shutdown signal received; draining in-flight requests.");
}
