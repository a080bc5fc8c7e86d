//! `GET /connect`: sends the browser to the provider's authorize endpoint.

// crates.io
use axum::extract::{Query, State, rejection::QueryRejection};
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	error::ValidationError,
	http::TokenHttpClient,
	oauth::{self, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::{Found, Relay},
	state::StateToken,
};

/// Query parameters accepted by `/connect`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
	/// Caller destination once tokens are obtained.
	pub redirect_uri: Option<String>,
	/// Provider environment; the configured default when absent.
	pub login_url: Option<String>,
}

/// Validates the request and redirects to the provider login page.
pub async fn connect<C, M>(
	State(relay): State<Relay<C, M>>,
	params: Result<Query<ConnectParams>, QueryRejection>,
) -> Result<Found>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let _guard = FlowSpan::new(FlowKind::Connect, "connect").entered();

	obs::record_flow_outcome(FlowKind::Connect, FlowOutcome::Attempt);

	let result = params
		.map_err(|e| Error::from(ValidationError::Rejected { message: e.body_text() }))
		.and_then(|Query(params)| authorize_location(relay.config(), &params));

	obs::record_flow_result(FlowKind::Connect, &result);

	let location = result?;

	tracing::info!(
		provider = %location.origin().ascii_serialization(),
		"Redirecting to provider login."
	);

	Ok(Found(location))
}

fn authorize_location(config: &RelayConfig, params: &ConnectParams) -> Result<Url> {
	let redirect_uri = params
		.redirect_uri
		.as_deref()
		.map(str::trim)
		.filter(|uri| !uri.is_empty())
		.ok_or(ValidationError::MissingParameter { name: "redirect_uri" })?;

	validate_redirect_uri(redirect_uri)?;

	let provider = config.providers.resolve(params.login_url.as_deref())?;
	let state = StateToken::new(provider, redirect_uri);

	oauth::authorize_url(config, provider, &state)
}

/// Accepts only absolute `http`/`https` URLs as caller destinations.
pub(crate) fn validate_redirect_uri(raw: &str) -> Result<Url, ValidationError> {
	let invalid = |reason: &str| ValidationError::InvalidParameter {
		name: "redirect_uri",
		reason: reason.to_owned(),
	};
	let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

	match url.scheme() {
		"http" | "https" if url.has_host() => Ok(url),
		"http" | "https" => Err(invalid("missing host")),
		_ => Err(invalid("must be an http or https URL")),
	}
}
