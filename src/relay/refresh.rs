//! `POST /refresh`: trades a refresh token for a new access token.

// crates.io
use axum::{
	Form, Json,
	extract::{State, rejection::FormRejection},
};
// self
use crate::{
	_prelude::*,
	error::ValidationError,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::Relay,
	token::{RefreshedToken, TokenSecret},
};

/// Form body accepted by `/refresh`.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshForm {
	/// Refresh token previously relayed to the caller.
	pub refresh_token: Option<TokenSecret>,
	/// Provider environment; the configured default when absent.
	pub login_url: Option<String>,
}

/// Refreshes an access token. The refresh token is not echoed back.
pub async fn refresh<C, M>(
	State(relay): State<Relay<C, M>>,
	form: Result<Form<RefreshForm>, FormRejection>,
) -> Result<Json<RefreshedToken>>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let span = FlowSpan::new(FlowKind::Refresh, "refresh");

	obs::record_flow_outcome(FlowKind::Refresh, FlowOutcome::Attempt);

	let result = span.instrument(complete(&relay, form)).await;

	obs::record_flow_result(FlowKind::Refresh, &result);

	result.map(Json)
}

async fn complete<C, M>(
	relay: &Relay<C, M>,
	form: Result<Form<RefreshForm>, FormRejection>,
) -> Result<RefreshedToken>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let Form(form) = form.map_err(|e| ValidationError::Rejected { message: e.body_text() })?;
	let refresh_token = form
		.refresh_token
		.filter(|token| !token.is_blank())
		.ok_or(ValidationError::MissingParameter { name: "refresh_token" })?;
	let provider = relay.config().providers.resolve(form.login_url.as_deref())?.clone();
	let tokens = relay.facade().refresh_token(&provider, &refresh_token).await?;

	tracing::info!(provider = %provider, "Access token refreshed.");

	Ok(tokens.into())
}
