//! `GET /callback`: exchanges the provider's code and forwards tokens to the caller.

// crates.io
use axum::extract::{Query, State, rejection::QueryRejection};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	config::TokenDelivery,
	error::ValidationError,
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	relay::{Found, Relay, connect},
	state::StateToken,
	token::TokenResponse,
};

/// Query parameters the provider sends back.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
	/// Authorization code.
	pub code: Option<String>,
	/// Echoed `state`.
	pub state: Option<String>,
	/// OAuth error code when authorization failed.
	pub error: Option<String>,
	/// Human-readable companion to `error`.
	pub error_description: Option<String>,
}

/// Completes the authorization-code flow and redirects to the caller's destination.
pub async fn callback<C, M>(
	State(relay): State<Relay<C, M>>,
	params: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Found>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let span = FlowSpan::new(FlowKind::Callback, "callback");

	obs::record_flow_outcome(FlowKind::Callback, FlowOutcome::Attempt);

	let result = span.instrument(complete(&relay, params)).await;

	obs::record_flow_result(FlowKind::Callback, &result);

	result.map(Found)
}

async fn complete<C, M>(
	relay: &Relay<C, M>,
	params: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Url>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	let Query(params) =
		params.map_err(|e| ValidationError::Rejected { message: e.body_text() })?;

	if let Some(error) = params.error.filter(|e| !e.is_empty()) {
		return Err(ValidationError::AuthorizationDenied {
			error,
			description: params.error_description,
		}
		.into());
	}

	let code = required(params.code, "code")?;
	let state = StateToken::decode(&required(params.state, "state")?)?;
	let provider = relay.config().providers.lookup(&state.provider)?.clone();
	let destination = connect::validate_redirect_uri(&state.redirect_uri)?;
	let tokens = relay.facade().exchange_authorization_code(&provider, &code).await?;

	tracing::info!(
		provider = %provider,
		refresh_token = tokens.refresh_token.is_some(),
		"Authorization code exchanged."
	);

	Ok(attach_tokens(destination, &tokens, relay.config().token_delivery))
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ValidationError> {
	value.filter(|v| !v.is_empty()).ok_or(ValidationError::MissingParameter { name })
}

/// Appends the token pairs to `destination`, keeping whatever it already carries.
pub(crate) fn attach_tokens(
	mut destination: Url,
	tokens: &TokenResponse,
	delivery: TokenDelivery,
) -> Url {
	let pairs = tokens.redirect_pairs();

	match delivery {
		TokenDelivery::Query => {
			destination.query_pairs_mut().extend_pairs(pairs);
		},
		TokenDelivery::Fragment => {
			let mut fragment = Serializer::new(String::new());

			fragment.extend_pairs(pairs);

			let encoded = fragment.finish();
			let fragment = match destination.fragment().filter(|f| !f.is_empty()) {
				Some(existing) => format!("{existing}&{encoded}"),
				None => encoded,
			};

			destination.set_fragment(Some(&fragment));
		},
	}

	destination
}
