//! Token endpoint response model and the shapes relayed onward.

// self
use crate::{
	_prelude::*,
	error::ProviderError,
	provider::GrantType,
	token::TokenSecret,
};

/// Successful token endpoint body.
///
/// Only the fields the relay forwards are modeled; everything else the provider sends
/// (`id`, `signature`, `issued_at`, ...) is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
	/// Freshly issued access token.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued one.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// API host the access token is valid against.
	pub instance_url: String,
}
impl TokenResponse {
	/// Parses a 2xx token endpoint body.
	pub fn from_slice(grant: GrantType, body: &[u8]) -> Result<Self, ProviderError> {
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ProviderError::MalformedResponse { grant: grant.as_str(), source })
	}

	/// Key/value pairs attached to the caller redirect after a code exchange.
	///
	/// `refresh_token` is skipped when the provider did not return one.
	pub fn redirect_pairs(&self) -> Vec<(&'static str, &str)> {
		let mut pairs = vec![("access_token", self.access_token.expose())];

		if let Some(refresh) = &self.refresh_token {
			pairs.push(("refresh_token", refresh.expose()));
		}

		pairs.push(("instance_url", self.instance_url.as_str()));

		pairs
	}
}

/// JSON body returned by the refresh endpoint.
///
/// Carries no refresh token; callers keep the one they sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RefreshedToken {
	/// New access token.
	pub access_token: TokenSecret,
	/// API host the access token is valid against.
	pub instance_url: String,
}
impl From<TokenResponse> for RefreshedToken {
	fn from(response: TokenResponse) -> Self {
		Self { access_token: response.access_token, instance_url: response.instance_url }
	}
}
