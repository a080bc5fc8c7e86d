//! OAuth endpoint facade: authorize URLs and token endpoint exchanges.

pub use oauth2;

// crates.io
use oauth2::{
	AuthUrl, ClientId, CsrfToken, HttpClientError, RedirectUrl, Scope,
	basic::BasicClient,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	error::{ConfigError, ProviderError, TransportError},
	http::TokenHttpClient,
	provider::{GrantType, ProviderBaseUrl, ProviderErrorContext, ProviderStrategy},
	state::StateToken,
	token::{TokenResponse, TokenSecret},
};

type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into relay [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a relay error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, err: HttpClientError<ReqwestError>) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unknown HTTP client failure".into() }.into(),
		}
	}
}

/// Builds the provider authorize URL the browser is redirected to.
///
/// Carries `response_type=code`, `client_id`, the registered `redirect_uri`, the configured
/// scopes, the encoded `state`, and `response_mode=query`.
pub fn authorize_url(
	config: &RelayConfig,
	provider: &ProviderBaseUrl,
	state: &StateToken,
) -> Result<Url> {
	let client = BasicClient::new(ClientId::new(config.client_id.clone()))
		.set_auth_uri(AuthUrl::from_url(provider.authorize_endpoint()?))
		.set_redirect_uri(RedirectUrl::from_url(config.redirect_uri.clone()));
	let encoded = state.encode();
	let (url, _) = client
		.authorize_url(|| CsrfToken::new(encoded))
		.add_scopes(config.scopes.iter().cloned().map(Scope::new))
		.add_extra_param("response_mode", "query")
		.url();

	Ok(url)
}

/// Token endpoint client bound to the relay's credentials for one request.
pub(crate) struct BasicFacade<'a, C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	pub(crate) http_client: &'a C,
	pub(crate) error_mapper: &'a M,
	pub(crate) strategy: &'a dyn ProviderStrategy,
	pub(crate) config: &'a RelayConfig,
}
impl<'a, C, M> BasicFacade<'a, C, M>
where
	C: TokenHttpClient,
	M: TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization code at `provider`'s token endpoint.
	pub(crate) fn exchange_authorization_code<'f>(
		&'f self,
		provider: &'f ProviderBaseUrl,
		code: &'f str,
	) -> FacadeFuture<'f, TokenResponse> {
		let mut form = self.base_form(GrantType::AuthorizationCode);

		form.insert("code".into(), code.to_owned());
		form.insert("redirect_uri".into(), self.config.redirect_uri.to_string());

		Box::pin(self.request_token(GrantType::AuthorizationCode, provider, form))
	}

	/// Mints a new access token from a refresh token.
	pub(crate) fn refresh_token<'f>(
		&'f self,
		provider: &'f ProviderBaseUrl,
		refresh_token: &'f TokenSecret,
	) -> FacadeFuture<'f, TokenResponse> {
		let mut form = self.base_form(GrantType::RefreshToken);

		form.insert("refresh_token".into(), refresh_token.expose().to_owned());

		Box::pin(self.request_token(GrantType::RefreshToken, provider, form))
	}

	fn base_form(&self, grant: GrantType) -> BTreeMap<String, String> {
		let mut form = BTreeMap::new();

		form.insert("grant_type".into(), grant.as_str().to_owned());
		form.insert("client_id".into(), self.config.client_id.clone());

		if let Some(secret) = &self.config.client_secret {
			form.insert("client_secret".into(), secret.expose().to_owned());
		}

		form
	}

	async fn request_token(
		&self,
		grant: GrantType,
		provider: &ProviderBaseUrl,
		mut form: BTreeMap<String, String>,
	) -> Result<TokenResponse> {
		self.strategy.augment_token_request(grant, &mut form);

		let token_url = provider.token_endpoint()?;
		let body = Serializer::new(String::new()).extend_pairs(form.iter()).finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let handle = self.http_client.handle();
		let response = oauth2::AsyncHttpClient::call(&handle, request)
			.await
			.map_err(|err| self.error_mapper.map_transport_error(err))?;
		let status = response.status();

		if status.is_success() {
			return Ok(TokenResponse::from_slice(grant, response.body())?);
		}

		let body = String::from_utf8_lossy(response.body()).into_owned();

		tracing::error!(
			grant = grant.as_str(),
			status = status.as_u16(),
			body = %body,
			"Token endpoint rejected the request."
		);

		let kind = self.strategy.classify_token_error(&error_context(grant, status.as_u16(), &body));

		Err(ProviderError::Rejected { grant: grant.as_str(), status: status.as_u16(), kind, body }
			.into())
	}
}

#[derive(Deserialize)]
struct OAuthErrorBody {
	error: Option<String>,
	error_description: Option<String>,
}

fn error_context(grant: GrantType, status: u16, body: &str) -> ProviderErrorContext {
	let mut ctx = ProviderErrorContext::new(grant).with_http_status(status).with_body_preview(body);

	if let Ok(parsed) = serde_json::from_str::<OAuthErrorBody>(body) {
		if let Some(error) = parsed.error {
			ctx = ctx.with_oauth_error(error);
		}
		if let Some(description) = parsed.error_description {
			ctx = ctx.with_error_description(description);
		}
	}

	ctx
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{config::TokenDelivery, provider::ProviderDirectory};

	fn config() -> RelayConfig {
		let provider = ProviderBaseUrl::parse("https://login.example.com")
			.expect("Provider fixture should parse.");

		RelayConfig {
			bind_addr: "127.0.0.1:3000".parse().expect("Bind address fixture should parse."),
			client_id: "client-123".into(),
			client_secret: None,
			redirect_uri: Url::parse("http://localhost:3000/callback")
				.expect("Redirect fixture should parse."),
			scopes: vec!["api".into(), "refresh_token".into(), "offline_access".into()],
			providers: ProviderDirectory::new(provider.clone(), [provider]),
			provider_timeout: Duration::from_secs(10),
			token_delivery: TokenDelivery::Query,
		}
	}

	#[test]
	fn authorize_url_carries_fixed_parameters_and_state() {
		let config = config();
		let provider = config.providers.default_provider().clone();
		let state = StateToken::new(&provider, "https://app.example.com/done");
		let url = authorize_url(&config, &provider, &state).expect("Authorize URL should build.");
		let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.origin().ascii_serialization(), "https://login.example.com");
		assert_eq!(url.path(), "/services/oauth2/authorize");
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("response_mode").map(String::as_str), Some("query"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("client-123"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("http://localhost:3000/callback")
		);
		assert_eq!(
			pairs.get("scope").map(String::as_str),
			Some("api refresh_token offline_access")
		);
		assert_eq!(
			pairs.get("state").map(String::as_str),
			Some("https://login.example.com|https://app.example.com/done")
		);
	}

	#[test]
	fn error_context_reads_oauth_fields() {
		let ctx = error_context(
			GrantType::RefreshToken,
			400,
			r#"{"error":"invalid_grant","error_description":"expired access/refresh token"}"#,
		);

		assert_eq!(ctx.http_status, Some(400));
		assert_eq!(ctx.oauth_error.as_deref(), Some("invalid_grant"));
		assert_eq!(ctx.error_description.as_deref(), Some("expired access/refresh token"));

		let ctx = error_context(GrantType::AuthorizationCode, 400, "bad_code");

		assert_eq!(ctx.oauth_error, None);
		assert_eq!(ctx.body_preview.as_deref(), Some("bad_code"));
	}
}
