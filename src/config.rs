//! Relay configuration loaded from the process environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3000` |
//! | `CLIENT_ID` | required |
//! | `CLIENT_SECRET` | unset |
//! | `REDIRECT_URI` | `http://localhost:3000/callback` |
//! | `SCOPE` | `api refresh_token offline_access` |
//! | `LOGIN_URL` | [`PRODUCTION_LOGIN_URL`] |
//! | `LOGIN_URLS` | production and sandbox, comma separated |
//! | `PROVIDER_TIMEOUT_SECS` | `10` |
//! | `TOKEN_DELIVERY` | `query` |

// std
use std::net::{IpAddr, SocketAddr};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{PRODUCTION_LOGIN_URL, ProviderBaseUrl, ProviderDirectory, SANDBOX_LOGIN_URL},
	token::TokenSecret,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";
const DEFAULT_SCOPE: &str = "api refresh_token offline_access";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the callback handler puts tokens on the caller redirect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenDelivery {
	/// Query string; wire-compatible with existing callers.
	#[default]
	Query,
	/// URL fragment; never sent to servers or leaked through `Referer`.
	Fragment,
}
impl FromStr for TokenDelivery {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"query" => Ok(Self::Query),
			"fragment" => Ok(Self::Fragment),
			other => Err(ConfigError::InvalidVar {
				name: "TOKEN_DELIVERY",
				reason: format!("expected `query` or `fragment`, got `{other}`"),
			}),
		}
	}
}

/// Immutable settings shared by every handler.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Listen address.
	pub bind_addr: SocketAddr,
	/// OAuth client identifier.
	pub client_id: String,
	/// Optional client secret sent with token requests.
	pub client_secret: Option<TokenSecret>,
	/// Callback URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested on every authorization, in configured order.
	pub scopes: Vec<String>,
	/// Allowed provider environments and the default.
	pub providers: ProviderDirectory,
	/// Upper bound for each token endpoint call.
	pub provider_timeout: Duration,
	/// Callback token placement.
	pub token_delivery: TokenDelivery,
}
impl RelayConfig {
	/// Loads `.env` (when present) and then reads the process environment.
	pub fn load() -> Result<Self, ConfigError> {
		match dotenvy::dotenv() {
			Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file."),
			Err(e) if e.not_found() => (),
			Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file."),
		}

		Self::from_env()
	}

	/// Reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds a config from an arbitrary key lookup; blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(name).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let host = match var("HOST") {
			Some(raw) => raw.parse::<IpAddr>().map_err(|e| invalid("HOST", e))?,
			None => DEFAULT_HOST.parse::<IpAddr>().map_err(|e| invalid("HOST", e))?,
		};
		let port = match var("PORT") {
			Some(raw) => raw.parse::<u16>().map_err(|e| invalid("PORT", e))?,
			None => DEFAULT_PORT,
		};
		let client_id = var("CLIENT_ID").ok_or(ConfigError::MissingVar { name: "CLIENT_ID" })?;
		let client_secret = var("CLIENT_SECRET").map(TokenSecret::new);
		let redirect_uri = var("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.into());
		let redirect_uri = Url::parse(&redirect_uri).map_err(|e| invalid("REDIRECT_URI", e))?;
		let scopes = var("SCOPE")
			.unwrap_or_else(|| DEFAULT_SCOPE.into())
			.split_whitespace()
			.map(str::to_owned)
			.collect();
		let default_provider =
			ProviderBaseUrl::parse(&var("LOGIN_URL").unwrap_or_else(|| PRODUCTION_LOGIN_URL.into()))?;
		let allowed = match var("LOGIN_URLS") {
			Some(raw) => raw
				.split(',')
				.map(str::trim)
				.filter(|entry| !entry.is_empty())
				.map(ProviderBaseUrl::parse)
				.collect::<Result<Vec<_>, _>>()?,
			None => vec![
				ProviderBaseUrl::parse(PRODUCTION_LOGIN_URL)?,
				ProviderBaseUrl::parse(SANDBOX_LOGIN_URL)?,
			],
		};
		let provider_timeout = match var("PROVIDER_TIMEOUT_SECS") {
			Some(raw) => match raw.parse::<u64>().map_err(|e| invalid("PROVIDER_TIMEOUT_SECS", e))? {
				0 => return Err(invalid("PROVIDER_TIMEOUT_SECS", "must be greater than zero")),
				secs => Duration::from_secs(secs),
			},
			None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
		};
		let token_delivery = match var("TOKEN_DELIVERY") {
			Some(raw) => raw.parse()?,
			None => TokenDelivery::default(),
		};

		Ok(Self {
			bind_addr: SocketAddr::new(host, port),
			client_id,
			client_secret,
			redirect_uri,
			scopes,
			providers: ProviderDirectory::new(default_provider, allowed),
			provider_timeout,
			token_delivery,
		})
	}
}

fn invalid(name: &'static str, reason: impl Display) -> ConfigError {
	ConfigError::InvalidVar { name, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn load(pairs: &[(&str, &str)]) -> Result<RelayConfig, ConfigError> {
		let env: HashMap<String, String> =
			pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();

		RelayConfig::from_lookup(|key| env.get(key).cloned())
	}

	#[test]
	fn defaults_apply_when_only_client_id_is_set() {
		let config = load(&[("CLIENT_ID", "client-abc")]).expect("Minimal config should load.");

		assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().expect("Address should parse."));
		assert_eq!(config.client_id, "client-abc");
		assert!(config.client_secret.is_none());
		assert_eq!(config.redirect_uri.as_str(), "http://localhost:3000/callback");
		assert_eq!(config.scopes, ["api", "refresh_token", "offline_access"]);
		assert_eq!(config.providers.default_provider().as_str(), PRODUCTION_LOGIN_URL);
		assert_eq!(
			config.providers.iter().map(ProviderBaseUrl::as_str).collect::<Vec<_>>(),
			[PRODUCTION_LOGIN_URL, SANDBOX_LOGIN_URL]
		);
		assert_eq!(config.provider_timeout, Duration::from_secs(10));
		assert_eq!(config.token_delivery, TokenDelivery::Query);
	}

	#[test]
	fn missing_client_id_fails_fast() {
		for env in [&[][..], &[("CLIENT_ID", "   ")][..]] {
			let err = load(env).expect_err("Config without CLIENT_ID must fail.");

			assert!(matches!(err, ConfigError::MissingVar { name: "CLIENT_ID" }));
		}
	}

	#[test]
	fn overrides_are_parsed_and_validated() {
		let config = load(&[
			("CLIENT_ID", "client-abc"),
			("CLIENT_SECRET", "shh"),
			("HOST", "127.0.0.1"),
			("PORT", "8080"),
			("LOGIN_URL", "https://test.salesforce.com/"),
			("LOGIN_URLS", "https://login.salesforce.com, https://acme.my.salesforce.com"),
			("SCOPE", "api  web"),
			("PROVIDER_TIMEOUT_SECS", "3"),
			("TOKEN_DELIVERY", "Fragment"),
		])
		.expect("Overridden config should load.");

		assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().expect("Address should parse."));
		assert_eq!(config.client_secret.as_ref().map(TokenSecret::expose), Some("shh"));
		assert_eq!(config.providers.default_provider().as_str(), SANDBOX_LOGIN_URL);
		assert_eq!(config.providers.iter().count(), 3);
		assert_eq!(config.scopes, ["api", "web"]);
		assert_eq!(config.provider_timeout, Duration::from_secs(3));
		assert_eq!(config.token_delivery, TokenDelivery::Fragment);
	}

	#[test]
	fn invalid_values_are_rejected() {
		for (name, value) in [
			("PORT", "http"),
			("HOST", "not-an-ip"),
			("REDIRECT_URI", "/callback"),
			("PROVIDER_TIMEOUT_SECS", "0"),
			("TOKEN_DELIVERY", "cookie"),
		] {
			let err = load(&[("CLIENT_ID", "client-abc"), (name, value)])
				.expect_err("Invalid override must be rejected.");

			assert!(matches!(err, ConfigError::InvalidVar { .. }), "{name}={value} gave {err:?}.");
		}

		let err = load(&[("CLIENT_ID", "client-abc"), ("LOGIN_URL", "http://login.example.com")])
			.expect_err("Insecure login URL must be rejected.");

		assert!(matches!(err, ConfigError::InvalidProviderUrl { .. }));
	}
}
