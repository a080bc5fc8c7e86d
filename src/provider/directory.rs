//! Provider base URLs and the allow-list used to resolve them.

// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ValidationError},
};

/// Production login environment.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";
/// Sandbox login environment.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

const AUTHORIZE_PATH: &str = "services/oauth2/authorize";
const TOKEN_PATH: &str = "services/oauth2/token";

/// Validated root origin of a provider's OAuth endpoints.
///
/// The canonical form has no trailing `/`, no query, no fragment, and never contains the
/// [`StateToken`](crate::state::StateToken) delimiter. Plain `http` is only accepted for
/// loopback hosts.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProviderBaseUrl(String);
impl ProviderBaseUrl {
	/// Parses and canonicalizes a provider base URL.
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		let invalid = |reason| ConfigError::InvalidProviderUrl { url: raw.to_owned(), reason };
		let url = Url::parse(raw.trim()).map_err(|_| invalid("not an absolute URL"))?;

		match url.scheme() {
			"https" => (),
			"http" if is_loopback(&url) => (),
			_ => return Err(invalid("must use https")),
		}

		if url.host().is_none() {
			return Err(invalid("missing host"));
		}
		if url.query().is_some() || url.fragment().is_some() {
			return Err(invalid("must not carry a query or fragment"));
		}

		let canonical = url.as_str().trim_end_matches('/');

		if canonical.contains(crate::state::DELIMITER) {
			return Err(invalid("must not contain `|`"));
		}

		Ok(Self(canonical.to_owned()))
	}

	/// Canonical string form.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Authorization endpoint the browser is sent to.
	pub fn authorize_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(AUTHORIZE_PATH)
	}

	/// Token endpoint used for code exchanges and refreshes.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(TOKEN_PATH)
	}

	fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		Url::parse(&format!("{}/{path}", self.0))
			.map_err(|source| ConfigError::InvalidEndpoint { source })
	}
}
impl AsRef<str> for ProviderBaseUrl {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl FromStr for ProviderBaseUrl {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::parse(s)
	}
}
impl Debug for ProviderBaseUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ProviderBaseUrl({})", self.0)
	}
}
impl Display for ProviderBaseUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Allow-list of provider environments plus the default used when callers omit one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDirectory {
	default: ProviderBaseUrl,
	allowed: Vec<ProviderBaseUrl>,
}
impl ProviderDirectory {
	/// Builds a directory; the default is always allowed and listed first.
	pub fn new<I>(default: ProviderBaseUrl, allowed: I) -> Self
	where
		I: IntoIterator<Item = ProviderBaseUrl>,
	{
		let mut list = vec![default.clone()];

		for url in allowed {
			if !list.contains(&url) {
				list.push(url);
			}
		}

		Self { default, allowed: list }
	}

	/// Provider used when a request does not name one.
	pub fn default_provider(&self) -> &ProviderBaseUrl {
		&self.default
	}

	/// Iterator over every allowed provider, default first.
	pub fn iter(&self) -> impl Iterator<Item = &ProviderBaseUrl> {
		self.allowed.iter()
	}

	/// Resolves an optional caller choice; blank or absent falls back to the default.
	pub fn resolve(&self, requested: Option<&str>) -> Result<&ProviderBaseUrl, ValidationError> {
		match requested.map(str::trim) {
			None | Some("") => Ok(&self.default),
			Some(raw) => self.lookup(raw),
		}
	}

	/// Finds an allowed provider equal to `raw` after canonicalization.
	pub fn lookup(&self, raw: &str) -> Result<&ProviderBaseUrl, ValidationError> {
		let unknown = || ValidationError::UnknownProvider { url: raw.to_owned() };
		let candidate = ProviderBaseUrl::parse(raw).map_err(|_| unknown())?;

		self.allowed.iter().find(|allowed| **allowed == candidate).ok_or_else(unknown)
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base(raw: &str) -> ProviderBaseUrl {
		ProviderBaseUrl::parse(raw).expect("Provider base URL fixture should parse.")
	}

	#[test]
	fn base_url_is_canonicalized() {
		assert_eq!(base("https://Login.Salesforce.com/").as_str(), "https://login.salesforce.com");
		assert_eq!(base("https://example.com/tenant/").as_str(), "https://example.com/tenant");
		assert_eq!(
			base("https://example.com/tenant").token_endpoint().map(String::from).ok(),
			Some("https://example.com/tenant/services/oauth2/token".into())
		);
		assert_eq!(
			base(PRODUCTION_LOGIN_URL).authorize_endpoint().map(String::from).ok(),
			Some("https://login.salesforce.com/services/oauth2/authorize".into())
		);
	}

	#[test]
	fn base_url_rejects_insecure_and_decorated_urls() {
		for raw in [
			"http://login.example.com",
			"ftp://login.example.com",
			"https://login.example.com/?a=b",
			"https://login.example.com/#frag",
			"https://login.example.com/a|b",
			"not a url",
		] {
			assert!(
				matches!(ProviderBaseUrl::parse(raw), Err(ConfigError::InvalidProviderUrl { .. })),
				"{raw} should be rejected."
			);
		}

		assert!(ProviderBaseUrl::parse("http://127.0.0.1:8080").is_ok());
		assert!(ProviderBaseUrl::parse("http://localhost:8080").is_ok());
	}

	#[test]
	fn directory_resolves_default_and_allow_list() {
		let directory = ProviderDirectory::new(
			base(PRODUCTION_LOGIN_URL),
			[base(SANDBOX_LOGIN_URL), base(PRODUCTION_LOGIN_URL)],
		);

		assert_eq!(directory.iter().count(), 2);
		assert_eq!(directory.resolve(None).map(|p| p.as_str()).ok(), Some(PRODUCTION_LOGIN_URL));
		assert_eq!(directory.resolve(Some("")).map(|p| p.as_str()).ok(), Some(PRODUCTION_LOGIN_URL));
		assert_eq!(
			directory.resolve(Some("https://test.salesforce.com/")).map(|p| p.as_str()).ok(),
			Some(SANDBOX_LOGIN_URL)
		);

		let err = directory
			.resolve(Some("https://evil.example.com"))
			.expect_err("Unknown providers must be rejected.");

		assert!(matches!(err, ValidationError::UnknownProvider { .. }));
	}
}
