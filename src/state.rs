//! `state` round-trip encoding.
//!
//! The provider echoes the `state` parameter back to the callback untouched, so the relay uses
//! it to carry the chosen provider environment and the caller's final redirect target. The wire
//! form is `provider '|' redirect_uri` and decoding splits on the first `|`.
//!
//! Both components are URLs. Any literal `|` inside them is written as `%7C`, the
//! percent-encoded form of the same character, which keeps the split unambiguous while the
//! decoded URL still designates the same resource. Decoding never unescapes.

// self
use crate::{_prelude::*, error::ValidationError, provider::ProviderBaseUrl};

/// Separator between the provider base URL and the caller redirect URI.
pub const DELIMITER: char = '|';

const ESCAPED_DELIMITER: &str = "%7C";

/// Provider choice plus caller destination carried through the provider's `state` parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateToken {
	/// Provider base URL the code must be exchanged against.
	pub provider: String,
	/// Where the browser goes once tokens are obtained.
	pub redirect_uri: String,
}
impl StateToken {
	/// Builds a token, escaping the delimiter inside either component.
	pub fn new(provider: &ProviderBaseUrl, redirect_uri: &str) -> Self {
		Self { provider: escape(provider.as_str()), redirect_uri: escape(redirect_uri) }
	}

	/// Wire form placed into the `state` parameter.
	pub fn encode(&self) -> String {
		format!("{}{DELIMITER}{}", self.provider, self.redirect_uri)
	}

	/// Splits a returned `state` on its first delimiter.
	pub fn decode(raw: &str) -> Result<Self, ValidationError> {
		let (provider, redirect_uri) = raw
			.split_once(DELIMITER)
			.ok_or(ValidationError::MalformedState { reason: "missing delimiter" })?;

		if provider.is_empty() || redirect_uri.is_empty() {
			return Err(ValidationError::MalformedState { reason: "empty component" });
		}

		Ok(Self { provider: provider.to_owned(), redirect_uri: redirect_uri.to_owned() })
	}
}
impl Display for StateToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.encode())
	}
}
impl FromStr for StateToken {
	type Err = ValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::decode(s)
	}
}

fn escape(component: &str) -> String {
	component.replace(DELIMITER, ESCAPED_DELIMITER)
}
