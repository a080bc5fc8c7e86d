//! Redacting wrapper for access tokens, refresh tokens, and the client secret.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Secret string that never shows up in `Debug` or `Display` output.
///
/// Serde reads and writes the raw value, since forwarding it is the relay's job.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a secret value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value for outbound forms and redirects. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// True when the secret is empty or only whitespace.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({})", REDACTED)
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
