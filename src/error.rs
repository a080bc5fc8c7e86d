//! Relay-level error types and the single error-to-HTTP-response mapping.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
// self
use crate::{_prelude::*, provider::ProviderErrorKind};

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error surfaced by handlers and helpers.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Caller or provider supplied input that cannot be processed.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Token endpoint rejected the request or answered with garbage.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Listener could not be started or crashed.
	#[error(transparent)]
	Startup(#[from] StartupError),
}
impl Error {
	/// HTTP status the error maps to.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Config(_) | Self::Startup(_) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::Validation(_) => StatusCode::BAD_REQUEST,
			Self::Provider(e) => e.status(),
			Self::Transport(TransportError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
			Self::Transport(_) => StatusCode::BAD_GATEWAY,
		}
	}

	/// Stable machine-readable code rendered in error bodies.
	pub fn code(&self) -> &'static str {
		match self {
			Self::Config(_) | Self::Startup(_) => "internal_error",
			Self::Validation(_) => "invalid_request",
			Self::Provider(ProviderError::Rejected { kind, .. }) => match kind {
				ProviderErrorKind::InvalidGrant => "invalid_grant",
				ProviderErrorKind::InsufficientScope => "insufficient_scope",
				ProviderErrorKind::InvalidClient => "invalid_client",
				ProviderErrorKind::Transient => "provider_error",
			},
			Self::Provider(ProviderError::MalformedResponse { .. }) => "provider_error",
			Self::Transport(TransportError::Timeout) => "provider_timeout",
			Self::Transport(_) => "provider_unreachable",
		}
	}
}
impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status();

		if status.is_server_error() {
			tracing::error!(status = status.as_u16(), error = %self, "Request failed.");
		} else {
			tracing::warn!(status = status.as_u16(), error = %self, "Request rejected.");
		}

		let body = ErrorBody { error: self.code(), message: self.to_string() };

		(status, Json(body)).into_response()
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: &'static str,
	message: String,
}

/// Configuration failures raised while loading settings or building clients.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Required environment variable is absent or blank.
	#[error("Environment variable `{name}` is required.")]
	MissingVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		name: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// Provider base URL failed validation.
	#[error("Provider base URL `{url}` is invalid: {reason}.")]
	InvalidProviderUrl {
		/// Offending URL as supplied.
		url: String,
		/// Human-readable reason.
		reason: &'static str,
	},
	/// Provider endpoint could not be derived from its base URL.
	#[error("Provider endpoint is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Input failures detected before (or instead of) contacting the provider.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// Required parameter is absent or empty.
	#[error("Missing required parameter `{name}`.")]
	MissingParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// Parameter is present but unusable.
	#[error("Parameter `{name}` is invalid: {reason}.")]
	InvalidParameter {
		/// Parameter name.
		name: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// Provider base URL is not in the allow-list.
	#[error("Provider `{url}` is not an allowed login URL.")]
	UnknownProvider {
		/// Rejected provider base URL.
		url: String,
	},
	/// `state` parameter does not decode into a provider and redirect pair.
	#[error("The state parameter is malformed: {reason}.")]
	MalformedState {
		/// Human-readable reason.
		reason: &'static str,
	},
	/// Provider redirected back with an authorization error instead of a code.
	#[error("Provider denied the authorization request: {error}{}.", describe(.description))]
	AuthorizationDenied {
		/// OAuth `error` code.
		error: String,
		/// Optional OAuth `error_description`.
		description: Option<String>,
	},
	/// Request extractor rejected the input.
	#[error("{message}")]
	Rejected {
		/// Extractor-supplied message.
		message: String,
	},
}

fn describe(description: &Option<String>) -> String {
	match description.as_deref().map(str::trim) {
		Some(text) if !text.is_empty() => format!(" ({text})"),
		_ => String::new(),
	}
}

/// Token endpoint failures.
///
/// The raw response body is kept for diagnostics but never rendered by `Display`, so the
/// body only reaches the log where the response was received.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint rejected the {grant} request with HTTP {status}.")]
	Rejected {
		/// Grant label.
		grant: &'static str,
		/// HTTP status code.
		status: u16,
		/// Strategy classification.
		kind: ProviderErrorKind,
		/// Raw response body.
		body: String,
	},
	/// Token endpoint answered 2xx with a body that is not a token response.
	#[error("Token endpoint returned a malformed {grant} response.")]
	MalformedResponse {
		/// Grant label.
		grant: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ProviderError {
	fn status(&self) -> StatusCode {
		match self {
			Self::Rejected { kind, .. } => match kind {
				ProviderErrorKind::InvalidGrant | ProviderErrorKind::InsufficientScope =>
					StatusCode::BAD_REQUEST,
				ProviderErrorKind::InvalidClient | ProviderErrorKind::Transient =>
					StatusCode::BAD_GATEWAY,
			},
			Self::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
		}
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// HTTP client failed without a more specific cause.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
	/// Token endpoint did not answer within the configured timeout.
	#[error("Token endpoint did not respond in time.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Fatal process-level failures.
#[derive(Debug, ThisError)]
pub enum StartupError {
	/// Listener could not bind the configured address.
	#[error("Failed to bind {addr}.")]
	Bind {
		/// Address that was requested.
		addr: std::net::SocketAddr,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Server loop terminated with an IO failure.
	#[error("Server terminated unexpectedly.")]
	Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn rejected(kind: ProviderErrorKind) -> Error {
		ProviderError::Rejected {
			grant: "authorization_code",
			status: 400,
			kind,
			body: "secret-body".into(),
		}
		.into()
	}

	#[test]
	fn provider_rejections_split_client_and_provider_causes() {
		assert_eq!(rejected(ProviderErrorKind::InvalidGrant).status(), StatusCode::BAD_REQUEST);
		assert_eq!(rejected(ProviderErrorKind::InsufficientScope).status(), StatusCode::BAD_REQUEST);
		assert_eq!(rejected(ProviderErrorKind::InvalidClient).status(), StatusCode::BAD_GATEWAY);
		assert_eq!(rejected(ProviderErrorKind::Transient).status(), StatusCode::BAD_GATEWAY);
		assert_eq!(rejected(ProviderErrorKind::InvalidGrant).code(), "invalid_grant");
	}

	#[test]
	fn provider_body_stays_out_of_display() {
		let err = rejected(ProviderErrorKind::InvalidGrant);

		assert!(!err.to_string().contains("secret-body"));
		assert_eq!(
			err.to_string(),
			"Token endpoint rejected the authorization_code request with HTTP 400."
		);
	}

	#[test]
	fn transport_and_validation_statuses() {
		assert_eq!(Error::from(TransportError::Timeout).status(), StatusCode::GATEWAY_TIMEOUT);
		assert_eq!(
			Error::from(TransportError::Io(std::io::Error::other("reset"))).status(),
			StatusCode::BAD_GATEWAY
		);

		let err = Error::from(ValidationError::MissingParameter { name: "redirect_uri" });

		assert_eq!(err.status(), StatusCode::BAD_REQUEST);
		assert_eq!(err.code(), "invalid_request");
		assert_eq!(err.to_string(), "Missing required parameter `redirect_uri`.");
	}

	#[test]
	fn authorization_denied_renders_description_when_present() {
		let denied = |description: Option<&str>| {
			Error::from(ValidationError::AuthorizationDenied {
				error: "access_denied".into(),
				description: description.map(str::to_owned),
			})
			.to_string()
		};

		assert_eq!(
			denied(Some("end-user denied authorization")),
			"Provider denied the authorization request: access_denied (end-user denied authorization)."
		);
		assert_eq!(denied(None), "Provider denied the authorization request: access_denied.");
		assert_eq!(denied(Some("  ")), "Provider denied the authorization request: access_denied.");
	}
}
