//! Provider strategy hooks that customize token exchanges.
//!
//! Implementations decorate outgoing token requests and sort token endpoint failures into
//! client-side causes (bad code, stale refresh token) and provider-side causes (broken client
//! registration, outages) without tying handlers to any particular HTTP client.

// self
use crate::{_prelude::*, provider::GrantType};

/// Strategy hook that allows providers to decorate requests and classify errors.
///
/// Override only what you need; `augment_token_request` defaults to a no-op.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a failed token response into the relay taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Gives providers a chance to add custom form parameters before dispatching.
	fn augment_token_request(&self, _grant: GrantType, _form: &mut BTreeMap<String, String>) {}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization grant (bad code/refresh token).
	InvalidGrant,
	/// Client authentication failed; the relay's registration is wrong.
	InvalidClient,
	/// Requested scopes exceed what the client may obtain.
	InsufficientScope,
	/// Provider-side failure or an unrecognized response.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// Only primitive data is kept so strategies stay decoupled from the HTTP stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
		}
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(preview(body.into()));

		self
	}
}

/// Classifier tuned for Salesforce-style token endpoints.
///
/// The OAuth `error` field is matched exactly, then `error_description` and the body preview are
/// scanned for known codes and phrases, and the HTTP status decides last.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultProviderStrategy;
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		ctx.oauth_error
			.as_deref()
			.and_then(kind_of_code)
			.or_else(|| ctx.error_description.as_deref().and_then(scan_text))
			.or_else(|| ctx.body_preview.as_deref().and_then(scan_text))
			.unwrap_or_else(|| kind_of_status(ctx.http_status))
	}
}

// Ordered; the first hit wins when scanning free text.
const KNOWN_ERRORS: &[(&str, ProviderErrorKind)] = &[
	("invalid_grant", ProviderErrorKind::InvalidGrant),
	("access_denied", ProviderErrorKind::InvalidGrant),
	("inactive_user", ProviderErrorKind::InvalidGrant),
	("inactive_org", ProviderErrorKind::InvalidGrant),
	("expired access/refresh token", ProviderErrorKind::InvalidGrant),
	("invalid_client", ProviderErrorKind::InvalidClient),
	("unauthorized_client", ProviderErrorKind::InvalidClient),
	("redirect_uri_mismatch", ProviderErrorKind::InvalidClient),
	("invalid_scope", ProviderErrorKind::InsufficientScope),
	("insufficient_scope", ProviderErrorKind::InsufficientScope),
	("temporarily_unavailable", ProviderErrorKind::Transient),
	("server_error", ProviderErrorKind::Transient),
	("rate_limit_exceeded", ProviderErrorKind::Transient),
];

fn kind_of_code(code: &str) -> Option<ProviderErrorKind> {
	let code = code.trim();

	// `invalid_client_id` and `invalid_client_credentials` are Salesforce spellings.
	if code.to_ascii_lowercase().starts_with("invalid_client") {
		return Some(ProviderErrorKind::InvalidClient);
	}

	KNOWN_ERRORS.iter().find(|(known, _)| known.eq_ignore_ascii_case(code)).map(|(_, kind)| *kind)
}

fn scan_text(text: &str) -> Option<ProviderErrorKind> {
	let lowered = text.to_ascii_lowercase();

	KNOWN_ERRORS.iter().find(|(known, _)| lowered.contains(known)).map(|(_, kind)| *kind)
}

fn kind_of_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

fn preview(body: String) -> String {
	match body.char_indices().nth(ProviderErrorContext::BODY_PREVIEW_LIMIT) {
		Some((cut, _)) => format!("{}…", &body[..cut]),
		None => body,
	}
}
