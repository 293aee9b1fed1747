//! Provider strategy hooks that customize token exchanges.
//!
//! Implementations decorate outgoing parameter maps and classify OAuth error
//! responses without tying flows to any particular HTTP client.

// self
use crate::{_prelude::*, grant::ParameterMap, provider::descriptor::GrantType};

/// Strategy hook that allows providers to decorate requests and classify errors.
///
/// Implementors must be `Send + Sync`. The hooks only see crate-owned data types so
/// downstream crates never depend on reqwest structures. `augment_token_request`
/// defaults to a no-op.
pub trait ProviderStrategy: Send + Sync {
	/// Maps an endpoint failure into the crate's error taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Gives providers a chance to add form parameters before dispatching.
	///
	/// `params` starts with the flow's extra parameters (`client_id`) and is overlaid on
	/// the grant's own contribution, so a key set here replaces the grant's value.
	/// Override the hook when a provider requires extra fields such as `resource` or
	/// `claims`.
	fn augment_token_request(&self, _grant: GrantType, _params: &mut ParameterMap) {}
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
	/// The user has not completed verification yet.
	AuthorizationPending,
	/// The client polls too fast and must widen its interval.
	SlowDown,
	/// The device code expired.
	Expired,
	/// The user or the server declined the authorization request.
	Declined,
	/// Provider rejected the authorization grant (bad code, password or refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the client may obtain.
	InsufficientScope,
	/// Failure is temporary and should be retried.
	Transient,
	/// Any other failure the client does not recover from.
	Fatal,
}
impl ProviderErrorKind {
	/// Whether the poller keeps polling after this outcome.
	pub const fn is_retryable(self) -> bool {
		matches!(self, Self::AuthorizationPending | Self::SlowDown | Self::Transient)
	}
}

/// Context passed to provider strategies when classifying token errors.
///
/// Holds only primitive data (status codes, OAuth fields, body preview) so
/// strategies stay decoupled from any HTTP client.
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
	/// Whether the failure originated from the network layer.
	pub network_error: bool,
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
			network_error: false,
		}
	}

	/// Convenience constructor for network failures.
	pub fn network_failure(grant_type: GrantType) -> Self {
		let mut ctx = Self::new(grant_type);

		ctx.network_error = true;

		ctx
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code returned by the provider.
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
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy following RFC 6749 §5.2 and RFC 8628 §3.5.
///
/// Structured OAuth fields win, then body text hints, then the HTTP status code.
/// Network failures are always transient.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(match_error_code) {
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn match_error_code(value: &str) -> Option<ProviderErrorKind> {
	let kind = match value.to_ascii_lowercase().as_str() {
		"authorization_pending" => ProviderErrorKind::AuthorizationPending,
		"slow_down" => ProviderErrorKind::SlowDown,
		"expired_token" | "code_expired" => ProviderErrorKind::Expired,
		"authorization_declined" | "access_denied" => ProviderErrorKind::Declined,
		"invalid_grant" | "bad_verification_code" | "interaction_required" =>
			ProviderErrorKind::InvalidGrant,
		"invalid_client" | "unauthorized_client" => ProviderErrorKind::InvalidClient,
		"invalid_scope" | "insufficient_scope" => ProviderErrorKind::InsufficientScope,
		"temporarily_unavailable" | "server_error" => ProviderErrorKind::Transient,
		_ => return None,
	};

	Some(kind)
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("authorization_pending") =>
			Some(ProviderErrorKind::AuthorizationPending),
		text if text.contains("slow_down") => Some(ProviderErrorKind::SlowDown),
		text if text.contains("expired_token") => Some(ProviderErrorKind::Expired),
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		Some(408 | 429) => ProviderErrorKind::Transient,
		Some(code) if code >= 500 => ProviderErrorKind::Transient,
		_ => ProviderErrorKind::Fatal,
	}
}
