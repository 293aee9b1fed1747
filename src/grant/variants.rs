// self
use crate::{
	_prelude::*,
	auth::{CorrelationId, ScopeSet, Secret},
	grant::{
		CLIENT_INFO_PARAM, GRANT_TYPE_PARAM, Grant, GrantError, ParameterMap, SCOPE_PARAM,
	},
	provider::GrantType,
};

/// `requested_token_use` value marking an on-behalf-of exchange.
pub const ON_BEHALF_OF: &str = "on_behalf_of";

/// Device code redemption for a single poll.
///
/// The correlation id is exposed for the transport headers and never rendered into
/// the request body.
#[derive(Clone, Debug)]
pub struct DeviceCodeGrant {
	device_code: String,
	correlation_id: CorrelationId,
	scopes: ScopeSet,
}
impl DeviceCodeGrant {
	pub(crate) fn new(
		device_code: impl Into<String>,
		correlation_id: CorrelationId,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		let device_code = non_blank(device_code.into(), "device_code")?;

		Ok(Self { device_code, correlation_id, scopes })
	}

	/// Device code issued by the device authorization endpoint.
	pub fn device_code(&self) -> &str {
		&self.device_code
	}

	/// Correlation id shared by every request of the owning flow.
	pub fn correlation_id(&self) -> &CorrelationId {
		&self.correlation_id
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		scoped(&self.scopes, GrantType::DeviceCode)
			.with("device_code", &self.device_code)
			.with(CLIENT_INFO_PARAM, "1")
	}
}

/// Resource-owner password credentials.
#[derive(Clone, Debug)]
pub struct UsernamePasswordGrant {
	username: String,
	password: Secret,
	scopes: ScopeSet,
}
impl UsernamePasswordGrant {
	pub(crate) fn new(
		username: impl Into<String>,
		password: Secret,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		let username = non_blank(username.into(), "username")?;

		if password.is_empty() {
			return Err(GrantError::EmptyField { field: "password" });
		}

		Ok(Self { username, password, scopes })
	}

	/// Account name sent as `username`.
	pub fn username(&self) -> &str {
		&self.username
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		scoped(&self.scopes, GrantType::Password)
			.with("username", &self.username)
			.with("password", self.password.expose())
	}
}

/// Authorization code redemption, with an optional PKCE verifier.
#[derive(Clone, Debug)]
pub struct AuthorizationCodeGrant {
	code: String,
	redirect_uri: String,
	code_verifier: Option<String>,
	scopes: ScopeSet,
}
impl AuthorizationCodeGrant {
	pub(crate) fn new(
		code: impl Into<String>,
		redirect_uri: impl Into<String>,
		code_verifier: Option<String>,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		let code = non_blank(code.into(), "code")?;
		let redirect_uri = non_blank(redirect_uri.into(), "redirect_uri")?;

		Url::parse(&redirect_uri).map_err(|source| GrantError::InvalidRedirectUri { source })?;

		let code_verifier = code_verifier.filter(|verifier| !verifier.trim().is_empty());

		Ok(Self { code, redirect_uri, code_verifier, scopes })
	}

	/// Redirect URI exactly as it was sent to the authorization endpoint.
	pub fn redirect_uri(&self) -> &str {
		&self.redirect_uri
	}

	/// Returns true when a PKCE verifier accompanies the code.
	pub fn has_code_verifier(&self) -> bool {
		self.code_verifier.is_some()
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		let mut params = scoped(&self.scopes, GrantType::AuthorizationCode)
			.with("code", &self.code)
			.with("redirect_uri", &self.redirect_uri);

		if let Some(verifier) = &self.code_verifier {
			params.insert_single("code_verifier", verifier);
		}

		params
	}
}

/// Refresh token redemption.
#[derive(Clone, Debug)]
pub struct RefreshTokenGrant {
	refresh_token: Secret,
	scopes: ScopeSet,
}
impl RefreshTokenGrant {
	pub(crate) fn new(refresh_token: Secret, scopes: ScopeSet) -> Result<Self, GrantError> {
		if refresh_token.expose().trim().is_empty() {
			return Err(GrantError::EmptyField { field: "refresh_token" });
		}

		Ok(Self { refresh_token, scopes })
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		scoped(&self.scopes, GrantType::RefreshToken)
			.with("refresh_token", self.refresh_token.expose())
			.with(CLIENT_INFO_PARAM, "1")
	}
}

/// JWT bearer assertion, the inner grant of an on-behalf-of exchange.
#[derive(Clone, Debug)]
pub struct JwtBearerGrant {
	assertion: Secret,
	scopes: ScopeSet,
}
impl JwtBearerGrant {
	pub(crate) fn new(assertion: Secret, scopes: ScopeSet) -> Result<Self, GrantError> {
		if assertion.expose().trim().is_empty() {
			return Err(GrantError::EmptyField { field: "assertion" });
		}

		Ok(Self { assertion, scopes })
	}

	/// Requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		scoped(&self.scopes, GrantType::JwtBearer).with("assertion", self.assertion.expose())
	}
}

/// Wrapper that layers `requested_token_use` and caller parameters over another grant.
#[derive(Clone, Debug)]
pub struct DelegatedGrant {
	inner: Arc<Grant>,
	on_behalf_of: bool,
	custom_parameters: ParameterMap,
}
impl DelegatedGrant {
	pub(crate) fn new(
		inner: impl Into<Arc<Grant>>,
		on_behalf_of: bool,
		custom_parameters: ParameterMap,
	) -> Result<Self, GrantError> {
		let inner = inner.into();

		if matches!(inner.as_ref(), Grant::Delegated(_)) {
			return Err(GrantError::NestedDelegation);
		}
		if custom_parameters.keys().any(|key| key.trim().is_empty()) {
			return Err(GrantError::EmptyField { field: "custom parameter name" });
		}

		Ok(Self { inner, on_behalf_of, custom_parameters })
	}

	/// Wrapped grant.
	pub fn inner(&self) -> &Grant {
		&self.inner
	}

	/// Returns true when the request is an on-behalf-of exchange.
	pub fn on_behalf_of(&self) -> bool {
		self.on_behalf_of
	}

	/// Caller parameters overlaid last.
	pub fn custom_parameters(&self) -> &ParameterMap {
		&self.custom_parameters
	}

	pub(crate) fn contribute(&self) -> ParameterMap {
		let mut params = self.inner.contribute();

		if self.on_behalf_of {
			params.insert_single("requested_token_use", ON_BEHALF_OF);
		}

		params.overlay(&self.custom_parameters);

		params
	}
}

fn scoped(scopes: &ScopeSet, grant: GrantType) -> ParameterMap {
	ParameterMap::new().with(SCOPE_PARAM, scopes.scope_param()).with(GRANT_TYPE_PARAM, grant.as_str())
}

fn non_blank(value: String, field: &'static str) -> Result<String, GrantError> {
	if value.trim().is_empty() { Err(GrantError::EmptyField { field }) } else { Ok(value) }
}
