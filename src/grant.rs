//! Authorization grants and their token-request parameters.
//!
//! A [`Grant`] describes how one token request proves the caller's right to a token.
//! Every variant is immutable once built and renders its parameters through the pure
//! [`Grant::contribute`]. [`serialize`] overlays caller extras on top and freezes the
//! result, so a grant built once may be serialized any number of times with identical
//! output.

mod params;
mod variants;

pub use params::*;
pub use variants::*;

// self
use crate::{_prelude::*, auth::ScopeSet, provider::GrantType};

/// `scope` parameter name.
pub const SCOPE_PARAM: &str = "scope";
/// `grant_type` parameter name.
pub const GRANT_TYPE_PARAM: &str = "grant_type";
/// `client_id` parameter name.
pub const CLIENT_ID_PARAM: &str = "client_id";
/// `client_info` parameter name; `1` asks the server to return account identifiers.
pub const CLIENT_INFO_PARAM: &str = "client_info";

/// Precondition failures raised while constructing a grant.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum GrantError {
	/// A required field was empty or blank.
	#[error("The {field} field cannot be empty.")]
	EmptyField {
		/// Name of the offending field.
		field: &'static str,
	},
	/// The redirect URI could not be parsed as an absolute URL.
	#[error("Redirect URI is invalid.")]
	InvalidRedirectUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Delegated grants must wrap a concrete grant.
	#[error("A delegated grant cannot wrap another delegated grant.")]
	NestedDelegation,
}

/// Closed set of grant shapes understood by the token endpoint.
#[derive(Clone, Debug)]
pub enum Grant {
	/// Device code redemption.
	DeviceCode(DeviceCodeGrant),
	/// Resource-owner username/password.
	UsernamePassword(UsernamePasswordGrant),
	/// Authorization code redemption.
	AuthorizationCode(AuthorizationCodeGrant),
	/// Refresh token redemption.
	RefreshToken(RefreshTokenGrant),
	/// JWT bearer assertion.
	JwtBearer(JwtBearerGrant),
	/// Wrapper adding on-behalf-of and caller parameters to another grant.
	Delegated(DelegatedGrant),
}
impl Grant {
	/// Builds a device code grant for one poll of the token endpoint.
	pub fn device_code(
		device_code: impl Into<String>,
		correlation_id: crate::auth::CorrelationId,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		DeviceCodeGrant::new(device_code, correlation_id, scopes).map(Self::DeviceCode)
	}

	/// Builds a username/password grant.
	pub fn username_password(
		username: impl Into<String>,
		password: crate::auth::Secret,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		UsernamePasswordGrant::new(username, password, scopes).map(Self::UsernamePassword)
	}

	/// Builds an authorization code grant; `code_verifier` is the PKCE verifier, if any.
	pub fn authorization_code(
		code: impl Into<String>,
		redirect_uri: impl Into<String>,
		code_verifier: Option<String>,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		AuthorizationCodeGrant::new(code, redirect_uri, code_verifier, scopes)
			.map(Self::AuthorizationCode)
	}

	/// Builds a refresh token grant.
	pub fn refresh_token(
		refresh_token: crate::auth::Secret,
		scopes: ScopeSet,
	) -> Result<Self, GrantError> {
		RefreshTokenGrant::new(refresh_token, scopes).map(Self::RefreshToken)
	}

	/// Builds a JWT bearer assertion grant.
	pub fn jwt_bearer(assertion: crate::auth::Secret, scopes: ScopeSet) -> Result<Self, GrantError> {
		JwtBearerGrant::new(assertion, scopes).map(Self::JwtBearer)
	}

	/// Wraps `inner`, optionally marking the request as on-behalf-of and overlaying
	/// caller parameters.
	pub fn delegated(
		inner: impl Into<Arc<Grant>>,
		on_behalf_of: bool,
		custom_parameters: ParameterMap,
	) -> Result<Self, GrantError> {
		DelegatedGrant::new(inner, on_behalf_of, custom_parameters).map(Self::Delegated)
	}

	/// On-behalf-of request exchanging the caller's `assertion` for a downstream token.
	pub fn on_behalf_of(assertion: crate::auth::Secret, scopes: ScopeSet) -> Result<Self, GrantError> {
		Self::delegated(Self::jwt_bearer(assertion, scopes)?, true, ParameterMap::new())
	}

	/// Grant type sent on the wire; delegated grants report their inner grant's type.
	pub fn grant_type(&self) -> GrantType {
		match self {
			Self::DeviceCode(_) => GrantType::DeviceCode,
			Self::UsernamePassword(_) => GrantType::Password,
			Self::AuthorizationCode(_) => GrantType::AuthorizationCode,
			Self::RefreshToken(_) => GrantType::RefreshToken,
			Self::JwtBearer(_) => GrantType::JwtBearer,
			Self::Delegated(grant) => grant.inner().grant_type(),
		}
	}

	/// Scopes requested by the grant.
	pub fn scopes(&self) -> &ScopeSet {
		match self {
			Self::DeviceCode(grant) => grant.scopes(),
			Self::UsernamePassword(grant) => grant.scopes(),
			Self::AuthorizationCode(grant) => grant.scopes(),
			Self::RefreshToken(grant) => grant.scopes(),
			Self::JwtBearer(grant) => grant.scopes(),
			Self::Delegated(grant) => grant.inner().scopes(),
		}
	}

	/// Parameters this grant contributes to a token request.
	pub fn contribute(&self) -> ParameterMap {
		match self {
			Self::DeviceCode(grant) => grant.contribute(),
			Self::UsernamePassword(grant) => grant.contribute(),
			Self::AuthorizationCode(grant) => grant.contribute(),
			Self::RefreshToken(grant) => grant.contribute(),
			Self::JwtBearer(grant) => grant.contribute(),
			Self::Delegated(grant) => grant.contribute(),
		}
	}
}

/// Renders the final token request parameters for `grant`.
///
/// Starts from [`Grant::contribute`] and overlays `extra`; a key present in both takes
/// `extra`'s value list verbatim. The result is frozen.
pub fn serialize(grant: &Grant, extra: &ParameterMap) -> Parameters {
	let mut params = grant.contribute();

	params.overlay(extra);

	params.freeze()
}
