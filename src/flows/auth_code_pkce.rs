//! Authorization Code + PKCE flow.
//!
//! [`PublicClient::start_authorization`] prepares the browser leg (state, S256
//! challenge, authorize URL); [`PublicClient::exchange_authorization`] validates the
//! returned `state` and redeems the code with the matching verifier. Clients that run
//! their own browser leg can call
//! [`PublicClient::acquire_token_by_authorization_code`] directly.

mod session;

pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	flows::{PublicClient, common},
	grant::Grant,
	obs::{FlowKind, FlowSpan},
	provider::GrantType,
	transport::TokenResponse,
};

impl PublicClient {
	/// Starts the Authorization Code + PKCE flow.
	///
	/// Send the user to [`AuthorizationSession::authorize_url`] and keep the session
	/// until the redirect comes back.
	pub fn start_authorization(
		&self,
		scopes: ScopeSet,
		redirect_uri: Url,
	) -> Result<AuthorizationSession> {
		let _guard = FlowSpan::new(FlowKind::AuthorizationCode, "start_authorization").entered();

		self.ensure_supported(GrantType::AuthorizationCode)?;

		let authorization = self.descriptor.endpoints.authorization.as_ref().ok_or_else(|| {
			ConfigError::MissingEndpoint {
				descriptor: self.descriptor.id.clone(),
				endpoint: "authorization",
			}
		})?;

		Ok(session::build_session(authorization, &self.client_id, scopes, redirect_uri))
	}

	/// Completes the flow started by [`start_authorization`](Self::start_authorization).
	///
	/// Fails with [`Error::InvalidGrant`] before any request when `returned_state`
	/// does not match the session.
	pub async fn exchange_authorization(
		&self,
		session: AuthorizationSession,
		code: impl Into<String>,
		returned_state: &str,
	) -> Result<TokenResponse> {
		session.validate_state(returned_state)?;

		let (scopes, redirect_uri, pkce) = session.into_exchange_parts();

		self.acquire_token_by_authorization_code(
			code,
			redirect_uri.as_str(),
			Some(pkce.verifier),
			scopes,
		)
		.await
	}

	/// Redeems an authorization code obtained out of band.
	pub async fn acquire_token_by_authorization_code(
		&self,
		code: impl Into<String>,
		redirect_uri: &str,
		code_verifier: Option<String>,
		scopes: ScopeSet,
	) -> Result<TokenResponse> {
		let code = code.into();
		let redirect_uri = redirect_uri.to_owned();

		common::observe_flow(
			FlowKind::AuthorizationCode,
			"acquire_token_by_authorization_code",
			async move {
				self.ensure_supported(GrantType::AuthorizationCode)?;

				self.redeem(Grant::authorization_code(code, redirect_uri, code_verifier, scopes)?)
					.await
			},
		)
		.await
	}
}
