//! Resource-owner username/password flow.
//!
//! Kept for legacy first-party clients; interactive or device code flows are
//! preferred wherever a browser is reachable.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	flows::{PublicClient, common},
	grant::Grant,
	obs::FlowKind,
	provider::GrantType,
	transport::TokenResponse,
};

impl PublicClient {
	/// Exchanges a username and password for tokens.
	pub async fn acquire_token_by_username_password(
		&self,
		username: impl Into<String>,
		password: Secret,
		scopes: ScopeSet,
	) -> Result<TokenResponse> {
		let username = username.into();

		common::observe_flow(
			FlowKind::UsernamePassword,
			"acquire_token_by_username_password",
			async move {
				self.ensure_supported(GrantType::Password)?;

				self.redeem(Grant::username_password(username, password, scopes)?).await
			},
		)
		.await
	}
}
