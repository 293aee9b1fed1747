//! Refresh token redemption.
//!
//! The refresh token is presented as-is; the crate keeps no token cache, so rotating
//! the stored refresh token is the caller's job when the response carries a new one.

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
	/// Redeems `refresh_token` for a fresh access token covering `scopes`.
	pub async fn acquire_token_by_refresh_token(
		&self,
		refresh_token: Secret,
		scopes: ScopeSet,
	) -> Result<TokenResponse> {
		common::observe_flow(FlowKind::Refresh, "acquire_token_by_refresh_token", async move {
			self.ensure_supported(GrantType::RefreshToken)?;

			self.redeem(Grant::refresh_token(refresh_token, scopes)?).await
		})
		.await
	}
}
