//! On-behalf-of flow: a middle-tier service trades the caller's token for one aimed
//! at a downstream API.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	flows::{PublicClient, common},
	grant::{Grant, ParameterMap},
	obs::FlowKind,
	provider::GrantType,
	transport::TokenResponse,
};

impl PublicClient {
	/// Exchanges the incoming `assertion` for a token covering `scopes`.
	pub async fn acquire_token_on_behalf_of(
		&self,
		assertion: Secret,
		scopes: ScopeSet,
	) -> Result<TokenResponse> {
		self.acquire_token_on_behalf_of_with(assertion, scopes, ParameterMap::new()).await
	}

	/// Same as [`acquire_token_on_behalf_of`](Self::acquire_token_on_behalf_of) with
	/// caller parameters overlaid last (for example `claims`).
	pub async fn acquire_token_on_behalf_of_with(
		&self,
		assertion: Secret,
		scopes: ScopeSet,
		custom_parameters: ParameterMap,
	) -> Result<TokenResponse> {
		common::observe_flow(FlowKind::OnBehalfOf, "acquire_token_on_behalf_of", async move {
			self.ensure_supported(GrantType::JwtBearer)?;

			let inner = Grant::jwt_bearer(assertion, scopes)?;

			self.redeem(Grant::delegated(inner, true, custom_parameters)?).await
		})
		.await
	}
}
