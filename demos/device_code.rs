//! Signs a user in with the device code flow against a v2.0-style authority.
//!
//! Set `CLIENT_ID` (and optionally `AUTHORITY`) before running; press Ctrl-C to abandon
//! the flow.

// std
use std::env;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_public_client::{
	auth::ScopeSet,
	flows::{CancelSignal, PublicClient},
	provider::{GrantType, ProviderDescriptor},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = env::var("CLIENT_ID")?;
	let authority = env::var("AUTHORITY")
		.unwrap_or_else(|_| "https://login.microsoftonline.com/organizations/".into());
	let descriptor = ProviderDescriptor::builder("entra")
		.authority(&Url::parse(&authority)?)?
		.support_grants([GrantType::DeviceCode, GrantType::RefreshToken])
		.build()?;
	let client = PublicClient::new(descriptor, client_id)?;
	let cancel = CancelSignal::new();
	let token = client
		.acquire_token_by_device_code(
			ScopeSet::new(["User.Read"]),
			|notice| println!("{}", notice.message),
			cancel,
		)
		.await?;

	println!(
		"Signed in; access token expires in {}s, refresh token issued: {}.",
		token.expires_in.unwrap_or_default(),
		token.refresh_token.is_some()
	);
	println!("Poll counters: {:?}.", client.poll_metrics);

	Ok(())
}
