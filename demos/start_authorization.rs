//! Prepares an Authorization Code + PKCE session and checks the returned `state`.

// std
use std::collections::HashMap;
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_public_client::{
	auth::ScopeSet,
	flows::PublicClient,
	provider::{GrantType, ProviderDescriptor},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let descriptor = ProviderDescriptor::builder("demo-provider")
		.authorization_endpoint(Url::parse("https://provider.example.com/authorize")?)
		.token_endpoint(Url::parse("https://provider.example.com/token")?)
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.build()?;
	let client = PublicClient::new(descriptor, "demo-client")?;
	let session = client.start_authorization(
		ScopeSet::new(["User.Read"]),
		Url::parse("http://localhost:8400/")?,
	)?;

	println!("Send your user to {}.", &session.authorize_url);
	println!(
		"PKCE challenge ({}): {}.",
		session.code_challenge_method().as_str(),
		session.code_challenge()
	);

	let mut sessions = HashMap::new();

	sessions.insert(session.state.clone(), session.clone());

	// The redirect handler looks the session up by `state`.
	let returned_state = session.state.clone();

	match sessions.remove(&returned_state) {
		Some(stashed) => {
			stashed.validate_state(&returned_state)?;
			println!("State validated; call PublicClient::exchange_authorization with the code.");
		},
		None => eprintln!("State `{returned_state}` was not recognized."),
	}

	Ok(())
}
