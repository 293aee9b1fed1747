// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::ScopeSet, grant::CLIENT_ID_PARAM};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Authorization Code + PKCE handshake state returned by
/// [`PublicClient::start_authorization`](crate::flows::PublicClient::start_authorization).
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Requested scopes, redeemed unchanged during the exchange.
	pub scopes: ScopeSet,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Authorize URL to send the user to.
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl AuthorizationSession {
	fn new(
		scopes: ScopeSet,
		redirect_uri: Url,
		authorize_url: Url,
		state: String,
		pkce: PkcePair,
	) -> Self {
		Self { scopes, state, redirect_uri, authorize_url, pkce }
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		&self.pkce.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		self.pkce.method
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch".into() })
		}
	}

	pub(super) fn into_exchange_parts(self) -> (ScopeSet, Url, PkcePair) {
		let AuthorizationSession { scopes, redirect_uri, pkce, .. } = self;

		(scopes, redirect_uri, pkce)
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("scopes", &self.scopes)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
pub(super) struct PkcePair {
	pub(super) verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

pub(super) fn build_session(
	authorization_endpoint: &Url,
	client_id: &str,
	scopes: ScopeSet,
	redirect_uri: Url,
) -> AuthorizationSession {
	let state = random_string(STATE_LEN);
	let pkce = PkcePair::generate();
	let authorize_url =
		build_authorize_url(authorization_endpoint, client_id, &redirect_uri, &scopes, &state, &pkce);

	AuthorizationSession::new(scopes, redirect_uri, authorize_url, state, pkce)
}

fn build_authorize_url(
	authorization_endpoint: &Url,
	client_id: &str,
	redirect_uri: &Url,
	scopes: &ScopeSet,
	state: &str,
	pkce: &PkcePair,
) -> Url {
	let mut url = authorization_endpoint.clone();

	url.query_pairs_mut()
		.append_pair("response_type", "code")
		.append_pair(CLIENT_ID_PARAM, client_id)
		.append_pair("redirect_uri", redirect_uri.as_str())
		.append_pair("scope", &scopes.scope_param())
		.append_pair("state", state)
		.append_pair("code_challenge", &pkce.challenge)
		.append_pair("code_challenge_method", pkce.method.as_str());

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
