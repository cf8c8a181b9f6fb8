// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
// self
use crate::{_prelude::*, auth::ScopeSet, provider::CognitoEndpoints};

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

/// Redirect metadata produced by [`Strategy::authorization_request`].
///
/// The host application keeps the session (typically in its own session store) until the
/// user agent returns to the callback URL, then hands it back to
/// [`Strategy::authenticate`].
///
/// [`Strategy::authorization_request`]: crate::strategy::Strategy::authorization_request
/// [`Strategy::authenticate`]: crate::strategy::Strategy::authenticate
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Scopes placed on the authorize URL.
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// Callback URL the code is bound to.
	pub redirect_uri: Url,
	/// Hosted UI URL the user agent should be sent to.
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl AuthorizationSession {
	fn new(
		scope: ScopeSet,
		redirect_uri: Url,
		authorize_url: Url,
		state: String,
		pkce: PkcePair,
	) -> Self {
		Self { scope, state, redirect_uri, authorize_url, pkce }
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
	///
	/// The comparison runs in constant time.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if bool::from(returned_state.as_bytes().ct_eq(self.state.as_bytes())) {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch.".into() })
		}
	}

	pub(super) fn pkce_verifier(&self) -> &str {
		&self.pkce.verifier
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
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
	endpoints: &CognitoEndpoints,
	client_id: &str,
	scope: ScopeSet,
	redirect_uri: Url,
) -> AuthorizationSession {
	let state = random_string(STATE_LEN);
	let pkce = PkcePair::generate();
	let authorize_url =
		build_authorize_url(endpoints, client_id, &redirect_uri, &scope, &state, &pkce);

	AuthorizationSession::new(scope, redirect_uri, authorize_url, state, pkce)
}

fn build_authorize_url(
	endpoints: &CognitoEndpoints,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	state: &str,
	pkce: &PkcePair,
) -> Url {
	let mut url = endpoints.authorization().clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if !scope.is_empty() {
		pairs.append_pair("scope", &scope.normalized());
	}

	pairs.append_pair("state", state);
	pairs.append_pair("code_challenge", &pkce.challenge);
	pairs.append_pair("code_challenge_method", pkce.method.as_str());

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}
