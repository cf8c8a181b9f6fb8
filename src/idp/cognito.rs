// crates.io
use reqwest::header::CONTENT_TYPE;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{TransientError, TransportError},
	http::{self, ReqwestHttpClient},
	idp::{
		self, AMZ_JSON_CONTENT_TYPE, GET_USER_TARGET, GetUserInput, GetUserOutput,
		IdentityProviderApi, IdpFuture,
	},
	provider::{DefaultProviderHooks, ProviderHooks},
};

const AMZ_TARGET: &str = "x-amz-target";
const AMZN_ERROR_TYPE: &str = "x-amzn-errortype";

/// Reqwest-backed Cognito user-pool client scoped to one regional endpoint.
///
/// `GetUser` is authorized by the access token alone, so no SigV4 signing is involved. The
/// client is stateless per call and safe to share across concurrent attempts.
#[derive(Clone)]
pub struct CognitoIdpClient {
	http: ReqwestHttpClient,
	endpoint: Url,
	hooks: Arc<dyn ProviderHooks>,
}
impl CognitoIdpClient {
	/// Creates a client for `endpoint` (see [`StrategyConfig::idp_endpoint`]).
	///
	/// [`StrategyConfig::idp_endpoint`]: crate::config::StrategyConfig::idp_endpoint
	pub fn with_client(http: ReqwestHttpClient, endpoint: Url) -> Self {
		Self { http, endpoint, hooks: Arc::new(DefaultProviderHooks) }
	}

	/// Replaces the hooks used to classify API errors.
	pub fn with_hooks(mut self, hooks: Arc<dyn ProviderHooks>) -> Self {
		self.hooks = hooks;

		self
	}

	/// Endpoint the client posts to.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	async fn send_get_user(&self, access_token: &TokenSecret) -> Result<GetUserOutput> {
		let body = serde_json::to_vec(&GetUserInput { access_token: access_token.expose() })
			.map_err(TransportError::identity_provider)?;
		let response = self
			.http
			.post(self.endpoint.clone())
			.header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
			.header(AMZ_TARGET, GET_USER_TARGET)
			.body(body)
			.send()
			.await
			.map_err(map_send_error)?;
		let status = response.status().as_u16();
		let retry_after = http::parse_retry_after(response.headers());
		let header_error_type = response
			.headers()
			.get(AMZN_ERROR_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(ToOwned::to_owned);
		let bytes = response.bytes().await.map_err(map_send_error)?;

		if response_is_success(status) {
			idp::decode_get_user(&bytes, status)
		} else {
			Err(idp::map_api_error(
				self.hooks.as_ref(),
				status,
				header_error_type.as_deref(),
				retry_after,
				&bytes,
			))
		}
	}
}
impl IdentityProviderApi for CognitoIdpClient {
	fn get_user<'a>(&'a self, access_token: &'a TokenSecret) -> IdpFuture<'a, GetUserOutput> {
		Box::pin(self.send_get_user(access_token))
	}
}
impl Debug for CognitoIdpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CognitoIdpClient").field("endpoint", &self.endpoint.as_str()).finish()
	}
}

fn response_is_success(status: u16) -> bool {
	(200..300).contains(&status)
}

fn map_send_error(err: ReqwestError) -> Error {
	if err.is_timeout() {
		TransientError::IdentityProvider {
			kind: "Timeout".into(),
			message: "Request timed out while calling the identity provider API".into(),
			status: None,
			retry_after: None,
		}
		.into()
	} else {
		TransportError::identity_provider(err).into()
	}
}
