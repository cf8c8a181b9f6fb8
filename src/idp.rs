//! Identity-provider API seam: the `GetUser` contract plus transport-agnostic decoding.
//!
//! [`IdentityProviderApi`] is the single outbound operation the profile resolver needs.
//! [`CognitoIdpClient`] implements it over reqwest; tests and alternative transports can
//! provide their own implementation.

#[cfg(feature = "reqwest")] mod cognito;

#[cfg(feature = "reqwest")] pub use cognito::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{MalformedResponseError, TransientError},
	provider::{ApiErrorContext, ApiErrorKind, ProviderHooks},
};

/// Boxed future returned by [`IdentityProviderApi`] implementations.
pub type IdpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// `X-Amz-Target` value selecting the `GetUser` operation.
pub const GET_USER_TARGET: &str = "AWSCognitoIdentityProviderService.GetUser";
/// Content type of the AWS JSON 1.1 protocol.
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Outbound contract to the identity provider.
///
/// Implementations must issue exactly one request per call and must not retry; retry policy
/// belongs to the caller or the transport.
pub trait IdentityProviderApi: Send + Sync {
	/// Fetches the user the access token was issued to.
	fn get_user<'a>(&'a self, access_token: &'a TokenSecret) -> IdpFuture<'a, GetUserOutput>;
}

/// `GetUser` request body.
#[derive(Serialize)]
pub(crate) struct GetUserInput<'a> {
	#[serde(rename = "AccessToken")]
	pub(crate) access_token: &'a str,
}

/// Decoded `GetUser` response; only the fields the profile needs are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetUserOutput {
	/// User-pool username (often a UUID `sub` for email-alias pools).
	pub username: String,
	/// Attributes in the order the provider returned them.
	pub user_attributes: Vec<AttributeType>,
}

/// Single `{Name, Value}` attribute entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeType {
	/// Attribute name, e.g. `email` or `custom:tenant`.
	pub name: String,
	/// Attribute value; Cognito may omit it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
	#[serde(rename = "__type")]
	error_type: Option<String>,
	#[serde(alias = "Message")]
	message: Option<String>,
}

/// Decodes a successful `GetUser` body.
pub(crate) fn decode_get_user(body: &[u8], status: u16) -> Result<GetUserOutput> {
	let mut de = serde_json::Deserializer::from_slice(body);
	let output: GetUserOutput = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| MalformedResponseError::Json { source, status: Some(status) })?;

	if output.username.is_empty() {
		return Err(MalformedResponseError::EmptyUsername.into());
	}

	Ok(output)
}

/// Maps a non-success `GetUser` response into the crate taxonomy.
pub(crate) fn map_api_error(
	hooks: &dyn ProviderHooks,
	status: u16,
	header_error_type: Option<&str>,
	retry_after: Option<Duration>,
	body: &[u8],
) -> Error {
	let parsed: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();
	let mut ctx = ApiErrorContext::new(status);

	if let Some(error_type) = parsed.error_type.as_deref().or(header_error_type) {
		ctx = ctx.with_error_type(error_type);
	}
	if let Some(message) = parsed.message {
		ctx = ctx.with_message(message);
	}

	let kind = ctx.error_type.clone().unwrap_or_else(|| format!("HTTP {status}"));
	let message = ctx.message.clone().unwrap_or_default();

	match hooks.classify_api_error(&ctx) {
		ApiErrorKind::Rejected => Error::ProviderRejection { kind, message },
		ApiErrorKind::Transient =>
			TransientError::IdentityProvider { kind, message, status: Some(status), retry_after }
				.into(),
		ApiErrorKind::Malformed => MalformedResponseError::UnexpectedStatus {
			status,
			body_preview: String::from_utf8_lossy(body).chars().take(256).collect(),
		}
		.into(),
	}
}
