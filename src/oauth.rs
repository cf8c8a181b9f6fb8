//! Authorization-code exchange delegated to the `oauth2` crate.
//!
//! [`CodeExchange`] is the seam the strategy depends on; [`BasicFacade`] implements it on top
//! of [`oauth2::basic::BasicClient`] and any [`TokenHttpClient`], translating `oauth2` request
//! failures into the crate error taxonomy via [`ProviderHooks`] and a [`TransportErrorMapper`].

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret, TokenSet},
	config::StrategyConfig,
	error::{ConfigError, TransientError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ProviderErrorContext, ProviderErrorKind, ProviderHooks},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Boxed future returned by [`CodeExchange`] implementations.
pub type ExchangeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Swaps an authorization code for a [`TokenSet`].
///
/// The strategy holds this as a collaborator so the exchange and profile resolution can be
/// replaced and tested independently.
pub trait CodeExchange: Send + Sync {
	/// Exchanges `code` (bound to `pkce_verifier` and `redirect_uri`) at the token endpoint.
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		pkce_verifier: &'a str,
		redirect_uri: &'a Url,
	) -> ExchangeFuture<'a, TokenSet>;
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		hooks: &dyn ProviderHooks,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		hooks: &dyn ProviderHooks,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(hooks, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_unknown_transport_error(meta),
		}
	}
}

/// [`CodeExchange`] backed by `oauth2`'s basic client.
pub struct BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	hooks: Arc<dyn ProviderHooks>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Configures the `oauth2` client from the validated strategy configuration.
	///
	/// The client secret is sent with HTTP Basic authentication, which Cognito accepts for
	/// confidential app clients.
	pub fn from_config(
		config: &StrategyConfig,
		hooks: Arc<dyn ProviderHooks>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoints().authorization().to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(config.endpoints().token().to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(config.callback_url().to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id().to_owned()))
			.set_client_secret(ClientSecret::new(config.client_secret().expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			hooks,
		})
	}
}
impl<C, M> CodeExchange for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_code<'a>(
		&'a self,
		code: &'a str,
		pkce_verifier: &'a str,
		redirect_uri: &'a Url,
	) -> ExchangeFuture<'a, TokenSet> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;
			let mut form = BTreeMap::new();

			self.hooks.augment_token_request(&mut form);

			let mut request = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url));

			for (key, value) in form {
				request = request.add_extra_param(key, value);
			}

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(self.hooks.as_ref(), meta.take(), err, self.error_mapper.as_ref())
			})?;

			map_token_response(response)
		})
	}
}
impl<C, M> Debug for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicFacade")
			.field("client_id", self.oauth_client.client_id())
			.finish_non_exhaustive()
	}
}

fn map_token_response(response: FacadeTokenResponse) -> Result<TokenSet> {
	let expires_in = response
		.expires_in()
		.map(|lifetime| {
			i64::try_from(lifetime.as_secs())
				.map(Duration::seconds)
				.map_err(|_| ConfigError::ExpiresInOutOfRange)
		})
		.transpose()?;
	let scope = response
		.scopes()
		.map(|scopes| ScopeSet::new(scopes.iter().map(|scope| scope.as_str())))
		.transpose()
		.map_err(ConfigError::from)?;

	Ok(TokenSet {
		access_token: TokenSecret::new(response.access_token().secret().to_owned()),
		refresh_token: response
			.refresh_token()
			.map(|refresh| TokenSecret::new(refresh.secret().to_owned())),
		expires_in,
		scope,
		issued_at: OffsetDateTime::now_utc(),
	})
}

fn map_request_error<E, M>(
	hooks: &dyn ProviderHooks,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(hooks, response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(hooks, meta_ref, error),
		RequestTokenError::Parse(error, body) => match meta_status(meta_ref) {
			Some(status) if !(200..300).contains(&status) =>
				map_unstructured_error(hooks, status, &body, meta_ref),
			status => TransientError::TokenResponseParse { source: error, status }.into(),
		},
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	hooks: &dyn ProviderHooks,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx =
		ProviderErrorContext::default().with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = if let Some(description) = response.error_description() {
		format!("Token endpoint returned an OAuth error: {description}")
	} else {
		format!("Token endpoint returned an OAuth error: {}", response.error().as_ref())
	};

	error_from_kind(hooks.classify_token_error(&ctx), message, meta)
}

// Error statuses whose body is not an OAuth error document (HTML gateway pages, plain text).
fn map_unstructured_error(
	hooks: &dyn ProviderHooks,
	status: u16,
	body: &[u8],
	meta: Option<&ResponseMetadata>,
) -> Error {
	let ctx = ProviderErrorContext::default()
		.with_http_status(status)
		.with_body_preview(String::from_utf8_lossy(body));
	let message = format!(
		"Token endpoint returned HTTP {status} with a non-OAuth body: {}",
		ctx.body_preview.as_deref().unwrap_or_default()
	);

	error_from_kind(hooks.classify_token_error(&ctx), message, meta)
}

fn error_from_kind(
	kind: ProviderErrorKind,
	message: String,
	meta: Option<&ResponseMetadata>,
) -> Error {
	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	hooks: &dyn ProviderHooks,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		let status = meta_status(meta).or_else(|| err.status().map(|code| code.as_u16()));
		let mut ctx = ProviderErrorContext::network_failure();

		if let Some(status) = status {
			ctx = ctx.with_http_status(status);
		}

		return error_from_kind(
			hooks.classify_token_error(&ctx),
			"Request timed out while calling the token endpoint".into(),
			meta,
		);
	}

	TransportError::from(err).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: "HTTP client error occurred while calling the token endpoint".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
