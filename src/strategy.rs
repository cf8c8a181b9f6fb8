//! The Cognito OAuth 2.0 strategy: builds the hosted-UI redirect, completes the callback, and
//! hands the resolved profile to the application [`Verify`] callback.
//!
//! One [`Strategy`] serves every request of a process. It owns only immutable configuration
//! and `Arc`-shared collaborators, so concurrent [`Strategy::authenticate`] calls never
//! contend on shared state.

mod session;
mod verify;

pub use session::*;
pub use verify::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenSet},
	config::{StrategyConfig, StrategyName},
	http::TokenHttpClient,
	idp::IdentityProviderApi,
	oauth::{BasicFacade, CodeExchange, TransportErrorMapper},
	obs::{self, AttemptState, AttemptTracker, Stage, StageOutcome},
	profile::{CognitoProfileResolver, Profile, ProfileResolver},
	provider::ProviderHooks,
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestHttpClient,
	idp::CognitoIdpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::DefaultProviderHooks,
};

const ACCESS_DENIED: &str = "access_denied";

/// Query parameters delivered to the callback URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
	/// Authorization code, present on success.
	pub code: Option<String>,
	/// State echoed by the authorization server.
	pub state: Option<String>,
	/// OAuth error code, present on failure.
	pub error: Option<String>,
	/// Human-readable error description.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from a redirect URL's query string.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			let slot = match key.as_ref() {
				"code" => &mut params.code,
				"state" => &mut params.state,
				"error" => &mut params.error,
				"error_description" => &mut params.error_description,
				_ => continue,
			};

			*slot = Some(value.into_owned());
		}

		params
	}
}

/// Cognito user-pool authentication strategy.
pub struct Strategy<V>
where
	V: Verify,
{
	config: StrategyConfig,
	verify: V,
	exchange: Arc<dyn CodeExchange>,
	resolver: Arc<dyn ProfileResolver>,
}
impl<V> Strategy<V>
where
	V: Verify,
{
	/// Assembles a strategy from already-built collaborators.
	///
	/// Use this to substitute the code exchange or the profile resolver, e.g. in tests.
	pub fn from_parts(
		config: StrategyConfig,
		verify: V,
		exchange: Arc<dyn CodeExchange>,
		resolver: Arc<dyn ProfileResolver>,
	) -> Self {
		#[cfg(feature = "tracing")]
		if !config.scope().permits_get_user() {
			tracing::warn!(
				scope = %config.scope(),
				"configured scopes omit aws.cognito.signin.user.admin; GetUser will be rejected"
			);
		}

		Self { config, verify, exchange, resolver }
	}

	/// Builds a strategy over a caller-provided token transport and identity-provider client.
	///
	/// No network traffic happens here; failures are configuration errors only.
	pub fn with_http_client<C, M>(
		config: StrategyConfig,
		verify: V,
		hooks: Arc<dyn ProviderHooks>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
		idp: Arc<dyn IdentityProviderApi>,
	) -> Result<Self>
	where
		C: TokenHttpClient,
		M: TransportErrorMapper<C::TransportError>,
	{
		let exchange =
			BasicFacade::<C, M>::from_config(&config, hooks, http_client, error_mapper)?;
		let resolver = CognitoProfileResolver::new(idp);

		Ok(Self::from_parts(config, verify, Arc::new(exchange), Arc::new(resolver)))
	}

	/// Symbolic strategy name, `cognito-oauth2` unless overridden.
	pub fn name(&self) -> &StrategyName {
		self.config.name()
	}

	/// Validated configuration.
	pub fn config(&self) -> &StrategyConfig {
		&self.config
	}

	/// Starts a login: returns the hosted-UI redirect plus the state and PKCE material that must
	/// be kept until the callback arrives.
	pub fn authorization_request(&self) -> AuthorizationSession {
		obs::record_stage_outcome(Stage::Authorize, StageOutcome::Attempt);

		let session = build_session(
			self.config.endpoints(),
			self.config.client_id(),
			self.config.scope().clone(),
			self.config.callback_url().clone(),
		);

		obs::record_stage_outcome(Stage::Authorize, StageOutcome::Success);

		session
	}

	/// Fetches the normalized profile for `access_token` with a single `GetUser` call.
	pub async fn user_profile(&self, access_token: &TokenSecret) -> Result<Profile> {
		self.resolver.user_profile(access_token).await
	}

	/// Completes a login from the callback parameters.
	///
	/// The returned `state` is checked before anything else, including provider errors. A
	/// callback carrying `error=access_denied` (the user declined consent) and a verify
	/// callback that rejects the user both resolve to [`VerifyOutcome::Failure`]. Every other
	/// problem is an error; no stage is retried.
	pub async fn authenticate(
		&self,
		session: AuthorizationSession,
		callback: CallbackParams,
		request: &V::Request,
	) -> Result<VerifyOutcome<V::User>> {
		let mut tracker = AttemptTracker::new();
		let result = self.run_attempt(&mut tracker, &session, callback, request).await;

		match &result {
			Ok(outcome) if outcome.is_success() => {
				let advanced = tracker.advance(AttemptState::Succeeded);

				debug_assert!(advanced.is_ok());
			},
			_ => tracker.fail(),
		}

		result
	}

	async fn run_attempt(
		&self,
		tracker: &mut AttemptTracker,
		session: &AuthorizationSession,
		callback: CallbackParams,
		request: &V::Request,
	) -> Result<VerifyOutcome<V::User>> {
		let CallbackParams { code, state, error, error_description } = callback;

		session.validate_state(state.as_deref().unwrap_or_default())?;

		if let Some(code) = error {
			if code == ACCESS_DENIED {
				return Ok(VerifyOutcome::failure(
					error_description
						.unwrap_or_else(|| "User denied the authorization request.".into()),
				));
			}

			return Err(Error::Authorization { code, description: error_description });
		}

		let code = code.filter(|code| !code.is_empty()).ok_or_else(|| Error::InvalidGrant {
			reason: "Authorization response is missing the code parameter.".into(),
		})?;
		let advanced = tracker.advance(AttemptState::ExchangingToken);

		debug_assert!(advanced.is_ok());

		let TokenSet { access_token, refresh_token, .. } = obs::observe(
			Stage::ExchangeToken,
			self.exchange.exchange_code(&code, session.pkce_verifier(), &session.redirect_uri),
		)
		.await?;
		let advanced = tracker.advance(AttemptState::ResolvingProfile);

		debug_assert!(advanced.is_ok());

		let profile = self.resolver.user_profile(&access_token).await?;
		let args = VerifyArgs {
			request: self.config.pass_request_to_callback().then_some(request),
			access_token,
			refresh_token,
			profile,
		};

		obs::observe(Stage::Verify, self.verify.verify(args)).await
	}
}
#[cfg(feature = "reqwest")]
impl<V> Strategy<V>
where
	V: Verify,
{
	/// Builds a strategy on the default reqwest stack.
	///
	/// The token exchange and `GetUser` share one client that never follows redirects.
	pub fn new(config: StrategyConfig, verify: V) -> Result<Self> {
		let http_client = ReqwestHttpClient::new()?;
		let hooks: Arc<dyn ProviderHooks> = Arc::new(DefaultProviderHooks);
		let idp = CognitoIdpClient::with_client(http_client.clone(), config.idp_endpoint().clone())
			.with_hooks(hooks.clone());

		Self::with_http_client::<ReqwestHttpClient, ReqwestTransportErrorMapper>(
			config,
			verify,
			hooks,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
			Arc::new(idp),
		)
	}
}
impl<V> Debug for Strategy<V>
where
	V: Verify,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Strategy")
			.field("name", self.config.name())
			.field("client_id", &self.config.client_id())
			.field("pass_request_to_callback", &self.config.pass_request_to_callback())
			.finish_non_exhaustive()
	}
}
