//! Walks through a complete Cognito hosted-UI login against a local mock: build the redirect,
//! simulate the callback, exchange the code, resolve the `GetUser` profile, and run the verify
//! callback.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use oauth2_cognito::{
	config::StrategyConfig,
	http::ReqwestHttpClient,
	idp::CognitoIdpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::{DefaultProviderHooks, ProviderHooks},
	reqwest::Client,
	strategy::{CallbackParams, Strategy, Verify, VerifyArgs, VerifyFuture, VerifyOutcome},
	url::Url,
};

struct PrintProfile;
impl Verify for PrintProfile {
	type Request = ();
	type User = String;

	fn verify<'a>(&'a self, args: VerifyArgs<'a, ()>) -> VerifyFuture<'a, String> {
		Box::pin(async move {
			for (name, value) in args.profile.iter() {
				println!("  {name} = {value}");
			}

			Ok(VerifyOutcome::success(args.profile.username().to_owned()))
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"access_token": "demo-access",
					"refresh_token": "demo-refresh",
					"token_type": "Bearer",
					"expires_in": 3600
				})
				.to_string(),
			);
		})
		.await;
	let get_user_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/")
				.header("x-amz-target", "AWSCognitoIdentityProviderService.GetUser");
			then.status(200).header("content-type", "application/x-amz-json-1.1").body(
				json!({
					"Username": "alice",
					"UserAttributes": [
						{ "Name": "sub", "Value": "5b1e" },
						{ "Name": "email", "Value": "alice@example.com" }
					]
				})
				.to_string(),
			);
		})
		.await;
	let config = StrategyConfig::builder()
		.domain(server.base_url())
		.client_id("demo-client")
		.client_secret("demo-secret")
		.callback_url("https://app.example.com/auth/cognito/callback")
		.idp_endpoint(server.url("/"))
		.scope(["openid", "email", "aws.cognito.signin.user.admin"])?
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder().redirect(oauth2_cognito::reqwest::redirect::Policy::none()).build()?,
	);
	let hooks: Arc<dyn ProviderHooks> = Arc::new(DefaultProviderHooks);
	let idp = CognitoIdpClient::with_client(http_client.clone(), config.idp_endpoint().clone())
		.with_hooks(hooks.clone());
	let strategy = Strategy::with_http_client::<ReqwestHttpClient, ReqwestTransportErrorMapper>(
		config,
		PrintProfile,
		hooks,
		http_client,
		Arc::new(ReqwestTransportErrorMapper),
		Arc::new(idp),
	)?;
	let session = strategy.authorization_request();

	println!("Send the user agent to: {}", session.authorize_url);

	let redirect = Url::parse(&format!(
		"https://app.example.com/auth/cognito/callback?code=demo-code&state={}",
		session.state
	))?;

	println!("Profile resolved by {}:", strategy.name());

	let outcome = strategy.authenticate(session, CallbackParams::from_url(&redirect), &()).await?;

	println!("Authenticated user: {:?}.", outcome.user());

	token_mock.assert_async().await;
	get_user_mock.assert_async().await;

	Ok(())
}
