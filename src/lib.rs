//! Amazon Cognito OAuth 2.0 strategy: delegate the authorization-code exchange to a generic
//! OAuth2 client, normalize `GetUser` attributes into a profile, and hand the result to an
//! application verify callback.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod idp;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod provider;
pub mod strategy;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::StrategyConfig,
		http::ReqwestHttpClient,
		idp::CognitoIdpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{DefaultProviderHooks, ProviderHooks},
		strategy::{Strategy, Verify},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests. Redirects are never followed, matching
	/// [`ReqwestHttpClient::new`].
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Strategy`] whose token exchange and `GetUser` calls both run over the
	/// insecure test transport.
	pub fn build_reqwest_test_strategy<V>(
		config: StrategyConfig,
		verify: V,
	) -> Strategy<V>
	where
		V: Verify,
	{
		let http_client = test_reqwest_http_client();
		let hooks: Arc<dyn ProviderHooks> = Arc::new(DefaultProviderHooks);
		let idp = CognitoIdpClient::with_client(http_client.clone(), config.idp_endpoint().clone())
			.with_hooks(hooks.clone());

		Strategy::with_http_client::<ReqwestHttpClient, ReqwestTransportErrorMapper>(
			config,
			verify,
			hooks,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
			Arc::new(idp),
		)
		.expect("Failed to build test strategy.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
