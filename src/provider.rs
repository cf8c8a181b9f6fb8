//! Cognito-facing endpoint derivation (data) and provider hooks (behavior).
//!
//! `endpoints` turns the configured user-pool domain and region into the authorization, token,
//! and `GetUser` URLs, enforcing HTTPS for anything that is not a loopback test host.
//! `hooks` defines [`ProviderHooks`], an HTTP-client-agnostic hook used to decorate the token
//! request and map token-endpoint and identity-provider failures into the crate's error
//! taxonomy.

pub mod endpoints;
pub mod hooks;

pub use endpoints::*;
pub use hooks::*;
