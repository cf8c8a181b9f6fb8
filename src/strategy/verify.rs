// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, auth::TokenSecret, profile::Profile};

/// Boxed future returned by [`Verify`] implementations.
pub type VerifyFuture<'a, U> = Pin<Box<dyn Future<Output = Result<VerifyOutcome<U>>> + 'a + Send>>;

/// Application callback that turns a resolved profile into an application user.
pub trait Verify: Send + Sync {
	/// Inbound request type the host framework hands to the strategy.
	type Request: Send + Sync;
	/// Application user produced on success.
	type User: Send;

	/// Decides whether the resolved identity is accepted.
	///
	/// Return `Ok(VerifyOutcome::Failure { .. })` to reject the login without raising an
	/// error, and `Err(Error::verify(..))` for hard failures such as an unreachable user store.
	fn verify<'a>(&'a self, args: VerifyArgs<'a, Self::Request>) -> VerifyFuture<'a, Self::User>;
}

/// Inputs handed to [`Verify::verify`].
pub struct VerifyArgs<'a, R> {
	/// Inbound request; `Some` only when `pass_request_to_callback` is enabled.
	pub request: Option<&'a R>,
	/// Access token returned by the exchange.
	pub access_token: TokenSecret,
	/// Refresh token, when issued.
	pub refresh_token: Option<TokenSecret>,
	/// Normalized `GetUser` profile.
	pub profile: Profile,
}
impl<R> Debug for VerifyArgs<'_, R> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VerifyArgs")
			.field("request_passed", &self.request.is_some())
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("profile", &self.profile)
			.finish()
	}
}

/// Result of a completed authentication attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum VerifyOutcome<U> {
	/// The user was authenticated.
	Success {
		/// Application user.
		user: U,
		/// Optional details forwarded to the host framework.
		info: Option<Value>,
	},
	/// The attempt completed but the user was not authenticated.
	Failure {
		/// Optional reason forwarded to the host framework.
		info: Option<Value>,
	},
}
impl<U> VerifyOutcome<U> {
	/// Successful outcome without extra info.
	pub fn success(user: U) -> Self {
		Self::Success { user, info: None }
	}

	/// Failed outcome carrying a human-readable message.
	pub fn failure(message: impl Into<String>) -> Self {
		Self::Failure { info: Some(serde_json::json!({ "message": message.into() })) }
	}

	/// Returns true for [`VerifyOutcome::Success`].
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success { .. })
	}

	/// Returns the authenticated user, if any.
	pub fn user(&self) -> Option<&U> {
		match self {
			Self::Success { user, .. } => Some(user),
			Self::Failure { .. } => None,
		}
	}

	/// Returns the attached info value, if any.
	pub fn info(&self) -> Option<&Value> {
		match self {
			Self::Success { info, .. } | Self::Failure { info } => info.as_ref(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn failure_info_carries_the_message() {
		let outcome = VerifyOutcome::<()>::failure("User is disabled.");

		assert!(!outcome.is_success());
		assert!(outcome.user().is_none());
		assert_eq!(
			outcome.info().and_then(|info| info.get("message")).and_then(Value::as_str),
			Some("User is disabled.")
		);
	}

	#[test]
	fn args_debug_redacts_tokens() {
		let args = VerifyArgs::<()> {
			request: None,
			access_token: TokenSecret::new("tok-123"),
			refresh_token: Some(TokenSecret::new("ref-456")),
			profile: Profile::new("alice"),
		};
		let rendered = format!("{args:?}");

		assert!(!rendered.contains("tok-123"));
		assert!(!rendered.contains("ref-456"));
		assert!(rendered.contains("alice"));
	}
}
