//! Token secrets and the credential set produced by the code exchange.

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true when the wrapped value is empty.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Credentials returned by a successful authorization-code exchange.
///
/// Lives only for the duration of one authentication attempt; the strategy never persists it.
#[derive(Clone, Debug)]
pub struct TokenSet {
	/// Bearer token used for the `GetUser` call.
	pub access_token: TokenSecret,
	/// Refresh token, when the app client is allowed to receive one.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime reported by the token endpoint.
	pub expires_in: Option<Duration>,
	/// Scopes echoed by the token endpoint, when present.
	pub scope: Option<ScopeSet>,
	/// Instant at which the exchange completed.
	pub issued_at: OffsetDateTime,
}
impl TokenSet {
	/// Returns the absolute expiry, if the token endpoint reported a lifetime.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_in.map(|lifetime| self.issued_at + lifetime)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}

	#[test]
	fn expiry_is_relative_to_issue_time() {
		let issued_at = OffsetDateTime::UNIX_EPOCH;
		let tokens = TokenSet {
			access_token: TokenSecret::new("access"),
			refresh_token: None,
			expires_in: Some(Duration::seconds(3600)),
			scope: None,
			issued_at,
		};

		assert_eq!(tokens.expires_at(), Some(issued_at + Duration::hours(1)));
	}
}
