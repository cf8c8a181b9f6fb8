//! Strategy-level error types shared across configuration, token exchange, and profile
//! resolution.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical strategy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Identity provider returned a payload with an unexpected shape.
	#[error(transparent)]
	MalformedResponse(#[from] MalformedResponseError),

	/// Identity provider refused the access token (invalid, expired, or unauthorized).
	#[error("Identity provider rejected the access token ({kind}): {message}.")]
	ProviderRejection {
		/// Provider error type, e.g. `NotAuthorizedException`.
		kind: String,
		/// Provider-supplied message.
		message: String,
	},
	/// Authorization redirect carried an OAuth error instead of a code.
	#[error("Authorization request failed with `{code}`.")]
	Authorization {
		/// OAuth `error` parameter.
		code: String,
		/// OAuth `error_description` parameter, when present.
		description: Option<String>,
	},
	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad or reused code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or strategy-supplied reason string.
		reason: String,
	},
	/// Application verify callback reported a hard error.
	#[error("Verify callback failed.")]
	Verify {
		/// Application-supplied failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps an application error raised from a verify callback.
	pub fn verify(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Verify { source: Box::new(src) }
	}
}

/// Configuration and validation failures raised by the strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Strategy configuration failed validation.
	#[error(transparent)]
	Strategy(#[from] crate::config::StrategyConfigError),
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Derived endpoint is not a valid OAuth URL.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Profile resolution was requested without an access token.
	#[error("Access token must not be empty.")]
	EmptyAccessToken,
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or strategy-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Identity provider API is throttling or temporarily failing.
	#[error("Identity provider API is temporarily unavailable ({kind}): {message}.")]
	IdentityProvider {
		/// Provider error type, e.g. `TooManyRequestsException`.
		kind: String,
		/// Provider-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint}.")]
	Network {
		/// Endpoint label (`token endpoint`, `identity provider API`).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a network error raised while calling the token endpoint.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "token endpoint", source: Box::new(src) }
	}

	/// Wraps a network error raised while calling the identity provider API.
	pub fn identity_provider(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "identity provider API", source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Identity provider payloads that do not match the `GetUser` contract.
#[derive(Debug, ThisError)]
pub enum MalformedResponseError {
	/// Body is not JSON of the expected shape.
	#[error("Identity provider returned malformed JSON.")]
	Json {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Response decoded but the username is empty.
	#[error("Identity provider response carries an empty username.")]
	EmptyUsername,
	/// Non-success status without a recognizable error payload.
	#[error("Identity provider returned HTTP {status} without an error type.")]
	UnexpectedStatus {
		/// HTTP status code.
		status: u16,
		/// Preview of the response body.
		body_preview: String,
	},
}
