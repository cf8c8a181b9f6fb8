//! Provider hooks that customize the token exchange and classify upstream failures.
//!
//! Implementations decorate the outgoing token request and normalize error mapping without
//! tying the strategy to any particular HTTP client.

// self
use crate::_prelude::*;

/// Hook that allows deployments to decorate requests and classify errors.
///
/// Implementors are required to be `Send + Sync`, and the hooks use crate-owned data types so
/// downstream crates never depend on reqwest-specific structures. Only
/// [`classify_token_error`](Self::classify_token_error) is mandatory.
pub trait ProviderHooks: Send + Sync {
	/// Maps low-level HTTP/JSON errors from the token endpoint into the crate taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;

	/// Maps a failed identity-provider API call into the crate taxonomy.
	///
	/// The default implementation understands Cognito's `__type` error codes.
	fn classify_api_error(&self, ctx: &ApiErrorContext) -> ApiErrorKind {
		classify_cognito_api_error(ctx)
	}

	/// Gives deployments a chance to add custom form parameters to the code exchange.
	///
	/// The method works on a plain `BTreeMap` so implementations remain HTTP client agnostic.
	fn augment_token_request(&self, _form: &mut BTreeMap<String, String>) {}
}

/// Canonical token-endpoint error categories used by hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization code.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the client may request.
	InsufficientScope,
	/// Failure is temporary and should be retried.
	Transient,
}

/// Context passed to hooks when classifying token-endpoint errors.
///
/// Only primitive data (status codes, OAuth fields, body preview) is kept so hooks stay
/// decoupled from any HTTP client.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure() -> Self {
		Self { network_error: true, ..Default::default() }
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Identity-provider API error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
	/// Access token is invalid, expired, revoked, or not allowed to read the user.
	Rejected,
	/// Throttling or server-side failure.
	Transient,
	/// Response cannot be interpreted.
	Malformed,
}

/// Context passed to hooks when classifying identity-provider API errors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiErrorContext {
	/// HTTP status code returned by the API.
	pub http_status: Option<u16>,
	/// Error type with any `namespace#` prefix removed (e.g. `NotAuthorizedException`).
	pub error_type: Option<String>,
	/// Provider-supplied message.
	pub message: Option<String>,
}
impl ApiErrorContext {
	/// Creates a context for the provided HTTP status.
	pub fn new(status: u16) -> Self {
		Self { http_status: Some(status), ..Default::default() }
	}

	/// Adds the error type, stripping AWS `namespace#` and `:detail` decorations.
	pub fn with_error_type(mut self, raw: impl AsRef<str>) -> Self {
		let raw = raw.as_ref();
		let name = raw.rsplit('#').next().unwrap_or(raw);
		let name = name.split(':').next().unwrap_or(name).trim();

		if !name.is_empty() {
			self.error_type = Some(name.to_owned());
		}

		self
	}

	/// Adds the provider message.
	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(truncate_preview(message.into()));

		self
	}
}

/// Default hooks that apply RFC-guided heuristics to the token endpoint and Cognito error
/// codes to the identity-provider API.
///
/// Token errors prioritize structured OAuth fields (`error`, `error_description`), then fall
/// back to body text hints, and finally the HTTP status code. Network failures are always
/// treated as transient.
#[derive(Debug, Default)]
pub struct DefaultProviderHooks;
impl Display for DefaultProviderHooks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-hooks")
	}
}
impl ProviderHooks for DefaultProviderHooks {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}

		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

const BODY_PREVIEW_LIMIT: usize = 256;

/// Classifies Cognito `GetUser` failures by error type, then by status.
pub fn classify_cognito_api_error(ctx: &ApiErrorContext) -> ApiErrorKind {
	match ctx.error_type.as_deref() {
		Some(
			"NotAuthorizedException"
			| "UserNotFoundException"
			| "UserNotConfirmedException"
			| "PasswordResetRequiredException"
			| "ForbiddenException"
			| "ResourceNotFoundException"
			| "InvalidParameterException"
			| "AccessDeniedException",
		) => ApiErrorKind::Rejected,
		Some(
			"TooManyRequestsException"
			| "InternalErrorException"
			| "LimitExceededException"
			| "ThrottlingException"
			| "ServiceUnavailable",
		) => ApiErrorKind::Transient,
		_ => match ctx.http_status {
			Some(429) => ApiErrorKind::Transient,
			Some(code) if code >= 500 => ApiErrorKind::Transient,
			Some(400 | 401 | 403) if ctx.error_type.is_some() => ApiErrorKind::Rejected,
			Some(401 | 403) => ApiErrorKind::Rejected,
			_ => ApiErrorKind::Malformed,
		},
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ProviderErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ProviderErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ProviderErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let body = body?;
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}
