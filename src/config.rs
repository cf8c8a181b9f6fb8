//! Strategy configuration: a fluent, deserializable builder validated into an immutable
//! [`StrategyConfig`].

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, ScopeValidationError, TokenSecret},
	provider::{self, CognitoEndpoints},
};

/// Symbolic name registered by default so multi-strategy hosts can tell this one apart.
pub const DEFAULT_STRATEGY_NAME: &str = "cognito-oauth2";

macro_rules! def_name {
	($name:ident, $doc:literal, $kind:literal, $check:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new value after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, StrategyConfigError> {
				let view = value.as_ref();

				$check($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = StrategyConfigError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$check($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = StrategyConfigError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

def_name! {
	Region,
	"AWS region hosting the user pool, e.g. `us-east-1`.",
	"region",
	validate_region
}
def_name! {
	StrategyName,
	"Symbolic strategy name registered with the host.",
	"name",
	validate_token
}

/// Errors raised while building or decoding a [`StrategyConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StrategyConfigError {
	/// A required field was not supplied.
	#[error("Missing required `{field}` setting.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// A field was supplied but is empty or contains whitespace.
	#[error("The `{field}` setting must be non-empty and free of whitespace.")]
	InvalidToken {
		/// Field name.
		field: &'static str,
	},
	/// A URL-valued field cannot be parsed or has the wrong shape.
	#[error("The `{field}` setting is not a valid URL: {reason}.")]
	InvalidUrl {
		/// Field name.
		field: &'static str,
		/// Parser or shape failure.
		reason: String,
	},
	/// Endpoints must use HTTPS outside loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Region does not look like an AWS region code.
	#[error("Region `{region}` is not a valid AWS region code.")]
	InvalidRegion {
		/// Offending value.
		region: String,
	},
	/// Configured scopes are invalid.
	#[error(transparent)]
	InvalidScope(#[from] ScopeValidationError),
	/// Serialized configuration could not be decoded.
	#[error("Configuration is malformed at `{path}`: {reason}.")]
	Decode {
		/// Path of the offending field.
		path: String,
		/// Decoder failure.
		reason: String,
	},
}

/// Immutable, validated strategy configuration.
///
/// Built once at startup through [`StrategyConfigBuilder`] (or [`StrategyConfig::from_json`])
/// and owned by the strategy for its lifetime. Fields are private so every value in
/// circulation has passed [`StrategyConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct StrategyConfig {
	name: StrategyName,
	endpoints: CognitoEndpoints,
	client_id: String,
	client_secret: TokenSecret,
	callback_url: Url,
	region: Option<Region>,
	idp_endpoint: Url,
	scope: ScopeSet,
	pass_request_to_callback: bool,
}
impl StrategyConfig {
	/// Creates a new builder.
	pub fn builder() -> StrategyConfigBuilder {
		StrategyConfigBuilder::default()
	}

	/// Symbolic name of the strategy.
	pub fn name(&self) -> &StrategyName {
		&self.name
	}

	/// Authorization and token endpoints derived from the user-pool domain.
	pub fn endpoints(&self) -> &CognitoEndpoints {
		&self.endpoints
	}

	/// App client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// App client secret.
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Redirect URI registered with the app client.
	pub fn callback_url(&self) -> &Url {
		&self.callback_url
	}

	/// Region hosting the user pool, when known.
	pub fn region(&self) -> Option<&Region> {
		self.region.as_ref()
	}

	/// Identity-provider API endpoint used for `GetUser`.
	pub fn idp_endpoint(&self) -> &Url {
		&self.idp_endpoint
	}

	/// Scopes requested on the authorization redirect.
	pub fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	/// Whether the originating request reaches the verify callback.
	pub fn pass_request_to_callback(&self) -> bool {
		self.pass_request_to_callback
	}

	/// Decodes a JSON document into a builder and validates it.
	pub fn from_json(raw: &str) -> Result<Self, StrategyConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let builder: StrategyConfigBuilder = serde_path_to_error::deserialize(&mut de)
			.map_err(|e| StrategyConfigError::Decode {
				path: e.path().to_string(),
				reason: e.inner().to_string(),
			})?;

		builder.build()
	}
}

/// Builder for [`StrategyConfig`] values.
///
/// Every field is optional until [`build`](Self::build) runs, which is also the shape accepted
/// by [`StrategyConfig::from_json`].
#[derive(Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyConfigBuilder {
	/// User-pool domain (bare host or URL).
	pub domain: Option<String>,
	/// App client identifier.
	pub client_id: Option<String>,
	/// App client secret.
	pub client_secret: Option<String>,
	/// Redirect URI.
	pub callback_url: Option<String>,
	/// AWS region.
	pub region: Option<String>,
	/// Requested scopes.
	pub scope: Option<ScopeSet>,
	/// Strategy name override.
	pub name: Option<String>,
	/// Identity-provider API endpoint override.
	pub idp_endpoint: Option<String>,
	/// Request passthrough flag.
	pub pass_request_to_callback: bool,
}
impl StrategyConfigBuilder {
	/// Sets the user-pool domain.
	pub fn domain(mut self, domain: impl Into<String>) -> Self {
		self.domain = Some(domain.into());

		self
	}

	/// Sets the app client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the app client secret.
	pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.client_secret = Some(client_secret.into());

		self
	}

	/// Sets the redirect URI.
	pub fn callback_url(mut self, callback_url: impl Into<String>) -> Self {
		self.callback_url = Some(callback_url.into());

		self
	}

	/// Sets the AWS region.
	pub fn region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());

		self
	}

	/// Sets the requested scopes.
	pub fn scope<I, S>(mut self, scopes: I) -> Result<Self, StrategyConfigError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scope = Some(ScopeSet::new(scopes)?);

		Ok(self)
	}

	/// Overrides the symbolic strategy name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Overrides the identity-provider API endpoint (VPC endpoints, local mocks).
	pub fn idp_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.idp_endpoint = Some(endpoint.into());

		self
	}

	/// Enables or disables passing the originating request to the verify callback.
	pub fn pass_request_to_callback(mut self, enabled: bool) -> Self {
		self.pass_request_to_callback = enabled;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<StrategyConfig, StrategyConfigError> {
		let domain = self.domain.ok_or(StrategyConfigError::MissingField { field: "domain" })?;
		let endpoints = CognitoEndpoints::from_domain(&domain)?;
		let client_id =
			self.client_id.ok_or(StrategyConfigError::MissingField { field: "client_id" })?;

		validate_token("client_id", &client_id)?;

		let client_secret = self
			.client_secret
			.ok_or(StrategyConfigError::MissingField { field: "client_secret" })?;

		if client_secret.is_empty() {
			return Err(StrategyConfigError::InvalidToken { field: "client_secret" });
		}

		let callback_url = parse_callback_url(
			self.callback_url
				.as_deref()
				.ok_or(StrategyConfigError::MissingField { field: "callback_url" })?,
		)?;
		let region = self.region.map(Region::new).transpose()?;
		let idp_endpoint = match (self.idp_endpoint, region.as_ref()) {
			(Some(raw), _) => {
				let url = Url::parse(&raw).map_err(|e| StrategyConfigError::InvalidUrl {
					field: "idp_endpoint",
					reason: e.to_string(),
				})?;

				provider::endpoints::validate_endpoint("identity provider", &url)?;

				url
			},
			(None, Some(region)) => provider::identity_provider_endpoint(region)?,
			(None, None) => return Err(StrategyConfigError::MissingField { field: "region" }),
		};
		let name = match self.name {
			Some(name) => StrategyName::new(name)?,
			None => StrategyName(DEFAULT_STRATEGY_NAME.to_owned()),
		};

		Ok(StrategyConfig {
			name,
			endpoints,
			client_id,
			client_secret: TokenSecret::new(client_secret),
			callback_url,
			region,
			idp_endpoint,
			scope: self.scope.unwrap_or_default(),
			pass_request_to_callback: self.pass_request_to_callback,
		})
	}
}
impl Debug for StrategyConfigBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyConfigBuilder")
			.field("domain", &self.domain)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_url", &self.callback_url)
			.field("region", &self.region)
			.field("scope", &self.scope)
			.field("name", &self.name)
			.field("idp_endpoint", &self.idp_endpoint)
			.field("pass_request_to_callback", &self.pass_request_to_callback)
			.finish()
	}
}

fn parse_callback_url(raw: &str) -> Result<Url, StrategyConfigError> {
	let url = Url::parse(raw).map_err(|e| StrategyConfigError::InvalidUrl {
		field: "callback_url",
		reason: e.to_string(),
	})?;

	if matches!(url.scheme(), "http" | "https") && url.host().is_some() {
		Ok(url)
	} else {
		Err(StrategyConfigError::InvalidUrl {
			field: "callback_url",
			reason: format!("unsupported scheme `{}` or missing host", url.scheme()),
		})
	}
}

fn validate_token(field: &'static str, view: &str) -> Result<(), StrategyConfigError> {
	if view.is_empty() || view.chars().any(char::is_whitespace) {
		Err(StrategyConfigError::InvalidToken { field })
	} else {
		Ok(())
	}
}

fn validate_region(field: &'static str, view: &str) -> Result<(), StrategyConfigError> {
	validate_token(field, view)?;

	let well_formed = view.contains('-')
		&& !view.starts_with('-')
		&& !view.ends_with('-')
		&& view.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');

	if well_formed {
		Ok(())
	} else {
		Err(StrategyConfigError::InvalidRegion { region: view.to_owned() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn complete() -> StrategyConfigBuilder {
		StrategyConfig::builder()
			.domain("myapp.auth.us-east-1.amazoncognito.com")
			.client_id("client-123")
			.client_secret("secret-456")
			.callback_url("https://app.example.com/auth/callback")
			.region("us-east-1")
	}

	#[test]
	fn builder_derives_endpoints_and_defaults() {
		let config = complete().build().expect("Complete configuration should build.");

		assert_eq!(&**config.name(), DEFAULT_STRATEGY_NAME);
		assert_eq!(
			config.endpoints().token().as_str(),
			"https://myapp.auth.us-east-1.amazoncognito.com/oauth2/token"
		);
		assert_eq!(config.idp_endpoint().as_str(), "https://cognito-idp.us-east-1.amazonaws.com/");
		assert!(config.scope().is_empty());
		assert!(!config.pass_request_to_callback());
	}

	#[test]
	fn missing_fields_fail_in_declaration_order() {
		let err = StrategyConfig::builder().build().expect_err("Empty builder must fail.");

		assert_eq!(err, StrategyConfigError::MissingField { field: "domain" });

		let mut builder = complete();

		builder.client_id = None;

		assert_eq!(
			builder.build().expect_err("Missing client id must fail."),
			StrategyConfigError::MissingField { field: "client_id" }
		);

		let mut builder = complete();

		builder.region = None;

		assert_eq!(
			builder.build().expect_err("Missing region without override must fail."),
			StrategyConfigError::MissingField { field: "region" }
		);
	}

	#[test]
	fn malformed_values_are_rejected() {
		assert!(matches!(
			complete().callback_url("not a url").build(),
			Err(StrategyConfigError::InvalidUrl { field: "callback_url", .. })
		));
		assert!(matches!(
			complete().callback_url("mailto:ops@example.com").build(),
			Err(StrategyConfigError::InvalidUrl { field: "callback_url", .. })
		));
		assert!(matches!(
			complete().client_id("with space").build(),
			Err(StrategyConfigError::InvalidToken { field: "client_id" })
		));
		assert!(matches!(
			complete().client_secret("").build(),
			Err(StrategyConfigError::InvalidToken { field: "client_secret" })
		));
		assert!(matches!(
			complete().region("US_EAST_1").build(),
			Err(StrategyConfigError::InvalidRegion { .. })
		));
		assert!(matches!(
			complete().idp_endpoint("http://cognito.example.com/").build(),
			Err(StrategyConfigError::InsecureEndpoint { endpoint: "identity provider", .. })
		));
	}

	#[test]
	fn idp_override_replaces_regional_endpoint() {
		let mut builder = complete().idp_endpoint("http://127.0.0.1:4566/");

		builder.region = None;

		let config = builder.build().expect("Override without region should build.");

		assert_eq!(config.idp_endpoint().as_str(), "http://127.0.0.1:4566/");
		assert!(config.region().is_none());
	}

	#[test]
	fn json_configuration_reports_paths() {
		let config = StrategyConfig::from_json(
			r#"{
				"domain": "myapp.auth.eu-west-1.amazoncognito.com",
				"client_id": "client",
				"client_secret": "secret",
				"callback_url": "https://app.example.com/cb",
				"region": "eu-west-1",
				"scope": ["openid", "aws.cognito.signin.user.admin"],
				"pass_request_to_callback": true
			}"#,
		)
		.expect("JSON configuration should decode.");

		assert!(config.pass_request_to_callback());
		assert!(config.scope().permits_get_user());

		let err = StrategyConfig::from_json(r#"{"scope": ["bad scope"]}"#)
			.expect_err("Invalid scope entries must fail to decode.");

		assert!(matches!(err, StrategyConfigError::Decode { ref path, .. } if path == "scope"));
	}

	#[test]
	fn builder_debug_hides_the_secret() {
		let rendered = format!("{:?}", complete());

		assert!(!rendered.contains("secret-456"));
		assert!(rendered.contains("client_secret_set: true"));
	}
}
