//! Endpoint derivation for Cognito user-pool domains.

// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{_prelude::*, config::{Region, StrategyConfigError}};

/// Path appended to the user-pool domain for the authorization endpoint.
pub const AUTHORIZATION_PATH: &str = "/oauth2/authorize";
/// Path appended to the user-pool domain for the token endpoint.
pub const TOKEN_PATH: &str = "/oauth2/token";

/// OAuth endpoints derived from a Cognito user-pool domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CognitoEndpoints {
	authorization: Url,
	token: Url,
}
impl CognitoEndpoints {
	/// Derives both endpoints from a domain such as `myapp.auth.us-east-1.amazoncognito.com`
	/// or a custom domain URL like `https://auth.example.com`.
	///
	/// A domain without a scheme is treated as HTTPS. Any base path is kept and the fixed
	/// suffixes are appended to it.
	pub fn from_domain(domain: &str) -> Result<Self, StrategyConfigError> {
		let base = parse_domain(domain)?;

		Ok(Self {
			authorization: with_suffix(&base, AUTHORIZATION_PATH),
			token: with_suffix(&base, TOKEN_PATH),
		})
	}

	/// Hosted UI authorization endpoint.
	pub fn authorization(&self) -> &Url {
		&self.authorization
	}

	/// Token endpoint used for the code exchange.
	pub fn token(&self) -> &Url {
		&self.token
	}
}

/// Returns the regional Cognito identity-provider API endpoint.
pub fn identity_provider_endpoint(region: &Region) -> Result<Url, StrategyConfigError> {
	let suffix = if region.starts_with("cn-") { "amazonaws.com.cn" } else { "amazonaws.com" };
	let raw = format!("https://cognito-idp.{region}.{suffix}/");

	Url::parse(&raw).map_err(|e| StrategyConfigError::InvalidUrl {
		field: "region",
		reason: e.to_string(),
	})
}

/// Rejects endpoints that are neither HTTPS nor plain HTTP on a loopback host.
pub(crate) fn validate_endpoint(
	name: &'static str,
	url: &Url,
) -> Result<(), StrategyConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(StrategyConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn parse_domain(domain: &str) -> Result<Url, StrategyConfigError> {
	let trimmed = domain.trim();

	if trimmed.is_empty() {
		return Err(StrategyConfigError::MissingField { field: "domain" });
	}

	let candidate =
		if trimmed.contains("://") { trimmed.to_owned() } else { format!("https://{trimmed}") };
	let base = Url::parse(&candidate).map_err(|e| StrategyConfigError::InvalidUrl {
		field: "domain",
		reason: e.to_string(),
	})?;

	if base.host().is_none() {
		return Err(StrategyConfigError::InvalidUrl {
			field: "domain",
			reason: "missing host".into(),
		});
	}
	if base.query().is_some() || base.fragment().is_some() {
		return Err(StrategyConfigError::InvalidUrl {
			field: "domain",
			reason: "query and fragment are not allowed".into(),
		});
	}

	validate_endpoint("domain", &base)?;

	Ok(base)
}

fn with_suffix(base: &Url, suffix: &str) -> Url {
	let mut url = base.clone();
	let path = format!("{}{suffix}", base.path().trim_end_matches('/'));

	url.set_path(&path);

	url
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bare_domain_defaults_to_https() {
		let endpoints = CognitoEndpoints::from_domain("myapp.auth.us-east-1.amazoncognito.com")
			.expect("Bare Cognito domain should derive endpoints.");

		assert_eq!(
			endpoints.authorization.as_str(),
			"https://myapp.auth.us-east-1.amazoncognito.com/oauth2/authorize"
		);
		assert_eq!(
			endpoints.token.as_str(),
			"https://myapp.auth.us-east-1.amazoncognito.com/oauth2/token"
		);
	}

	#[test]
	fn custom_domain_keeps_base_path() {
		let endpoints = CognitoEndpoints::from_domain("https://auth.example.com/tenant-a/")
			.expect("Custom domain with base path should derive endpoints.");

		assert_eq!(
			endpoints.authorization.as_str(),
			"https://auth.example.com/tenant-a/oauth2/authorize"
		);
		assert_eq!(endpoints.token.as_str(), "https://auth.example.com/tenant-a/oauth2/token");
	}

	#[test]
	fn insecure_domains_are_rejected_unless_loopback() {
		let err = CognitoEndpoints::from_domain("http://auth.example.com")
			.expect_err("Plain HTTP must be rejected for public hosts.");

		assert!(matches!(err, StrategyConfigError::InsecureEndpoint { endpoint: "domain", .. }));
		assert!(CognitoEndpoints::from_domain("http://127.0.0.1:8080").is_ok());
		assert!(CognitoEndpoints::from_domain("http://localhost:8080").is_ok());
		assert!(matches!(
			CognitoEndpoints::from_domain("  "),
			Err(StrategyConfigError::MissingField { field: "domain" })
		));
		assert!(matches!(
			CognitoEndpoints::from_domain("https://auth.example.com/?x=1"),
			Err(StrategyConfigError::InvalidUrl { field: "domain", .. })
		));
	}

	#[test]
	fn identity_provider_endpoint_tracks_partition() {
		let region = Region::new("eu-west-1").expect("Region fixture should be valid.");

		assert_eq!(
			identity_provider_endpoint(&region)
				.expect("Commercial region endpoint should parse.")
				.as_str(),
			"https://cognito-idp.eu-west-1.amazonaws.com/"
		);

		let region = Region::new("cn-north-1").expect("Region fixture should be valid.");

		assert_eq!(
			identity_provider_endpoint(&region)
				.expect("China region endpoint should parse.")
				.as_str(),
			"https://cognito-idp.cn-north-1.amazonaws.com.cn/"
		);
	}
}
