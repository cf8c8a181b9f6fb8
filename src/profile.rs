//! Normalized user profiles and the resolver that builds them from `GetUser`.

// crates.io
use serde::{Serializer, ser::SerializeMap};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	idp::{GetUserOutput, IdentityProviderApi},
	obs::{self, Stage},
};

/// Key that always carries the user-pool username.
pub const USERNAME_KEY: &str = "username";

/// Boxed future returned by [`ProfileResolver`] implementations.
pub type ProfileFuture<'a> = Pin<Box<dyn Future<Output = Result<Profile>> + 'a + Send>>;

/// Insertion-ordered attribute map produced for the verify callback.
///
/// Keys are unique. Inserting an existing key replaces its value in place (last write wins)
/// and keeps the key's original position. A provider attribute literally named `username`
/// therefore replaces the canonical username; [`username_overridden`](Self::username_overridden)
/// reports when that happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
	entries: Vec<(String, String)>,
	username_overridden: bool,
}
impl Profile {
	/// Creates a profile holding only the canonical username.
	pub fn new(username: impl Into<String>) -> Self {
		Self {
			entries: vec![(USERNAME_KEY.to_owned(), username.into())],
			username_overridden: false,
		}
	}

	/// Flattens a `GetUser` response: `username` first, then every attribute in response order.
	///
	/// Attributes Cognito returns without a value are recorded as empty strings.
	pub fn from_get_user(output: GetUserOutput) -> Self {
		let mut profile = Self::new(output.username);

		for attribute in output.user_attributes {
			profile.insert(attribute.name, attribute.value.unwrap_or_default());
		}

		profile
	}

	/// Sets `name` to `value`, returning the previous value for that name.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		let name = name.into();
		let value = value.into();

		if name == USERNAME_KEY {
			self.username_overridden = true;
		}

		match self.entries.iter_mut().find(|(key, _)| *key == name) {
			Some((_, slot)) => Some(std::mem::replace(slot, value)),
			None => {
				self.entries.push((name, value));

				None
			},
		}
	}

	/// Returns the value stored for `name`.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.entries.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
	}

	/// Returns true if `name` is present.
	pub fn contains_key(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Current `username` value.
	pub fn username(&self) -> &str {
		self.get(USERNAME_KEY).unwrap_or_default()
	}

	/// Returns true when a provider attribute replaced the canonical username.
	pub fn username_overridden(&self) -> bool {
		self.username_overridden
	}

	/// Number of keys, `username` included.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Always false for profiles built by this crate; present for API symmetry.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates `(name, value)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Copies the profile into a sorted map.
	pub fn to_map(&self) -> BTreeMap<String, String> {
		self.entries.iter().cloned().collect()
	}
}
impl Serialize for Profile {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;

		for (key, value) in &self.entries {
			map.serialize_entry(key, value)?;
		}

		map.end()
	}
}

/// Exchanges an access token for a normalized [`Profile`].
pub trait ProfileResolver: Send + Sync {
	/// Resolves the profile of the user the token was issued to.
	///
	/// Resolves to either a fully populated profile or an error, never both and never a
	/// partial profile. Dropping the future abandons the in-flight request.
	fn user_profile<'a>(&'a self, access_token: &'a TokenSecret) -> ProfileFuture<'a>;
}

/// [`ProfileResolver`] that calls Cognito `GetUser` exactly once per invocation.
#[derive(Clone)]
pub struct CognitoProfileResolver {
	api: Arc<dyn IdentityProviderApi>,
}
impl CognitoProfileResolver {
	/// Wraps an identity-provider API client.
	pub fn new(api: Arc<dyn IdentityProviderApi>) -> Self {
		Self { api }
	}
}
impl ProfileResolver for CognitoProfileResolver {
	fn user_profile<'a>(&'a self, access_token: &'a TokenSecret) -> ProfileFuture<'a> {
		Box::pin(obs::observe(Stage::ResolveProfile, async move {
			if access_token.is_empty() {
				return Err(ConfigError::EmptyAccessToken.into());
			}

			let output = self.api.get_user(access_token).await?;

			Ok(Profile::from_get_user(output))
		}))
	}
}
impl Debug for CognitoProfileResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CognitoProfileResolver(..)")
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{error::MalformedResponseError, idp::{AttributeType, IdpFuture}};

	fn attribute(name: &str, value: &str) -> AttributeType {
		AttributeType { name: name.into(), value: Some(value.into()) }
	}

	struct StaticApi {
		calls: AtomicUsize,
		response: fn(&str) -> Result<GetUserOutput>,
	}
	impl StaticApi {
		fn new(response: fn(&str) -> Result<GetUserOutput>) -> Arc<Self> {
			Arc::new(Self { calls: AtomicUsize::new(0), response })
		}
	}
	impl IdentityProviderApi for StaticApi {
		fn get_user<'a>(&'a self, access_token: &'a TokenSecret) -> IdpFuture<'a, GetUserOutput> {
			self.calls.fetch_add(1, Ordering::SeqCst);

			let result = (self.response)(access_token.expose());

			Box::pin(async move { result })
		}
	}

	fn alice(token: &str) -> Result<GetUserOutput> {
		assert_eq!(token, "tok-123");

		Ok(GetUserOutput {
			username: "alice".into(),
			user_attributes: vec![attribute("email", "a@x.com"), attribute("email", "a2@x.com")],
		})
	}

	fn rejected(_: &str) -> Result<GetUserOutput> {
		Err(Error::ProviderRejection {
			kind: "NotAuthorizedException".into(),
			message: "Invalid Access Token".into(),
		})
	}

	#[test]
	fn attributes_flatten_in_order_with_last_write_wins() {
		let profile = Profile::from_get_user(GetUserOutput {
			username: "bob".into(),
			user_attributes: vec![
				attribute("sub", "1"),
				attribute("email", "first@x.com"),
				attribute("phone_number", "+1"),
				attribute("email", "last@x.com"),
			],
		});

		assert_eq!(profile.len(), 4);
		assert_eq!(profile.get("email"), Some("last@x.com"));
		assert_eq!(
			profile.iter().map(|(key, _)| key).collect::<Vec<_>>(),
			["username", "sub", "email", "phone_number"]
		);
		assert!(!profile.username_overridden());
	}

	#[test]
	fn empty_attribute_list_yields_only_username() {
		let profile = Profile::from_get_user(GetUserOutput {
			username: "carol".into(),
			user_attributes: Vec::new(),
		});

		assert_eq!(profile.len(), 1);
		assert_eq!(profile.username(), "carol");
	}

	#[test]
	fn username_attribute_overrides_canonical_value() {
		let profile = Profile::from_get_user(GetUserOutput {
			username: "uuid-1".into(),
			user_attributes: vec![attribute("username", "dave"), AttributeType {
				name: "nickname".into(),
				value: None,
			}],
		});

		assert_eq!(profile.username(), "dave");
		assert_eq!(profile.get("nickname"), Some(""));
		assert_eq!(profile.len(), 2);
		assert!(profile.username_overridden());
	}

	#[test]
	fn profile_serializes_as_ordered_object() {
		let mut profile = Profile::new("erin");

		profile.insert("email", "e@x.com");

		assert_eq!(
			serde_json::to_string(&profile).expect("Profile should serialize."),
			"{\"username\":\"erin\",\"email\":\"e@x.com\"}"
		);
		assert_eq!(profile.to_map().len(), 2);
	}

	#[tokio::test]
	async fn resolver_builds_profile_from_single_call() {
		let api = StaticApi::new(alice);
		let resolver = CognitoProfileResolver::new(api.clone());
		let profile = resolver
			.user_profile(&TokenSecret::new("tok-123"))
			.await
			.expect("Profile resolution should succeed.");

		assert_eq!(profile.username(), "alice");
		assert_eq!(profile.get("email"), Some("a2@x.com"));
		assert_eq!(profile.len(), 2);
		assert_eq!(api.calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn resolver_passes_provider_errors_through() {
		let resolver = CognitoProfileResolver::new(StaticApi::new(rejected));
		let err = resolver
			.user_profile(&TokenSecret::new("bad-tok"))
			.await
			.expect_err("Rejected tokens must not produce a profile.");

		assert!(matches!(
			err,
			Error::ProviderRejection { ref kind, .. } if kind == "NotAuthorizedException"
		));
	}

	#[tokio::test]
	async fn resolver_rejects_empty_tokens_without_calling_out() {
		let api = StaticApi::new(|_| Err(MalformedResponseError::EmptyUsername.into()));
		let resolver = CognitoProfileResolver::new(api.clone());
		let err = resolver
			.user_profile(&TokenSecret::new(""))
			.await
			.expect_err("Empty tokens must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::EmptyAccessToken)));
		assert_eq!(api.calls.load(Ordering::SeqCst), 0);
	}
}
