//! Profile lookups against the userinfo endpoint.

// self
use crate::{
	_prelude::*,
	http::{HttpTransport, Method},
	obs::OperationKind,
	strategy::{self, Strategy},
};

/// User profile as returned by the remote service.
///
/// The service owns the schema, so the profile keeps every field it received; the accessors
/// cover the fields every profile carries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Map<String, Value>);
impl UserProfile {
	/// Identity identifier, rendered as text whether the service sent a string or a number.
	pub fn id(&self) -> Option<String> {
		match self.0.get("id")? {
			Value::String(id) => Some(id.clone()),
			Value::Number(id) => Some(id.to_string()),
			_ => None,
		}
	}

	/// Email address.
	pub fn email(&self) -> Option<&str> {
		self.text("email")
	}

	/// Display name.
	pub fn name(&self) -> Option<&str> {
		self.text("name")
	}

	/// Raw field lookup.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field)
	}

	fn text(&self, field: &str) -> Option<&str> {
		self.0.get(field).and_then(Value::as_str)
	}
}

impl<T> Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fetches the profile of the user owning `access_token` with `GET /oauth2/userinfo`.
	///
	/// A blank token fails with [`ErrorKind::NoPermission`] before any request is made.
	pub async fn user_profile(&self, access_token: &str) -> Result<UserProfile> {
		const KIND: OperationKind = OperationKind::UserProfile;

		strategy::observe(KIND, "user_profile", async move {
			if access_token.trim().is_empty() {
				return Err(Error::no_permission("Please provide an access token.")
					.with_help("Profile lookups require the user's access token."));
			}

			let request = self
				.executor()
				.request(KIND, Method::Get, self.options.endpoints.userinfo.clone())
				.with_access_token(access_token);

			self.executor().execute_as(request).await
		})
		.await
	}

	/// Fetches the profile of `identity_id` with `GET /oauth2/userinfo/{identity_id}`, signed
	/// with the client credentials in the query string.
	///
	/// A blank id or missing credentials fail with [`ErrorKind::NoPermission`] before any
	/// request is made.
	pub async fn identity_profile(&self, identity_id: &str) -> Result<UserProfile> {
		const KIND: OperationKind = OperationKind::IdentityProfile;

		strategy::observe(KIND, "identity_profile", async move {
			if identity_id.trim().is_empty() {
				return Err(Error::no_permission("Please provide an identity id."));
			}

			let credentials = self.require_client()?;
			let mut url = self.options.endpoints.identity(identity_id);

			url.query_pairs_mut()
				.append_pair("client_id", &credentials.client_id)
				.append_pair("client_secret", credentials.client_secret.expose());

			let request = self.executor().request(KIND, Method::Get, url);

			self.executor().execute_as(request).await
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn accessors_read_common_fields() {
		let profile: UserProfile = serde_json::from_str(
			r#"{"id":42,"email":"jane@example.com","name":"Jane","roles":["owner"]}"#,
		)
		.expect("Profile fixture should decode.");

		assert_eq!(profile.id().as_deref(), Some("42"));
		assert_eq!(profile.email(), Some("jane@example.com"));
		assert_eq!(profile.name(), Some("Jane"));
		assert_eq!(profile.get("roles"), Some(&serde_json::json!(["owner"])));
	}

	#[test]
	fn non_object_profiles_do_not_decode() {
		assert!(serde_json::from_str::<UserProfile>("[1,2]").is_err());
	}
}
