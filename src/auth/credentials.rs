//! OAuth client credentials issued by the remote identity service.

// self
use crate::{_prelude::*, auth::Secret};

/// Client identifier + secret pair obtained through dynamic registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: Secret,
}
impl ClientCredentials {
	/// Creates a credentials pair.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Self {
		Self { client_id: client_id.into(), client_secret: client_secret.into() }
	}

	/// Rejects pairs with a blank identifier or secret.
	pub fn validate(&self) -> Result<()> {
		if self.client_id.trim().is_empty() || self.client_secret.is_blank() {
			return Err(Error::incorrect_usage("Client credentials require an id and a secret."));
		}

		Ok(())
	}
}

/// Shared slot holding the credentials of a strategy instance.
///
/// Writers replace the whole pair at once; readers take an [`Arc`] snapshot so an in-flight
/// request keeps signing with the pair it started with.
#[derive(Debug, Default)]
pub struct CredentialsSlot(RwLock<Option<Arc<ClientCredentials>>>);
impl CredentialsSlot {
	/// Creates a slot seeded with optional credentials.
	pub fn new(initial: Option<ClientCredentials>) -> Self {
		Self(RwLock::new(initial.map(Arc::new)))
	}

	/// Replaces the stored credentials.
	pub fn replace(&self, credentials: ClientCredentials) {
		*self.0.write() = Some(Arc::new(credentials));
	}

	/// Returns the current credentials, if any.
	pub fn snapshot(&self) -> Option<Arc<ClientCredentials>> {
		self.0.read().clone()
	}

	/// Returns the current credentials or a [`ErrorKind::NoPermission`] error.
	pub fn require(&self) -> Result<Arc<ClientCredentials>> {
		self.snapshot().ok_or_else(|| {
			Error::no_permission("No client credentials are configured.")
				.with_help("Register a client or call `set_client` first.")
		})
	}
}
