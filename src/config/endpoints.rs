//! Endpoint URLs derived from the identity service base URL.

// self
use crate::{_prelude::*, error::ConfigError};

/// Remote service endpoints, derived from the base URL.
///
/// Paths never carry a trailing slash; a trailing slash on the base URL is trimmed before the
/// suffixes are appended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// `/oauth2/authorize`
	pub authorize: Url,
	/// `/oauth2/token`
	pub token: Url,
	/// `/oauth2/client`
	pub client: Url,
	/// `/oauth2/client/redirect`
	pub client_redirect: Url,
	/// `/oauth2/userinfo`
	pub userinfo: Url,
	/// `/oauth2/password`
	pub password: Url,
}
impl Endpoints {
	/// Derives every endpoint from the service base URL.
	pub fn from_base(base: &Url) -> Result<Self, ConfigError> {
		let root = base.as_str().trim_end_matches('/');
		let join = |suffix: &str| {
			Url::parse(&format!("{root}{suffix}"))
				.map_err(|source| ConfigError::InvalidUrl { field: "service URL", source })
		};

		Ok(Self {
			authorize: join("/oauth2/authorize")?,
			token: join("/oauth2/token")?,
			client: join("/oauth2/client")?,
			client_redirect: join("/oauth2/client/redirect")?,
			userinfo: join("/oauth2/userinfo")?,
			password: join("/oauth2/password")?,
		})
	}

	/// Profile endpoint for a single identity.
	pub fn identity(&self, identity_id: &str) -> Url {
		let mut url = self.userinfo.clone();

		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().push(identity_id);
		}

		url
	}
}
