//! Authorization-code login against the remote identity service.
//!
//! [`Strategy::authorization_request`] produces the URL users are sent to, together with the
//! `state` value the redirect must echo back. Once the service redirects to the callback URL,
//! [`Strategy::complete_authorization`] exchanges the code and loads the user's profile.

pub use crate::oauth::TokenGrant;

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	http::HttpTransport,
	oauth,
	obs::OperationKind,
	strategy::{self, Strategy, UserProfile},
};

const STATE_LEN: usize = 32;

/// Authorization redirect produced by [`Strategy::authorization_request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Opaque state value that must round-trip via the redirect.
	pub state: String,
	/// Fully-formed authorize URL to send the user to.
	pub authorize_url: Url,
}
impl AuthorizationRequest {
	/// Validates the `state` parameter returned with the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::no_permission("Authorization state mismatch.")
				.with_help("Restart the login; the redirect did not originate from this request."))
		}
	}
}

/// Outcome of a completed login.
#[derive(Clone, Debug, PartialEq)]
pub struct Authenticated {
	/// Tokens issued for the authorization code.
	pub grant: TokenGrant,
	/// Profile of the user who logged in.
	pub profile: UserProfile,
}

impl<T> Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Builds the authorize URL for a new login.
	///
	/// `login_hint`, when present and non-blank, pre-fills the user's identity on the service's
	/// login form. Requires client credentials.
	pub fn authorization_request(&self, login_hint: Option<&str>) -> Result<AuthorizationRequest> {
		let credentials = self.require_client()?;
		let state = random_string(STATE_LEN);
		let mut authorize_url = self.options.endpoints.authorize.clone();
		let mut pairs = authorize_url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &credentials.client_id);
		pairs.append_pair("redirect_uri", self.options.callback_url.as_str());
		pairs.append_pair("state", &state);

		if let Some(hint) = login_hint.map(str::trim).filter(|hint| !hint.is_empty()) {
			pairs.append_pair("login_hint", hint);
		}

		drop(pairs);

		Ok(AuthorizationRequest { state, authorize_url })
	}

	/// Exchanges an authorization code at `POST /oauth2/token`.
	///
	/// The client credentials travel in the request body. The exchange shares the executor's
	/// retry loop; OAuth error responses map onto [`ErrorKind`]s by their `error` code.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
		const KIND: OperationKind = OperationKind::ExchangeCode;

		strategy::observe(KIND, "exchange_code", async move {
			if code.trim().is_empty() {
				return Err(Error::incorrect_usage("Please provide an authorization code."));
			}

			let credentials = self.require_client()?;

			oauth::exchange_code(
				self.executor(),
				&self.options.endpoints,
				&self.options.callback_url,
				&credentials,
				code,
			)
			.await
		})
		.await
	}

	/// Exchanges `code` and loads the profile of the user who logged in.
	pub async fn complete_authorization(&self, code: &str) -> Result<Authenticated> {
		let grant = self.exchange_code(code).await?;
		let profile = self.user_profile(grant.access_token.expose()).await?;

		Ok(Authenticated { grant, profile })
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn state_validation_errors_on_mismatch() {
		let request = AuthorizationRequest {
			state: "expected".into(),
			authorize_url: Url::parse("https://auth.example.com/oauth2/authorize?state=expected")
				.expect("Authorize URL fixture should parse."),
		};

		assert!(request.validate_state("expected").is_ok());

		let err = request.validate_state("other").expect_err("State mismatch should fail.");

		assert_eq!(err.kind(), ErrorKind::NoPermission);
	}

	#[test]
	fn random_states_are_alphanumeric() {
		let state = random_string(STATE_LEN);

		assert_eq!(state.len(), STATE_LEN);
		assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(state, random_string(STATE_LEN));
	}
}
