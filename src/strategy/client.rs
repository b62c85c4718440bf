//! Dynamic client registration and maintenance.

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, Secret},
	config,
	http::{HttpTransport, Method},
	obs::OperationKind,
	strategy::{self, Strategy},
};

/// Client record returned by a successful registration.
#[derive(Clone, Debug, Deserialize)]
pub struct RegisteredClient {
	/// Identifier issued by the remote service.
	pub client_id: String,
	/// Secret issued by the remote service.
	pub client_secret: Secret,
	/// Every other field the service returned (name, redirect URI, ...).
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl RegisteredClient {
	/// Credentials pair carried by the record.
	pub fn credentials(&self) -> ClientCredentials {
		ClientCredentials::new(self.client_id.clone(), self.client_secret.clone())
	}

	/// JSON rendering of the record with the secret redacted.
	fn redacted_json(&self) -> String {
		let mut record = self.extra.clone();

		record.insert("client_id".into(), Value::from(self.client_id.as_str()));
		record.insert("client_secret".into(), Value::from(self.client_secret.to_string()));

		Value::Object(record).to_string()
	}
}

/// Partial update of a registered client.
///
/// Only the fields that are set are sent; unset fields are omitted from the request body rather
/// than sent as `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClientUpdate {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// New description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// New redirect target.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<Url>,
	/// New site URI, sent as `blog_uri`.
	#[serde(rename = "blog_uri", skip_serializing_if = "Option::is_none")]
	pub site_uri: Option<Url>,
}
impl ClientUpdate {
	/// Sets the display name.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the description.
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Sets the redirect target.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Sets the site URI.
	pub fn site_uri(mut self, uri: Url) -> Self {
		self.site_uri = Some(uri);

		self
	}

	/// Whether no field is set.
	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.description.is_none()
			&& self.redirect_uri.is_none()
			&& self.site_uri.is_none()
	}

	fn validate(&self) -> Result<()> {
		if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
			return Err(Error::incorrect_usage("Client name cannot be blank."));
		}
		if let Some(uri) = &self.redirect_uri {
			config::validate_http_url("redirect URI", uri)?;
		}
		if let Some(uri) = &self.site_uri {
			config::validate_http_url("site URI", uri)?;
		}

		Ok(())
	}
}

#[derive(Serialize)]
struct RegistrationBody<'a> {
	name: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	description: Option<&'a str>,
	redirect_uri: &'a str,
	#[serde(rename = "blog_uri")]
	site_uri: &'a str,
}

#[derive(Serialize)]
struct RedirectBody<'a> {
	redirect_uri: &'a str,
}

/// Request body signed with the client's credentials.
#[derive(Serialize)]
struct Signed<'a, B>
where
	B: Serialize,
{
	client_id: &'a str,
	client_secret: &'a str,
	#[serde(flatten)]
	body: B,
}
impl<'a, B> Signed<'a, B>
where
	B: Serialize,
{
	fn new(credentials: &'a ClientCredentials, body: B) -> Self {
		Self {
			client_id: &credentials.client_id,
			client_secret: credentials.client_secret.expose(),
			body,
		}
	}
}

impl<T> Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Registers this site as an OAuth client and installs the issued credentials.
	///
	/// Sends `POST /oauth2/client` with the name, the optional description, the configured
	/// callback URL as `redirect_uri`, and the configured site URI as `blog_uri`. A blank `name`
	/// fails with [`ErrorKind::IncorrectUsage`] before any request is made.
	pub async fn register_client(
		&self,
		name: &str,
		description: Option<&str>,
	) -> Result<RegisteredClient> {
		const KIND: OperationKind = OperationKind::RegisterClient;

		strategy::observe(KIND, "register_client", async move {
			if name.trim().is_empty() {
				return Err(Error::incorrect_usage("Please provide a client name.")
					.with_help("Registering a client requires a display name."));
			}

			let body = RegistrationBody {
				name,
				description,
				redirect_uri: self.options.callback_url.as_str(),
				site_uri: self.options.site_uri.as_str(),
			};
			let request = self
				.executor()
				.request(KIND, Method::Post, self.options.endpoints.client.clone())
				.with_json(&body)?;
			let registered = self.executor().execute_as::<RegisteredClient>(request).await?;
			let credentials = registered.credentials();

			if credentials.validate().is_err() {
				return Err(Error::malformed_response(registered.redacted_json())
					.with_help("Client registration answered without usable credentials."));
			}

			self.set_client(credentials)?;

			Ok(registered)
		})
		.await
	}

	/// Sends a partial update of the registered client with `PUT /oauth2/client`.
	///
	/// Requires client credentials; only the fields set on `update` are sent.
	pub async fn update_client(&self, update: &ClientUpdate) -> Result<Value> {
		const KIND: OperationKind = OperationKind::UpdateClient;

		strategy::observe(KIND, "update_client", async move {
			update.validate()?;

			let credentials = self.require_client()?;
			let request = self
				.executor()
				.request(KIND, Method::Put, self.options.endpoints.client.clone())
				.with_json(&Signed::new(&credentials, update))?;

			self.executor().execute(request).await
		})
		.await
	}

	/// Points the registered client at a new redirect target with
	/// `POST /oauth2/client/redirect`.
	pub async fn change_callback_url(&self, callback_url: &Url) -> Result<Value> {
		const KIND: OperationKind = OperationKind::ChangeCallbackUrl;

		strategy::observe(KIND, "change_callback_url", async move {
			config::validate_http_url("callback URL", callback_url)?;

			let credentials = self.require_client()?;
			let body = RedirectBody { redirect_uri: callback_url.as_str() };
			let request = self
				.executor()
				.request(KIND, Method::Post, self.options.endpoints.client_redirect.clone())
				.with_json(&Signed::new(&credentials, body))?;

			self.executor().execute(request).await
		})
		.await
	}
}
