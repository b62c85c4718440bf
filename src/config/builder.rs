//! Serde-capable builder that validates into [`StrategyOptions`](crate::config::StrategyOptions).

// self
use crate::{
	_prelude::*,
	auth::ClientCredentials,
	config::{
		DEFAULT_BASE_URL, Endpoints, RetryHook, RetryPolicy, StrategyOptions, validate_http_url,
	},
	error::ConfigError,
};

/// Builder for [`StrategyOptions`] values.
///
/// Every field is optional until [`build`](Self::build) runs; `callback_url` and `site_uri` are
/// mandatory there. Deserializing the builder accepts the same fields, with the retry delay
/// expressed as `retry_timeout_ms`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct StrategyOptionsBuilder {
	/// Base URL of the remote identity service.
	pub url: Option<Url>,
	/// Redirect target the remote service sends users back to.
	pub callback_url: Option<Url>,
	/// URI identifying the calling site.
	pub site_uri: Option<Url>,
	/// Number of retries after the initial attempt.
	pub retries: Option<u32>,
	/// Delay between two attempts, in milliseconds.
	pub retry_timeout_ms: Option<u64>,
	/// Credentials to install immediately.
	pub client: Option<ClientCredentials>,
	/// Retry observer.
	#[serde(skip)]
	pub retry_hook: Option<RetryHook>,
}
impl StrategyOptionsBuilder {
	/// Overrides the service base URL.
	pub fn url(mut self, url: Url) -> Self {
		self.url = Some(url);

		self
	}

	/// Sets the callback URL.
	pub fn callback_url(mut self, url: Url) -> Self {
		self.callback_url = Some(url);

		self
	}

	/// Sets the site URI.
	pub fn site_uri(mut self, uri: Url) -> Self {
		self.site_uri = Some(uri);

		self
	}

	/// Overrides the retry budget.
	pub fn retries(mut self, retries: u32) -> Self {
		self.retries = Some(retries);

		self
	}

	/// Overrides the delay between two attempts.
	pub fn retry_timeout(mut self, timeout: StdDuration) -> Self {
		self.retry_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));

		self
	}

	/// Installs a retry observer.
	pub fn retry_hook<F>(mut self, hook: F) -> Self
	where
		F: 'static + Fn(&Error) + Send + Sync,
	{
		self.retry_hook = Some(Arc::new(hook));

		self
	}

	/// Installs client credentials up front.
	pub fn client(mut self, credentials: ClientCredentials) -> Self {
		self.client = Some(credentials);

		self
	}

	/// Consumes the builder and validates the resulting options.
	pub fn build(self) -> Result<StrategyOptions, ConfigError> {
		let url = match self.url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL)
				.map_err(|source| ConfigError::InvalidUrl { field: "service URL", source })?,
		};
		let callback_url = self.callback_url.ok_or(ConfigError::MissingCallbackUrl)?;
		let site_uri = self.site_uri.ok_or(ConfigError::MissingSiteUri)?;

		validate_http_url("service URL", &url)?;
		validate_http_url("callback URL", &callback_url)?;
		validate_http_url("site URI", &site_uri)?;

		let endpoints = Endpoints::from_base(&url)?;
		let defaults = RetryPolicy::default();
		let retry = RetryPolicy {
			retries: self.retries.unwrap_or(defaults.retries),
			retry_timeout: self
				.retry_timeout_ms
				.map(StdDuration::from_millis)
				.unwrap_or(defaults.retry_timeout),
		};

		Ok(StrategyOptions {
			url,
			endpoints,
			callback_url,
			site_uri,
			retry,
			retry_hook: self.retry_hook,
			client: self.client,
		})
	}
}
impl Debug for StrategyOptionsBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptionsBuilder")
			.field("url", &self.url)
			.field("callback_url", &self.callback_url)
			.field("site_uri", &self.site_uri)
			.field("retries", &self.retries)
			.field("retry_timeout_ms", &self.retry_timeout_ms)
			.field("client", &self.client)
			.field("retry_hook_set", &self.retry_hook.is_some())
			.finish()
	}
}
