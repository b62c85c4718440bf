//! Strategy configuration: validated options, their builder, and derived endpoints.
//!
//! [`StrategyOptionsBuilder`] is serde-deserializable so applications can load it from any
//! configuration source; [`StrategyOptionsBuilder::build`] performs every validation up front so a
//! misconfigured strategy fails before it touches the network.

pub mod builder;
pub mod endpoints;

pub use builder::*;
pub use endpoints::*;

// self
use crate::{_prelude::*, auth::ClientCredentials, error::ConfigError};

/// Hosted identity service used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://auth.ghost.org";
/// Default retry budget for transient transport failures.
pub const DEFAULT_RETRIES: u32 = 10;
/// Default delay between two attempts.
pub const DEFAULT_RETRY_TIMEOUT: StdDuration = StdDuration::from_millis(5_000);

/// Callback invoked with a [`ErrorKind::ServiceUnreachable`] error before every retry.
pub type RetryHook = Arc<dyn Fn(&Error) + Send + Sync>;

/// Retry behavior applied by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Number of retries after the initial attempt.
	pub retries: u32,
	/// Fixed delay between two attempts.
	pub retry_timeout: StdDuration,
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { retries: DEFAULT_RETRIES, retry_timeout: DEFAULT_RETRY_TIMEOUT }
	}
}

/// Validated configuration consumed by [`Strategy`](crate::strategy::Strategy).
#[derive(Clone)]
pub struct StrategyOptions {
	/// Base URL of the remote identity service.
	pub url: Url,
	/// Endpoints derived from `url`.
	pub endpoints: Endpoints,
	/// Redirect target the remote service sends users back to.
	pub callback_url: Url,
	/// URI identifying the calling site, sent with client registrations.
	pub site_uri: Url,
	/// Retry behavior for transient transport failures.
	pub retry: RetryPolicy,
	/// Optional retry observer.
	pub retry_hook: Option<RetryHook>,
	/// Credentials installed before any registration happens.
	pub client: Option<ClientCredentials>,
}
impl StrategyOptions {
	/// Creates a new builder.
	pub fn builder() -> StrategyOptionsBuilder {
		StrategyOptionsBuilder::default()
	}
}
impl Debug for StrategyOptions {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StrategyOptions")
			.field("url", &self.url.as_str())
			.field("callback_url", &self.callback_url.as_str())
			.field("site_uri", &self.site_uri.as_str())
			.field("retry", &self.retry)
			.field("retry_hook_set", &self.retry_hook.is_some())
			.field("client_set", &self.client.is_some())
			.finish()
	}
}

pub(crate) fn validate_http_url(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" => Ok(()),
		_ => Err(ConfigError::UnsupportedScheme { field, url: url.to_string() }),
	}
}
