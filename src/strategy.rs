//! The OAuth 2.0 client strategy and its domain operations.
//!
//! [`Strategy`] owns the validated options, a [`RequestExecutor`] over the configured transport,
//! and the client credentials issued by the remote service. Each operation validates its input
//! before touching the network, builds a [`RequestDescriptor`](crate::http::RequestDescriptor),
//! and hands it to the executor. Operations live in submodules grouped by concern.

pub mod authorize;
pub mod client;
pub mod password;
pub mod profile;

pub use authorize::*;
pub use client::*;
pub use password::*;
pub use profile::*;

// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::{ClientCredentials, CredentialsSlot},
	config::StrategyOptions,
	executor::RequestExecutor,
	http::HttpTransport,
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
};

#[cfg(feature = "reqwest")]
/// Strategy specialized for the crate's default reqwest transport.
pub type ReqwestStrategy = Strategy<ReqwestTransport>;

/// OAuth 2.0 client strategy bound to one remote identity service.
///
/// Clones share the transport and the credentials slot, so credentials installed through one
/// handle (by [`register_client`](Strategy::register_client) or
/// [`set_client`](Strategy::set_client)) are visible to every other handle.
pub struct Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Validated configuration.
	pub options: StrategyOptions,
	executor: RequestExecutor<T>,
	credentials: Arc<CredentialsSlot>,
}
impl<T> Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a strategy that sends every request through `transport`.
	///
	/// Fails with [`ErrorKind::IncorrectUsage`] when the options carry blank initial credentials.
	pub fn with_transport(options: StrategyOptions, transport: impl Into<Arc<T>>) -> Result<Self> {
		if let Some(client) = &options.client {
			client.validate()?;
		}

		let mut executor = RequestExecutor::new(transport, options.retry);

		if let Some(hook) = &options.retry_hook {
			executor = executor.with_retry_hook(Arc::clone(hook));
		}

		let credentials = Arc::new(CredentialsSlot::new(options.client.clone()));

		Ok(Self { options, executor, credentials })
	}

	/// Executor used by every operation.
	pub fn executor(&self) -> &RequestExecutor<T> {
		&self.executor
	}

	/// Current client credentials, if any.
	pub fn client(&self) -> Option<Arc<ClientCredentials>> {
		self.credentials.snapshot()
	}

	/// Replaces the client credentials used to sign client-scoped requests.
	pub fn set_client(&self, credentials: ClientCredentials) -> Result<()> {
		credentials.validate()?;

		#[cfg(feature = "tracing")]
		tracing::debug!(client_id = credentials.client_id.as_str(), "Client credentials replaced.");

		self.credentials.replace(credentials);

		Ok(())
	}

	pub(crate) fn require_client(&self) -> Result<Arc<ClientCredentials>> {
		self.credentials.require()
	}
}
#[cfg(feature = "reqwest")]
impl Strategy<ReqwestTransport> {
	/// Creates a strategy backed by a default reqwest client.
	pub fn new(options: StrategyOptions) -> Result<Self> {
		Self::with_transport(options, ReqwestTransport::default())
	}
}
impl<T> Clone for Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			options: self.options.clone(),
			executor: self.executor.clone(),
			credentials: Arc::clone(&self.credentials),
		}
	}
}
impl<T> Debug for Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Strategy")
			.field("options", &self.options)
			.field("executor", &self.executor)
			.field("client_id", &self.client().map(|client| client.client_id.clone()))
			.finish()
	}
}

/// Runs one operation inside its span, recording attempt and terminal outcome.
pub(crate) async fn observe<F, R>(kind: OperationKind, stage: &'static str, operation: F) -> Result<R>
where
	F: Future<Output = Result<R>>,
{
	let span = OperationSpan::new(kind, stage);

	obs::record_operation_outcome(kind, OperationOutcome::Attempt);

	let result = span.instrument(operation).await;

	match &result {
		Ok(_) => obs::record_operation_outcome(kind, OperationOutcome::Success),
		Err(e) => {
			obs::record_operation_outcome(kind, OperationOutcome::Failure);
			obs::log_failure(kind, e);
		},
	}

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		error::TransportError,
		http::{RequestDescriptor, TransportFuture},
	};

	struct Offline;
	impl HttpTransport for Offline {
		fn send<'a>(&'a self, _: &'a RequestDescriptor) -> TransportFuture<'a> {
			Box::pin(async { Err(TransportError::new("offline")) })
		}
	}

	fn options() -> StrategyOptions {
		StrategyOptions::builder()
			.callback_url(
				Url::parse("https://blog.example.com/callback")
					.expect("Callback URL fixture should parse."),
			)
			.site_uri(Url::parse("https://blog.example.com").expect("Site URI fixture should parse."))
			.build()
			.expect("Strategy options should build.")
	}

	#[test]
	fn clones_share_credentials() {
		let strategy = Strategy::<Offline>::with_transport(options(), Offline)
			.expect("Strategy should build without initial credentials.");
		let clone = strategy.clone();

		assert!(clone.client().is_none());

		strategy
			.set_client(ClientCredentials::new("client-1", "secret-1"))
			.expect("Valid credentials should be accepted.");

		assert_eq!(
			clone.client().map(|client| client.client_id.clone()).as_deref(),
			Some("client-1")
		);
	}

	#[test]
	fn blank_credentials_are_rejected() {
		let mut blank = options();

		blank.client = Some(ClientCredentials::new("", "secret"));

		let err = Strategy::<Offline>::with_transport(blank, Offline)
			.expect_err("Blank initial credentials should be rejected.");

		assert_eq!(err.kind(), ErrorKind::IncorrectUsage);

		let strategy = Strategy::<Offline>::with_transport(options(), Offline)
			.expect("Strategy should build without initial credentials.");
		let err = strategy
			.set_client(ClientCredentials::new("client", " "))
			.expect_err("Blank secret should be rejected.");

		assert_eq!(err.kind(), ErrorKind::IncorrectUsage);
		assert!(strategy.client().is_none());
	}

	#[tokio::test]
	async fn observe_passes_results_through() {
		let value = observe(OperationKind::UserProfile, "observe_passes_results_through", async {
			Ok::<_, Error>(7)
		})
		.await
		.expect("Successful operation should pass through.");

		assert_eq!(value, 7);
	}
}
