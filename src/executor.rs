//! Retrying request executor.
//!
//! [`RequestExecutor`] turns a [`RequestDescriptor`] into either decoded JSON or one canonical
//! [`Error`]. Connection-level failures that mean "the service is not reachable yet" are retried
//! after a fixed pause, at most [`RetryPolicy::retries`] times per call; everything else surfaces
//! immediately. Remote error bodies are decoded by [`payload`](crate::error::payload) and
//! annotated with the endpoint that failed.

// self
use crate::{
	_prelude::*,
	config::{RetryHook, RetryPolicy},
	error::{TransportError, payload},
	http::{HttpTransport, Method, RequestDescriptor},
	obs::{self, OperationKind, OperationOutcome},
};

/// Sends requests through an [`HttpTransport`] with bounded retries and error normalization.
pub struct RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	policy: RetryPolicy,
	retry_hook: Option<RetryHook>,
}
impl<T> RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an executor over `transport` using `policy` for every call.
	pub fn new(transport: impl Into<Arc<T>>, policy: RetryPolicy) -> Self {
		Self { transport: transport.into(), policy, retry_hook: None }
	}

	/// Installs a hook invoked once per retry with a
	/// [`ErrorKind::ServiceUnreachable`] error whose context holds the retries left.
	pub fn with_retry_hook(mut self, hook: RetryHook) -> Self {
		self.retry_hook = Some(hook);

		self
	}

	/// Retry policy applied to every call.
	pub fn policy(&self) -> RetryPolicy {
		self.policy
	}

	/// Underlying transport.
	pub fn transport(&self) -> &T {
		&self.transport
	}

	/// Starts a descriptor whose retry budget is seeded from the policy.
	pub fn request(&self, operation: OperationKind, method: Method, url: Url) -> RequestDescriptor {
		RequestDescriptor::new(operation, method, url).with_retries(self.policy.retries)
	}

	/// Sends `descriptor` and decodes the successful body as JSON.
	///
	/// # Errors
	///
	/// - [`ErrorKind::BadRequest`] when the service answers an empty body.
	/// - [`ErrorKind::MalformedResponse`] when the body is not JSON; the raw body is the context.
	/// - The decoded remote error when the service answers an error payload.
	/// - [`ErrorKind::ServiceUnreachable`] or [`ErrorKind::Generic`] for bare transport failures.
	pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Value> {
		let endpoint = descriptor.endpoint();

		match self.send(descriptor).await {
			Ok(body) => decode_body(&endpoint, &body),
			Err(failure) => Err(interpret_failure(&endpoint, failure)),
		}
	}

	/// Same as [`execute`](Self::execute), then deserializes the JSON into `R`.
	///
	/// A shape mismatch is reported as [`ErrorKind::MalformedResponse`] naming the offending
	/// field path.
	pub async fn execute_as<R>(&self, descriptor: RequestDescriptor) -> Result<R>
	where
		R: DeserializeOwned,
	{
		let value = self.execute(descriptor).await?;

		decode_value(value)
	}

	/// Sends `descriptor`, re-sending it while the failure is retryable and budget remains.
	///
	/// Returns the raw body or the last [`TransportError`] untouched; exhausting the budget keeps
	/// the original failure code.
	pub async fn send(&self, mut descriptor: RequestDescriptor) -> Result<String, TransportError> {
		loop {
			let attempt = self.transport.send(&descriptor).await;

			match attempt {
				Ok(body) => return Ok(body),
				Err(failure) if failure.is_retryable() && descriptor.remaining_retries > 0 => {
					descriptor.remaining_retries -= 1;

					obs::log_retry(
						descriptor.operation,
						&failure,
						descriptor.remaining_retries,
						self.policy.retry_timeout,
					);
					obs::record_operation_outcome(descriptor.operation, OperationOutcome::Retry);

					if let Some(hook) = &self.retry_hook {
						hook(&retry_notice(&descriptor, &failure));
					}

					tokio::time::sleep(self.policy.retry_timeout).await;
				},
				Err(failure) => return Err(failure),
			}
		}
	}
}
impl<T> Clone for RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: Arc::clone(&self.transport),
			policy: self.policy,
			retry_hook: self.retry_hook.clone(),
		}
	}
}
impl<T> Debug for RequestExecutor<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestExecutor")
			.field("policy", &self.policy)
			.field("retry_hook_set", &self.retry_hook.is_some())
			.finish_non_exhaustive()
	}
}

/// Normalizes a transport failure that survived the retry loop.
///
/// Failures carrying a remote body are decoded through
/// [`payload::deserialize_with_status`]; bare connection failures become
/// [`ErrorKind::ServiceUnreachable`] and anything else [`ErrorKind::Generic`]. The result is
/// annotated with the endpoint that failed.
pub fn interpret_failure(endpoint: &str, failure: TransportError) -> Error {
	if let Some(data) = failure.nested_data.as_deref() {
		let decoded = payload::deserialize_with_status(data, failure.status);
		let help = match decoded.help() {
			Some(remote) => format!("Request to {endpoint} failed. {remote}"),
			None => format!("Request to {endpoint} failed."),
		};
		let decoded = decoded.with_help(help);

		return match decoded.kind() {
			ErrorKind::MalformedResponse => decoded,
			_ => decoded.with_source(failure),
		};
	}

	let kind = match &failure.code {
		Some(code) if code.is_unreachable() => ErrorKind::ServiceUnreachable,
		_ => ErrorKind::Generic,
	};
	let context = match (&failure.code, failure.status) {
		(Some(code), _) => Some(code.as_str().to_owned()),
		(None, Some(status)) => Some(format!("HTTP {status}")),
		(None, None) => None,
	};
	let mut err = Error::new(kind, failure.message.clone())
		.with_help(format!("Request to {endpoint} failed."));

	if let Some(context) = context {
		err = err.with_context(context);
	}

	err.with_source(failure)
}

/// Error for a successful answer that carried no body.
pub(crate) fn empty_body(endpoint: &str) -> Error {
	Error::new(ErrorKind::BadRequest, "The response could not be understood.")
		.with_help(format!("{endpoint} answered with an empty body."))
}

fn decode_body(endpoint: &str, body: &str) -> Result<Value> {
	if body.trim().is_empty() {
		return Err(empty_body(endpoint));
	}

	serde_json::from_str(body).map_err(|e| {
		Error::malformed_response(body)
			.with_help(format!("{endpoint} answered with a body that is not JSON."))
			.with_source(e)
	})
}

fn decode_value<R>(value: Value) -> Result<R>
where
	R: DeserializeOwned,
{
	let raw = value.to_string();

	serde_path_to_error::deserialize(value).map_err(|e| {
		let path = e.path().to_string();

		Error::malformed_response(raw)
			.with_help(format!("Response field `{path}` has an unexpected shape."))
			.with_source(e)
	})
}

fn retry_notice(descriptor: &RequestDescriptor, failure: &TransportError) -> Error {
	let code = failure.code.as_ref().map(|code| code.as_str()).unwrap_or("unknown");

	Error::new(
		ErrorKind::ServiceUnreachable,
		format!("Remote service unreachable ({code}); retrying {}.", descriptor.endpoint()),
	)
	.with_context(format!("Retries left: {}", descriptor.remaining_retries))
}
