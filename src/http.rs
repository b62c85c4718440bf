//! Transport primitives for calls to the remote identity service.
//!
//! [`HttpTransport`] is the strategy's only dependency on an HTTP stack. It receives a
//! [`RequestDescriptor`] and answers with exactly one of a raw body (2xx) or a
//! [`TransportError`]; non-2xx answers are errors carrying their status and raw body so the
//! executor can decode the service's own error payload. Retries, JSON decoding, and error
//! normalization all live above this seam, in [`RequestExecutor`](crate::executor::RequestExecutor).

// self
use crate::{_prelude::*, auth::Secret, error::TransportError, obs::OperationKind};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<String, TransportError>> + 'a + Send + Sync>>;

/// Abstraction over HTTP transports able to carry strategy requests.
///
/// Implementations must be `Send + Sync + 'static` so a strategy can be shared across tasks,
/// and the futures they return must be `Send + Sync` so the code-exchange adapter can hand them
/// to the `oauth2` crate.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Performs a single HTTP call.
	///
	/// Implementations send `request.headers` verbatim, attach `request.access_token` as a bearer
	/// `Authorization` header, and return the body of any 2xx answer. Every other outcome is a
	/// [`TransportError`]; HTTP failures fill `status` and `nested_data`.
	fn send<'a>(&'a self, request: &'a RequestDescriptor) -> TransportFuture<'a>;
}

/// HTTP methods used by the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
}
impl Method {
	/// Returns the method token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"GET" => Ok(Method::Get),
			"POST" => Ok(Method::Post),
			"PUT" => Ok(Method::Put),
			other => Err(Error::incorrect_usage(format!("Unsupported HTTP method `{other}`."))),
		}
	}
}

/// One logical request against the remote service.
///
/// The executor owns the descriptor for the duration of a call: it re-sends the same value on
/// every attempt and is the only writer of `remaining_retries`.
#[derive(Clone)]
pub struct RequestDescriptor {
	/// Operation the request belongs to (labels spans and metrics).
	pub operation: OperationKind,
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers.
	pub headers: BTreeMap<String, String>,
	/// Serialized JSON body.
	pub body: Option<String>,
	/// User access token sent as a bearer credential.
	pub access_token: Option<Secret>,
	/// Retries left for this call.
	pub remaining_retries: u32,
}
impl RequestDescriptor {
	/// Creates a descriptor with JSON `accept` semantics and no retry budget.
	pub fn new(operation: OperationKind, method: Method, url: Url) -> Self {
		let mut headers = BTreeMap::new();

		headers.insert("accept".into(), "application/json".into());

		Self {
			operation,
			method,
			url,
			headers,
			body: None,
			access_token: None,
			remaining_retries: 0,
		}
	}

	/// Serializes `body` as the JSON payload and sets `content-type: application/json`.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self>
	where
		B: ?Sized + Serialize,
	{
		let payload = serde_json::to_string(body).map_err(|e| {
			Error::incorrect_usage("Request body could not be serialized.").with_source(e)
		})?;

		self.headers.insert("content-type".into(), "application/json".into());
		self.body = Some(payload);

		Ok(self)
	}

	/// Adds or replaces a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into().to_ascii_lowercase(), value.into());

		self
	}

	/// Attaches a bearer access token.
	pub fn with_access_token(mut self, token: impl Into<Secret>) -> Self {
		self.access_token = Some(token.into());

		self
	}

	/// Overrides the retry budget.
	pub fn with_retries(mut self, retries: u32) -> Self {
		self.remaining_retries = retries;

		self
	}

	/// Request URL without its query string, safe to surface in logs and error hints.
	pub fn endpoint(&self) -> String {
		let mut url = self.url.clone();

		url.set_query(None);
		url.set_fragment(None);

		url.to_string()
	}
}
impl Debug for RequestDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestDescriptor")
			.field("operation", &self.operation)
			.field("method", &self.method)
			.field("endpoint", &self.endpoint())
			.field("headers", &self.headers)
			.field("body_len", &self.body.as_ref().map(String::len))
			.field("access_token_set", &self.access_token.is_some())
			.field("remaining_retries", &self.remaining_retries)
			.finish()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a per-request timeout.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send<'a>(&'a self, request: &'a RequestDescriptor) -> TransportFuture<'a> {
		Box::pin(async move {
			let method = match request.method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
			};
			let mut builder = self.0.request(method, request.url.clone());

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if let Some(token) = &request.access_token {
				builder = builder.bearer_auth(token.expose());
			}
			if let Some(body) = &request.body {
				builder = builder.body(body.clone());
			}

			let response = self.0.execute(builder.build()?).await?;
			let status = response.status();
			let body = String::from_utf8_lossy(&response.bytes().await?).into_owned();

			if status.is_success() {
				Ok(body)
			} else {
				Err(TransportError::new(format!(
					"Remote service responded with HTTP {}.",
					status.as_u16()
				))
				.with_status(status.as_u16())
				.with_nested_data(body))
			}
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn descriptor() -> RequestDescriptor {
		RequestDescriptor::new(
			OperationKind::IdentityProfile,
			Method::Get,
			Url::parse("https://auth.example.com/oauth2/userinfo/42?client_secret=shh")
				.expect("Descriptor URL fixture should parse."),
		)
	}

	#[test]
	fn json_bodies_set_content_type() {
		let request = descriptor()
			.with_json(&serde_json::json!({ "name": "site" }))
			.expect("JSON body should serialize.");

		assert_eq!(request.headers.get("content-type").map(String::as_str), Some("application/json"));
		assert_eq!(request.body.as_deref(), Some("{\"name\":\"site\"}"));
	}

	#[test]
	fn endpoint_and_debug_hide_secrets() {
		let request = descriptor().with_access_token("bearer-secret");
		let rendered = format!("{request:?}");

		assert_eq!(request.endpoint(), "https://auth.example.com/oauth2/userinfo/42");
		assert!(!rendered.contains("shh"));
		assert!(!rendered.contains("bearer-secret"));
	}

	#[test]
	fn methods_parse_from_tokens() {
		assert_eq!("PUT".parse::<Method>().expect("PUT should parse."), Method::Put);
		assert_eq!(
			"DELETE".parse::<Method>().expect_err("DELETE is not supported.").kind(),
			ErrorKind::IncorrectUsage
		);
	}
}
