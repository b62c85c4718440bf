//! Shared fixtures for the integration tests.

#![allow(dead_code)]

// std
use std::collections::VecDeque;
// crates.io
use parking_lot::Mutex;
// self
#[cfg(feature = "reqwest")]
use oauth2_strategy::{http::ReqwestTransport, reqwest::Client as ReqwestClient};
use oauth2_strategy::{
	auth::ClientCredentials,
	config::StrategyOptionsBuilder,
	error::{TransportError, TransportErrorCode},
	http::{HttpTransport, RequestDescriptor, TransportFuture},
	strategy::Strategy,
	url::Url,
};

pub const CLIENT_ID: &str = "client-it";
pub const CLIENT_SECRET: &str = "secret-it";
pub const CALLBACK_URL: &str = "https://blog.example.com/ghost/oauth/callback";
pub const SITE_URI: &str = "https://blog.example.com";

/// One scripted transport outcome.
#[derive(Clone, Debug)]
pub enum Reply {
	Body(String),
	Refused,
	HostNotFound,
	TimedOut,
	Http(u16, String),
}
impl Reply {
	pub fn json(body: serde_json::Value) -> Self {
		Reply::Body(body.to_string())
	}

	fn into_result(self) -> Result<String, TransportError> {
		match self {
			Reply::Body(body) => Ok(body),
			Reply::Refused => Err(TransportError::new("connect ECONNREFUSED 127.0.0.1:2368")
				.with_code(TransportErrorCode::ConnectionRefused)),
			Reply::HostNotFound => Err(TransportError::new("getaddrinfo ENOTFOUND auth.invalid")
				.with_code(TransportErrorCode::HostNotFound)),
			Reply::TimedOut => Err(TransportError::new("request timed out")
				.with_code(TransportErrorCode::TimedOut)),
			Reply::Http(status, body) =>
				Err(TransportError::new(format!("Remote service responded with HTTP {status}."))
					.with_status(status)
					.with_nested_data(body)),
		}
	}
}

/// In-memory transport that answers from a script and records every request it sees.
///
/// Once the script runs out, every further call gets `fallback`.
pub struct ScriptedTransport {
	script: Mutex<VecDeque<Reply>>,
	fallback: Reply,
	requests: Mutex<Vec<RequestDescriptor>>,
}
impl ScriptedTransport {
	pub fn new(script: impl IntoIterator<Item = Reply>, fallback: Reply) -> Self {
		Self {
			script: Mutex::new(script.into_iter().collect()),
			fallback,
			requests: Mutex::new(Vec::new()),
		}
	}

	pub fn always(reply: Reply) -> Self {
		Self::new([], reply)
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}

	pub fn requests(&self) -> Vec<RequestDescriptor> {
		self.requests.lock().clone()
	}

	pub fn last_json_body(&self) -> serde_json::Value {
		let body = self
			.requests
			.lock()
			.last()
			.and_then(|request| request.body.clone())
			.expect("A request with a body should have been sent.");

		serde_json::from_str(&body).expect("Request body should be JSON.")
	}
}
impl HttpTransport for ScriptedTransport {
	fn send<'a>(&'a self, request: &'a RequestDescriptor) -> TransportFuture<'a> {
		self.requests.lock().push(request.clone());

		let reply = self.script.lock().pop_front().unwrap_or_else(|| self.fallback.clone());

		Box::pin(async move { reply.into_result() })
	}
}

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Test URL fixture should parse.")
}

/// Options with a 1 ms retry pause so retry tests stay fast.
pub fn options(base: &str) -> StrategyOptionsBuilder {
	StrategyOptionsBuilder::default()
		.url(url(base))
		.callback_url(url(CALLBACK_URL))
		.site_uri(url(SITE_URI))
		.retry_timeout(std::time::Duration::from_millis(1))
}

pub fn credentials() -> ClientCredentials {
	ClientCredentials::new(CLIENT_ID, CLIENT_SECRET)
}

pub fn scripted_strategy(
	builder: StrategyOptionsBuilder,
	transport: ScriptedTransport,
) -> (Strategy<ScriptedTransport>, std::sync::Arc<ScriptedTransport>) {
	let transport = std::sync::Arc::new(transport);
	let options = builder.build().expect("Strategy options should build.");
	let strategy = Strategy::with_transport(options, std::sync::Arc::clone(&transport))
		.expect("Strategy should build over the scripted transport.");

	(strategy, transport)
}

/// Reqwest transport that accepts the self-signed certificates `httpmock` serves.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_transport() -> ReqwestTransport {
	let client = ReqwestClient::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestTransport::with_client(client)
}
