//! Internal OAuth client facade for the authorization-code exchange.
//!
//! The `oauth2` crate builds and parses the token request; the HTTP round trip is carried by
//! [`RequestExecutor::send`] so the exchange shares the strategy's retry loop and error
//! normalization.

// crates.io
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, HttpRequest, HttpResponse, RedirectUrl, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
	http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, Secret},
	config::Endpoints,
	error::{ConfigError, TransportError},
	executor::{self, RequestExecutor},
	http::{HttpTransport, Method},
	obs::OperationKind,
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const EMPTY_BODY: &str = "Token endpoint answered with an empty body.";

/// Tokens issued by the token endpoint for an authorization code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Access token used to call the userinfo endpoint on behalf of the user.
	pub access_token: Secret,
	/// Refresh token, when the service issued one.
	pub refresh_token: Option<Secret>,
	/// Token type reported by the service (usually `bearer`).
	pub token_type: String,
	/// Scopes granted, when the service reported them.
	pub scopes: Vec<String>,
	/// Moment the access token stops being valid, when the service reported a lifetime.
	pub expires_at: Option<OffsetDateTime>,
}

/// [`AsyncHttpClient`] adapter that routes `oauth2` requests through a [`RequestExecutor`].
struct ExecutorHttpClient<'e, T>
where
	T: ?Sized + HttpTransport,
{
	executor: &'e RequestExecutor<T>,
}
impl<'c, T> AsyncHttpClient<'c> for ExecutorHttpClient<'_, T>
where
	T: ?Sized + HttpTransport,
{
	type Error = HttpClientError<TransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			let url = Url::parse(&request.uri().to_string())
				.map_err(|e| HttpClientError::Other(format!("Invalid token request URI: {e}.")))?;
			let method = request
				.method()
				.as_str()
				.parse::<Method>()
				.map_err(|e| HttpClientError::Other(e.to_string()))?;
			let mut descriptor = self.executor.request(OperationKind::ExchangeCode, method, url);

			for (name, value) in request.headers() {
				if let Ok(value) = value.to_str() {
					descriptor = descriptor.with_header(name.as_str(), value);
				}
			}

			descriptor.body = Some(String::from_utf8_lossy(request.body()).into_owned());

			let body = self
				.executor
				.send(descriptor)
				.await
				.map_err(|e| HttpClientError::Reqwest(Box::new(e)))?;

			if body.trim().is_empty() {
				return Err(HttpClientError::Other(EMPTY_BODY.into()));
			}

			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() = StatusCode::OK;
			response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

			Ok(response)
		})
	}
}

/// Exchanges an authorization code for tokens, authenticating with `credentials` in the
/// request body.
pub(crate) async fn exchange_code<T>(
	executor: &RequestExecutor<T>,
	endpoints: &Endpoints,
	callback_url: &Url,
	credentials: &ClientCredentials,
	code: &str,
) -> Result<TokenGrant>
where
	T: ?Sized + HttpTransport,
{
	let client = basic_client(endpoints, callback_url, credentials)?;
	let http_client = ExecutorHttpClient { executor };
	let endpoint = endpoints.token.as_str();
	let response = client
		.exchange_code(AuthorizationCode::new(code.to_owned()))
		.request_async(&http_client)
		.await
		.map_err(|e| map_request_error(endpoint, e))?;
	let issued_at = OffsetDateTime::now_utc();
	let expires_at = response
		.expires_in()
		.and_then(|lifetime| Duration::try_from(lifetime).ok())
		.and_then(|lifetime| issued_at.checked_add(lifetime));

	Ok(TokenGrant {
		access_token: Secret::new(response.access_token().secret().to_owned()),
		refresh_token: response.refresh_token().map(|token| Secret::new(token.secret().to_owned())),
		token_type: response.token_type().as_ref().to_owned(),
		scopes: response
			.scopes()
			.map(|scopes| scopes.iter().map(|scope| scope.as_str().to_owned()).collect())
			.unwrap_or_default(),
		expires_at,
	})
}

fn basic_client(
	endpoints: &Endpoints,
	callback_url: &Url,
	credentials: &ClientCredentials,
) -> Result<ConfiguredBasicClient> {
	let auth_url = AuthUrl::new(endpoints.authorize.to_string())
		.map_err(|source| ConfigError::InvalidUrl { field: "authorize endpoint", source })?;
	let token_url = TokenUrl::new(endpoints.token.to_string())
		.map_err(|source| ConfigError::InvalidUrl { field: "token endpoint", source })?;
	let redirect_url = RedirectUrl::new(callback_url.to_string())
		.map_err(|source| ConfigError::InvalidUrl { field: "callback URL", source })?;

	Ok(BasicClient::new(ClientId::new(credentials.client_id.clone()))
		.set_client_secret(ClientSecret::new(credentials.client_secret.expose().to_owned()))
		.set_auth_uri(auth_url)
		.set_token_uri(token_url)
		.set_redirect_uri(redirect_url)
		.set_auth_type(AuthType::RequestBody))
}

fn map_request_error(
	endpoint: &str,
	err: BasicRequestTokenError<HttpClientError<TransportError>>,
) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) => map_oauth_error(endpoint, &response),
		RequestTokenError::Request(HttpClientError::Reqwest(failure)) =>
			map_transport_error(endpoint, *failure),
		RequestTokenError::Request(HttpClientError::Other(message)) if message == EMPTY_BODY =>
			executor::empty_body(endpoint),
		RequestTokenError::Request(other) => Error::new(ErrorKind::Generic, other.to_string())
			.with_help(format!("Request to {endpoint} failed."))
			.with_source(other),
		RequestTokenError::Parse(e, body) =>
			Error::malformed_response(String::from_utf8_lossy(&body).into_owned())
				.with_help(format!("{endpoint} answered with an unreadable token response."))
				.with_source(e),
		RequestTokenError::Other(message) => Error::new(ErrorKind::Generic, message)
			.with_help(format!("Request to {endpoint} failed.")),
	}
}

fn map_transport_error(endpoint: &str, failure: TransportError) -> Error {
	let oauth_error = failure
		.nested_data
		.as_deref()
		.and_then(|data| serde_json::from_str::<BasicErrorResponse>(data).ok());

	match oauth_error {
		Some(response) => map_oauth_error(endpoint, &response).with_source(failure),
		None => executor::interpret_failure(endpoint, failure),
	}
}

fn map_oauth_error(endpoint: &str, response: &BasicErrorResponse) -> Error {
	let code = response.error().as_ref();
	let kind = match ErrorKind::from_name(code) {
		Some(kind @ (ErrorKind::BadRequest | ErrorKind::NoPermission)) => kind,
		_ => ErrorKind::BadRequest,
	};
	let message = match response.error_description() {
		Some(description) => description.clone(),
		None => format!("Token endpoint returned the OAuth error `{code}`."),
	};

	Error::new(kind, message)
		.with_help(format!("Request to {endpoint} failed."))
		.with_context(code.to_owned())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn oauth_codes_map_to_kinds() {
		let endpoint = "https://auth.example.com/oauth2/token";

		for (code, kind) in [
			("invalid_request", ErrorKind::BadRequest),
			("invalid_client", ErrorKind::NoPermission),
			("invalid_grant", ErrorKind::NoPermission),
			("unauthorized_client", ErrorKind::NoPermission),
			("server_error", ErrorKind::BadRequest),
			("slow_down", ErrorKind::BadRequest),
		] {
			let response = serde_json::from_str::<BasicErrorResponse>(&format!(
				"{{\"error\":\"{code}\",\"error_description\":\"Described.\"}}"
			))
			.expect("OAuth error fixture should parse.");
			let err = map_oauth_error(endpoint, &response);

			assert_eq!(err.kind(), kind, "{code} should map to {kind}.");
			assert_eq!(err.message(), "Described.");
			assert_eq!(err.context(), Some(code));
		}
	}

	#[test]
	fn non_oauth_bodies_use_the_payload_deserializer() {
		let failure = TransportError::new("Remote service responded with HTTP 422.")
			.with_status(422)
			.with_nested_data(r#"{"errors":[{"errorType":"ValidationError","message":"Bad code."}]}"#);
		let err = map_transport_error("https://auth.example.com/oauth2/token", failure);

		assert_eq!(err.kind(), ErrorKind::Validation);
		assert_eq!(err.message(), "Bad code.");
	}

	#[test]
	fn basic_client_accepts_configured_endpoints() {
		let base = Url::parse("https://auth.example.com").expect("Base URL fixture should parse.");
		let endpoints = Endpoints::from_base(&base).expect("Endpoints should derive from base.");
		let callback =
			Url::parse("https://blog.example.com/callback").expect("Callback fixture should parse.");

		assert!(
			basic_client(&endpoints, &callback, &ClientCredentials::new("client", "secret")).is_ok()
		);
	}
}
