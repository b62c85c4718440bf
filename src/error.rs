//! Strategy-level error types shared by the executor, the payload deserializer, and every
//! domain operation.

pub mod payload;

// self
use crate::_prelude::*;

/// Strategy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error categories understood by the strategy and by the remote identity service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
	/// The remote service rejected the request, or its answer could not be used.
	BadRequest,
	/// Credential is missing or was rejected.
	NoPermission,
	/// The remote service refused the supplied values.
	Validation,
	/// Caller supplied invalid or missing input; never retried and never sent.
	IncorrectUsage,
	/// The remote service failed internally, or reported an unknown error.
	InternalServerError,
	/// The remote service could not be reached.
	ServiceUnreachable,
	/// A response body could not be interpreted.
	MalformedResponse,
	/// Transport failure outside every other category.
	Generic,
}
impl ErrorKind {
	/// Returns the stable error name used on the wire and in logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::BadRequest => "BadRequestError",
			ErrorKind::NoPermission => "NoPermissionError",
			ErrorKind::Validation => "ValidationError",
			ErrorKind::IncorrectUsage => "IncorrectUsageError",
			ErrorKind::InternalServerError => "InternalServerError",
			ErrorKind::ServiceUnreachable => "ServiceUnreachableError",
			ErrorKind::MalformedResponse => "MalformedResponseError",
			ErrorKind::Generic => "GenericError",
		}
	}

	/// HTTP status code conventionally attached to the kind.
	pub const fn status_code(self) -> u16 {
		match self {
			ErrorKind::BadRequest | ErrorKind::IncorrectUsage => 400,
			ErrorKind::NoPermission => 403,
			ErrorKind::Validation => 422,
			ErrorKind::ServiceUnreachable => 503,
			ErrorKind::InternalServerError | ErrorKind::MalformedResponse | ErrorKind::Generic =>
				500,
		}
	}

	/// Message used when neither the caller nor the remote payload supplied one.
	pub const fn default_message(self) -> &'static str {
		match self {
			ErrorKind::BadRequest => "The request could not be understood.",
			ErrorKind::NoPermission => "You do not have permission to perform this request.",
			ErrorKind::Validation => "The request failed validation.",
			ErrorKind::IncorrectUsage => "Incorrect usage.",
			ErrorKind::InternalServerError => "The server has encountered an error.",
			ErrorKind::ServiceUnreachable => "The remote service is unreachable.",
			ErrorKind::MalformedResponse => "The response could not be interpreted.",
			ErrorKind::Generic => "An unexpected error occurred.",
		}
	}

	/// Resolves an error name sent by the remote service.
	///
	/// Accepts the stable kind names returned by [`ErrorKind::as_str`] as well as the RFC 6749
	/// error codes, case-insensitively. Unknown names return `None`; callers decide the fallback.
	pub fn from_name(name: &str) -> Option<Self> {
		const TABLE: &[(&str, ErrorKind)] = &[
			("BadRequestError", ErrorKind::BadRequest),
			("invalid_request", ErrorKind::BadRequest),
			("invalid_scope", ErrorKind::BadRequest),
			("unsupported_grant_type", ErrorKind::BadRequest),
			("unsupported_response_type", ErrorKind::BadRequest),
			("NoPermissionError", ErrorKind::NoPermission),
			("UnauthorizedError", ErrorKind::NoPermission),
			("invalid_client", ErrorKind::NoPermission),
			("invalid_grant", ErrorKind::NoPermission),
			("invalid_token", ErrorKind::NoPermission),
			("unauthorized_client", ErrorKind::NoPermission),
			("access_denied", ErrorKind::NoPermission),
			("ValidationError", ErrorKind::Validation),
			("IncorrectUsageError", ErrorKind::IncorrectUsage),
			("InternalServerError", ErrorKind::InternalServerError),
			("server_error", ErrorKind::InternalServerError),
			("ServiceUnreachableError", ErrorKind::ServiceUnreachable),
			("temporarily_unavailable", ErrorKind::ServiceUnreachable),
			("MalformedResponseError", ErrorKind::MalformedResponse),
			("GenericError", ErrorKind::Generic),
		];

		let name = name.trim();

		TABLE.iter().find(|(known, _)| known.eq_ignore_ascii_case(name)).map(|(_, kind)| *kind)
	}

	/// Infers a kind from an HTTP status code when a payload carries no error name.
	pub fn from_status(status: u16) -> Option<Self> {
		match status {
			400 => Some(ErrorKind::BadRequest),
			401 | 403 => Some(ErrorKind::NoPermission),
			422 => Some(ErrorKind::Validation),
			502..=504 => Some(ErrorKind::ServiceUnreachable),
			code if code >= 500 => Some(ErrorKind::InternalServerError),
			_ => None,
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Canonical strategy error exposed by public APIs.
///
/// Every failing path (input validation, transport failure, remote error payload, undecodable
/// response) resolves to exactly one value of this type. `help` and `context` carry the
/// remote service's hints or the strategy's own annotations (failing URL, raw body, remaining
/// retries).
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct Error {
	kind: ErrorKind,
	message: String,
	help: Option<String>,
	context: Option<String>,
	#[source]
	source: Option<BoxError>,
}
impl Error {
	/// Creates an error of the given kind.
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self { kind, message: message.into(), help: None, context: None, source: None }
	}

	/// Creates an error of the given kind carrying its default message.
	pub fn from_kind(kind: ErrorKind) -> Self {
		Self::new(kind, kind.default_message())
	}

	/// Caller input is missing or invalid.
	pub fn incorrect_usage(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::IncorrectUsage, message)
	}

	/// Credential is missing or was rejected.
	pub fn no_permission(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NoPermission, message)
	}

	/// Body could not be interpreted; the raw text is kept as context.
	pub fn malformed_response(raw: impl Into<String>) -> Self {
		Self::from_kind(ErrorKind::MalformedResponse).with_context(raw)
	}

	/// Attaches a hint describing how to resolve the failure.
	pub fn with_help(mut self, help: impl Into<String>) -> Self {
		self.help = Some(help.into());

		self
	}

	/// Attaches free-form context (raw payload, remaining retries, ...).
	pub fn with_context(mut self, context: impl Into<String>) -> Self {
		self.context = Some(context.into());

		self
	}

	/// Records the underlying cause.
	pub fn with_source(mut self, source: impl 'static + Send + Sync + StdError) -> Self {
		self.source = Some(Box::new(source));

		self
	}

	/// Error category.
	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	/// Human-readable message.
	pub fn message(&self) -> &str {
		&self.message
	}

	/// Resolution hint, if any.
	pub fn help(&self) -> Option<&str> {
		self.help.as_deref()
	}

	/// Additional context, if any.
	pub fn context(&self) -> Option<&str> {
		self.context.as_deref()
	}

	/// HTTP status code conventionally attached to the error kind.
	pub fn status_code(&self) -> u16 {
		self.kind.status_code()
	}

	/// Returns the transport failure this error wraps, if any.
	pub fn transport(&self) -> Option<&TransportError> {
		self.source.as_deref().and_then(|source| source.downcast_ref::<TransportError>())
	}

	/// Shortcut for the wrapped transport failure's code.
	pub fn transport_code(&self) -> Option<&TransportErrorCode> {
		self.transport().and_then(|err| err.code.as_ref())
	}
}
impl From<ConfigError> for Error {
	fn from(e: ConfigError) -> Self {
		Error::incorrect_usage(e.to_string()).with_source(e)
	}
}

/// Configuration and validation failures raised while building a strategy.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The redirect target registered with the remote service is missing.
	#[error("Please add a callback URL.")]
	MissingCallbackUrl,
	/// The URI identifying the calling site is missing.
	#[error("Please add a site URI.")]
	MissingSiteUri,
	/// A configured URL cannot be parsed.
	#[error("The {field} is not a valid URL.")]
	InvalidUrl {
		/// Which option failed validation.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL uses a scheme other than HTTP(S).
	#[error("The {field} must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which option failed validation.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Machine-readable transport failure codes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
	/// The remote host actively refused the connection.
	ConnectionRefused,
	/// The remote host name could not be resolved.
	HostNotFound,
	/// The request timed out.
	TimedOut,
	/// The connection was reset mid-flight.
	ConnectionReset,
	/// Any other failure while establishing the connection.
	Connect,
	/// Transport-specific code not covered above.
	Other(String),
}
impl TransportErrorCode {
	/// Returns a stable label suitable for logs and error context.
	pub fn as_str(&self) -> &str {
		match self {
			TransportErrorCode::ConnectionRefused => "connection_refused",
			TransportErrorCode::HostNotFound => "host_not_found",
			TransportErrorCode::TimedOut => "timed_out",
			TransportErrorCode::ConnectionReset => "connection_reset",
			TransportErrorCode::Connect => "connect",
			TransportErrorCode::Other(code) => code,
		}
	}

	/// Whether the executor may re-issue a request that failed with this code.
	pub fn is_retryable(&self) -> bool {
		matches!(self, TransportErrorCode::ConnectionRefused | TransportErrorCode::HostNotFound)
	}

	/// Whether the code means the remote service was never reached.
	pub fn is_unreachable(&self) -> bool {
		!matches!(self, TransportErrorCode::Other(_))
	}
}
impl Display for TransportErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failure reported by an [`HttpTransport`](crate::http::HttpTransport).
///
/// Non-2xx answers are transport failures too: they carry the HTTP status and the raw body in
/// `nested_data` so the executor can decode the remote service's own error payload.
#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct TransportError {
	/// Machine-readable failure code, when the transport could classify the failure.
	pub code: Option<TransportErrorCode>,
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// Transport-supplied description.
	pub message: String,
	/// Raw error body returned by the remote service.
	pub nested_data: Option<String>,
	/// Underlying transport failure.
	#[source]
	pub source: Option<BoxError>,
}
impl TransportError {
	/// Creates a transport failure with only a message.
	pub fn new(message: impl Into<String>) -> Self {
		Self { code: None, status: None, message: message.into(), nested_data: None, source: None }
	}

	/// Sets the failure code.
	pub fn with_code(mut self, code: TransportErrorCode) -> Self {
		self.code = Some(code);

		self
	}

	/// Sets the HTTP status code.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Sets the raw remote error body. Blank bodies are ignored.
	pub fn with_nested_data(mut self, data: impl Into<String>) -> Self {
		let data = data.into();

		self.nested_data = if data.trim().is_empty() { None } else { Some(data) };

		self
	}

	/// Records the underlying transport failure.
	pub fn with_source(mut self, source: impl 'static + Send + Sync + StdError) -> Self {
		self.source = Some(Box::new(source));

		self
	}

	/// Whether the executor may retry this failure.
	pub fn is_retryable(&self) -> bool {
		self.code.as_ref().is_some_and(TransportErrorCode::is_retryable)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let code = if e.is_timeout() {
			Some(TransportErrorCode::TimedOut)
		} else if e.is_connect() {
			Some(classify_connect_error(&e))
		} else {
			None
		};
		let mut err = TransportError::new(e.to_string());

		err.code = code;
		err.status = e.status().map(|status| status.as_u16());

		err.with_source(e)
	}
}

#[cfg(feature = "reqwest")]
fn classify_connect_error(err: &ReqwestError) -> TransportErrorCode {
	let mut cause = err.source();

	while let Some(inner) = cause {
		if let Some(io) = inner.downcast_ref::<std::io::Error>() {
			match io.kind() {
				std::io::ErrorKind::ConnectionRefused =>
					return TransportErrorCode::ConnectionRefused,
				std::io::ErrorKind::ConnectionReset => return TransportErrorCode::ConnectionReset,
				_ => (),
			}
		}

		let text = inner.to_string().to_ascii_lowercase();

		if text.contains("dns error")
			|| text.contains("failed to lookup address")
			|| text.contains("name or service not known")
		{
			return TransportErrorCode::HostNotFound;
		}

		cause = inner.source();
	}

	TransportErrorCode::Connect
}
