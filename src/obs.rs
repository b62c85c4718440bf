//! Optional observability helpers for strategy operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_strategy.operation` with the
//!   `operation` and `stage` (call site) fields, plus a warning for every retried request.
//! - Enable `metrics` to increment the `oauth2_strategy_operation_total` counter for every
//!   attempt/retry/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations the strategy issues against the remote identity service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Dynamic client registration.
	RegisterClient,
	/// Partial client update.
	UpdateClient,
	/// Redirect URI replacement for a registered client.
	ChangeCallbackUrl,
	/// Profile lookup with a user access token.
	UserProfile,
	/// Profile lookup by identity id, signed with client credentials.
	IdentityProfile,
	/// Password change on behalf of a user.
	ChangePassword,
	/// Authorization-code exchange at the token endpoint.
	ExchangeCode,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::RegisterClient => "register_client",
			OperationKind::UpdateClient => "update_client",
			OperationKind::ChangeCallbackUrl => "change_callback_url",
			OperationKind::UserProfile => "user_profile",
			OperationKind::IdentityProfile => "identity_profile",
			OperationKind::ChangePassword => "change_password",
			OperationKind::ExchangeCode => "exchange_code",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a strategy operation.
	Attempt,
	/// A transient transport failure was retried.
	Retry,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Retry => "retry",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
