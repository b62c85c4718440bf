//! Password changes on behalf of a user.

// self
use crate::{
	_prelude::*,
	auth::Secret,
	http::{HttpTransport, Method},
	obs::OperationKind,
	strategy::{self, Strategy},
};

/// Password change request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
	/// Access token of the user whose password changes.
	pub access_token: Secret,
	/// Current password.
	#[serde(rename = "oldPassword")]
	pub old_password: Secret,
	/// Replacement password.
	#[serde(rename = "newPassword")]
	pub new_password: Secret,
}
impl PasswordChange {
	/// Creates a password change request.
	pub fn new(
		access_token: impl Into<Secret>,
		old_password: impl Into<Secret>,
		new_password: impl Into<Secret>,
	) -> Self {
		Self {
			access_token: access_token.into(),
			old_password: old_password.into(),
			new_password: new_password.into(),
		}
	}

	fn validate(&self) -> Result<()> {
		if self.access_token.is_blank() {
			return Err(Error::no_permission("Please provide an access token.")
				.with_help("Password changes require the user's access token."));
		}
		if self.old_password.is_blank() || self.new_password.is_blank() {
			return Err(Error::incorrect_usage("Please provide the old and the new password."));
		}

		Ok(())
	}
}

impl<T> Strategy<T>
where
	T: ?Sized + HttpTransport,
{
	/// Changes a user's password with `PUT /oauth2/password`.
	///
	/// A blank token fails with [`ErrorKind::NoPermission`] and a blank password with
	/// [`ErrorKind::IncorrectUsage`], both before any request is made.
	pub async fn change_password(&self, change: &PasswordChange) -> Result<Value> {
		const KIND: OperationKind = OperationKind::ChangePassword;

		strategy::observe(KIND, "change_password", async move {
			change.validate()?;

			let request = self
				.executor()
				.request(KIND, Method::Put, self.options.endpoints.password.clone())
				.with_json(change)?;

			self.executor().execute(request).await
		})
		.await
	}
}
