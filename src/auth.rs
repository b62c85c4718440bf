//! Client credentials and redacted secrets used to sign requests.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
