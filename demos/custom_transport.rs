//! Demonstrates plugging a custom [`HttpTransport`] into the strategy.
//!
//! 1. Implement [`HttpTransport`] so every call answers with either a raw 2xx body or a
//!    [`TransportError`].
//! 2. Tag connection failures with a [`TransportErrorCode`] so the executor knows which ones to
//!    retry.
//! 3. Hand the transport to [`Strategy::with_transport`].

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth2_strategy::{
	config::StrategyOptions,
	error::{TransportError, TransportErrorCode},
	http::{HttpTransport, RequestDescriptor, TransportFuture},
	strategy::Strategy,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let options = StrategyOptions::builder()
		.url(Url::parse("https://auth.example.com")?)
		.callback_url(Url::parse("https://blog.example.com/ghost/oauth/callback")?)
		.site_uri(Url::parse("https://blog.example.com")?)
		.retries(5)
		.retry_timeout(std::time::Duration::from_millis(10))
		.retry_hook(|err| eprintln!("{err} {}", err.context().unwrap_or_default()))
		.build()?;
	let strategy = <Strategy<WarmingUpTransport>>::with_transport(
		options,
		WarmingUpTransport { cold_calls: 2, calls: AtomicUsize::new(0) },
	)?;
	let profile = strategy.user_profile("demo-access").await?;

	println!(
		"Profile {} loaded after {} calls.",
		profile.id().unwrap_or_default(),
		strategy.executor().transport().calls.load(Ordering::SeqCst)
	);

	Ok(())
}

/// Refuses connections until it has been called `cold_calls` times.
struct WarmingUpTransport {
	cold_calls: usize,
	calls: AtomicUsize,
}
impl HttpTransport for WarmingUpTransport {
	fn send<'a>(&'a self, request: &'a RequestDescriptor) -> TransportFuture<'a> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if call < self.cold_calls {
				return Err(TransportError::new(format!("connect ECONNREFUSED {}", request.url))
					.with_code(TransportErrorCode::ConnectionRefused));
			}

			Ok(format!("{{\"id\":\"user-{call}\",\"endpoint\":\"{}\"}}", request.endpoint()))
		})
	}
}
