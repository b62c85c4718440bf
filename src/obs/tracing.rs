// self
use crate::{
	_prelude::*,
	error::TransportError,
	obs::{OperationKind, OperationOutcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by strategy operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("oauth2_strategy.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a transient failure that is about to be retried.
pub(crate) fn log_retry(
	kind: OperationKind,
	failure: &TransportError,
	remaining: u32,
	delay: StdDuration,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			operation = kind.as_str(),
			outcome = OperationOutcome::Retry.as_str(),
			code = failure.code.as_ref().map(|code| code.as_str()),
			remaining,
			delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
			"Remote service unreachable; retrying."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, failure, remaining, delay);
	}
}

/// Logs the terminal failure of an operation.
pub(crate) fn log_failure(kind: OperationKind, err: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			operation = kind.as_str(),
			outcome = OperationOutcome::Failure.as_str(),
			kind = err.kind().as_str(),
			help = err.help(),
			"{err}"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, err);
	}
}
