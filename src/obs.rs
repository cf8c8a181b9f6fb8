//! Optional observability helpers for authentication attempts.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_cognito.attempt` with a `stage`
//!   field, plus `debug` events for every [`AttemptState`] transition.
//! - Enable `metrics` to increment the `oauth2_cognito_attempt_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod attempt;
mod metrics;
mod tracing;

pub use attempt::*;
pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Stages of an authentication attempt observed by the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// Building the authorization redirect.
	Authorize,
	/// Authorization-code exchange at the token endpoint.
	ExchangeToken,
	/// `GetUser` call and profile normalization.
	ResolveProfile,
	/// Application verify callback.
	Verify,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Authorize => "authorize",
			Stage::ExchangeToken => "exchange_token",
			Stage::ResolveProfile => "resolve_profile",
			Stage::Verify => "verify",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`StageSpan`], recording attempt and outcome metrics around it.
pub(crate) async fn observe<T, Fut>(stage: Stage, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = StageSpan::new(stage);

	record_stage_outcome(stage, StageOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_stage_outcome(stage, StageOutcome::Success),
		Err(_) => record_stage_outcome(stage, StageOutcome::Failure),
	}

	result
}
