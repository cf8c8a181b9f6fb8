// self
use crate::_prelude::*;

/// Lifecycle of one authentication attempt.
///
/// `Start → ExchangingToken → ResolvingProfile → {Succeeded | Failed}`; `Failed` is also
/// reachable from `Start` (rejected callback) and `ExchangingToken`. Both end states are
/// terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptState {
	/// Callback received; nothing has been sent upstream.
	Start,
	/// Authorization code is being exchanged for tokens.
	ExchangingToken,
	/// `GetUser` is in flight.
	ResolvingProfile,
	/// A fully populated profile was produced.
	Succeeded,
	/// The attempt failed.
	Failed,
}
impl AttemptState {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AttemptState::Start => "start",
			AttemptState::ExchangingToken => "exchanging_token",
			AttemptState::ResolvingProfile => "resolving_profile",
			AttemptState::Succeeded => "succeeded",
			AttemptState::Failed => "failed",
		}
	}

	/// Returns true for `Succeeded` and `Failed`.
	pub const fn is_terminal(self) -> bool {
		matches!(self, AttemptState::Succeeded | AttemptState::Failed)
	}

	/// Returns true when `next` is a legal successor of `self`.
	pub const fn can_advance_to(self, next: AttemptState) -> bool {
		matches!(
			(self, next),
			(AttemptState::Start, AttemptState::ExchangingToken | AttemptState::Failed)
				| (
					AttemptState::ExchangingToken,
					AttemptState::ResolvingProfile | AttemptState::Failed
				) | (AttemptState::ResolvingProfile, AttemptState::Succeeded | AttemptState::Failed)
		)
	}
}
impl Display for AttemptState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned for an illegal [`AttemptState`] transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Attempt cannot move from {from} to {to}.")]
pub struct InvalidTransition {
	/// Current state.
	pub from: AttemptState,
	/// Requested state.
	pub to: AttemptState,
}

/// Tracks and logs the state of one attempt.
#[derive(Debug)]
pub struct AttemptTracker {
	state: AttemptState,
}
impl AttemptTracker {
	/// Starts tracking a new attempt in [`AttemptState::Start`].
	pub fn new() -> Self {
		Self { state: AttemptState::Start }
	}

	/// Current state.
	pub fn state(&self) -> AttemptState {
		self.state
	}

	/// Moves to `next`, rejecting transitions the lifecycle does not allow.
	pub fn advance(&mut self, next: AttemptState) -> Result<(), InvalidTransition> {
		if !self.state.can_advance_to(next) {
			return Err(InvalidTransition { from: self.state, to: next });
		}

		#[cfg(feature = "tracing")]
		tracing::debug!(from = self.state.as_str(), to = next.as_str(), "attempt transition");

		self.state = next;

		Ok(())
	}

	/// Marks the attempt failed unless it already reached a terminal state.
	pub fn fail(&mut self) {
		if !self.state.is_terminal() {
			let _ = self.advance(AttemptState::Failed);
		}
	}
}
impl Default for AttemptTracker {
	fn default() -> Self {
		Self::new()
	}
}
