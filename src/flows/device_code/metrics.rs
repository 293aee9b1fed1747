// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use super::DeviceCodeState;

/// Thread-safe counters for device code polling.
#[derive(Debug, Default)]
pub struct PollMetrics {
	polls: AtomicU64,
	pending: AtomicU64,
	slow_downs: AtomicU64,
	transient_failures: AtomicU64,
	succeeded: AtomicU64,
	expired: AtomicU64,
	denied: AtomicU64,
	cancelled: AtomicU64,
	failed: AtomicU64,
}
impl PollMetrics {
	/// Returns the total number of token requests issued by pollers.
	pub fn polls(&self) -> u64 {
		self.polls.load(Ordering::Relaxed)
	}

	/// Returns the number of `authorization_pending` answers.
	pub fn pending(&self) -> u64 {
		self.pending.load(Ordering::Relaxed)
	}

	/// Returns the number of `slow_down` answers.
	pub fn slow_downs(&self) -> u64 {
		self.slow_downs.load(Ordering::Relaxed)
	}

	/// Returns the number of transient failures absorbed by pollers.
	pub fn transient_failures(&self) -> u64 {
		self.transient_failures.load(Ordering::Relaxed)
	}

	/// Returns how many attempts ended in `state`; zero for non-terminal states.
	pub fn terminal(&self, state: DeviceCodeState) -> u64 {
		self.terminal_counter(state).map_or(0, |counter| counter.load(Ordering::Relaxed))
	}

	pub(crate) fn record_terminal(&self, state: DeviceCodeState) {
		if let Some(counter) = self.terminal_counter(state) {
			counter.fetch_add(1, Ordering::Relaxed);
		}
	}

	fn terminal_counter(&self, state: DeviceCodeState) -> Option<&AtomicU64> {
		match state {
			DeviceCodeState::Succeeded => Some(&self.succeeded),
			DeviceCodeState::Expired => Some(&self.expired),
			DeviceCodeState::Denied => Some(&self.denied),
			DeviceCodeState::Cancelled => Some(&self.cancelled),
			DeviceCodeState::Failed => Some(&self.failed),
			DeviceCodeState::Initiating
			| DeviceCodeState::AwaitingUserAction
			| DeviceCodeState::Polling => None,
		}
	}

	pub(crate) fn record_poll(&self) {
		self.polls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_pending(&self) {
		self.pending.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_slow_down(&self) {
		self.slow_downs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_transient_failure(&self) {
		self.transient_failures.fetch_add(1, Ordering::Relaxed);
	}
}
