//! Time source and timer used by polling flows.
//!
//! Flows never read the system clock or sleep directly; they go through [`Clock`]
//! so tests can drive the device code poller without real delays.

// self
use crate::_prelude::*;

/// Boxed sleep future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Wall clock plus a non-blocking timer.
pub trait Clock
where
	Self: 'static + Send + Sync,
{
	/// Current UTC instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends the calling task for `duration`; negative durations resolve at once.
	fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Clock backed by the system time and tokio's timer.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;
#[cfg(feature = "tokio")]
impl Clock for TokioClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		let duration = if duration.is_positive() { duration.unsigned_abs() } else { Default::default() };

		Box::pin(tokio::time::sleep(duration))
	}
}
