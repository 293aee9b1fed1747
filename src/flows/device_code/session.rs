// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{_prelude::*, auth::CorrelationId, transport::DeviceAuthorization};

/// Pacing and retry budget for the device code poller.
///
/// Durations (de)serialize as whole seconds; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceCodePolicy {
	/// Interval used when the server does not send one.
	#[serde(with = "seconds")]
	pub default_interval: Duration,
	/// Floor applied to every interval, server-supplied or not.
	#[serde(with = "seconds")]
	pub min_interval: Duration,
	/// Ceiling applied to every interval, including ones grown by `slow_down`.
	#[serde(with = "seconds")]
	pub max_interval: Duration,
	/// Amount added to the interval on each `slow_down` answer (RFC 8628 §3.5).
	#[serde(with = "seconds")]
	pub slow_down_increment: Duration,
	/// Consecutive transient failures tolerated before the flow fails.
	pub max_consecutive_failures: u32,
}
impl DeviceCodePolicy {
	/// Bounds `interval` by the policy floor and ceiling; the floor wins when they cross.
	pub fn bound_interval(&self, interval: Duration) -> Duration {
		interval.min(self.max_interval).max(self.min_interval)
	}
}
impl Default for DeviceCodePolicy {
	fn default() -> Self {
		Self {
			default_interval: Duration::seconds(5),
			min_interval: Duration::seconds(1),
			max_interval: Duration::minutes(5),
			slow_down_increment: Duration::seconds(5),
			max_consecutive_failures: 3,
		}
	}
}

/// Cooperative cancellation flag shared between a caller and a poller.
///
/// The poller observes it only between polls; an in-flight request always completes.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal(Arc<AtomicBool>);
impl CancelSignal {
	/// Creates a signal that is not raised.
	pub fn new() -> Self {
		Self::default()
	}

	/// Raises the signal.
	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	/// Whether the signal has been raised.
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// What the user needs to complete verification on a second device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceCodeNotice {
	/// Code the user types at the verification page.
	pub user_code: String,
	/// Verification page.
	pub verification_uri: String,
	/// Verification page with the user code embedded, when the server supplies one.
	pub verification_uri_complete: Option<String>,
	/// Instant after which the code is no longer accepted.
	pub expires_at: OffsetDateTime,
	/// Instructions to display; the server's text when supplied.
	pub message: String,
}

/// State of one device code attempt, owned by a single poller.
pub struct DeviceCodeSession {
	device_code: String,
	user_code: String,
	verification_uri: String,
	verification_uri_complete: Option<String>,
	message: String,
	expires_at: OffsetDateTime,
	interval: Duration,
	correlation_id: CorrelationId,
}
impl DeviceCodeSession {
	/// Builds the session from a device authorization response received at `now`.
	pub fn from_authorization(
		authorization: DeviceAuthorization,
		correlation_id: CorrelationId,
		now: OffsetDateTime,
		policy: &DeviceCodePolicy,
	) -> Self {
		let DeviceAuthorization {
			device_code,
			user_code,
			verification_uri,
			verification_uri_complete,
			expires_in,
			interval,
			message,
		} = authorization;
		let interval =
			policy.bound_interval(interval.map(Duration::seconds).unwrap_or(policy.default_interval));
		let message = message.unwrap_or_else(|| {
			format!(
				"To sign in, use a web browser to open the page {verification_uri} and enter the code {user_code} to authenticate."
			)
		});

		Self {
			device_code,
			user_code,
			verification_uri,
			verification_uri_complete,
			message,
			expires_at: now.saturating_add(Duration::seconds(expires_in.max(0))),
			interval,
			correlation_id,
		}
	}

	/// Code redeemed on every poll.
	pub fn device_code(&self) -> &str {
		&self.device_code
	}

	/// Instant after which polling stops.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Current polling interval.
	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Correlation id shared by initiation and every poll.
	pub fn correlation_id(&self) -> &CorrelationId {
		&self.correlation_id
	}

	/// Whether the code has expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}

	/// Time left before expiry at `now`, never negative.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		(self.expires_at - now).max(Duration::ZERO)
	}

	/// Notice handed to the user notification callback.
	pub fn notice(&self) -> DeviceCodeNotice {
		DeviceCodeNotice {
			user_code: self.user_code.clone(),
			verification_uri: self.verification_uri.clone(),
			verification_uri_complete: self.verification_uri_complete.clone(),
			expires_at: self.expires_at,
			message: self.message.clone(),
		}
	}

	pub(super) fn slow_down(&mut self, policy: &DeviceCodePolicy) {
		let grown = self.interval.saturating_add(policy.slow_down_increment);

		self.interval = policy.bound_interval(grown);
	}
}
impl Debug for DeviceCodeSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DeviceCodeSession")
			.field("user_code", &self.user_code)
			.field("verification_uri", &self.verification_uri)
			.field("expires_at", &self.expires_at)
			.field("interval", &self.interval)
			.field("correlation_id", &self.correlation_id)
			.finish_non_exhaustive()
	}
}

mod seconds {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
