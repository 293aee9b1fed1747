//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `oauth2_public_client.flow` with the `flow` (grant)
//!   and `stage` (call site) fields, plus a debug event for every device code poll
//!   and an info event carrying the terminal `state` of each device code attempt.
//! - Enable `metrics` to increment `oauth2_public_client_flow_total` for every
//!   attempt/success/failure (labeled by `flow` + `outcome`) and
//!   `oauth2_public_client_device_code_poll_total` for every poll (labeled by `outcome`),
//!   and `oauth2_public_client_device_code_terminal_total` once per device code attempt
//!   (labeled by terminal `state`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Device code flow.
	DeviceCode,
	/// Resource-owner username/password flow.
	UsernamePassword,
	/// Authorization Code + PKCE flow.
	AuthorizationCode,
	/// Refresh token flow.
	Refresh,
	/// On-behalf-of flow.
	OnBehalfOf,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::DeviceCode => "device_code",
			FlowKind::UsernamePassword => "username_password",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::OnBehalfOf => "on_behalf_of",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Result of a single device code poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollOutcome {
	/// `authorization_pending`.
	Pending,
	/// `slow_down`.
	SlowDown,
	/// Retryable failure (network, 5xx, 429).
	Transient,
	/// Token issued.
	Token,
	/// Poll ended the flow with an error.
	Terminal,
}
impl PollOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			PollOutcome::Pending => "pending",
			PollOutcome::SlowDown => "slow_down",
			PollOutcome::Transient => "transient",
			PollOutcome::Token => "token",
			PollOutcome::Terminal => "terminal",
		}
	}
}
impl Display for PollOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
