//! Device code flow (RFC 8628): initiation, user notification, and paced polling.
//!
//! [`PublicClient::acquire_token_by_device_code`] requests a device code, hands the
//! user code to the caller's notification callback exactly once, then polls the token
//! endpoint until a terminal outcome. The first poll happens right after the callback
//! returns; every later poll waits for the session interval, which grows on
//! `slow_down`. Pending, slow-down and bounded transient failures are absorbed; only
//! terminal outcomes surface to the caller.

mod metrics;
mod session;

pub use metrics::PollMetrics;
pub use session::*;

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::{ConfigError, TransientError},
	flows::{PublicClient, common},
	grant::{CLIENT_ID_PARAM, Grant, ParameterMap, SCOPE_PARAM},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, PollOutcome},
	provider::{GrantType, ProviderErrorKind},
	transport::{RequestHeaders, TokenResponse},
};

/// States of one device code attempt.
///
/// Transitions only move forward: `Initiating → AwaitingUserAction → Polling` and
/// then into exactly one terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceCodeState {
	/// Requesting a device code.
	Initiating,
	/// Waiting for the notification callback to return.
	AwaitingUserAction,
	/// Polling the token endpoint.
	Polling,
	/// A token was issued.
	Succeeded,
	/// The device code expired.
	Expired,
	/// The user or the server declined the request.
	Denied,
	/// The caller raised the cancel signal.
	Cancelled,
	/// Any other terminal failure.
	Failed,
}
impl DeviceCodeState {
	/// Whether the state ends the attempt.
	pub const fn is_terminal(self) -> bool {
		!matches!(self, Self::Initiating | Self::AwaitingUserAction | Self::Polling)
	}

	/// Terminal state reached when an endpoint answer of `kind` ends the attempt.
	pub const fn terminal_for(kind: ProviderErrorKind) -> Self {
		match kind {
			ProviderErrorKind::Expired => Self::Expired,
			ProviderErrorKind::Declined => Self::Denied,
			_ => Self::Failed,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Initiating => "initiating",
			Self::AwaitingUserAction => "awaiting_user_action",
			Self::Polling => "polling",
			Self::Succeeded => "succeeded",
			Self::Expired => "expired",
			Self::Denied => "denied",
			Self::Cancelled => "cancelled",
			Self::Failed => "failed",
		}
	}
}
impl Display for DeviceCodeState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

impl PublicClient {
	/// Runs the device code flow for `scopes`.
	///
	/// `notify` receives the user code and verification URI once, before the first
	/// poll. Raising `cancel` stops the flow at the next poll boundary with
	/// [`Error::Cancelled`].
	pub async fn acquire_token_by_device_code<N>(
		&self,
		scopes: ScopeSet,
		notify: N,
		cancel: CancelSignal,
	) -> Result<TokenResponse>
	where
		N: FnOnce(&DeviceCodeNotice) + Send,
	{
		const KIND: FlowKind = FlowKind::DeviceCode;

		let span = FlowSpan::new(KIND, "acquire_token_by_device_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.ensure_supported(GrantType::DeviceCode)?;

				DeviceCodePoller::new(self, scopes, cancel).run(notify).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}

struct DeviceCodePoller<'c> {
	client: &'c PublicClient,
	scopes: ScopeSet,
	cancel: CancelSignal,
	state: DeviceCodeState,
}
impl<'c> DeviceCodePoller<'c> {
	fn new(client: &'c PublicClient, scopes: ScopeSet, cancel: CancelSignal) -> Self {
		Self { client, scopes, cancel, state: DeviceCodeState::Initiating }
	}

	async fn run<N>(mut self, notify: N) -> Result<TokenResponse>
	where
		N: FnOnce(&DeviceCodeNotice) + Send,
	{
		let mut session = match self.initiate().await {
			Ok(session) => session,
			Err((state, err)) => return self.finish(state, Err(err)),
		};

		self.transition(DeviceCodeState::AwaitingUserAction);

		notify(&session.notice());

		self.transition(DeviceCodeState::Polling);

		let (state, result) = self.poll(&mut session).await;

		self.finish(state, result)
	}

	async fn initiate(&self) -> Result<DeviceCodeSession, (DeviceCodeState, Error)> {
		let descriptor = &self.client.descriptor;
		let endpoint = descriptor.endpoints.device_authorization.as_ref().ok_or_else(|| {
			let err = ConfigError::MissingEndpoint {
				descriptor: descriptor.id.clone(),
				endpoint: "device authorization",
			};

			(DeviceCodeState::Failed, Error::from(err))
		})?;
		let params = ParameterMap::new()
			.with(CLIENT_ID_PARAM, self.client.client_id.as_str())
			.with(SCOPE_PARAM, self.scopes.scope_param())
			.freeze();
		let correlation_id = self.client.correlation_ids.next_id();
		let headers = RequestHeaders::correlated(correlation_id.clone());
		let authorization = self
			.client
			.transport
			.request_device_code(endpoint, &params, &headers)
			.await
			.map_err(|err| {
				let failure = common::classify_endpoint_error(
					self.client.strategy.as_ref(),
					GrantType::DeviceCode,
					err,
				);

				(DeviceCodeState::terminal_for(failure.kind), failure.error)
			})?;

		Ok(DeviceCodeSession::from_authorization(
			authorization,
			correlation_id,
			self.client.clock.now(),
			&self.client.device_code_policy,
		))
	}

	async fn poll(
		&self,
		session: &mut DeviceCodeSession,
	) -> (DeviceCodeState, Result<TokenResponse>) {
		let client = self.client;
		let policy = &client.device_code_policy;
		let headers = RequestHeaders::correlated(session.correlation_id().clone());
		let mut attempt = 0_u32;
		let mut consecutive_failures = 0_u32;

		loop {
			if self.cancel.is_cancelled() {
				return (DeviceCodeState::Cancelled, Err(Error::Cancelled));
			}
			if session.is_expired_at(client.clock.now()) {
				return (DeviceCodeState::Expired, Err(Error::DeviceCodeExpired));
			}

			let grant = match Grant::device_code(
				session.device_code(),
				session.correlation_id().clone(),
				self.scopes.clone(),
			) {
				Ok(grant) => grant,
				Err(err) => return (DeviceCodeState::Failed, Err(err.into())),
			};

			attempt += 1;
			client.poll_metrics.record_poll();

			let failure = match client.send_grant(&grant, &headers).await {
				Ok(token) => {
					self.observe_poll(attempt, PollOutcome::Token, session.interval());

					return (DeviceCodeState::Succeeded, Ok(token));
				},
				Err(failure) => failure,
			};
			if !failure.kind.is_retryable() {
				self.observe_poll(attempt, PollOutcome::Terminal, session.interval());

				return (DeviceCodeState::terminal_for(failure.kind), Err(failure.error));
			}

			let delay = match failure.kind {
				ProviderErrorKind::AuthorizationPending => {
					consecutive_failures = 0;
					client.poll_metrics.record_pending();
					self.observe_poll(attempt, PollOutcome::Pending, session.interval());

					session.interval()
				},
				ProviderErrorKind::SlowDown => {
					consecutive_failures = 0;
					session.slow_down(policy);
					client.poll_metrics.record_slow_down();
					self.observe_poll(attempt, PollOutcome::SlowDown, session.interval());

					session.interval()
				},
				_ => {
					consecutive_failures += 1;
					client.poll_metrics.record_transient_failure();

					if consecutive_failures > policy.max_consecutive_failures {
						self.observe_poll(attempt, PollOutcome::Terminal, session.interval());

						let exhausted = TransientError::RetriesExhausted {
							attempts: consecutive_failures,
							last: failure.error.to_string(),
						};

						return (DeviceCodeState::Failed, Err(exhausted.into()));
					}

					let delay = failure
						.retry_after
						.map_or(session.interval(), |hint| hint.max(session.interval()));

					self.observe_poll(attempt, PollOutcome::Transient, delay);

					delay
				},
			};

			if self.cancel.is_cancelled() {
				return (DeviceCodeState::Cancelled, Err(Error::Cancelled));
			}

			client.clock.sleep(delay.min(session.remaining_at(client.clock.now()))).await;
		}
	}

	fn observe_poll(&self, attempt: u32, outcome: PollOutcome, next_interval: Duration) {
		obs::record_poll_outcome(outcome);
		obs::trace_poll(attempt, outcome, next_interval);
	}

	fn transition(&mut self, next: DeviceCodeState) {
		debug_assert!(!self.state.is_terminal(), "Terminal states have no successors.");

		self.state = next;
	}

	fn finish(
		mut self,
		state: DeviceCodeState,
		result: Result<TokenResponse>,
	) -> Result<TokenResponse> {
		debug_assert!(state.is_terminal());

		self.transition(state);
		self.client.poll_metrics.record_terminal(self.state);
		obs::record_device_code_terminal(self.state.as_str());
		obs::trace_device_code_terminal(self.state.as_str());

		result
	}
}
