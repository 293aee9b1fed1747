mod common;

// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
use time::Duration;
// self
use common::*;
use oauth2_public_client::{
	auth::ScopeSet,
	error::{ConfigError, Error, TransientError},
	flows::{CancelSignal, DeviceCodeNotice, DeviceCodePolicy, DeviceCodeState},
	provider::GrantType,
};

fn seconds(values: &[i64]) -> Vec<Duration> {
	values.iter().copied().map(Duration::seconds).collect()
}

fn scopes() -> ScopeSet {
	ScopeSet::new(["User.Read"])
}

#[tokio::test]
async fn pending_polls_until_token_is_issued() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([pending(), pending(), pending(), Ok(token("at-1"))]);

	let notices = Arc::new(Mutex::new(Vec::<(DeviceCodeNotice, usize)>::new()));
	let observed = notices.clone();
	let probe = transport.clone();
	let token = client
		.acquire_token_by_device_code(
			scopes(),
			move |notice| observed.lock().push((notice.clone(), probe.token_requests().len())),
			CancelSignal::new(),
		)
		.await
		.expect("Device code flow should succeed after pending answers.");

	assert_eq!(token.access_token.expose(), "at-1");

	let notices = notices.lock();

	assert_eq!(notices.len(), 1, "The user must be notified exactly once.");
	assert_eq!(notices[0].1, 0, "The user must be notified before the first poll.");
	assert_eq!(notices[0].0.user_code, "ABCD-EFGH");
	assert_eq!(notices[0].0.verification_uri, "https://microsoft.com/devicelogin");

	let requests = transport.requests();
	let initiation = &requests[0];

	assert_eq!(initiation.kind, RequestKind::DeviceCode);
	assert_eq!(
		initiation.endpoint.as_str(),
		"https://login.example.com/organizations/oauth2/v2.0/devicecode"
	);
	assert_eq!(initiation.param("client_id"), Some(CLIENT_ID));
	assert_eq!(initiation.param("scope"), Some("offline_access openid profile User.Read"));

	let polls = transport.token_requests();

	assert_eq!(polls.len(), 4);

	for poll in &polls {
		assert_eq!(
			poll.endpoint.as_str(),
			"https://login.example.com/organizations/oauth2/v2.0/token"
		);
		assert_eq!(
			poll.keys(),
			["scope", "grant_type", "device_code", "client_info", "client_id"]
		);
		assert_eq!(poll.param("grant_type"), Some("device_code"));
		assert_eq!(poll.param("device_code"), Some("device-code-1"));
		assert_eq!(poll.param("client_info"), Some("1"));
		assert_eq!(poll.correlation_id(), initiation.correlation_id());
	}

	assert_eq!(initiation.correlation_id(), Some("corr-0"));
	assert_eq!(clock.sleeps(), seconds(&[5, 5, 5]));
	assert_eq!(client.poll_metrics.polls(), 4);
	assert_eq!(client.poll_metrics.pending(), 3);
	assert_eq!(client.poll_metrics.slow_downs(), 0);
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Succeeded), 1);
}

#[tokio::test]
async fn already_expired_code_never_polls() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let notified = Arc::new(Mutex::new(0_usize));
	let counter = notified.clone();

	transport.push_device(Ok(device_authorization(0, Some(5))));

	let err = client
		.acquire_token_by_device_code(scopes(), move |_| *counter.lock() += 1, CancelSignal::new())
		.await
		.expect_err("A zero-lifetime device code must expire immediately.");

	assert!(matches!(err, Error::DeviceCodeExpired));
	assert_eq!(*notified.lock(), 1);
	assert!(transport.token_requests().is_empty());
	assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn polling_stops_once_the_code_expires() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(12, Some(5))));
	transport.push_tokens([pending(), pending(), pending(), pending()]);

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("Polling must stop at the expiry deadline.");

	assert!(matches!(err, Error::DeviceCodeExpired));
	assert_eq!(transport.token_requests().len(), 3);
	assert_eq!(clock.sleeps(), seconds(&[5, 5, 2]));
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Expired), 1);
}

#[tokio::test]
async fn retry_after_past_the_deadline_is_cut_short() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(30, Some(5))));
	transport.push_tokens([unavailable(Some(120)), pending()]);

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("The code must expire while waiting out the Retry-After hint.");

	assert!(matches!(err, Error::DeviceCodeExpired));
	assert_eq!(transport.token_requests().len(), 1);
	assert_eq!(clock.sleeps(), seconds(&[30]));
}

#[tokio::test]
async fn oversized_server_lifetime_and_interval_are_bounded() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let notice = Arc::new(Mutex::new(None));
	let captured = notice.clone();

	transport.push_device(Ok(device_authorization(i64::MAX, Some(i64::MAX))));
	transport.push_tokens([slow_down(), pending(), Ok(token("at-huge"))]);

	let token = client
		.acquire_token_by_device_code(
			scopes(),
			move |value: &DeviceCodeNotice| *captured.lock() = Some(value.expires_at),
			CancelSignal::new(),
		)
		.await
		.expect("Oversized server values should not end the flow.");
	let max_interval = DeviceCodePolicy::default().max_interval;

	assert_eq!(token.access_token.expose(), "at-huge");
	assert!(notice.lock().is_some());
	assert_eq!(clock.sleeps(), vec![max_interval, max_interval]);
}

#[tokio::test]
async fn cancel_during_sleep_stops_before_the_next_poll() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let cancel = CancelSignal::new();
	let trigger = cancel.clone();

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([pending(), pending()]);
	clock.on_sleep(move |_| trigger.cancel());

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, cancel)
		.await
		.expect_err("A raised cancel signal must stop the flow.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(transport.token_requests().len(), 1);
	assert_eq!(clock.sleeps(), seconds(&[5]));
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Cancelled), 1);
}

#[tokio::test]
async fn cancel_during_an_in_flight_poll_skips_the_sleep() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let cancel = CancelSignal::new();
	let trigger = cancel.clone();

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([pending(), pending()]);
	transport.on_token_request(move |_| trigger.cancel());

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, cancel)
		.await
		.expect_err("A raised cancel signal must stop the flow.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(transport.token_requests().len(), 1);
	assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn token_issued_by_an_in_flight_poll_wins_over_cancel() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let cancel = CancelSignal::new();
	let trigger = cancel.clone();

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_token(Ok(token("at-late")));
	transport.on_token_request(move |_| trigger.cancel());

	let token = client
		.acquire_token_by_device_code(scopes(), |_| {}, cancel)
		.await
		.expect("A token already issued must be returned.");

	assert_eq!(token.access_token.expose(), "at-late");
}

#[tokio::test]
async fn cancel_raised_before_polling_sends_no_token_request() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let cancel = CancelSignal::new();
	let trigger = cancel.clone();

	transport.push_device(Ok(device_authorization(900, Some(5))));

	let err = client
		.acquire_token_by_device_code(scopes(), move |_| trigger.cancel(), cancel)
		.await
		.expect_err("Cancelling from the notification callback must stop the flow.");

	assert!(matches!(err, Error::Cancelled));
	assert!(transport.token_requests().is_empty());
}

#[tokio::test]
async fn slow_down_grows_the_interval_for_the_rest_of_the_flow() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([pending(), slow_down(), pending(), Ok(token("at-2"))]);

	client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect("Device code flow should succeed after slow_down.");

	assert_eq!(clock.sleeps(), seconds(&[5, 10, 10]));
	assert_eq!(client.poll_metrics.slow_downs(), 1);
}

#[tokio::test]
async fn missing_server_interval_uses_the_policy_default_and_floor() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let policy = DeviceCodePolicy {
		default_interval: Duration::seconds(3),
		min_interval: Duration::seconds(2),
		..DeviceCodePolicy::default()
	};
	let client = client(descriptor(), &transport, &clock).with_device_code_policy(policy);

	transport.push_device(Ok(device_authorization(900, None)));
	transport.push_tokens([pending(), Ok(token("at-3"))]);

	client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect("Device code flow should succeed.");

	assert_eq!(clock.sleeps(), seconds(&[3]));
}

#[tokio::test]
async fn consecutive_transient_failures_exhaust_the_retry_budget() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([
		unavailable(Some(7)),
		unavailable(None),
		unavailable(Some(2)),
		unavailable(None),
	]);

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("A fourth consecutive transient failure must end the flow.");

	match err {
		Error::Transient(TransientError::RetriesExhausted { attempts, last }) => {
			assert_eq!(attempts, 4);
			assert!(last.contains("upstream busy"), "Unexpected last error: {last}.");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(transport.token_requests().len(), 4);
	assert_eq!(clock.sleeps(), seconds(&[7, 5, 5]));
	assert_eq!(client.poll_metrics.transient_failures(), 4);
}

#[tokio::test]
async fn a_pending_answer_resets_the_failure_counter() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([
		unavailable(None),
		unavailable(None),
		unavailable(None),
		pending(),
		unavailable(None),
		unavailable(None),
		unavailable(None),
		Ok(token("at-4")),
	]);

	let token = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect("Failures separated by a pending answer should be tolerated.");

	assert_eq!(token.access_token.expose(), "at-4");
	assert_eq!(transport.token_requests().len(), 8);
}

#[tokio::test]
async fn declined_authorization_is_terminal() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_tokens([pending(), Err(oauth_error("authorization_declined", 400))]);

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("A declined request must end the flow.");

	assert!(matches!(err, Error::AuthorizationDeclined { .. }));
	assert_eq!(transport.token_requests().len(), 2);
	assert_eq!(clock.sleeps(), seconds(&[5]));
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Denied), 1);
}

#[tokio::test]
async fn declined_initiation_ends_as_denied() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Err(oauth_error("access_denied", 400)));

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("A declined initiation must fail the flow.");

	assert!(matches!(err, Error::AuthorizationDeclined { .. }));
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Denied), 1);
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Failed), 0);
}

#[tokio::test]
async fn invalid_grant_surfaces_without_retrying() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_token(Err(oauth_error("invalid_grant", 400)));

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("invalid_grant must end the flow.");

	match err {
		Error::InvalidGrant { reason } => assert_eq!(reason, "AADSTS00000: invalid_grant."),
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(transport.token_requests().len(), 1);
	assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn server_reported_expiry_is_terminal() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);

	transport.push_device(Ok(device_authorization(900, Some(5))));
	transport.push_token(Err(oauth_error("expired_token", 400)));

	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("expired_token must end the flow.");

	assert!(matches!(err, Error::DeviceCodeExpired));
}

#[tokio::test]
async fn failed_initiation_never_notifies() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor(), &transport, &clock);
	let notified = Arc::new(Mutex::new(false));
	let flag = notified.clone();

	transport.push_device(Err(oauth_error("invalid_client", 401)));

	let err = client
		.acquire_token_by_device_code(scopes(), move |_| *flag.lock() = true, CancelSignal::new())
		.await
		.expect_err("A rejected initiation must fail the flow.");

	assert!(matches!(err, Error::InvalidClient { .. }));
	assert!(!*notified.lock());
	assert!(transport.token_requests().is_empty());
	assert_eq!(client.poll_metrics.terminal(DeviceCodeState::Failed), 1);
}

#[tokio::test]
async fn unsupported_grant_fails_before_any_request() {
	let transport = ScriptedTransport::new();
	let clock = ManualClock::new();
	let client = client(descriptor_with([GrantType::Password]), &transport, &clock);
	let err = client
		.acquire_token_by_device_code(scopes(), |_| {}, CancelSignal::new())
		.await
		.expect_err("Device code must be rejected when the descriptor disables it.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::UnsupportedGrant { grant: "device_code", .. })
	));
	assert!(transport.requests().is_empty());
}
