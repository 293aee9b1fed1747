#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	future,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
};
// crates.io
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
// self
use oauth2_public_client::{
	auth::{CorrelationId, CorrelationIdSource, Secret},
	clock::{Clock, SleepFuture},
	error::Error,
	flows::PublicClient,
	grant::Parameters,
	provider::{GrantType, ProviderDescriptor},
	transport::{
		DeviceAuthorization, EndpointError, OAuthErrorResponse, RequestHeaders, TokenResponse,
		TokenTransport, TransportFuture,
	},
	url::Url,
};

pub const CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";
pub const AUTHORITY: &str = "https://login.example.com/organizations/";

type Hook = Box<dyn Fn(usize) + Send + Sync>;

/// Which endpoint a recorded request targeted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
	DeviceCode,
	Token,
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub kind: RequestKind,
	pub endpoint: Url,
	pub params: Parameters,
	pub headers: RequestHeaders,
}
impl RecordedRequest {
	pub fn param(&self, key: &str) -> Option<&str> {
		self.params.first(key)
	}

	pub fn keys(&self) -> Vec<String> {
		self.params.keys().map(str::to_owned).collect()
	}

	pub fn correlation_id(&self) -> Option<&str> {
		self.headers.correlation_id.as_ref().map(CorrelationId::as_str)
	}
}

/// Transport answering from pre-scripted queues and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
	device: Mutex<VecDeque<Result<DeviceAuthorization, EndpointError>>>,
	token: Mutex<VecDeque<Result<TokenResponse, EndpointError>>>,
	requests: Mutex<Vec<RecordedRequest>>,
	on_token_request: Mutex<Option<Hook>>,
}
impl ScriptedTransport {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn push_device(&self, reply: Result<DeviceAuthorization, EndpointError>) {
		self.device.lock().push_back(reply);
	}

	pub fn push_token(&self, reply: Result<TokenResponse, EndpointError>) {
		self.token.lock().push_back(reply);
	}

	pub fn push_tokens<I>(&self, replies: I)
	where
		I: IntoIterator<Item = Result<TokenResponse, EndpointError>>,
	{
		self.token.lock().extend(replies);
	}

	/// Runs `hook` with the zero-based index of each token request before it is answered.
	pub fn on_token_request(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
		*self.on_token_request.lock() = Some(Box::new(hook));
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn token_requests(&self) -> Vec<RecordedRequest> {
		self.requests().into_iter().filter(|request| request.kind == RequestKind::Token).collect()
	}

	fn record(
		&self,
		kind: RequestKind,
		endpoint: &Url,
		params: &Parameters,
		headers: &RequestHeaders,
	) -> usize {
		let mut requests = self.requests.lock();
		let index = requests.iter().filter(|request| request.kind == kind).count();

		requests.push(RecordedRequest {
			kind,
			endpoint: endpoint.clone(),
			params: params.clone(),
			headers: headers.clone(),
		});

		index
	}
}
impl TokenTransport for ScriptedTransport {
	fn request_token<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, TokenResponse> {
		let index = self.record(RequestKind::Token, endpoint, params, headers);

		if let Some(hook) = self.on_token_request.lock().as_ref() {
			hook(index);
		}

		let reply = self.token.lock().pop_front().unwrap_or_else(|| Err(script_exhausted()));

		Box::pin(future::ready(reply))
	}

	fn request_device_code<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, DeviceAuthorization> {
		self.record(RequestKind::DeviceCode, endpoint, params, headers);

		let reply = self.device.lock().pop_front().unwrap_or_else(|| Err(script_exhausted()));

		Box::pin(future::ready(reply))
	}
}

fn script_exhausted() -> EndpointError {
	EndpointError::Request(Error::Endpoint {
		error: "script_exhausted".into(),
		description: Some("No scripted reply left.".into()),
		status: None,
	})
}

/// Clock whose sleeps complete at once and advance `now` by the requested duration.
pub struct ManualClock {
	now: Mutex<OffsetDateTime>,
	sleeps: Mutex<Vec<Duration>>,
	on_sleep: Mutex<Option<Hook>>,
}
impl ManualClock {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			now: Mutex::new(OffsetDateTime::UNIX_EPOCH + Duration::days(20_000)),
			sleeps: Mutex::new(Vec::new()),
			on_sleep: Mutex::new(None),
		})
	}

	/// Runs `hook` with the zero-based index of each sleep after time has advanced.
	pub fn on_sleep(&self, hook: impl Fn(usize) + Send + Sync + 'static) {
		*self.on_sleep.lock() = Some(Box::new(hook));
	}

	pub fn sleeps(&self) -> Vec<Duration> {
		self.sleeps.lock().clone()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		*self.now.lock() += duration.max(Duration::ZERO);

		let index = {
			let mut sleeps = self.sleeps.lock();

			sleeps.push(duration);

			sleeps.len() - 1
		};

		if let Some(hook) = self.on_sleep.lock().as_ref() {
			hook(index);
		}

		Box::pin(future::ready(()))
	}
}

/// Correlation ids `corr-0`, `corr-1`, ...
#[derive(Default)]
pub struct SequentialIds(AtomicUsize);
impl CorrelationIdSource for SequentialIds {
	fn next_id(&self) -> CorrelationId {
		CorrelationId::new(format!("corr-{}", self.0.fetch_add(1, Ordering::Relaxed)))
	}
}

pub fn descriptor() -> ProviderDescriptor {
	let authority = Url::parse(AUTHORITY).expect("Authority fixture should parse.");

	ProviderDescriptor::builder("test-authority")
		.authority(&authority)
		.expect("Authority fixture should derive endpoints.")
		.support_grants(GrantType::ALL)
		.build()
		.expect("Descriptor fixture should build.")
}

pub fn descriptor_with(grants: impl IntoIterator<Item = GrantType>) -> ProviderDescriptor {
	let authority = Url::parse(AUTHORITY).expect("Authority fixture should parse.");

	ProviderDescriptor::builder("test-authority")
		.authority(&authority)
		.expect("Authority fixture should derive endpoints.")
		.support_grants(grants)
		.build()
		.expect("Descriptor fixture should build.")
}

pub fn client(
	descriptor: ProviderDescriptor,
	transport: &Arc<ScriptedTransport>,
	clock: &Arc<ManualClock>,
) -> PublicClient {
	let transport: Arc<dyn TokenTransport> = transport.clone();
	let clock: Arc<dyn Clock> = clock.clone();

	PublicClient::with_transport(descriptor, CLIENT_ID, transport, clock)
		.with_correlation_ids(Arc::new(SequentialIds::default()))
}

pub fn device_authorization(expires_in: i64, interval: Option<i64>) -> DeviceAuthorization {
	DeviceAuthorization {
		device_code: "device-code-1".into(),
		user_code: "ABCD-EFGH".into(),
		verification_uri: "https://microsoft.com/devicelogin".into(),
		verification_uri_complete: None,
		expires_in,
		interval,
		message: Some("Open https://microsoft.com/devicelogin and enter ABCD-EFGH.".into()),
	}
}

pub fn token(access_token: &str) -> TokenResponse {
	TokenResponse {
		access_token: Secret::new(access_token),
		token_type: "Bearer".into(),
		expires_in: Some(3599),
		refresh_token: Some(Secret::new("refresh-1")),
		id_token: None,
		scope: Some("User.Read".into()),
		client_info: None,
		extra: Default::default(),
	}
}

pub fn oauth_error(code: &str, status: u16) -> EndpointError {
	EndpointError::OAuth {
		response: OAuthErrorResponse {
			error: code.into(),
			error_description: Some(format!("AADSTS00000: {code}.")),
			error_uri: None,
		},
		status: Some(status),
		retry_after: None,
	}
}

pub fn pending() -> Result<TokenResponse, EndpointError> {
	Err(oauth_error("authorization_pending", 400))
}

pub fn slow_down() -> Result<TokenResponse, EndpointError> {
	Err(oauth_error("slow_down", 400))
}

pub fn unavailable(retry_after: Option<i64>) -> Result<TokenResponse, EndpointError> {
	Err(EndpointError::Status {
		status: 503,
		body_preview: "upstream busy".into(),
		retry_after: retry_after.map(Duration::seconds),
	})
}

#[cfg(feature = "reqwest")]
pub fn test_reqwest_http_client() -> oauth2_public_client::http::ReqwestHttpClient {
	let client = oauth2_public_client::reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(oauth2_public_client::reqwest::redirect::Policy::none())
		.build()
		.expect("Test reqwest client should build.");

	oauth2_public_client::http::ReqwestHttpClient::with_client(client)
}
