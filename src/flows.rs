//! Flow orchestrators exposed through [`PublicClient`].
//!
//! Every flow builds a fresh [`Grant`](crate::grant::Grant), serializes it with the
//! client id as an extra parameter, lets the provider strategy decorate the map and
//! hands the frozen parameters to the transport. The device code flow additionally
//! drives the polling state machine in [`device_code`].

pub mod auth_code_pkce;
pub mod common;
pub mod device_code;
pub mod on_behalf_of;
pub mod refresh;
pub mod username_password;

pub use auth_code_pkce::*;
pub use device_code::*;

// self
use crate::{
	_prelude::*,
	auth::{CorrelationIdSource, RandomCorrelationIds},
	clock::Clock,
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	transport::TokenTransport,
};

/// Public (secretless) OAuth client bound to a single provider descriptor.
///
/// The client owns the transport, clock, strategy and correlation id source so
/// individual flows only deal with grant-specific logic. Cloning is cheap; clones
/// share the transport and the poll counters.
#[derive(Clone)]
pub struct PublicClient {
	/// Transport used for every outbound endpoint request.
	pub transport: Arc<dyn TokenTransport>,
	/// Time source and timer used by the device code poller.
	pub clock: Arc<dyn Clock>,
	/// Strategy responsible for parameter decoration and error classification.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Provider descriptor that defines endpoints and enabled grants.
	pub descriptor: ProviderDescriptor,
	/// OAuth 2.0 client identifier sent with every request.
	pub client_id: String,
	/// Pacing and retry budget for the device code poller.
	pub device_code_policy: DeviceCodePolicy,
	/// Source of per-flow correlation ids.
	pub correlation_ids: Arc<dyn CorrelationIdSource>,
	/// Shared counters for device code polls.
	pub poll_metrics: Arc<PollMetrics>,
}
impl PublicClient {
	/// Creates a client over caller-provided transport and clock implementations.
	pub fn with_transport(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		transport: Arc<dyn TokenTransport>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			transport,
			clock,
			strategy: Arc::new(DefaultProviderStrategy),
			descriptor,
			client_id: client_id.into(),
			device_code_policy: DeviceCodePolicy::default(),
			correlation_ids: Arc::new(RandomCorrelationIds),
			poll_metrics: Default::default(),
		}
	}

	/// Replaces the provider strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Replaces the clock used for expiry checks and poll pacing.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the device code pacing policy.
	pub fn with_device_code_policy(mut self, policy: DeviceCodePolicy) -> Self {
		self.device_code_policy = policy;

		self
	}

	/// Replaces the correlation id source.
	pub fn with_correlation_ids(mut self, source: Arc<dyn CorrelationIdSource>) -> Self {
		self.correlation_ids = source;

		self
	}
}
#[cfg(all(feature = "reqwest", feature = "tokio"))]
impl PublicClient {
	/// Creates a client over the default reqwest transport and tokio clock.
	///
	/// The reqwest client is built without redirect following, so construction can
	/// fail when the TLS backend cannot initialize.
	pub fn new(descriptor: ProviderDescriptor, client_id: impl Into<String>) -> Result<Self> {
		let transport = crate::transport::ReqwestTokenTransport::new(
			crate::http::ReqwestHttpClient::without_redirects()?,
			crate::transport::ReqwestTransportErrorMapper,
		);

		Ok(Self::with_transport(
			descriptor,
			client_id,
			Arc::new(transport),
			Arc::new(crate::clock::TokioClock),
		))
	}
}
impl Debug for PublicClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PublicClient")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("device_code_policy", &self.device_code_policy)
			.finish()
	}
}
