//! Shared helpers for flow implementations (grant dispatch, error classification, guards).

// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError},
	flows::PublicClient,
	grant::{self, CLIENT_ID_PARAM, Grant, ParameterMap},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{GrantType, ProviderErrorContext, ProviderErrorKind, ProviderStrategy},
	transport::{EndpointError, RequestHeaders, TokenResponse},
};

/// Classified endpoint failure.
///
/// `kind` drives the device code poller; `error` is what non-polling flows surface.
#[derive(Debug)]
pub struct EndpointFailure {
	/// Classification returned by the provider strategy.
	pub kind: ProviderErrorKind,
	/// Retry-After hint, when supplied.
	pub retry_after: Option<Duration>,
	/// Error surfaced to callers when the failure is terminal.
	pub error: Error,
}

/// Runs the strategy over an [`EndpointError`] and maps it onto the crate taxonomy.
pub fn classify_endpoint_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	err: EndpointError,
) -> EndpointFailure {
	let retry_after = err.retry_after();

	match err {
		EndpointError::OAuth { response, status, .. } => {
			let mut ctx = ProviderErrorContext::new(grant).with_oauth_error(response.error.clone());

			if let Some(description) = &response.error_description {
				ctx = ctx.with_error_description(description.clone());
			}
			if let Some(status) = status {
				ctx = ctx.with_http_status(status);
			}

			let kind = strategy.classify_token_error(&ctx);
			let error =
				error_for_kind(kind, response.error, response.error_description, status, retry_after);

			EndpointFailure { kind, retry_after, error }
		},
		EndpointError::Status { status, body_preview, .. } => {
			let ctx = ProviderErrorContext::new(grant)
				.with_http_status(status)
				.with_body_preview(body_preview.clone());
			let kind = strategy.classify_token_error(&ctx);
			let description = Some(body_preview).filter(|body| !body.trim().is_empty());
			let error =
				error_for_kind(kind, format!("http_{status}"), description, Some(status), retry_after);

			EndpointFailure { kind, retry_after, error }
		},
		EndpointError::Request(error) => {
			let kind = match &error {
				Error::Transport(_) =>
					strategy.classify_token_error(&ProviderErrorContext::network_failure(grant)),
				Error::Transient(_) => ProviderErrorKind::Transient,
				_ => ProviderErrorKind::Fatal,
			};

			EndpointFailure { kind, retry_after, error }
		},
	}
}

fn error_for_kind(
	kind: ProviderErrorKind,
	code: String,
	description: Option<String>,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	let reason = description.clone().unwrap_or_else(|| code.clone());

	match kind {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason },
		ProviderErrorKind::Declined => Error::AuthorizationDeclined { reason },
		ProviderErrorKind::Expired => Error::DeviceCodeExpired,
		ProviderErrorKind::Transient =>
			TransientError::TokenEndpoint { message: reason, status, retry_after }.into(),
		ProviderErrorKind::AuthorizationPending
		| ProviderErrorKind::SlowDown
		| ProviderErrorKind::Fatal => Error::Endpoint { error: code, description, status },
	}
}

impl PublicClient {
	/// Serializes `grant`, decorates it through the strategy and sends it to the
	/// token endpoint.
	pub(crate) async fn send_grant(
		&self,
		grant: &Grant,
		headers: &RequestHeaders,
	) -> Result<TokenResponse, EndpointFailure> {
		let grant_type = grant.grant_type();
		let mut extra = ParameterMap::new().with(CLIENT_ID_PARAM, self.client_id.as_str());

		self.strategy.augment_token_request(grant_type, &mut extra);

		let params = grant::serialize(grant, &extra);

		self.transport
			.request_token(&self.descriptor.endpoints.token, &params, headers)
			.await
			.map_err(|err| classify_endpoint_error(self.strategy.as_ref(), grant_type, err))
	}

	/// Single-shot redemption used by every flow except device code.
	pub(crate) async fn redeem(&self, grant: Grant) -> Result<TokenResponse> {
		let headers = RequestHeaders::correlated(self.correlation_ids.next_id());

		self.send_grant(&grant, &headers).await.map_err(|failure| failure.error)
	}

	pub(crate) fn ensure_supported(&self, grant: GrantType) -> Result<()> {
		if self.descriptor.supports(grant) {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedGrant {
				descriptor: self.descriptor.id.clone(),
				grant: grant.as_str(),
			}
			.into())
		}
	}
}

/// Wraps a flow body with its span and attempt/success/failure counters.
pub(crate) async fn observe_flow<F, T>(kind: FlowKind, stage: &'static str, flow: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(flow).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}

	result
}
