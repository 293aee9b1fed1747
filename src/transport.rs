//! Token endpoint transport: the seam between flows and the network.
//!
//! Flows hand a frozen [`Parameters`] view plus [`RequestHeaders`] to a
//! [`TokenTransport`] and get back a decoded [`TokenResponse`] or
//! [`DeviceAuthorization`]. [`HttpTokenTransport`] is the default implementation; it
//! form-encodes the parameters, attaches correlation headers, captures
//! [`ResponseMetadata`] and decodes JSON bodies with `serde_path_to_error` so decode
//! failures point at the offending field.

// std
use std::collections::BTreeMap;
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{
		CLIENT_REQUEST_ID_HEADER, CorrelationId, RETURN_CLIENT_REQUEST_ID_HEADER, Secret,
	},
	error::{ConfigError, TransientError, TransportError},
	grant::Parameters,
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient, parse_retry_after},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";
const ERROR_BODY_PREVIEW_LIMIT: usize = 512;

#[cfg(feature = "reqwest")]
/// Transport specialized for the crate's default reqwest stack.
pub type ReqwestTokenTransport = HttpTokenTransport<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Boxed future returned by [`TokenTransport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, EndpointError>> + 'a + Send>>;

/// Sends token and device authorization requests.
///
/// One call is one HTTP round trip; implementations never retry on their own. Polling
/// cadence and retry budgets belong to the flows.
pub trait TokenTransport
where
	Self: 'static + Send + Sync,
{
	/// POSTs `params` to a token endpoint.
	fn request_token<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, TokenResponse>;

	/// POSTs `params` to a device authorization endpoint.
	fn request_device_code<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, DeviceAuthorization>;
}

/// Per-request headers layered on top of the form body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestHeaders {
	/// Correlation id sent as `client-request-id`.
	pub correlation_id: Option<CorrelationId>,
	/// Additional headers in insertion order.
	pub extra: Vec<(String, String)>,
}
impl RequestHeaders {
	/// Headers carrying `correlation_id`.
	pub fn correlated(correlation_id: CorrelationId) -> Self {
		Self { correlation_id: Some(correlation_id), extra: Vec::new() }
	}

	/// Appends an extra header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra.push((name.into(), value.into()));

		self
	}
}

/// Successful token endpoint response.
///
/// The crate does not validate or interpret tokens; unknown fields are kept in
/// `extra`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Issued access token.
	pub access_token: Secret,
	/// Token type, usually `Bearer`.
	#[serde(default)]
	pub token_type: String,
	/// Lifetime of the access token in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Refresh token, when issued.
	#[serde(default)]
	pub refresh_token: Option<Secret>,
	/// OpenID Connect ID token, when issued.
	#[serde(default)]
	pub id_token: Option<Secret>,
	/// Space-delimited scopes granted by the server.
	#[serde(default)]
	pub scope: Option<String>,
	/// Opaque account identifiers returned when `client_info=1` was requested.
	#[serde(default)]
	pub client_info: Option<String>,
	/// Fields not modeled above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

/// Device authorization response (RFC 8628 §3.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorization {
	/// Code the client redeems while polling.
	pub device_code: String,
	/// Code the user types at the verification page.
	pub user_code: String,
	/// Verification page; some servers name the field `verification_url`.
	#[serde(alias = "verification_url")]
	pub verification_uri: String,
	/// Verification page with the user code embedded.
	#[serde(default)]
	pub verification_uri_complete: Option<String>,
	/// Lifetime of the device code in seconds.
	pub expires_in: i64,
	/// Minimum polling interval in seconds.
	#[serde(default)]
	pub interval: Option<i64>,
	/// Human readable instructions supplied by the server.
	#[serde(default)]
	pub message: Option<String>,
}

/// OAuth error body (RFC 6749 §5.2).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
	/// OAuth `error` code.
	pub error: String,
	/// OAuth `error_description`.
	#[serde(default)]
	pub error_description: Option<String>,
	/// OAuth `error_uri`.
	#[serde(default)]
	pub error_uri: Option<String>,
}

/// Failure reported by a [`TokenTransport`].
///
/// Endpoint answers are returned unclassified; flows decide what they mean through
/// the provider strategy.
#[derive(Debug, ThisError)]
pub enum EndpointError {
	/// Endpoint answered with an OAuth error body.
	#[error("Endpoint returned OAuth error `{}`.", .response.error)]
	OAuth {
		/// Decoded error body.
		response: OAuthErrorResponse,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint, when supplied.
		retry_after: Option<Duration>,
	},
	/// Endpoint answered with a non-success status and no OAuth error body.
	#[error("Endpoint returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Leading part of the response body.
		body_preview: String,
		/// Retry-After hint, when supplied.
		retry_after: Option<Duration>,
	},
	/// The request never produced a usable answer.
	#[error(transparent)]
	Request(#[from] Error),
}
impl EndpointError {
	/// Retry-After hint carried by the failure, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		match self {
			Self::OAuth { retry_after, .. } | Self::Status { retry_after, .. } => *retry_after,
			Self::Request(Error::Transient(err)) => err.retry_after(),
			Self::Request(_) => None,
		}
	}
}
impl From<ConfigError> for EndpointError {
	fn from(e: ConfigError) -> Self {
		Self::Request(e.into())
	}
}
impl From<TransientError> for EndpointError {
	fn from(e: TransientError) -> Self {
		Self::Request(e.into())
	}
}

/// Maps HTTP client failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the HTTP client.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
///
/// Builder failures are configuration errors, timeouts are transient and every
/// other reqwest failure is a network error.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown failure"),
		}
	}
}

/// [`TokenTransport`] over any [`TokenHttpClient`].
pub struct HttpTokenTransport<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> HttpTokenTransport<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a transport from an HTTP client and its error mapper.
	pub fn new(http_client: impl Into<Arc<C>>, error_mapper: impl Into<Arc<M>>) -> Self {
		Self { http_client: http_client.into(), error_mapper: error_mapper.into() }
	}

	async fn post<T>(
		&self,
		endpoint: &Url,
		params: &Parameters,
		headers: &RequestHeaders,
	) -> Result<T, EndpointError>
	where
		T: DeserializeOwned,
	{
		let slot = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(slot.clone());
		let request = build_request(endpoint, params, headers)?;
		let response = handle
			.call(request)
			.await
			.map_err(|err| self.error_mapper.map_transport_error(slot.take().as_ref(), err))?;

		decode_response(response, slot.take())
	}
}
#[cfg(feature = "reqwest")]
impl HttpTokenTransport<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Transport over a default reqwest client.
	pub fn reqwest() -> Self {
		Self::new(ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> TokenTransport for HttpTokenTransport<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn request_token<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, TokenResponse> {
		Box::pin(self.post(endpoint, params, headers))
	}

	fn request_device_code<'a>(
		&'a self,
		endpoint: &'a Url,
		params: &'a Parameters,
		headers: &'a RequestHeaders,
	) -> TransportFuture<'a, DeviceAuthorization> {
		Box::pin(self.post(endpoint, params, headers))
	}
}
impl<C, M> Debug for HttpTokenTransport<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("HttpTokenTransport(..)")
	}
}

fn build_request(
	endpoint: &Url,
	params: &Parameters,
	headers: &RequestHeaders,
) -> Result<HttpRequest, ConfigError> {
	let mut builder = Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, JSON_ACCEPT);

	if let Some(id) = &headers.correlation_id {
		builder = builder
			.header(CLIENT_REQUEST_ID_HEADER, id.as_str())
			.header(RETURN_CLIENT_REQUEST_ID_HEADER, "true");
	}
	for (name, value) in &headers.extra {
		builder = builder.header(name.as_str(), value.as_str());
	}

	Ok(builder.body(params.to_form_body().into_bytes())?)
}

fn decode_response<T>(
	response: HttpResponse,
	meta: Option<ResponseMetadata>,
) -> Result<T, EndpointError>
where
	T: DeserializeOwned,
{
	let status = response.status();
	let retry_after =
		meta.and_then(|meta| meta.retry_after).or_else(|| parse_retry_after(response.headers()));
	let body = response.body();

	if status.is_success() {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		return serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			TransientError::ResponseParse { source, status: Some(status.as_u16()) }.into()
		});
	}

	match serde_json::from_slice::<OAuthErrorResponse>(body) {
		Ok(error) if !error.error.trim().is_empty() =>
			Err(EndpointError::OAuth { response: error, status: Some(status.as_u16()), retry_after }),
		_ => Err(EndpointError::Status {
			status: status.as_u16(),
			body_preview: String::from_utf8_lossy(body)
				.chars()
				.take(ERROR_BODY_PREVIEW_LIMIT)
				.collect(),
			retry_after,
		}),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the endpoint".into(),
			status: meta.and_then(|meta| meta.status).or_else(|| err.status().map(|s| s.as_u16())),
			retry_after: meta.and_then(|meta| meta.retry_after),
		}
		.into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the endpoint: {message}"),
		status: meta.and_then(|meta| meta.status),
		retry_after: meta.and_then(|meta| meta.retry_after),
	}
	.into()
}
