//! Correlation identifiers attached to outbound requests as headers.

// crates.io
use uuid::Uuid;
// self
use crate::_prelude::*;

/// Request header carrying the correlation id.
pub const CLIENT_REQUEST_ID_HEADER: &str = "client-request-id";
/// Request header asking the server to echo the correlation id back.
pub const RETURN_CLIENT_REQUEST_ID_HEADER: &str = "return-client-request-id";

/// Per-request identifier for end-to-end tracing across client and server.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);
impl CorrelationId {
	/// Wraps an externally supplied identifier.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Generates a random UUID v4 identifier.
	pub fn random() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	/// Borrow the identifier as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for CorrelationId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CorrelationId({})", self.0)
	}
}
impl Display for CorrelationId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Source of correlation ids for flows that do not receive one from the caller.
pub trait CorrelationIdSource: Send + Sync {
	/// Produces the id for the next flow or request.
	fn next_id(&self) -> CorrelationId;
}

/// Default source issuing random UUID v4 ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCorrelationIds;
impl CorrelationIdSource for RandomCorrelationIds {
	fn next_id(&self) -> CorrelationId {
		CorrelationId::random()
	}
}
