// std
use std::iter::IntoIterator;
// self
use crate::{
	_prelude::*,
	provider::{GrantType, ProviderDescriptor, ProviderEndpoints, SupportedGrants},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Descriptor identifiers must not be blank.
	#[error("Descriptor identifier cannot be empty.")]
	EmptyIdentifier,
	/// Authorization endpoint is required for Authorization Code flows.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Device authorization endpoint is required for the device code flow.
	#[error("Missing device authorization endpoint.")]
	MissingDeviceAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// At least one grant must be supported.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Authority URL cannot be extended with endpoint paths.
	#[error("Authority URL cannot carry endpoint paths: {url}.")]
	InvalidAuthority {
		/// Authority URL that failed validation.
		url: String,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: String,
	/// Optional authorization endpoint (required for Authorization Code flows).
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used by every grant.
	pub token_endpoint: Option<Url>,
	/// Optional device authorization endpoint (required for the device code flow).
	pub device_authorization_endpoint: Option<Url>,
	/// Grants enabled for the provider.
	pub supported_grants: SupportedGrants,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			authorization_endpoint: None,
			token_endpoint: None,
			device_authorization_endpoint: None,
			supported_grants: SupportedGrants::default(),
		}
	}

	/// Derives the three endpoints from a v2.0-style authority such as
	/// `https://login.microsoftonline.com/organizations/`.
	///
	/// The endpoints become `<authority>/oauth2/v2.0/{authorize,token,devicecode}`.
	pub fn authority(mut self, authority: &Url) -> Result<Self, ProviderDescriptorError> {
		let invalid = || ProviderDescriptorError::InvalidAuthority { url: authority.to_string() };

		if authority.cannot_be_a_base() {
			return Err(invalid());
		}

		let mut base = authority.clone();

		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		let join = |path: &str| base.join(path).map_err(|_| invalid());

		self.authorization_endpoint = Some(join("oauth2/v2.0/authorize")?);
		self.token_endpoint = Some(join("oauth2/v2.0/token")?);
		self.device_authorization_endpoint = Some(join("oauth2/v2.0/devicecode")?);

		Ok(self)
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the device authorization endpoint.
	pub fn device_authorization_endpoint(mut self, url: Url) -> Self {
		self.device_authorization_endpoint = Some(url);

		self
	}

	/// Marks a single grant type as supported.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Marks multiple grants as supported.
	pub fn support_grants<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		for grant in grants.into_iter() {
			self.supported_grants = self.supported_grants.enable(grant);
		}

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let endpoints = ProviderEndpoints {
			authorization: self.authorization_endpoint,
			token,
			device_authorization: self.device_authorization_endpoint,
		};
		let descriptor = ProviderDescriptor {
			id: self.id,
			endpoints,
			supported_grants: self.supported_grants,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.id.trim().is_empty() {
			return Err(ProviderDescriptorError::EmptyIdentifier);
		}
		if self.supported_grants.is_empty() {
			return Err(ProviderDescriptorError::NoSupportedGrants);
		}
		if self.supports(GrantType::AuthorizationCode) && self.endpoints.authorization.is_none() {
			return Err(ProviderDescriptorError::MissingAuthorizationEndpoint);
		}
		if self.supports(GrantType::DeviceCode) && self.endpoints.device_authorization.is_none() {
			return Err(ProviderDescriptorError::MissingDeviceAuthorizationEndpoint);
		}

		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(authorization) = self.endpoints.authorization.as_ref() {
			validate_endpoint("authorization", authorization)?;
		}
		if let Some(device) = self.endpoints.device_authorization.as_ref() {
			validate_endpoint("device authorization", device)?;
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	if url.scheme() != "https" {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
