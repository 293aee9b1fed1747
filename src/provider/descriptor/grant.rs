// self
use crate::_prelude::*;

/// Grant types a public client can present to the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Device code grant for input-constrained devices.
	DeviceCode,
	/// Resource-owner username/password grant.
	Password,
	/// Authorization Code grant (PKCE recommended).
	AuthorizationCode,
	/// Refresh Token grant for long-lived sessions.
	RefreshToken,
	/// JWT bearer assertion grant, used by the on-behalf-of flow.
	JwtBearer,
}
impl GrantType {
	/// Every grant type, in declaration order.
	pub const ALL: [GrantType; 5] = [
		GrantType::DeviceCode,
		GrantType::Password,
		GrantType::AuthorizationCode,
		GrantType::RefreshToken,
		GrantType::JwtBearer,
	];

	/// Returns the `grant_type` wire value.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::DeviceCode => "device_code",
			GrantType::Password => "password",
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
			GrantType::JwtBearer => "urn:ietf:params:oauth:grant-type:jwt-bearer",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Collection of grant flags wired into the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportedGrants {
	/// Indicates whether the device code grant is enabled.
	pub device_code: bool,
	/// Indicates whether the username/password grant is enabled.
	pub password: bool,
	/// Indicates whether the Authorization Code grant is enabled.
	pub authorization_code: bool,
	/// Indicates whether the Refresh Token grant is enabled.
	pub refresh_token: bool,
	/// Indicates whether the JWT bearer (on-behalf-of) grant is enabled.
	pub jwt_bearer: bool,
}
impl SupportedGrants {
	/// Returns true if the provided grant is supported.
	pub fn supports(self, grant: GrantType) -> bool {
		match grant {
			GrantType::DeviceCode => self.device_code,
			GrantType::Password => self.password,
			GrantType::AuthorizationCode => self.authorization_code,
			GrantType::RefreshToken => self.refresh_token,
			GrantType::JwtBearer => self.jwt_bearer,
		}
	}

	/// Marks a grant as supported.
	pub fn enable(mut self, grant: GrantType) -> Self {
		match grant {
			GrantType::DeviceCode => self.device_code = true,
			GrantType::Password => self.password = true,
			GrantType::AuthorizationCode => self.authorization_code = true,
			GrantType::RefreshToken => self.refresh_token = true,
			GrantType::JwtBearer => self.jwt_bearer = true,
		}

		self
	}

	/// Returns true when no grants are enabled.
	pub fn is_empty(self) -> bool {
		!GrantType::ALL.into_iter().any(|grant| self.supports(grant))
	}
}
