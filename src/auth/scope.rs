//! Scope modeling and the wire-level `scope` normalizer.

// std
use std::{
	collections::HashSet,
	convert::Infallible,
	hash::{Hash, Hasher},
	slice::Iter,
	sync::OnceLock,
};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserializer, Serializer, ser::SerializeSeq};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Scopes the library always requests so the token endpoint issues a refresh token,
/// an ID token, and basic profile claims.
pub const RESERVED_SCOPES: [&str; 3] = ["offline_access", "openid", "profile"];

/// Wire form of [`RESERVED_SCOPES`]; every rendered `scope` parameter starts with it.
pub const RESERVED_SCOPE_PARAM: &str = "offline_access openid profile";

/// Renders the `scope` parameter for a token or device-authorization request.
///
/// The result always starts with [`RESERVED_SCOPE_PARAM`]. Caller scopes follow in the
/// order supplied, each at most once. Blank entries are ignored, and caller scopes that
/// repeat a reserved scope are not emitted a second time.
pub fn normalize<I, S>(requested: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	let mut seen = HashSet::new();
	let mut rendered = String::from(RESERVED_SCOPE_PARAM);

	for entry in requested {
		for scope in entry.as_ref().split_whitespace() {
			if RESERVED_SCOPES.contains(&scope) || !seen.insert(scope.to_owned()) {
				continue;
			}

			rendered.push(' ');
			rendered.push_str(scope);
		}
	}

	rendered
}

/// Caller-requested scopes: case-sensitive, deduplicated, and kept in insertion order.
///
/// Equality and hashing ignore order, so `{a, b}` equals `{b, a}`. Rendering keeps the
/// caller's order so wire output stays deterministic. The
/// [`fingerprint`](Self::fingerprint) helper lazily caches a base64 (no padding) SHA-256
/// digest of the sorted scopes, which makes a stable, order-independent cache key.
#[derive(Default)]
pub struct ScopeSet {
	scopes: Arc<[String]>,
	fingerprint_cache: OnceLock<String>,
}
impl ScopeSet {
	/// Builds a scope set from any iterator.
	///
	/// Blank entries are dropped and entries containing whitespace are split into their
	/// individual scopes; construction never fails.
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut seen = HashSet::new();
		let mut ordered = Vec::new();

		for entry in scopes {
			for scope in entry.as_ref().split_whitespace() {
				if seen.insert(scope.to_owned()) {
					ordered.push(scope.to_owned());
				}
			}
		}

		Self { scopes: Arc::from(ordered), fingerprint_cache: OnceLock::new() }
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.scopes.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.scopes.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.scopes.iter().map(|s| s.as_str())
	}

	/// Caller scopes joined with single spaces, without the reserved prefix.
	pub fn joined(&self) -> String {
		self.scopes.join(" ")
	}

	/// Wire value for the `scope` parameter, reserved scopes included.
	pub fn scope_param(&self) -> String {
		normalize(self.iter())
	}

	/// Stable, order-independent fingerprint of the set.
	pub fn fingerprint(&self) -> String {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).clone()
	}

	/// Returns the underlying slice of scope strings.
	pub fn as_slice(&self) -> &[String] {
		&self.scopes
	}
}
impl Clone for ScopeSet {
	fn clone(&self) -> Self {
		Self { scopes: self.scopes.clone(), fingerprint_cache: OnceLock::new() }
	}
}
impl PartialEq for ScopeSet {
	fn eq(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().all(|scope| other.contains(scope))
	}
}
impl Eq for ScopeSet {}
impl Hash for ScopeSet {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.fingerprint_cache.get_or_init(|| compute_fingerprint(&self.scopes)).hash(state);
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.scopes).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.joined())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.scopes.iter() }
	}
}
impl<S> FromIterator<S> for ScopeSet
where
	S: AsRef<str>,
{
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self::new(iter)
	}
}
impl From<Vec<String>> for ScopeSet {
	fn from(value: Vec<String>) -> Self {
		Self::new(value)
	}
}
impl FromStr for ScopeSet {
	type Err = Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::new([s]))
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(self.scopes.len()))?;

		for scope in self.scopes.iter() {
			seq.serialize_element(scope)?;
		}

		seq.end()
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let values = <Vec<String>>::deserialize(deserializer)?;

		Ok(ScopeSet::new(values))
	}
}

fn compute_fingerprint(scopes: &[String]) -> String {
	let mut sorted = scopes.iter().map(String::as_str).collect::<Vec<_>>();

	sorted.sort_unstable();

	let mut hasher = Sha256::new();

	hasher.update(sorted.join(" ").as_bytes());

	let digest = hasher.finalize();

	STANDARD_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn normalize_prefixes_reserved_scopes() {
		assert_eq!(normalize(["Mail.Read"]), "offline_access openid profile Mail.Read");
		assert_eq!(
			normalize(["User.Read", "Mail.Send"]),
			"offline_access openid profile User.Read Mail.Send"
		);
	}

	#[test]
	fn normalize_treats_blank_input_as_absent() {
		assert_eq!(normalize(Vec::<String>::new()), RESERVED_SCOPE_PARAM);
		assert_eq!(normalize(["", "   ", "\t"]), RESERVED_SCOPE_PARAM);
		assert_eq!(normalize(["", "Files.Read", " "]), "offline_access openid profile Files.Read");
	}

	#[test]
	fn normalize_emits_each_scope_once() {
		let rendered = normalize(["openid", "Mail.Read", "Mail.Read", "profile", "mail.read"]);

		assert_eq!(rendered, "offline_access openid profile Mail.Read mail.read");

		for scope in ["offline_access", "openid", "profile", "Mail.Read", "mail.read"] {
			assert_eq!(
				rendered.split(' ').filter(|candidate| *candidate == scope).count(),
				1,
				"{scope} should appear exactly once."
			);
		}
	}

	#[test]
	fn scope_set_keeps_insertion_order_but_compares_as_set() {
		let lhs = ScopeSet::new(["profile.read", "email", "email"]);
		let rhs = ScopeSet::new(["email", "profile.read"]);

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.joined(), "profile.read email");
		assert_eq!(rhs.joined(), "email profile.read");
		assert_eq!(lhs.fingerprint(), rhs.fingerprint());
	}

	#[test]
	fn scope_set_splits_whitespace_and_drops_blanks() {
		let scopes = ScopeSet::new([" User.Read  Mail.Read ", "", "User.Read"]);

		assert_eq!(scopes.len(), 2);
		assert!(scopes.contains("Mail.Read"));
		assert_eq!(scopes.iter().collect::<Vec<_>>(), vec!["User.Read", "Mail.Read"]);
		assert_eq!(scopes.scope_param(), "offline_access openid profile User.Read Mail.Read");

		let parsed = ScopeSet::from_str("   ").expect("Scope parsing is infallible.");

		assert!(parsed.is_empty());
		assert_eq!(parsed.scope_param(), RESERVED_SCOPE_PARAM);
	}

	#[test]
	fn scope_set_serde_round_trip() {
		let scopes = ScopeSet::new(["b", "a"]);
		let json = serde_json::to_string(&scopes).expect("Scope set should serialize.");

		assert_eq!(json, "[\"b\",\"a\"]");

		let back: ScopeSet = serde_json::from_str(&json).expect("Scope set should deserialize.");

		assert_eq!(back.as_slice(), scopes.as_slice());
	}
}
