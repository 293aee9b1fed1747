//! Ordered, multi-valued parameter maps rendered into token request bodies.

// std
use std::{ops::Deref, slice::Iter};
// self
use crate::_prelude::*;

const REDACTED_KEYS: [&str; 5] =
	["password", "refresh_token", "assertion", "code_verifier", "client_secret"];

/// Ordered mapping from parameter name to an ordered list of values.
///
/// Keys are unique and keep the position of their first insertion. Writing an existing
/// key replaces its whole value list in place; value lists are never merged. This is the
/// overlay rule every grant and serializer relies on.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
	entries: Vec<(String, Vec<String>)>,
}
impl ParameterMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets `key` to `values`, returning the replaced list when the key existed.
	pub fn insert<K, I, V>(&mut self, key: K, values: I) -> Option<Vec<String>>
	where
		K: Into<String>,
		I: IntoIterator<Item = V>,
		V: Into<String>,
	{
		let key = key.into();
		let values = values.into_iter().map(Into::into).collect::<Vec<_>>();

		match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
			Some((_, slot)) => Some(std::mem::replace(slot, values)),
			None => {
				self.entries.push((key, values));

				None
			},
		}
	}

	/// Sets `key` to a single value.
	pub fn insert_single(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.insert(key, [value.into()]);
	}

	/// Builder-style [`insert_single`](Self::insert_single).
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert_single(key, value);

		self
	}

	/// Writes every entry of `other` over `self`; colliding keys take `other`'s list.
	pub fn overlay(&mut self, other: &ParameterMap) {
		for (key, values) in other.iter() {
			self.insert(key, values.iter().cloned());
		}
	}

	/// Removes `key`, returning its values.
	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		let idx = self.entries.iter().position(|(existing, _)| existing == key)?;

		Some(self.entries.remove(idx).1)
	}

	/// Values recorded for `key`.
	pub fn get(&self, key: &str) -> Option<&[String]> {
		self.entries
			.iter()
			.find(|(existing, _)| existing == key)
			.map(|(_, values)| values.as_slice())
	}

	/// First value recorded for `key`.
	pub fn first(&self, key: &str) -> Option<&str> {
		self.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	/// Returns true when `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.get(key).is_some()
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns true when the map holds no keys.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Keys in insertion order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(key, _)| key.as_str())
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> ParameterIter<'_> {
		ParameterIter { inner: self.entries.iter() }
	}

	/// Flattened `(name, value)` pairs in wire order; multi-valued keys repeat.
	pub fn form_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().flat_map(|(key, values)| {
			values.iter().map(move |value| (key.as_str(), value.as_str()))
		})
	}

	/// Freezes the map into a shareable, read-only [`Parameters`].
	pub fn freeze(self) -> Parameters {
		Parameters(Arc::new(self))
	}
}
impl Debug for ParameterMap {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, values) in &self.entries {
			if REDACTED_KEYS.contains(&key.as_str()) {
				map.entry(key, &"<redacted>");
			} else {
				map.entry(key, values);
			}
		}

		map.finish()
	}
}
impl<K, V> FromIterator<(K, V)> for ParameterMap
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let mut map = Self::new();

		map.extend(iter);

		map
	}
}
impl<K, V> Extend<(K, V)> for ParameterMap
where
	K: Into<String>,
	V: Into<String>,
{
	fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
		for (key, value) in iter {
			self.insert_single(key, value);
		}
	}
}
impl<'a> IntoIterator for &'a ParameterMap {
	type IntoIter = ParameterIter<'a>;
	type Item = (&'a str, &'a [String]);

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Iterator over `(name, values)` entries.
pub struct ParameterIter<'a> {
	inner: Iter<'a, (String, Vec<String>)>,
}
impl<'a> Iterator for ParameterIter<'a> {
	type Item = (&'a str, &'a [String]);

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|(key, values)| (key.as_str(), values.as_slice()))
	}
}

/// Frozen request parameters produced by [`serialize`](crate::grant::serialize).
///
/// Cloning shares the same allocation; nothing reachable from this type can mutate it,
/// so transports may hold it across retries without observing concurrent edits.
#[derive(Clone, PartialEq, Eq)]
pub struct Parameters(Arc<ParameterMap>);
impl Parameters {
	/// Copies the parameters into a fresh, editable map.
	pub fn to_map(&self) -> ParameterMap {
		self.0.as_ref().clone()
	}

	/// URL-encoded `application/x-www-form-urlencoded` body.
	pub fn to_form_body(&self) -> String {
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in self.form_pairs() {
			serializer.append_pair(key, value);
		}

		serializer.finish()
	}
}
impl Deref for Parameters {
	type Target = ParameterMap;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl Debug for Parameters {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Debug::fmt(self.0.as_ref(), f)
	}
}
