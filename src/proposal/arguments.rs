//! Argument payloads attached to proposals and the contracts they must satisfy.

// self
use crate::_prelude::*;

/// Structured payload carried by a proposal for downstream consumers (templates, mailers).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
	/// Keyed payload.
	Map(JsonMap<String, JsonValue>),
	/// Ordered positional payload.
	List(Vec<JsonValue>),
}
impl Arguments {
	/// Builds a positional payload from any sequence of JSON-convertible values.
	pub fn list<I, V>(values: I) -> Self
	where
		I: IntoIterator<Item = V>,
		V: Into<JsonValue>,
	{
		Self::List(values.into_iter().map(Into::into).collect())
	}

	/// Returns the keyed payload, if this is one.
	pub fn as_map(&self) -> Option<&JsonMap<String, JsonValue>> {
		match self {
			Self::Map(map) => Some(map),
			Self::List(_) => None,
		}
	}

	/// Looks up a key in a keyed payload.
	pub fn get(&self, key: &str) -> Option<&JsonValue> {
		self.as_map().and_then(|map| map.get(key))
	}
}
impl From<JsonMap<String, JsonValue>> for Arguments {
	fn from(map: JsonMap<String, JsonValue>) -> Self {
		Self::Map(map)
	}
}
impl From<Vec<JsonValue>> for Arguments {
	fn from(values: Vec<JsonValue>) -> Self {
		Self::List(values)
	}
}
impl From<JsonValue> for Arguments {
	/// Objects become keyed payloads, arrays stay positional, scalars become a one-element list.
	fn from(value: JsonValue) -> Self {
		match value {
			JsonValue::Object(map) => Self::Map(map),
			JsonValue::Array(values) => Self::List(values),
			scalar => Self::List(vec![scalar]),
		}
	}
}

/// Predicate form of [`Expects`].
pub type ArgumentsPredicate = Arc<dyn Fn(Option<&Arguments>) -> bool + Send + Sync>;

/// Transient rule checked against [`Arguments`] before a proposal is saved.
#[derive(Clone, Default)]
pub enum Expects {
	/// No contract.
	#[default]
	None,
	/// A single required key.
	Key(String),
	/// Required keys, reported in order.
	Keys(Vec<String>),
	/// Custom check over the whole payload.
	Predicate(ArgumentsPredicate),
}
impl Expects {
	/// Requires each of the provided keys.
	pub fn keys<I, S>(keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Keys(keys.into_iter().map(Into::into).collect())
	}

	/// Wraps a predicate.
	pub fn predicate<F>(f: F) -> Self
	where
		F: 'static + Fn(Option<&Arguments>) -> bool + Send + Sync,
	{
		Self::Predicate(Arc::new(f))
	}

	/// Returns `true` when there is nothing to check.
	pub fn is_none(&self) -> bool {
		match self {
			Self::None => true,
			Self::Key(key) => key.is_empty(),
			Self::Keys(keys) => keys.is_empty(),
			Self::Predicate(_) => false,
		}
	}

	/// Keys named by the contract, in declaration order.
	pub fn required_keys(&self) -> &[String] {
		match self {
			Self::Key(key) => std::slice::from_ref(key),
			Self::Keys(keys) => keys,
			Self::None | Self::Predicate(_) => &[],
		}
	}
}
impl Debug for Expects {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::None => f.write_str("Expects::None"),
			Self::Key(key) => f.debug_tuple("Expects::Key").field(key).finish(),
			Self::Keys(keys) => f.debug_tuple("Expects::Keys").field(keys).finish(),
			Self::Predicate(_) => f.write_str("Expects::Predicate(..)"),
		}
	}
}
impl From<&str> for Expects {
	fn from(key: &str) -> Self {
		Self::Key(key.to_owned())
	}
}
impl From<Vec<&str>> for Expects {
	fn from(keys: Vec<&str>) -> Self {
		Self::keys(keys)
	}
}

/// Blank values: null, `false`, whitespace-only strings, and empty collections.
pub fn is_blank(value: &JsonValue) -> bool {
	match value {
		JsonValue::Null => true,
		JsonValue::Bool(flag) => !flag,
		JsonValue::String(s) => s.trim().is_empty(),
		JsonValue::Array(values) => values.is_empty(),
		JsonValue::Object(map) => map.is_empty(),
		JsonValue::Number(_) => false,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn json_values_convert_by_shape() {
		assert!(matches!(Arguments::from(json!({ "x": 1 })), Arguments::Map(_)));
		assert_eq!(Arguments::from(json!([1, 2])), Arguments::list([1, 2]));
		assert_eq!(Arguments::from(json!("not a hash")), Arguments::list(["not a hash"]));
	}

	#[test]
	fn untagged_serde_keeps_shape() {
		let map = Arguments::from(json!({ "a": 1, "b": [true] }));
		let payload = serde_json::to_string(&map).expect("Arguments should serialize.");
		let back: Arguments = serde_json::from_str(&payload).expect("Arguments should parse.");

		assert_eq!(back, map);

		let list: Arguments = serde_json::from_str("[1, \"two\"]").expect("List should parse.");

		assert_eq!(list, Arguments::list([json!(1), json!("two")]));
	}

	#[test]
	fn blank_matches_presence_semantics() {
		for blank in [json!(null), json!(false), json!(""), json!("  "), json!([]), json!({})] {
			assert!(is_blank(&blank), "{blank} should be blank.");
		}
		for present in [json!(0), json!(true), json!("x"), json!([null]), json!({ "k": 1 })] {
			assert!(!is_blank(&present), "{present} should be present.");
		}
	}

	#[test]
	fn empty_contracts_are_none() {
		assert!(Expects::None.is_none());
		assert!(Expects::Keys(Vec::new()).is_none());
		assert!(!Expects::from("a").is_none());
		assert!(!Expects::predicate(|_| true).is_none());
		assert_eq!(Expects::from(vec!["a", "b"]).required_keys(), ["a", "b"]);
	}
}
