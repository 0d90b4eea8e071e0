//! Strongly typed identifiers for stored proposals and their owning resources.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Resource column an identifier is destined for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceColumn {
	/// `resource_type`.
	Type,
	/// `resource_id`.
	Id,
}
impl ResourceColumn {
	/// Column name as stored.
	pub const fn as_str(self) -> &'static str {
		match self {
			ResourceColumn::Type => "resource_type",
			ResourceColumn::Id => "resource_id",
		}
	}
}
impl Display for ResourceColumn {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error returned when a value cannot key a resource column.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ResourceKeyError {
	/// The value was empty.
	#[error("`{column}` cannot be empty.")]
	Empty {
		/// Rejected column.
		column: ResourceColumn,
	},
	/// The value contains whitespace.
	#[error("`{column}` contains whitespace at byte {offset}.")]
	Whitespace {
		/// Rejected column.
		column: ResourceColumn,
		/// Byte offset of the first whitespace character.
		offset: usize,
	},
}

fn check_key(column: ResourceColumn, value: &str) -> Result<(), ResourceKeyError> {
	if value.is_empty() {
		return Err(ResourceKeyError::Empty { column });
	}

	match value.char_indices().find(|(_, c)| c.is_whitespace()) {
		Some((offset, _)) => Err(ResourceKeyError::Whitespace { column, offset }),
		None => Ok(()),
	}
}

macro_rules! resource_key {
	($(#[$meta:meta])* $name:ident => $column:expr) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` for this column.
			pub fn new(value: impl Into<String>) -> Result<Self, ResourceKeyError> {
				Self::try_from(value.into())
			}
		}
		impl TryFrom<String> for $name {
			type Error = ResourceKeyError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				check_key($column, &value).map(|()| Self(value))
			}
		}
		impl From<$name> for String {
			fn from(key: $name) -> Self {
				key.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", stringify!($name), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

resource_key! {
	/// Type name of an owning resource (e.g. `Team`).
	ResourceType => ResourceColumn::Type
}
resource_key! {
	/// Identifier of an owning resource within its type.
	ResourceId => ResourceColumn::Id
}

/// Store-assigned identifier of a persisted proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);
impl Display for ProposalId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn resource_keys_reject_empty_and_whitespace() {
		assert_eq!(
			ResourceType::new(""),
			Err(ResourceKeyError::Empty { column: ResourceColumn::Type })
		);
		assert_eq!(
			ResourceId::new("42 "),
			Err(ResourceKeyError::Whitespace { column: ResourceColumn::Id, offset: 2 })
		);

		let id = ResourceId::new("42").expect("Resource id fixture should be valid.");

		assert_eq!(id.as_ref(), "42");
		assert_eq!(format!("{id:?}"), "ResourceId(42)");
		assert!(ResourceId::new("a".repeat(1024)).is_ok(), "Long ids are accepted as is.");
	}

	#[test]
	fn deserialization_checks_the_column() {
		let kind: ResourceType =
			serde_json::from_str("\"Team\"").expect("Resource type should deserialize.");

		assert_eq!(kind.as_ref(), "Team");

		let err = serde_json::from_str::<ResourceType>("\"with space\"")
			.expect_err("Whitespace must be rejected.");

		assert!(err.to_string().contains("`resource_type` contains whitespace at byte 4."));
		assert!(serde_json::from_str::<ResourceId>("\"\"").is_err());
	}

	#[test]
	fn proposal_id_serializes_as_number() {
		let payload = serde_json::to_string(&ProposalId(7)).expect("Id should serialize.");

		assert_eq!(payload, "7");
	}
}
