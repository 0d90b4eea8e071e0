//! Proposable target resolution: repositories that find records by email and the registry
//! that maps proposable type names onto them.
//!
//! Record storage belongs to the host application. The crate only asks two questions: which
//! lookup serves a type name, and which record (if any) owns an email.

pub mod directory;
pub mod registry;

pub use directory::MemoryDirectory;
pub use registry::{RepositoryLookup, StaticRegistry};

// self
use crate::_prelude::*;

/// Boxed future returned by target lookups.
pub type LookupFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LookupError>> + 'a + Send>>;

/// Record returned by a proposable lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
	/// Record identifier within its entity type.
	pub id: String,
	/// Email the record was matched on.
	pub email: String,
	/// Additional attributes exposed by the repository.
	#[serde(default)]
	pub attributes: JsonMap<String, JsonValue>,
}
impl TargetRecord {
	/// Creates a record without extra attributes.
	pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
		Self { id: id.into(), email: email.into(), attributes: JsonMap::new() }
	}

	/// Adds an attribute.
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
		self.attributes.insert(key.into(), value.into());

		self
	}
}

/// Failure raised by a repository backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum LookupError {
	/// Backend-level failure.
	#[error("Proposable lookup failed: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Repository contract: find at most one record of `entity_type` by email.
pub trait ProposableRepository
where
	Self: Send + Sync,
{
	/// Returns the first record of `entity_type` matching `email`.
	fn find_one_by_email<'a>(
		&'a self,
		entity_type: &'a str,
		email: &'a str,
	) -> LookupFuture<'a, Option<TargetRecord>>;
}

/// Lookup capability bound to one proposable type.
pub trait ProposableLookup
where
	Self: Send + Sync,
{
	/// Type name this capability serves; stored on proposals that target it.
	fn type_name(&self) -> &str;

	/// Returns the first record matching `email`.
	fn find_one_by_email<'a>(&'a self, email: &'a str) -> LookupFuture<'a, Option<TargetRecord>>;
}

/// Registry contract: resolve a type name into a lookup capability.
pub trait ProposableRegistry
where
	Self: Send + Sync,
{
	/// Returns the capability registered for `type_name`, if any.
	fn resolve(&self, type_name: &str) -> Option<Arc<dyn ProposableLookup>>;
}

/// Proposable target given either by name or by capability.
#[derive(Clone)]
pub enum ProposableTarget {
	/// Type name resolved through the registry on first use.
	Name(String),
	/// Capability used directly; its type name is what gets stored.
	Capability(Arc<dyn ProposableLookup>),
}
impl Debug for ProposableTarget {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Name(name) => f.debug_tuple("ProposableTarget::Name").field(name).finish(),
			Self::Capability(lookup) =>
				f.debug_tuple("ProposableTarget::Capability").field(&lookup.type_name()).finish(),
		}
	}
}
impl From<&str> for ProposableTarget {
	fn from(name: &str) -> Self {
		Self::Name(name.to_owned())
	}
}
impl From<String> for ProposableTarget {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}
impl From<Arc<dyn ProposableLookup>> for ProposableTarget {
	fn from(lookup: Arc<dyn ProposableLookup>) -> Self {
		Self::Capability(lookup)
	}
}
