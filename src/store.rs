//! Storage contracts and built-in store implementations for proposal tokens.
//!
//! Stores are the final arbiter of uniqueness: every insert and update is an atomic
//! check-and-write against the `(email, proposable_type, resource_type, resource_id)` index
//! and the token-value index. Engine-side lookups before a write are advisory only.

pub mod file;
pub mod memory;

mod table;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	proposal::{ProposalId, ProposalToken, ResourceId, ResourceRef, ResourceType, record},
};

/// Boxed future returned by [`ProposalStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by proposal stores.
pub trait ProposalStore
where
	Self: Send + Sync,
{
	/// Inserts a new proposal, assigning its id. Fails on any unique-index collision.
	fn insert(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken>;

	/// Replaces a persisted proposal. Fails when the id is unknown, the token value changed, or
	/// the new uniqueness tuple collides with another proposal.
	fn update(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken>;

	/// Fetches a proposal by id.
	fn fetch(&self, id: ProposalId) -> StoreFuture<'_, Option<ProposalToken>>;

	/// First proposal (ascending id) matching the query.
	fn find_one<'a>(&'a self, query: &'a ProposalQuery) -> StoreFuture<'a, Option<ProposalToken>>;

	/// Fetches a proposal by its token value.
	fn find_by_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<ProposalToken>>;

	/// Every proposal whose context equals the filter, ascending by id.
	fn find_by_context<'a>(
		&'a self,
		filter: &'a ContextFilter,
	) -> StoreFuture<'a, Vec<ProposalToken>>;
}

/// Unique constraints enforced by stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueConstraint {
	/// `(email, proposable_type, resource_type, resource_id)`.
	Outstanding,
	/// `token`.
	Token,
}
impl UniqueConstraint {
	/// Returns a stable label for messages.
	pub const fn as_str(self) -> &'static str {
		match self {
			UniqueConstraint::Outstanding => "outstanding_proposal",
			UniqueConstraint::Token => "token",
		}
	}
}

/// Error type produced by [`ProposalStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// A write collided with an existing row on a unique index.
	#[error("Unique constraint `{}` violated.", .constraint.as_str())]
	UniqueViolation {
		/// Index that rejected the write.
		constraint: UniqueConstraint,
	},
	/// Update targeted an id that is not stored.
	#[error("Proposal {id} does not exist.")]
	NotFound {
		/// Missing identifier.
		id: ProposalId,
	},
	/// Update tried to change a column that is write-once.
	#[error("Column `{column}` cannot be changed once stored.")]
	Immutable {
		/// Column name.
		column: String,
	},
	/// Insert received a proposal that is already persisted, or update an unsaved one.
	#[error("Proposal persistence state does not match the requested write.")]
	PersistenceState,
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Key of the outstanding-proposal unique index. Null resource columns are part of the key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniquenessKey {
	/// Invitee email.
	pub email: String,
	/// Proposable type name.
	pub proposable_type: String,
	/// Owning resource type column.
	pub resource_type: Option<ResourceType>,
	/// Owning resource id column.
	pub resource_id: Option<ResourceId>,
}
impl UniquenessKey {
	/// Key of a stored or pending proposal.
	pub fn of(record: &ProposalToken) -> Self {
		Self {
			email: record.email().to_owned(),
			proposable_type: record.proposable_type().to_owned(),
			resource_type: record.resource_type().cloned(),
			resource_id: record.resource_id().cloned(),
		}
	}

	/// Stable base64 (no padding) SHA-256 digest of the key columns.
	///
	/// Columns are length-prefixed so no two distinct keys share a preimage, and null columns
	/// encode differently from empty strings.
	pub fn fingerprint(&self) -> String {
		let mut hasher = Sha256::new();

		for column in [
			Some(self.email.as_str()),
			Some(self.proposable_type.as_str()),
			self.resource_type.as_deref(),
			self.resource_id.as_deref(),
		] {
			match column {
				Some(value) => {
					hasher.update([1_u8]);
					hasher.update((value.len() as u64).to_be_bytes());
					hasher.update(value.as_bytes());
				},
				None => hasher.update([0_u8]),
			}
		}

		STANDARD_NO_PAD.encode(hasher.finalize())
	}
}

/// Resource constraint of a [`ProposalQuery`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResourceFilter {
	/// Resource columns are not constrained.
	#[default]
	Any,
	/// Resource columns must equal the value, `None` meaning both null.
	Exactly(Option<ResourceRef>),
}

/// Lookup constraints for [`ProposalStore::find_one`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalQuery {
	/// Invitee email.
	pub email: String,
	/// Proposable type name.
	pub proposable_type: String,
	/// Resource constraint.
	pub resource: ResourceFilter,
	/// Proposal to skip, typically the one being validated.
	pub exclude: Option<ProposalId>,
}
impl ProposalQuery {
	/// Matches any resource for the email + type pair.
	pub fn new(email: impl Into<String>, proposable_type: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			proposable_type: proposable_type.into(),
			resource: ResourceFilter::Any,
			exclude: None,
		}
	}

	/// Query selecting the rows that share `record`'s uniqueness key, other than `record`.
	pub fn conflicting_with(record: &ProposalToken) -> Self {
		Self::new(record.email(), record.proposable_type())
			.with_resource(ResourceFilter::Exactly(record.resource()))
			.excluding(record.id())
	}

	/// Sets the resource constraint.
	pub fn with_resource(mut self, resource: ResourceFilter) -> Self {
		self.resource = resource;

		self
	}

	/// Skips the proposal with this id.
	pub fn excluding(mut self, id: Option<ProposalId>) -> Self {
		self.exclude = id;

		self
	}

	/// Returns `true` when `record` satisfies every constraint.
	pub fn matches(&self, record: &ProposalToken) -> bool {
		if self.exclude.is_some() && self.exclude == record.id() {
			return false;
		}
		if record.email() != self.email || record.proposable_type() != self.proposable_type {
			return false;
		}

		match &self.resource {
			ResourceFilter::Any => true,
			ResourceFilter::Exactly(resource) =>
				record.resource_type() == resource.as_ref().map(|r| &r.resource_type)
					&& record.resource_id() == resource.as_ref().map(|r| &r.resource_id),
		}
	}
}

/// Filter selecting proposals whose context equals the tags joined with `:`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContextFilter(String);
impl ContextFilter {
	/// Joins `tags` with `:`.
	pub fn new<I, S>(tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self(record::join_context(tags))
	}

	/// Joined context value.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when `record` carries exactly this context.
	pub fn matches(&self, record: &ProposalToken) -> bool {
		record.context() == Some(self.0.as_str())
	}
}
