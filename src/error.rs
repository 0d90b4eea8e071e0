//! Crate-level error types shared across the engine, stores, and target lookups.

// self
use crate::{_prelude::*, proposal::ValidationErrors, target::LookupError};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Proposable repository failure.
	#[error(transparent)]
	Lookup(#[from] LookupError),
	/// One or more field validations failed; the caller should correct and retry.
	#[error(transparent)]
	Validation(#[from] ValidationErrors),

	/// Strict instance lookup found no record for the token's email.
	#[error("No {proposable_type} record matches the proposal email.")]
	TargetRecordNotFound {
		/// Proposable type that was searched.
		proposable_type: String,
		/// Email used for the lookup.
		email: String,
	},
	/// The registry does not know the proposable type.
	#[error("Proposable type `{type_name}` is not registered.")]
	UnknownProposable {
		/// Unresolved type name.
		type_name: String,
	},
	/// Strict accept attempted at or past `expires_at`.
	#[error("Token has expired.")]
	TokenExpired,
	/// Strict accept attempted on a token that was already accepted.
	#[error("Token has already been accepted.")]
	TokenAlreadyAccepted,
	/// Strict remind attempted while the inferred action is not `remind`.
	#[error("Proposal has not been made.")]
	ReminderNotApplicable,
	/// The computed-expiry setter received a literal instant.
	#[error("Expires must be computed from a callable.")]
	InvalidExpiryInput,
	/// Named accessor does not match the proposable type.
	#[error("No accessor named `{name}` on this proposal.")]
	NoSuchAccessor {
		/// Requested accessor name.
		name: String,
	},
}
