//! Validation and persistence of proposals.

// self
use crate::{
	_prelude::*,
	engine::ProposalEngine,
	obs::{self, OpKind, OpOutcome, OpSpan},
	proposal::{self, OUTSTANDING_MESSAGE, ProposalToken, ValidationErrors},
	store::{ProposalQuery, StoreError, UniqueConstraint},
};

impl ProposalEngine {
	/// Runs every check against `token` and reports all failures together.
	///
	/// Order: presence, argument contract, email shape, then the advisory uniqueness lookup.
	pub async fn validate(&self, token: &ProposalToken) -> Result<()> {
		let mut errors = ValidationErrors::default();

		proposal::check_presence(
			&mut errors,
			[
				("email", !token.email().trim().is_empty()),
				("token", token.token().is_some()),
				("proposable", token.proposable(self.registry.as_ref()).is_ok()),
				("proposable_type", !token.proposable_type().trim().is_empty()),
				("expires_at", token.expires_at().is_some()),
			],
		);
		proposal::check_arguments(&mut errors, token.expects(), token.arguments());
		proposal::check_email(&mut errors, token.email());

		if self.store.find_one(&ProposalQuery::conflicting_with(token)).await?.is_some() {
			errors.add("email", OUTSTANDING_MESSAGE);
		}

		errors.into_result().map_err(Error::from)
	}

	/// Validates and writes `token`.
	///
	/// New proposals first receive a token value and, when unset, an expiry from the configured
	/// lifetime; they are then inserted. Persisted proposals are updated in place. A unique-index
	/// rejection from the store is reported as a validation failure. Store-owned columns (id,
	/// timestamps) reach `token` only once the store accepts the write.
	pub async fn save(&self, token: &mut ProposalToken) -> Result<()> {
		const KIND: OpKind = OpKind::Save;

		let span = OpSpan::new(KIND, "save");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();

				if !token.is_persisted() {
					token.prepare_for_create(now, self.config.default_lifetime);
				}

				self.validate(token).await?;

				let mut staged = token.clone();

				if staged.is_persisted() {
					staged.touch(now);
				}

				let stored = self.persist(staged).await?;

				token.sync_persisted(&stored);

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	// Inserts or updates without validating; unique-index rejections become validation errors.
	pub(super) async fn persist(&self, record: ProposalToken) -> Result<ProposalToken> {
		let stored = if record.is_persisted() {
			self.store.update(record).await
		} else {
			self.store.insert(record).await
		};

		match stored {
			Ok(stored) => Ok(stored),
			Err(StoreError::UniqueViolation { constraint }) => {
				let mut errors = ValidationErrors::default();

				match constraint {
					UniqueConstraint::Outstanding => errors.add("email", OUTSTANDING_MESSAGE),
					UniqueConstraint::Token => errors.add("token", "has already been taken"),
				}

				Err(errors.into())
			},
			Err(e) => Err(e.into()),
		}
	}
}
