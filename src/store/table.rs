//! Indexed row set shared by the built-in stores.

// self
use crate::{
	_prelude::*,
	proposal::{ProposalId, ProposalToken},
	store::{
		ContextFilter, ProposalQuery, ResourceFilter, StoreError, UniqueConstraint, UniquenessKey,
	},
};

/// Rows keyed by id plus the two unique indexes. Callers hold the surrounding lock for the
/// whole check-and-write.
#[derive(Debug, Default)]
pub(crate) struct ProposalTable {
	rows: BTreeMap<ProposalId, ProposalToken>,
	outstanding: HashMap<String, ProposalId>,
	tokens: HashMap<String, ProposalId>,
	last_id: u64,
}
impl ProposalTable {
	/// Rebuilds the indexes from persisted rows, rejecting snapshots that already violate them.
	pub(crate) fn from_rows(rows: Vec<ProposalToken>) -> Result<Self, StoreError> {
		let mut table = Self::default();

		for row in rows {
			let id = row.id().ok_or(StoreError::PersistenceState)?;

			table.claim(&row, id)?;
			table.last_id = table.last_id.max(id.0);
			table.rows.insert(id, row);
		}

		Ok(table)
	}

	pub(crate) fn rows(&self) -> impl Iterator<Item = &ProposalToken> {
		self.rows.values()
	}

	pub(crate) fn insert(
		&mut self,
		mut record: ProposalToken,
		instant: OffsetDateTime,
	) -> Result<ProposalToken, StoreError> {
		if record.is_persisted() {
			return Err(StoreError::PersistenceState);
		}

		let id = ProposalId(self.last_id + 1);

		self.claim(&record, id)?;
		self.last_id = id.0;
		record.mark_inserted(id, instant);
		self.rows.insert(id, record.clone());

		Ok(record)
	}

	pub(crate) fn update(&mut self, record: ProposalToken) -> Result<ProposalToken, StoreError> {
		let id = record.id().ok_or(StoreError::PersistenceState)?;
		let existing = self.rows.get(&id).ok_or(StoreError::NotFound { id })?;

		if existing.token() != record.token() {
			return Err(StoreError::Immutable { column: "token".into() });
		}
		if existing.accepted_at().is_some() && existing.accepted_at() != record.accepted_at() {
			return Err(StoreError::Immutable { column: "accepted_at".into() });
		}

		let previous = UniquenessKey::of(existing).fingerprint();
		let next = UniquenessKey::of(&record).fingerprint();

		if previous != next {
			if self.outstanding.contains_key(&next) {
				return Err(StoreError::UniqueViolation {
					constraint: UniqueConstraint::Outstanding,
				});
			}

			self.outstanding.remove(&previous);
			self.outstanding.insert(next, id);
		}

		self.rows.insert(id, record.clone());

		Ok(record)
	}

	pub(crate) fn fetch(&self, id: ProposalId) -> Option<ProposalToken> {
		self.rows.get(&id).cloned()
	}

	pub(crate) fn find_one(&self, query: &ProposalQuery) -> Option<ProposalToken> {
		match &query.resource {
			ResourceFilter::Exactly(resource) => {
				let key = UniquenessKey {
					email: query.email.clone(),
					proposable_type: query.proposable_type.clone(),
					resource_type: resource.as_ref().map(|r| r.resource_type.clone()),
					resource_id: resource.as_ref().map(|r| r.resource_id.clone()),
				};

				self.outstanding
					.get(&key.fingerprint())
					.and_then(|id| self.rows.get(id))
					.filter(|row| query.matches(row))
					.cloned()
			},
			ResourceFilter::Any => self.rows.values().find(|row| query.matches(row)).cloned(),
		}
	}

	pub(crate) fn find_by_token(&self, token: &str) -> Option<ProposalToken> {
		self.tokens.get(token).and_then(|id| self.rows.get(id)).cloned()
	}

	pub(crate) fn find_by_context(&self, filter: &ContextFilter) -> Vec<ProposalToken> {
		self.rows.values().filter(|row| filter.matches(row)).cloned().collect()
	}

	// Both indexes are checked before either is written so a rejected row leaves no trace.
	fn claim(&mut self, record: &ProposalToken, id: ProposalId) -> Result<(), StoreError> {
		let fingerprint = UniquenessKey::of(record).fingerprint();

		if self.outstanding.contains_key(&fingerprint) {
			return Err(StoreError::UniqueViolation { constraint: UniqueConstraint::Outstanding });
		}
		if let Some(secret) = record.token()
			&& self.tokens.contains_key(secret.expose())
		{
			return Err(StoreError::UniqueViolation { constraint: UniqueConstraint::Token });
		}

		self.outstanding.insert(fingerprint, id);

		if let Some(secret) = record.token() {
			self.tokens.insert(secret.expose().to_owned(), id);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::proposal::Lifetime;

	const CREATED: OffsetDateTime = macros::datetime!(2025-01-01 00:00 UTC);

	fn prepared(email: &str) -> ProposalToken {
		let mut token = ProposalToken::new(email, "User");

		token.prepare_for_create(CREATED, Lifetime::CalendarYear);

		token
	}

	#[test]
	fn insert_assigns_sequential_ids_and_timestamps() {
		let mut table = ProposalTable::default();
		let now = CREATED;
		let first = table.insert(prepared("a@example.com"), now).expect("First insert should pass.");
		let second =
			table.insert(prepared("b@example.com"), now).expect("Second insert should pass.");

		assert_eq!(first.id(), Some(ProposalId(1)));
		assert_eq!(second.id(), Some(ProposalId(2)));
		assert_eq!(first.created_at(), Some(now));
	}

	#[test]
	fn insert_rejects_duplicate_tuple_without_side_effects() {
		let mut table = ProposalTable::default();
		let now = OffsetDateTime::now_utc();

		table.insert(prepared("a@example.com"), now).expect("First insert should pass.");

		let err = table
			.insert(prepared("a@example.com"), now)
			.expect_err("Duplicate tuple must be rejected.");

		assert_eq!(err, StoreError::UniqueViolation { constraint: UniqueConstraint::Outstanding });
		assert_eq!(table.rows().count(), 1);
		assert_eq!(table.tokens.len(), 1);
	}

	#[test]
	fn update_enforces_write_once_columns() {
		let mut table = ProposalTable::default();
		let now = CREATED + Duration::days(30);
		let mut stored = table.insert(prepared("a@example.com"), now).expect("Insert should pass.");

		assert!(stored.accept_at(now), "Fixture must still be acceptable at a fixed instant.");

		let stored = table.update(stored).expect("Accepting should be writable.");
		let forged: ProposalToken = serde_json::from_value({
			let mut payload = serde_json::to_value(&stored).expect("Row should serialize.");

			payload["accepted_at"] = JsonValue::Null;

			payload
		})
		.expect("Row should parse.");

		assert_eq!(
			table.update(forged).err(),
			Some(StoreError::Immutable { column: "accepted_at".into() })
		);

		let forged: ProposalToken = serde_json::from_value({
			let mut payload = serde_json::to_value(&stored).expect("Row should serialize.");

			payload["token"] = "another".into();

			payload
		})
		.expect("Row should parse.");

		assert_eq!(
			table.update(forged).err(),
			Some(StoreError::Immutable { column: "token".into() })
		);
	}

	#[test]
	fn snapshot_reload_rejects_conflicting_rows() {
		let mut table = ProposalTable::default();
		let now = OffsetDateTime::now_utc();
		let stored = table.insert(prepared("a@example.com"), now).expect("Insert should pass.");
		let mut clash: ProposalToken = serde_json::from_value({
			let mut payload = serde_json::to_value(&stored).expect("Row should serialize.");

			payload["id"] = 2.into();

			payload
		})
		.expect("Row should parse.");

		assert!(ProposalTable::from_rows(vec![stored.clone(), clash.clone()]).is_err());

		clash = prepared("b@example.com");

		assert_eq!(ProposalTable::from_rows(vec![clash]).err(), Some(StoreError::PersistenceState));

		let reloaded = ProposalTable::from_rows(vec![stored]).expect("Clean snapshot should load.");

		assert_eq!(reloaded.last_id, 1);
	}
}
