//! In-process [`ProposableRepository`] for local development and tests.

// self
use crate::{
	_prelude::*,
	target::{LookupFuture, ProposableRepository, TargetRecord},
};

type DirectoryMap = Arc<RwLock<HashMap<String, Vec<TargetRecord>>>>;

/// Records grouped by entity type; emails compare case-insensitively.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory(DirectoryMap);
impl MemoryDirectory {
	/// Adds a record under `entity_type`.
	pub fn insert(&self, entity_type: impl Into<String>, record: TargetRecord) {
		self.0.write().entry(entity_type.into()).or_default().push(record);
	}

	/// Removes every record of `entity_type` matching `email`; returns how many were removed.
	pub fn remove(&self, entity_type: &str, email: &str) -> usize {
		let mut guard = self.0.write();

		match guard.get_mut(entity_type) {
			Some(records) => {
				let before = records.len();

				records.retain(|record| !record.email.eq_ignore_ascii_case(email));

				before - records.len()
			},
			None => 0,
		}
	}

	fn find_now(map: &DirectoryMap, entity_type: &str, email: &str) -> Option<TargetRecord> {
		map.read()
			.get(entity_type)?
			.iter()
			.find(|record| record.email.eq_ignore_ascii_case(email))
			.cloned()
	}
}
impl ProposableRepository for MemoryDirectory {
	fn find_one_by_email<'a>(
		&'a self,
		entity_type: &'a str,
		email: &'a str,
	) -> LookupFuture<'a, Option<TargetRecord>> {
		Box::pin(async move { Ok(Self::find_now(&self.0, entity_type, email)) })
	}
}
