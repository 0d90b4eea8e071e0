//! Thread-safe in-memory [`ProposalStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	proposal::{ProposalId, ProposalToken},
	store::{
		ContextFilter, ProposalQuery, ProposalStore, StoreError, StoreFuture, table::ProposalTable,
	},
};

type StoreTable = Arc<RwLock<ProposalTable>>;

/// Thread-safe storage backend that keeps proposals in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreTable);
impl MemoryStore {
	/// Number of stored proposals.
	pub fn len(&self) -> usize {
		self.0.read().rows().count()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn insert_now(table: StoreTable, record: ProposalToken) -> Result<ProposalToken, StoreError> {
		table.write().insert(record, OffsetDateTime::now_utc())
	}

	fn update_now(table: StoreTable, record: ProposalToken) -> Result<ProposalToken, StoreError> {
		table.write().update(record)
	}
}
impl ProposalStore for MemoryStore {
	fn insert(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken> {
		let table = self.0.clone();

		Box::pin(async move { Self::insert_now(table, record) })
	}

	fn update(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken> {
		let table = self.0.clone();

		Box::pin(async move { Self::update_now(table, record) })
	}

	fn fetch(&self, id: ProposalId) -> StoreFuture<'_, Option<ProposalToken>> {
		let table = self.0.clone();

		Box::pin(async move { Ok(table.read().fetch(id)) })
	}

	fn find_one<'a>(&'a self, query: &'a ProposalQuery) -> StoreFuture<'a, Option<ProposalToken>> {
		let table = self.0.clone();

		Box::pin(async move { Ok(table.read().find_one(query)) })
	}

	fn find_by_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<ProposalToken>> {
		let table = self.0.clone();

		Box::pin(async move { Ok(table.read().find_by_token(token)) })
	}

	fn find_by_context<'a>(
		&'a self,
		filter: &'a ContextFilter,
	) -> StoreFuture<'a, Vec<ProposalToken>> {
		let table = self.0.clone();

		Box::pin(async move { Ok(table.read().find_by_context(filter)) })
	}
}
