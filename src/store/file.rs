//! Simple file-backed [`ProposalStore`] for lightweight deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	proposal::{ProposalId, ProposalToken},
	store::{
		ContextFilter, ProposalQuery, ProposalStore, StoreError, StoreFuture, table::ProposalTable,
	},
};

/// Persists proposals to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<ProposalTable>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let table =
			if path.exists() { Self::load_snapshot(&path)? } else { ProposalTable::default() };

		Ok(Self { path, inner: Arc::new(RwLock::new(table)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<ProposalTable, StoreError> {
		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(ProposalTable::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;
		let de = &mut serde_json::Deserializer::from_slice(&bytes);
		let rows: Vec<ProposalToken> =
			serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
				message: format!(
					"Failed to parse {} at `{}`: {}",
					path.display(),
					e.path(),
					e.inner()
				),
			})?;

		ProposalTable::from_rows(rows)
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, table: &ProposalTable) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let snapshot: Vec<_> = table.rows().collect();
		let serialized =
			serde_json::to_vec_pretty(&snapshot).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize store snapshot: {e}"),
			})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	// A failed flush rolls the table back so memory never runs ahead of the file.
	fn write_through(
		&self,
		apply: impl FnOnce(&mut ProposalTable) -> Result<ProposalToken, StoreError>,
	) -> Result<ProposalToken, StoreError> {
		let mut guard = self.inner.write();
		let before: Vec<ProposalToken> = guard.rows().cloned().collect();
		let stored = apply(&mut *guard)?;

		if let Err(e) = self.persist_locked(&*guard) {
			*guard = ProposalTable::from_rows(before)?;

			return Err(e);
		}

		Ok(stored)
	}
}
impl ProposalStore for FileStore {
	fn insert(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken> {
		Box::pin(async move {
			self.write_through(|table| table.insert(record, OffsetDateTime::now_utc()))
		})
	}

	fn update(&self, record: ProposalToken) -> StoreFuture<'_, ProposalToken> {
		Box::pin(async move { self.write_through(|table| table.update(record)) })
	}

	fn fetch(&self, id: ProposalId) -> StoreFuture<'_, Option<ProposalToken>> {
		Box::pin(async move { Ok(self.inner.read().fetch(id)) })
	}

	fn find_one<'a>(&'a self, query: &'a ProposalQuery) -> StoreFuture<'a, Option<ProposalToken>> {
		Box::pin(async move { Ok(self.inner.read().find_one(query)) })
	}

	fn find_by_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<ProposalToken>> {
		Box::pin(async move { Ok(self.inner.read().find_by_token(token)) })
	}

	fn find_by_context<'a>(
		&'a self,
		filter: &'a ContextFilter,
	) -> StoreFuture<'a, Vec<ProposalToken>> {
		Box::pin(async move { Ok(self.inner.read().find_by_context(filter)) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::proposal::Lifetime;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"proposal_token_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record(email: &str) -> ProposalToken {
		let mut record = ProposalToken::new(email, "User").with_context(["org", "1"]);

		record.prepare_for_create(OffsetDateTime::now_utc(), Lifetime::CalendarYear);

		record
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let stored = rt
			.block_on(store.insert(build_record("a@example.com")))
			.expect("Failed to insert fixture record into file store.");
		let secret = stored.token().expect("Stored record should carry a token.").clone();

		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.find_by_token(secret.expose()))
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.id(), stored.id());
		assert_eq!(fetched.context(), Some("org:1"));

		let duplicate = rt.block_on(reopened.insert(build_record("a@example.com")));

		assert!(
			matches!(duplicate, Err(StoreError::UniqueViolation { .. })),
			"Reloaded indexes must still reject duplicates."
		);

		let next = rt
			.block_on(reopened.insert(build_record("b@example.com")))
			.expect("Fresh tuple should insert after reload.");

		assert_eq!(next.id(), Some(ProposalId(2)));

		let query = ProposalQuery::new("b@example.com", "User");

		assert!(rt.block_on(reopened.find_one(&query)).expect("Lookup should succeed.").is_some());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshot_reports_json_path() {
		let path = temp_path();

		fs::write(&path, br#"[{"id": "not-a-number"}]"#).expect("Failed to write corrupt snapshot.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshot must not load.");

		assert!(
			matches!(&err, StoreError::Serialization { message } if message.contains("[0].id")),
			"Unexpected error: {err}"
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
