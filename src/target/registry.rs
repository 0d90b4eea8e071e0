//! Name-keyed registry of proposable lookups.

// self
use crate::{
	_prelude::*,
	target::{LookupFuture, ProposableLookup, ProposableRegistry, ProposableRepository, TargetRecord},
};

/// Lookup capability that forwards to a shared repository under a fixed entity type.
#[derive(Clone)]
pub struct RepositoryLookup {
	type_name: String,
	repository: Arc<dyn ProposableRepository>,
}
impl RepositoryLookup {
	/// Binds `repository` to `type_name`.
	pub fn new(type_name: impl Into<String>, repository: Arc<dyn ProposableRepository>) -> Self {
		Self { type_name: type_name.into(), repository }
	}
}
impl ProposableLookup for RepositoryLookup {
	fn type_name(&self) -> &str {
		&self.type_name
	}

	fn find_one_by_email<'a>(&'a self, email: &'a str) -> LookupFuture<'a, Option<TargetRecord>> {
		self.repository.find_one_by_email(&self.type_name, email)
	}
}
impl Debug for RepositoryLookup {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RepositoryLookup").field("type_name", &self.type_name).finish()
	}
}

/// Registry populated up front by the host application.
#[derive(Clone, Default)]
pub struct StaticRegistry {
	entries: HashMap<String, Arc<dyn ProposableLookup>>,
}
impl StaticRegistry {
	/// Registers a capability under its own type name, replacing any previous entry.
	pub fn register(mut self, lookup: Arc<dyn ProposableLookup>) -> Self {
		self.entries.insert(lookup.type_name().to_owned(), lookup);

		self
	}

	/// Registers `type_name` as served by `repository`.
	pub fn bind_repository(
		self,
		type_name: impl Into<String>,
		repository: Arc<dyn ProposableRepository>,
	) -> Self {
		self.register(Arc::new(RepositoryLookup::new(type_name, repository)))
	}

	/// Registered type names, sorted.
	pub fn type_names(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();

		names.sort_unstable();

		names
	}
}
impl ProposableRegistry for StaticRegistry {
	fn resolve(&self, type_name: &str) -> Option<Arc<dyn ProposableLookup>> {
		self.entries.get(type_name).cloned()
	}
}
impl Debug for StaticRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StaticRegistry").field("types", &self.type_names()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::target::MemoryDirectory;

	#[tokio::test]
	async fn bound_repository_answers_for_its_type_only() {
		let directory = Arc::new(MemoryDirectory::default());

		directory.insert("User", TargetRecord::new("1", "ada@example.com"));
		directory.insert("Admin", TargetRecord::new("2", "ada@example.com"));

		let registry = StaticRegistry::default().bind_repository("User", directory.clone());
		let lookup = registry.resolve("User").expect("User should be registered.");
		let found = lookup
			.find_one_by_email("ada@example.com")
			.await
			.expect("Directory lookups should not fail.")
			.expect("Record should be found.");

		assert_eq!(found.id, "1");
		assert_eq!(lookup.type_name(), "User");
		assert!(registry.resolve("Admin").is_none());
		assert_eq!(registry.type_names(), ["User"]);
	}
}
