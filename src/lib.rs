//! Single-use, expiring proposal tokens: invite unregistered emails, remind pending invitees,
//! notify registered users, all from one lifecycle with store-enforced uniqueness.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod engine;
pub mod error;
pub mod obs;
pub mod proposal;
pub mod store;
pub mod target;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		engine::{EngineConfig, ProposalEngine},
		store::{MemoryStore, ProposalStore},
		target::{MemoryDirectory, ProposableRegistry, StaticRegistry},
	};

	/// Proposable type registered by [`build_test_engine`].
	pub const TEST_PROPOSABLE: &str = "User";

	/// Constructs a [`ProposalEngine`] backed by an in-memory store and an in-memory directory
	/// registered under [`TEST_PROPOSABLE`].
	pub fn build_test_engine() -> (ProposalEngine, Arc<MemoryStore>, Arc<MemoryDirectory>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn ProposalStore> = store_backend.clone();
		let directory = Arc::new(MemoryDirectory::default());
		let registry: Arc<dyn ProposableRegistry> =
			Arc::new(StaticRegistry::default().bind_repository(TEST_PROPOSABLE, directory.clone()));
		let engine = ProposalEngine::new(store, registry, EngineConfig::default());

		(engine, store_backend, directory)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::{Arc, OnceLock},
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use serde_json;
pub use time;
#[cfg(test)] use color_eyre as _;
