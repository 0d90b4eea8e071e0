//! Proposal engine: the facade that ties tokens to a store and a proposable registry.

mod lifecycle;
mod save;

// self
use crate::{
	_prelude::*,
	obs::{self, OpKind, OpOutcome, OpSpan},
	proposal::{Lifetime, ProposalAction, ProposalId, ProposalToken, Resource, ResourceRef},
	store::{ContextFilter, ProposalQuery, ProposalStore, ResourceFilter},
	target::{ProposableRegistry, TargetRecord},
};

/// Engine settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Lifetime applied to new proposals saved without an expiry.
	pub default_lifetime: Lifetime,
}
impl EngineConfig {
	/// Overrides the default lifetime (one calendar year).
	pub fn with_default_lifetime(mut self, lifetime: Lifetime) -> Self {
		self.default_lifetime = lifetime;

		self
	}
}

/// Parameters for [`ProposalEngine::find_or_new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProposalRequest {
	/// Invitee email.
	pub email: String,
	/// Proposable type name.
	pub proposable_type: String,
	/// Owning resource; when absent the lookup ignores the resource columns.
	pub resource: Option<ResourceRef>,
}
impl ProposalRequest {
	/// Creates a request without an owning resource.
	pub fn new(email: impl Into<String>, proposable_type: impl Into<String>) -> Self {
		Self { email: email.into(), proposable_type: proposable_type.into(), resource: None }
	}

	/// Scopes the request to `resource`.
	pub fn for_resource<R>(self, resource: &R) -> Self
	where
		R: ?Sized + Resource,
	{
		self.with_resource(Some(ResourceRef::of(resource)))
	}

	/// Sets or clears the owning resource.
	pub fn with_resource(mut self, resource: Option<ResourceRef>) -> Self {
		self.resource = resource;

		self
	}

	/// Store query built from the request: email + type, plus the resource when given.
	pub fn query(&self) -> ProposalQuery {
		let filter = match &self.resource {
			Some(resource) => ResourceFilter::Exactly(Some(resource.clone())),
			None => ResourceFilter::Any,
		};

		ProposalQuery::new(&self.email, &self.proposable_type).with_resource(filter)
	}

	fn into_token(self) -> ProposalToken {
		ProposalToken::new(self.email, self.proposable_type).with_resource(self.resource)
	}
}

/// Coordinates proposal lifecycles against a store and a proposable registry.
///
/// The engine never holds locks across operations. Uniqueness checks before a write are
/// advisory; the store's atomic insert decides races between concurrent creators, and the
/// loser receives the same validation error a sequential duplicate would.
#[derive(Clone)]
pub struct ProposalEngine {
	/// Store that persists proposals and enforces the unique indexes.
	pub store: Arc<dyn ProposalStore>,
	/// Registry resolving proposable type names.
	pub registry: Arc<dyn ProposableRegistry>,
	/// Engine settings.
	pub config: EngineConfig,
}
impl ProposalEngine {
	/// Creates an engine.
	pub fn new(
		store: Arc<dyn ProposalStore>,
		registry: Arc<dyn ProposableRegistry>,
		config: EngineConfig,
	) -> Self {
		Self { store, registry, config }
	}

	/// Returns the first stored proposal matching the request, or an unsaved one carrying the
	/// request fields. Never writes.
	pub async fn find_or_new(&self, request: ProposalRequest) -> Result<ProposalToken> {
		const KIND: OpKind = OpKind::FindOrNew;

		let span = OpSpan::new(KIND, "find_or_new");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let query = request.query();
				let found = self.store.find_one(&query).await?;

				Ok(found.unwrap_or_else(|| request.into_token()))
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Proposal for the same email and type under another owning resource.
	pub async fn retarget(
		&self,
		token: &ProposalToken,
		resource: Option<ResourceRef>,
	) -> Result<ProposalToken> {
		let request = ProposalRequest::new(token.email(), token.proposable_type())
			.with_resource(resource);

		self.find_or_new(request).await
	}

	/// Fetches a stored proposal by id.
	pub async fn fetch(&self, id: ProposalId) -> Result<Option<ProposalToken>> {
		Ok(self.store.fetch(id).await?)
	}

	/// Fetches a stored proposal by its token value.
	pub async fn find_by_token(&self, token: &str) -> Result<Option<ProposalToken>> {
		Ok(self.store.find_by_token(token).await?)
	}

	/// Stored proposals whose context equals `tags` joined with `:`.
	pub async fn find_by_context<I, S>(&self, tags: I) -> Result<Vec<ProposalToken>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let filter = ContextFilter::new(tags);

		Ok(self.store.find_by_context(&filter).await?)
	}

	/// Inferred intent for `token`.
	pub async fn action(&self, token: &ProposalToken) -> Result<ProposalAction> {
		token.action(self.registry.as_ref()).await
	}

	/// Returns `true` when `token` would invite an unregistered email.
	pub async fn is_invite(&self, token: &ProposalToken) -> Result<bool> {
		token.is_invite(self.registry.as_ref()).await
	}

	/// Returns `true` when `token` is already on file.
	pub async fn is_remind(&self, token: &ProposalToken) -> Result<bool> {
		token.is_remind(self.registry.as_ref()).await
	}

	/// Returns `true` when `token` would notify an existing record.
	pub async fn is_notify(&self, token: &ProposalToken) -> Result<bool> {
		token.is_notify(self.registry.as_ref()).await
	}

	/// Target record owning the token's email, if any.
	pub async fn instance<'a>(&self, token: &'a ProposalToken) -> Result<Option<&'a TargetRecord>> {
		token.instance(self.registry.as_ref()).await
	}

	/// Target record owning the token's email, failing when absent.
	pub async fn instance_strict<'a>(&self, token: &'a ProposalToken) -> Result<&'a TargetRecord> {
		token.instance_strict(self.registry.as_ref()).await
	}

	/// Accessor named after the proposable type, e.g. `user` for `User`.
	pub async fn instance_named<'a>(
		&self,
		token: &'a ProposalToken,
		name: &str,
	) -> Result<&'a TargetRecord> {
		token.instance_named(name, self.registry.as_ref()).await
	}
}
impl Debug for ProposalEngine {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProposalEngine").field("config", &self.config).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::proposal::{ResourceId, ResourceType};

	#[test]
	fn request_query_constrains_resource_only_when_given() {
		let bare = ProposalRequest::new("a@example.com", "User");

		assert_eq!(bare.query().resource, ResourceFilter::Any);

		let team = ResourceRef::new(
			ResourceType::new("Team").expect("Resource type fixture should be valid."),
			ResourceId::new("1").expect("Resource id fixture should be valid."),
		);
		let scoped = bare.for_resource(&team);

		assert_eq!(scoped.query().resource, ResourceFilter::Exactly(Some(team)));
	}

	#[test]
	fn config_deserializes_with_defaults() {
		let config: EngineConfig = serde_json::from_str("{}").expect("Empty config should parse.");

		assert_eq!(config, EngineConfig::default());
		assert_eq!(config.default_lifetime, Lifetime::CalendarYear);
	}
}
