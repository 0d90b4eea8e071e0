//! Proposal token records, their lifecycle transitions, and action inference.

// self
use crate::{
	_prelude::*,
	proposal::{
		Arguments, ExpiryInput, Expects, Lifetime, ProposalId, ProposalSecret, ResourceId,
		ResourceType,
	},
	target::{ProposableLookup, ProposableRegistry, ProposableTarget, TargetRecord},
};

/// Intent inferred from a proposal's persistence state and its target record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalAction {
	/// Unsaved proposal for an email with no matching record.
	Invite,
	/// Proposal already on file.
	Remind,
	/// Unsaved proposal for an email that already has a record.
	Notify,
}
impl ProposalAction {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProposalAction::Invite => "invite",
			ProposalAction::Remind => "remind",
			ProposalAction::Notify => "notify",
		}
	}
}
impl Display for ProposalAction {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Anything that can own proposals.
pub trait Resource {
	/// Type name stored in `resource_type`.
	fn resource_type(&self) -> ResourceType;

	/// Identifier stored in `resource_id`.
	fn resource_id(&self) -> ResourceId;
}

/// Owned reference to a [`Resource`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
	/// Owning resource type.
	pub resource_type: ResourceType,
	/// Owning resource identifier.
	pub resource_id: ResourceId,
}
impl ResourceRef {
	/// Creates a reference from already validated parts.
	pub fn new(resource_type: ResourceType, resource_id: ResourceId) -> Self {
		Self { resource_type, resource_id }
	}

	/// Captures the type and identifier of `resource`.
	pub fn of<R>(resource: &R) -> Self
	where
		R: ?Sized + Resource,
	{
		Self::new(resource.resource_type(), resource.resource_id())
	}
}
impl Resource for ResourceRef {
	fn resource_type(&self) -> ResourceType {
		self.resource_type.clone()
	}

	fn resource_id(&self) -> ResourceId {
		self.resource_id.clone()
	}
}

/// Single-use token binding an email to a proposable type, optionally scoped to a resource.
///
/// The token value, `accepted_at`, and the persistence fields have no public setters: the
/// value is generated once before the first insert, and acceptance only moves forward.
/// Resolved lookups and matched target records are cached on the value itself; clones start
/// with empty caches.
#[derive(Serialize, Deserialize)]
pub struct ProposalToken {
	id: Option<ProposalId>,
	email: String,
	token: Option<ProposalSecret>,
	proposable_type: String,
	resource_type: Option<ResourceType>,
	resource_id: Option<ResourceId>,
	arguments: Option<Arguments>,
	#[serde(with = "time::serde::rfc3339::option")]
	expires_at: Option<OffsetDateTime>,
	#[serde(with = "time::serde::rfc3339::option")]
	accepted_at: Option<OffsetDateTime>,
	#[serde(with = "time::serde::rfc3339::option")]
	reminded_at: Option<OffsetDateTime>,
	context: Option<String>,
	#[serde(with = "time::serde::rfc3339::option")]
	created_at: Option<OffsetDateTime>,
	#[serde(with = "time::serde::rfc3339::option")]
	updated_at: Option<OffsetDateTime>,
	#[serde(skip)]
	expects: Expects,
	#[serde(skip)]
	proposable: OnceLock<Arc<dyn ProposableLookup>>,
	#[serde(skip)]
	instance: OnceLock<TargetRecord>,
}
impl ProposalToken {
	/// Creates an unsaved proposal for `email` targeting `proposable`.
	pub fn new(email: impl Into<String>, proposable: impl Into<ProposableTarget>) -> Self {
		let mut token = Self {
			id: None,
			email: email.into(),
			token: None,
			proposable_type: String::new(),
			resource_type: None,
			resource_id: None,
			arguments: None,
			expires_at: None,
			accepted_at: None,
			reminded_at: None,
			context: None,
			created_at: None,
			updated_at: None,
			expects: Expects::None,
			proposable: OnceLock::new(),
			instance: OnceLock::new(),
		};

		token.set_proposable(proposable);

		token
	}

	/// Scopes the proposal to an owning resource.
	pub fn with_resource(mut self, resource: Option<ResourceRef>) -> Self {
		let (resource_type, resource_id) = match resource {
			Some(ResourceRef { resource_type, resource_id }) =>
				(Some(resource_type), Some(resource_id)),
			None => (None, None),
		};

		self.resource_type = resource_type;
		self.resource_id = resource_id;

		self
	}

	/// Attaches the argument payload; the last call wins.
	///
	/// A JSON object is stored as a keyed payload; arrays and scalars are stored positionally.
	pub fn with(mut self, arguments: impl Into<Arguments>) -> Self {
		self.arguments = Some(arguments.into());

		self
	}

	/// Sets the transient argument contract checked on save.
	pub fn expecting(mut self, expects: impl Into<Expects>) -> Self {
		self.expects = expects.into();

		self
	}

	/// Sets a literal expiry instant.
	pub fn with_expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets the context tag, joining `tags` with `:`.
	pub fn with_context<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.context = Some(join_context(tags));

		self
	}

	/// Computed-expiry setter: runs the callable now and stores its result.
	///
	/// Literal instants are rejected with [`Error::InvalidExpiryInput`]; use
	/// [`with_expires_at`](Self::with_expires_at) for those.
	pub fn set_expires(&mut self, input: ExpiryInput) -> Result<()> {
		match input {
			ExpiryInput::Computed(compute) => {
				self.expires_at = Some(compute());

				Ok(())
			},
			ExpiryInput::At(_) => Err(Error::InvalidExpiryInput),
		}
	}

	/// Retargets the proposal by name or capability, storing the type name either way.
	pub fn set_proposable(&mut self, target: impl Into<ProposableTarget>) {
		self.proposable = OnceLock::new();
		self.instance = OnceLock::new();

		match target.into() {
			ProposableTarget::Name(name) => self.proposable_type = name,
			ProposableTarget::Capability(lookup) => {
				self.proposable_type = lookup.type_name().to_owned();

				let _ = self.proposable.set(lookup);
			},
		}
	}

	/// Store-assigned identifier; `None` until persisted.
	pub fn id(&self) -> Option<ProposalId> {
		self.id
	}

	/// Returns `true` once the proposal has been inserted.
	pub fn is_persisted(&self) -> bool {
		self.id.is_some()
	}

	/// Invitee email.
	pub fn email(&self) -> &str {
		&self.email
	}

	/// Token value; `None` until the proposal is first saved.
	pub fn token(&self) -> Option<&ProposalSecret> {
		self.token.as_ref()
	}

	/// Proposable type name.
	pub fn proposable_type(&self) -> &str {
		&self.proposable_type
	}

	/// Owning resource, when both columns are set.
	pub fn resource(&self) -> Option<ResourceRef> {
		match (&self.resource_type, &self.resource_id) {
			(Some(kind), Some(id)) => Some(ResourceRef::new(kind.clone(), id.clone())),
			_ => None,
		}
	}

	/// Owning resource type column.
	pub fn resource_type(&self) -> Option<&ResourceType> {
		self.resource_type.as_ref()
	}

	/// Owning resource id column.
	pub fn resource_id(&self) -> Option<&ResourceId> {
		self.resource_id.as_ref()
	}

	/// Attached payload.
	pub fn arguments(&self) -> Option<&Arguments> {
		self.arguments.as_ref()
	}

	/// Transient argument contract.
	pub fn expects(&self) -> &Expects {
		&self.expects
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Acceptance instant.
	pub fn accepted_at(&self) -> Option<OffsetDateTime> {
		self.accepted_at
	}

	/// Most recent reminder instant.
	pub fn reminded_at(&self) -> Option<OffsetDateTime> {
		self.reminded_at
	}

	/// Context tag.
	pub fn context(&self) -> Option<&str> {
		self.context.as_deref()
	}

	/// Insert instant.
	pub fn created_at(&self) -> Option<OffsetDateTime> {
		self.created_at
	}

	/// Last write instant.
	pub fn updated_at(&self) -> Option<OffsetDateTime> {
		self.updated_at
	}

	/// Returns `true` when `instant` is at or past the expiry. Proposals without an expiry
	/// never expire.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant >= expires_at)
	}

	/// Expiry check against the current UTC clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` once accepted.
	pub fn is_accepted(&self) -> bool {
		self.accepted_at.is_some()
	}

	/// Neither expired at `instant` nor accepted.
	pub fn is_acceptable_at(&self, instant: OffsetDateTime) -> bool {
		!self.is_expired_at(instant) && !self.is_accepted()
	}

	/// Acceptability against the current UTC clock.
	pub fn is_acceptable(&self) -> bool {
		self.is_acceptable_at(OffsetDateTime::now_utc())
	}

	/// Stamps `accepted_at` when acceptable; returns whether it did.
	pub fn accept_at(&mut self, instant: OffsetDateTime) -> bool {
		if !self.is_acceptable_at(instant) {
			return false;
		}

		self.accepted_at = Some(instant);

		true
	}

	/// Like [`accept_at`](Self::accept_at) but reports why acceptance is impossible.
	pub fn accept_strict_at(&mut self, instant: OffsetDateTime) -> Result<bool> {
		if self.is_expired_at(instant) {
			return Err(Error::TokenExpired);
		}
		if self.is_accepted() {
			return Err(Error::TokenAlreadyAccepted);
		}

		self.accepted_at = Some(instant);

		Ok(true)
	}

	/// Resolves the proposable type through `registry`, caching the capability.
	pub fn proposable(&self, registry: &dyn ProposableRegistry) -> Result<Arc<dyn ProposableLookup>> {
		if let Some(lookup) = self.proposable.get() {
			return Ok(lookup.clone());
		}

		let lookup = registry
			.resolve(&self.proposable_type)
			.ok_or_else(|| Error::UnknownProposable { type_name: self.proposable_type.clone() })?;

		Ok(self.proposable.get_or_init(|| lookup).clone())
	}

	/// Record of the proposable type that owns this email, if any. Hits are cached.
	pub async fn instance(&self, registry: &dyn ProposableRegistry) -> Result<Option<&TargetRecord>> {
		if let Some(record) = self.instance.get() {
			return Ok(Some(record));
		}

		let lookup = self.proposable(registry)?;

		match lookup.find_one_by_email(&self.email).await? {
			Some(record) => Ok(Some(self.instance.get_or_init(|| record))),
			None => Ok(None),
		}
	}

	/// Like [`instance`](Self::instance) but fails with [`Error::TargetRecordNotFound`].
	pub async fn instance_strict(&self, registry: &dyn ProposableRegistry) -> Result<&TargetRecord> {
		self.instance(registry).await?.ok_or_else(|| Error::TargetRecordNotFound {
			proposable_type: self.proposable_type.clone(),
			email: self.email.clone(),
		})
	}

	/// Accessor named after the proposable type (`user` for `User`); aliases
	/// [`instance_strict`](Self::instance_strict).
	pub async fn instance_named(
		&self,
		name: &str,
		registry: &dyn ProposableRegistry,
	) -> Result<&TargetRecord> {
		if name != self.proposable_type.to_lowercase() {
			return Err(Error::NoSuchAccessor { name: name.to_owned() });
		}

		self.instance_strict(registry).await
	}

	/// Infers the intent: persisted proposals remind, otherwise the target record decides
	/// between notify and invite.
	pub async fn action(&self, registry: &dyn ProposableRegistry) -> Result<ProposalAction> {
		if self.is_persisted() {
			return Ok(ProposalAction::Remind);
		}

		Ok(match self.instance(registry).await? {
			Some(_) => ProposalAction::Notify,
			None => ProposalAction::Invite,
		})
	}

	/// Returns `true` when the inferred action is [`ProposalAction::Invite`].
	pub async fn is_invite(&self, registry: &dyn ProposableRegistry) -> Result<bool> {
		Ok(self.action(registry).await? == ProposalAction::Invite)
	}

	/// Returns `true` when the inferred action is [`ProposalAction::Remind`].
	pub async fn is_remind(&self, registry: &dyn ProposableRegistry) -> Result<bool> {
		Ok(self.action(registry).await? == ProposalAction::Remind)
	}

	/// Returns `true` when the inferred action is [`ProposalAction::Notify`].
	pub async fn is_notify(&self, registry: &dyn ProposableRegistry) -> Result<bool> {
		Ok(self.action(registry).await? == ProposalAction::Notify)
	}

	/// Stamps `reminded_at` when the action is remind; returns whether it did.
	pub async fn remind_at(
		&mut self,
		instant: OffsetDateTime,
		registry: &dyn ProposableRegistry,
	) -> Result<bool> {
		if !self.is_remind(registry).await? {
			return Ok(false);
		}

		self.reminded_at = Some(instant);

		Ok(true)
	}

	/// Like [`remind_at`](Self::remind_at) but fails with [`Error::ReminderNotApplicable`].
	pub async fn remind_strict_at(
		&mut self,
		instant: OffsetDateTime,
		registry: &dyn ProposableRegistry,
	) -> Result<bool> {
		if !self.is_remind(registry).await? {
			return Err(Error::ReminderNotApplicable);
		}

		self.remind_at(instant, registry).await
	}

	/// Fills the token value and default expiry on a new proposal. Persisted proposals are
	/// left untouched.
	pub(crate) fn prepare_for_create(&mut self, now: OffsetDateTime, lifetime: Lifetime) {
		if self.is_persisted() {
			return;
		}
		if self.token.is_none() {
			self.token = Some(ProposalSecret::generate());
		}
		if self.expires_at.is_none() {
			self.expires_at = Some(lifetime.expires_after(now));
		}
	}

	pub(crate) fn mark_inserted(&mut self, id: ProposalId, instant: OffsetDateTime) {
		self.id = Some(id);
		self.created_at = Some(instant);
		self.updated_at = Some(instant);
	}

	pub(crate) fn touch(&mut self, instant: OffsetDateTime) {
		self.updated_at = Some(instant);
	}

	// Copies store-owned columns back without dropping the caller's caches or contract.
	pub(crate) fn sync_persisted(&mut self, stored: &ProposalToken) {
		self.id = stored.id;
		self.created_at = stored.created_at;
		self.updated_at = stored.updated_at;
	}

	// Also copies the transition stamps.
	pub(crate) fn sync_stamps(&mut self, stored: &ProposalToken) {
		self.accepted_at = stored.accepted_at;
		self.reminded_at = stored.reminded_at;
		self.sync_persisted(stored);
	}
}
impl Clone for ProposalToken {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			email: self.email.clone(),
			token: self.token.clone(),
			proposable_type: self.proposable_type.clone(),
			resource_type: self.resource_type.clone(),
			resource_id: self.resource_id.clone(),
			arguments: self.arguments.clone(),
			expires_at: self.expires_at,
			accepted_at: self.accepted_at,
			reminded_at: self.reminded_at,
			context: self.context.clone(),
			created_at: self.created_at,
			updated_at: self.updated_at,
			expects: self.expects.clone(),
			proposable: OnceLock::new(),
			instance: OnceLock::new(),
		}
	}
}
impl Debug for ProposalToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProposalToken")
			.field("id", &self.id)
			.field("email", &self.email)
			.field("token", &self.token)
			.field("proposable_type", &self.proposable_type)
			.field("resource_type", &self.resource_type)
			.field("resource_id", &self.resource_id)
			.field("arguments", &self.arguments)
			.field("expires_at", &self.expires_at)
			.field("accepted_at", &self.accepted_at)
			.field("reminded_at", &self.reminded_at)
			.field("context", &self.context)
			.finish_non_exhaustive()
	}
}
impl Display for ProposalToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match &self.token {
			Some(secret) => Display::fmt(secret, f),
			None => Ok(()),
		}
	}
}

pub(crate) fn join_context<I, S>(tags: I) -> String
where
	I: IntoIterator<Item = S>,
	S: AsRef<str>,
{
	tags.into_iter().map(|tag| tag.as_ref().to_owned()).collect::<Vec<_>>().join(":")
}
