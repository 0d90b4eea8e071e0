//! Accept and remind transitions, persisted when the proposal is on file.

// self
use crate::{
	_prelude::*,
	engine::ProposalEngine,
	obs::{self, OpKind, OpOutcome, OpSpan},
	proposal::ProposalToken,
};

#[derive(Clone, Copy, Debug)]
enum Transition {
	Accept,
	AcceptStrict,
	Remind,
	RemindStrict,
}
impl Transition {
	const fn kind(self) -> OpKind {
		match self {
			Transition::Accept | Transition::AcceptStrict => OpKind::Accept,
			Transition::Remind | Transition::RemindStrict => OpKind::Remind,
		}
	}

	const fn stage(self) -> &'static str {
		match self {
			Transition::Accept => "accept",
			Transition::AcceptStrict => "accept_strict",
			Transition::Remind => "remind",
			Transition::RemindStrict => "remind_strict",
		}
	}
}

impl ProposalEngine {
	/// Accepts `token` when it is neither expired nor accepted; returns whether it did.
	///
	/// Unsaved proposals are stamped in memory only.
	pub async fn accept(&self, token: &mut ProposalToken) -> Result<bool> {
		self.transition(Transition::Accept, token).await
	}

	/// Accepts `token`, failing with [`Error::TokenExpired`] or [`Error::TokenAlreadyAccepted`].
	pub async fn accept_strict(&self, token: &mut ProposalToken) -> Result<bool> {
		self.transition(Transition::AcceptStrict, token).await
	}

	/// Stamps `reminded_at` on a persisted proposal; returns whether it did.
	pub async fn remind(&self, token: &mut ProposalToken) -> Result<bool> {
		self.transition(Transition::Remind, token).await
	}

	/// Like [`remind`](Self::remind) but fails with [`Error::ReminderNotApplicable`].
	pub async fn remind_strict(&self, token: &mut ProposalToken) -> Result<bool> {
		self.transition(Transition::RemindStrict, token).await
	}

	async fn transition(&self, transition: Transition, token: &mut ProposalToken) -> Result<bool> {
		let kind = transition.kind();
		let span = OpSpan::new(kind, transition.stage());

		obs::record_op_outcome(kind, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let now = OffsetDateTime::now_utc();

				if !token.is_persisted() {
					return self.stamp(transition, token, now).await;
				}

				// Persisted rows are stamped on a copy so a failed write leaves `token` untouched.
				let mut staged = token.clone();

				if !self.stamp(transition, &mut staged, now).await? {
					return Ok(false);
				}

				staged.touch(now);

				let stored = self.persist(staged).await?;

				token.sync_stamps(&stored);

				Ok(true)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(kind, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(kind, OpOutcome::Failure),
		}

		result
	}

	async fn stamp(
		&self,
		transition: Transition,
		token: &mut ProposalToken,
		now: OffsetDateTime,
	) -> Result<bool> {
		let registry = self.registry.as_ref();

		match transition {
			Transition::Accept => Ok(token.accept_at(now)),
			Transition::AcceptStrict => token.accept_strict_at(now),
			Transition::Remind => token.remind_at(now, registry).await,
			Transition::RemindStrict => token.remind_strict_at(now, registry).await,
		}
	}
}
