//! Expiry inputs and default proposal lifetimes.

// self
use crate::_prelude::*;

/// Zero-argument producer used by [`ExpiryInput::Computed`].
pub type ExpiryFn = Box<dyn FnOnce() -> OffsetDateTime + Send>;

/// Value handed to [`ProposalToken::set_expires`](crate::proposal::ProposalToken::set_expires).
pub enum ExpiryInput {
	/// Literal instant; the computed setter rejects it. Use
	/// [`ProposalToken::with_expires_at`](crate::proposal::ProposalToken::with_expires_at).
	At(OffsetDateTime),
	/// Instant computed when the setter runs.
	Computed(ExpiryFn),
}
impl ExpiryInput {
	/// Wraps a closure as a computed expiry.
	pub fn computed<F>(f: F) -> Self
	where
		F: 'static + FnOnce() -> OffsetDateTime + Send,
	{
		Self::Computed(Box::new(f))
	}

	/// Computed expiry `duration` after the moment the setter runs.
	pub fn from_now(duration: Duration) -> Self {
		Self::computed(move || OffsetDateTime::now_utc() + duration)
	}
}
impl Debug for ExpiryInput {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::At(instant) => f.debug_tuple("ExpiryInput::At").field(instant).finish(),
			Self::Computed(_) => f.write_str("ExpiryInput::Computed(..)"),
		}
	}
}

/// Default lifetime applied to new proposals without an explicit expiry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
	/// Same wall-clock instant one calendar year later.
	#[default]
	CalendarYear,
	/// Fixed span.
	Fixed(Duration),
}
impl Lifetime {
	/// Expiry instant for a proposal created at `created`.
	pub fn expires_after(self, created: OffsetDateTime) -> OffsetDateTime {
		match self {
			Self::CalendarYear => created
				.replace_year(created.year() + 1)
				.unwrap_or_else(|_| created + Duration::days(365)),
			Self::Fixed(span) => created + span,
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn calendar_year_keeps_wall_clock() {
		let created = macros::datetime!(2025-03-14 09:30 UTC);

		assert_eq!(
			Lifetime::CalendarYear.expires_after(created),
			macros::datetime!(2026-03-14 09:30 UTC)
		);
	}

	#[test]
	fn leap_day_falls_back_to_365_days() {
		let created = macros::datetime!(2024-02-29 12:00 UTC);

		assert_eq!(
			Lifetime::CalendarYear.expires_after(created),
			macros::datetime!(2025-02-28 12:00 UTC)
		);
	}

	#[test]
	fn fixed_lifetime_adds_span() {
		let created = macros::datetime!(2025-01-01 00:00 UTC);

		assert_eq!(
			Lifetime::Fixed(Duration::days(7)).expires_after(created),
			macros::datetime!(2025-01-08 00:00 UTC)
		);
	}

	#[test]
	fn lifetime_deserializes_from_config() {
		let lifetime: Lifetime =
			serde_json::from_str("\"calendar_year\"").expect("Lifetime should deserialize.");

		assert_eq!(lifetime, Lifetime::CalendarYear);
	}
}
