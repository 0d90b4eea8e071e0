//! Field validation for proposals: presence, email shape, and argument contracts.
//!
//! Checks accumulate into [`ValidationErrors`] instead of failing fast so callers can report
//! every problem at once. Uniqueness needs the store and lives in the engine.

// std
use std::sync::LazyLock;
// crates.io
use regex::Regex;
// self
use crate::{
	_prelude::*,
	proposal::{Arguments, Expects, arguments::is_blank},
};

/// Message attached to `email` when the uniqueness tuple is already taken.
pub const OUTSTANDING_MESSAGE: &str = "already has an outstanding proposal";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^[\x21-\x3F\x41-\x7E]+@(?:[-a-z0-9]+\.)+[a-z]{2,}$")
		.expect("Email pattern must compile.")
});

/// Single failed check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
	/// Attribute the message belongs to.
	pub field: String,
	/// Message without the attribute prefix.
	pub message: String,
}
impl Display for FieldError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} {}", self.field, self.message)
	}
}

/// Ordered collection of failed checks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors(Vec<FieldError>);
impl ValidationErrors {
	/// Appends a message for `field`.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.0.push(FieldError { field: field.into(), message: message.into() });
	}

	/// Returns `true` when no check failed.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Number of failed checks.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Iterator over failed checks in the order they were recorded.
	pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
		self.0.iter()
	}

	/// Messages recorded for one field.
	pub fn on(&self, field: &str) -> Vec<&str> {
		self.0.iter().filter(|e| e.field == field).map(|e| e.message.as_str()).collect()
	}

	/// `field message` strings, in order.
	pub fn full_messages(&self) -> Vec<String> {
		self.0.iter().map(ToString::to_string).collect()
	}

	/// Converts into `Err` unless empty.
	pub fn into_result(self) -> Result<(), Self> {
		if self.is_empty() { Ok(()) } else { Err(self) }
	}
}
impl Display for ValidationErrors {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Validation failed: {}.", self.full_messages().join(", "))
	}
}
impl StdError for ValidationErrors {}

/// Returns `true` when `email` has the `local@domain.tld` shape.
pub fn is_valid_email(email: &str) -> bool {
	EMAIL_RE.is_match(email)
}

/// Records `can't be blank` for every missing field in `(field, present)` pairs.
pub fn check_presence<'a>(
	errors: &mut ValidationErrors,
	fields: impl IntoIterator<Item = (&'a str, bool)>,
) {
	for (field, present) in fields {
		if !present {
			errors.add(field, "can't be blank");
		}
	}
}

/// Records `is not valid` when the email shape does not match.
pub fn check_email(errors: &mut ValidationErrors, email: &str) {
	if !is_valid_email(email) {
		errors.add("email", "is not valid");
	}
}

/// Checks `arguments` against `expects`.
///
/// A predicate decides alone. Otherwise a keyed payload must carry each required key with a
/// non-blank value; any other payload (positional or absent) yields `must be a hash` and then
/// one `is missing` message per required key.
pub fn check_arguments(
	errors: &mut ValidationErrors,
	expects: &Expects,
	arguments: Option<&Arguments>,
) {
	if expects.is_none() {
		return;
	}
	if let Expects::Predicate(predicate) = expects {
		if !predicate(arguments) {
			errors.add("arguments", "is invalid");
		}

		return;
	}

	match arguments.and_then(Arguments::as_map) {
		Some(map) =>
			for key in expects.required_keys() {
				if map.get(key).is_none_or(is_blank) {
					errors.add("arguments", format!("is missing {key}"));
				}
			},
		None => {
			errors.add("arguments", "must be a hash");

			for key in expects.required_keys() {
				errors.add("arguments", format!("is missing {key}"));
			}
		},
	}
}
