//! Random proposal token values and their redacting wrapper.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::_prelude::*;

/// Number of random bytes drawn for every token.
pub const SECRET_BYTES: usize = 15;
/// Encoded length of every generated token.
pub const SECRET_LEN: usize = SECRET_BYTES.div_ceil(3) * 4;

const AMBIGUOUS: [char; 7] = ['+', '/', '=', 'l', 'I', 'O', '0'];
const REPLACEMENTS: [char; 7] = ['p', 'q', 'r', 's', 'x', 'y', 'z'];

/// Token value handed to invitees. `Debug` redacts it; `Display` renders it since the value
/// is meant to be embedded in links.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalSecret(String);
impl ProposalSecret {
	/// Draws a fresh value from the thread-local CSPRNG.
	pub fn generate() -> Self {
		let bytes: [u8; SECRET_BYTES] = rand::random();

		Self(remap(&STANDARD.encode(bytes)))
	}

	/// Wraps an existing value, e.g. one read back from a link.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for ProposalSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for ProposalSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ProposalSecret").field(&"<redacted>").finish()
	}
}
impl Display for ProposalSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn remap(encoded: &str) -> String {
	encoded
		.chars()
		.map(|c| match AMBIGUOUS.iter().position(|a| *a == c) {
			Some(idx) => REPLACEMENTS[idx],
			None => c,
		})
		.collect()
}
