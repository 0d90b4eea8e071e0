//! Proposal domain: identifiers, secrets, argument contracts, validation, and token records.

pub mod arguments;
pub mod expiry;
pub mod id;
pub mod record;
pub mod secret;
pub mod validation;

pub use arguments::*;
pub use expiry::*;
pub use id::*;
pub use record::*;
pub use secret::*;
pub use validation::*;
