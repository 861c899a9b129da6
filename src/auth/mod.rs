pub mod claims;
pub mod guard;
pub mod keys;
pub mod verifier;

pub use claims::{Claims, Role};
pub use guard::{AccessGuard, AuthError};
pub use keys::{KeyError, KeySource};
pub use verifier::{TokenVerifier, VerificationError};
