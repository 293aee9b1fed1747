//! Auth-domain primitives: scope sets, redacted secrets, and correlation ids.

pub mod correlation;
pub mod scope;
pub mod secret;

pub use correlation::*;
pub use scope::*;
pub use secret::*;
