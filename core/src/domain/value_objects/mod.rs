//! Value objects handed back to callers of the session service.

pub mod session;

// Re-export commonly used types
pub use session::{AuthenticatedOwner, IssuedToken, TokenPair};
