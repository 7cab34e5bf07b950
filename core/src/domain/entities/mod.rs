//! Domain entities representing owners and the credentials issued to them.

pub mod owner;
pub mod token;

// Re-export commonly used types
pub use owner::{Owner, OwnerStatus, Role};
pub use token::{Claims, Credential, NewCredential, TokenClass};
