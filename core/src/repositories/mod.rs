pub mod credential;
pub mod owner;

pub use credential::{
    CredentialFilter, CredentialPatch, CredentialRepository, ExpectedState,
    InMemoryCredentialRepository,
};
pub use owner::{InMemoryOwnerRepository, OwnerRepository};
