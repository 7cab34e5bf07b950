//! MySQL repository implementations

pub mod credential_repository;
pub mod owner_repository;

pub use credential_repository::MySqlCredentialRepository;
pub use owner_repository::MySqlOwnerRepository;
