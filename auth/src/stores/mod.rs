//! In-process implementations of the provider traits.

pub mod session_memory;
pub mod static_credentials;

pub use session_memory::InMemorySessionStore;
pub use static_credentials::StaticCredentialVerifier;
