//! Provider traits for the access gate's external collaborators.

pub mod credentials;
pub mod session;

pub use credentials::CredentialVerifier;
pub use session::SessionStore;
