//! Credential creation and validation.

pub mod claims;
pub mod service;

pub use claims::{Claims, TokenType};
pub use service::{CredentialService, INVALID_CREDENTIAL, IssuedCredential, TokenPair};
