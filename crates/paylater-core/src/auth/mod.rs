//! Authentication module for managing the user session and its credential.
//!
//! This module provides:
//! - `Credential`: bearer token plus the identity snapshot of the signed-in user
//! - `CredentialStore`: persistence of the credential (file, OS keychain or memory)
//! - `Session`: the process-wide session controller and its events
//!
//! The session is rehydrated from the store at startup and is only validated
//! against the service lazily, when a protected request comes back 401.

pub mod credentials;
pub mod session;

pub use credentials::{
    Credential, CredentialStore, FileCredentialStore, KeyringCredentialStore,
    MemoryCredentialStore,
};
pub use session::{Session, SessionEvent, SessionState};
