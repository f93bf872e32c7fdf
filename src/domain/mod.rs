//! Domain layer
//!
//! Pure record types with no knowledge of how certificates are built. The
//! factory consumes and produces these; storage of records is up to callers.

pub mod secret;

pub use secret::{Secret, SecretType, TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY};
