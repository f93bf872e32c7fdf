//! # dyncert
//!
//! Dynamic-SAN TLS certificate lifecycle for listener secrets. A secret is a
//! record holding a PEM chain, a private key and annotations; dyncert keeps
//! the certificate in step with the names (hostnames and IP addresses) the
//! secret has to serve.
//!
//! ## Architecture
//!
//! ```text
//! caller ─→ TlsFactory (merge / add_cn / renew / regenerate)
//!               │
//!               ├─ annotations: CN ⇄ annotation key, coverage, static flag
//!               ├─ filter:      pluggable CN approval policy
//!               ├─ generate:    leaf signing with the configured CA
//!               └─ expiration:  lookahead expiry and chain verification
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dyncert::{CertificateAuthority, FactoryConfig, Result, TlsFactory};
//!
//! fn main() -> Result<()> {
//!     let config = FactoryConfig::from_env()?;
//!     let ca = CertificateAuthority::generate("dyncert-ca", &config.organization, 3650)?;
//!     let factory = TlsFactory::new(ca, &config);
//!
//!     let (secret, changed) = factory.add_cn(None, &["svc.local", "10.0.0.5"])?;
//!     assert!(changed);
//!     assert!(!factory.needs_update(0, Some(&secret), &["svc.local"]));
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod factory;
pub mod observability;
pub mod utils;

// Re-export commonly used types and traits
pub use config::{CaConfig, FactoryConfig};
pub use domain::{Secret, SecretType};
pub use errors::{Error, Result, TlsError};
pub use factory::{CnFilter, TlsFactory};
pub use observability::init_logging;
pub use utils::CertificateAuthority;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
