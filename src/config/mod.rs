//! # Configuration Management
//!
//! Factory settings (CN, organization, expiry lookahead, key limits) and the
//! location of the signing CA. Both load from the environment; settings can
//! also come from a TOML file.

pub mod settings;
pub mod tls;

pub use settings::{AnnotationKeyLimits, FactoryConfig};
pub use tls::CaConfig;
