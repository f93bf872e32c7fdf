use std::path::PathBuf;

use crate::{errors::TlsError, utils::CertificateAuthority, Result};

/// Location of the signing CA certificate chain and key.
#[derive(Debug, Clone)]
pub struct CaConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl CaConfig {
    /// Load CA paths from environment variables.
    pub fn from_env() -> Result<Self> {
        let cert_path = std::env::var("DYNCERT_CA_CERT_PATH")
            .map_err(|_| TlsError::MissingCaMaterial("DYNCERT_CA_CERT_PATH"))?
            .trim()
            .to_string();

        if cert_path.is_empty() {
            return Err(TlsError::MissingCaMaterial("DYNCERT_CA_CERT_PATH").into());
        }

        let key_path = std::env::var("DYNCERT_CA_KEY_PATH")
            .map_err(|_| TlsError::MissingCaMaterial("DYNCERT_CA_KEY_PATH"))?
            .trim()
            .to_string();

        if key_path.is_empty() {
            return Err(TlsError::MissingCaMaterial("DYNCERT_CA_KEY_PATH").into());
        }

        Ok(Self { cert_path: PathBuf::from(cert_path), key_path: PathBuf::from(key_path) })
    }

    /// Read and parse the configured CA material.
    pub fn load(&self) -> Result<CertificateAuthority> {
        Ok(CertificateAuthority::load(&self.cert_path, &self.key_path)?)
    }
}
