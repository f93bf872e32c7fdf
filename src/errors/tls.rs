use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Certificate-level error variants surfaced by the factory and CA loading.
#[derive(Debug, Error)]
pub enum TlsError {
    /// The secret is marked static (user-provided) and cannot be re-signed.
    #[error("cannot renew static certificate")]
    StaticCertificate,

    /// A CA certificate or key path was not configured.
    #[error("CA material is not configured: {0}")]
    MissingCaMaterial(&'static str),

    /// The CA certificate file could not be read.
    #[error("Failed to read CA certificate at {path}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CA private key file could not be read.
    #[error("Failed to read CA private key at {path}: {source}")]
    PrivateKeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CA private key PEM contents were invalid or unsupported.
    #[error("CA private key is not a supported signing key: {source}")]
    InvalidPrivateKey {
        #[source]
        source: anyhow::Error,
    },

    /// The CA private key does not belong to the signing certificate.
    #[error("Certificate and private key do not match")]
    CertificateKeyMismatch,

    /// Certificate PEM contents were invalid or unreadable.
    #[error("Certificate data is not a valid PEM: {source}")]
    InvalidCertificatePem {
        #[source]
        source: anyhow::Error,
    },

    /// No certificates were found in the supplied PEM data.
    #[error("Certificate data does not contain any certificates")]
    EmptyCertificateChain,

    /// A DER certificate could not be decoded.
    #[error("Failed to parse certificate: {0}")]
    CertificateParse(String),

    /// A fresh key pair could not be generated.
    #[error("Failed to generate private key: {source}")]
    KeyGeneration {
        #[source]
        source: rcgen::Error,
    },

    /// A CN could not be encoded as a DNS SAN.
    #[error("Invalid DNS name {name}: {source}")]
    InvalidDnsName {
        name: String,
        #[source]
        source: rcgen::Error,
    },

    /// The CA certificate could not be turned into an issuer.
    #[error("Failed to load CA certificate as issuer: {source}")]
    InvalidIssuer {
        #[source]
        source: rcgen::Error,
    },

    /// A validity period in days is outside the supported range.
    #[error("Validity of {days} days is outside 1..={max} days")]
    InvalidValidity { days: i64, max: i64 },

    /// Building or signing a certificate failed.
    #[error("Failed to sign certificate: {source}")]
    Signing {
        #[source]
        source: rcgen::Error,
    },

    /// The certificate is not yet valid.
    #[error("Certificate is not valid before {not_before}")]
    CertificateNotYetValid { not_before: DateTime<Utc> },

    /// The certificate is expired.
    #[error("Certificate expired at {not_after}")]
    CertificateExpired { not_after: DateTime<Utc> },

    /// The leaf is not signed by any configured CA certificate.
    #[error("Certificate for {subject} issued by {issuer} does not chain to a configured CA")]
    UntrustedIssuer { subject: String, issuer: String },
}
