//! Expiry lookahead and chain verification against the configured CA.

use chrono::{Duration, Utc};
use x509_parser::{certificate::X509Certificate, prelude::FromDer};

use super::TlsFactory;
use crate::domain::Secret;
use crate::errors::TlsError;
use crate::utils::certificates::{asn1_to_chrono, parse_certs_pem};

impl TlsFactory {
    /// Whether the leaf certificate expires within the configured lookahead.
    ///
    /// Missing or unparseable certificates report `false`; they are replaced
    /// by the coverage checks anyway.
    pub fn is_expired(&self, secret: &Secret) -> bool {
        let Some(pem) = secret.certificate_pem() else {
            return false;
        };
        let Ok(certs) = parse_certs_pem(pem) else {
            return false;
        };
        let Ok((_, leaf)) = X509Certificate::from_der(certs[0].as_ref()) else {
            return false;
        };

        // lookaheads past the calendar's range saturate
        let Some(horizon) = Duration::try_days(self.expiration_days_check)
            .and_then(|lookahead| Utc::now().checked_add_signed(lookahead))
        else {
            return self.expiration_days_check > 0;
        };
        horizon.timestamp() > leaf.validity().not_after.timestamp()
    }

    /// Check that the leaf certificate is currently valid and signed by one of
    /// the configured CA certificates. Secrets without a certificate pass.
    pub fn verify(&self, secret: &Secret) -> Result<(), TlsError> {
        let Some(pem) = secret.certificate_pem() else {
            return Ok(());
        };

        let certs = parse_certs_pem(pem)?;
        let (_, leaf) = X509Certificate::from_der(certs[0].as_ref())
            .map_err(|e| TlsError::CertificateParse(e.to_string()))?;

        let now = Utc::now();
        let not_before = asn1_to_chrono(&leaf.validity().not_before)?;
        if now < not_before {
            return Err(TlsError::CertificateNotYetValid { not_before });
        }
        let not_after = asn1_to_chrono(&leaf.validity().not_after)?;
        if now > not_after {
            return Err(TlsError::CertificateExpired { not_after });
        }

        let issuer = leaf.issuer().to_string();
        for ca_der in self.ca().certs() {
            let Ok((_, ca)) = X509Certificate::from_der(ca_der.as_ref()) else {
                continue;
            };
            if ca.subject().to_string() != issuer || !ca.validity().is_valid() {
                continue;
            }
            if leaf.verify_signature(Some(ca.public_key())).is_ok() {
                return Ok(());
            }
        }

        Err(TlsError::UntrustedIssuer { subject: leaf.subject().to_string(), issuer })
    }
}
