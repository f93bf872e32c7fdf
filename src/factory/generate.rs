//! Leaf certificate signing and secret serialization.

use std::net::IpAddr;

use rcgen::{
    Certificate, CertificateParams, ExtendedKeyUsagePurpose, Ia5String, IsCa, KeyPair,
    KeyUsagePurpose, SanType,
};
use rustls::pki_types::CertificateDer;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::annotations::{cns_of, FINGERPRINT_ANNOTATION};
use super::names::{classify, is_valid_cn};
use super::TlsFactory;
use crate::domain::{Secret, SecretType, TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY};
use crate::errors::TlsError;
use crate::utils::certificates::{
    distinguished_name, expiry_after, fingerprint, marshal_chain, new_private_key,
    parse_private_key_pem, random_serial,
};

impl TlsFactory {
    /// Sign a new certificate for `secret` covering its recorded CNs plus `cns`.
    ///
    /// Starts from a copy of `secret` (or an empty secret), reusing its private
    /// key when one parses. The result always differs from the input; callers
    /// decide beforehand whether signing is warranted.
    pub fn generate<I, S>(&self, secret: Option<&Secret>, cns: I) -> Result<Secret, TlsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.generate_owned(secret.cloned().unwrap_or_default(), cns)
    }

    pub(super) fn generate_owned<I, S>(&self, mut secret: Secret, cns: I) -> Result<Secret, TlsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Err(err) = self.verify(&secret) {
            warn!(
                error = %err,
                "unable to verify existing certificate - signing operation may change certificate issuer"
            );
        }

        self.populate_cns(&mut secret, cns);

        let (key, reused) = private_key(&secret)?;
        let (domains, ips) = classify(cns_of(&secret));
        let leaf = self.new_cert(&domains, &ips, &key)?;

        let chain: Vec<CertificateDer<'_>> =
            std::iter::once(leaf.der().clone()).chain(self.ca().certs().iter().cloned()).collect();
        let (key_bytes, cert_bytes) = marshal_chain(&key, &chain);

        secret.secret_type = SecretType::Tls;
        secret.data.insert(TLS_CERT_KEY.to_string(), cert_bytes);
        // a reused key keeps its stored encoding
        if !reused {
            secret.data.insert(TLS_PRIVATE_KEY_KEY.to_string(), key_bytes);
        }
        let fingerprint = fingerprint(leaf.der());
        secret.annotations.insert(FINGERPRINT_ANNOTATION.to_string(), fingerprint.clone());

        info!(
            domains = ?domains,
            ips = ?ips,
            fingerprint = %fingerprint,
            "signed new certificate"
        );

        Ok(secret)
    }

    fn populate_cns<I, S>(&self, secret: &mut Secret, cns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for cn in cns {
            let cn = cn.as_ref();
            if is_valid_cn(cn) {
                secret.annotations.insert(self.codec().key(cn), cn.to_string());
            } else {
                warn!(cn = %cn, "dropping invalid CN");
            }
        }
    }

    fn new_cert(
        &self,
        domains: &[String],
        ips: &[IpAddr],
        key: &KeyPair,
    ) -> Result<Certificate, TlsError> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(&self.cn, &self.organization);
        params.is_ca = IsCa::NoCa;
        params.key_usages =
            vec![KeyUsagePurpose::DigitalSignature, KeyUsagePurpose::KeyEncipherment];
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        params.serial_number = Some(random_serial());
        params.not_before = self.ca().not_before();
        params.not_after = expiry_after(OffsetDateTime::now_utc(), self.validity_days)?;
        params.use_authority_key_identifier_extension = true;

        let mut sans = Vec::with_capacity(domains.len() + ips.len());
        for domain in domains {
            let name: Ia5String = domain
                .clone()
                .try_into()
                .map_err(|source| TlsError::InvalidDnsName { name: domain.clone(), source })?;
            sans.push(SanType::DnsName(name));
        }
        sans.extend(ips.iter().copied().map(SanType::IpAddress));
        params.subject_alt_names = sans;

        params
            .signed_by(key, self.ca().issuer(), self.ca().key())
            .map_err(|source| TlsError::Signing { source })
    }
}

/// The secret's existing key when it parses as a signer, otherwise a new one.
/// The flag is true when the existing key was reused.
fn private_key(secret: &Secret) -> Result<(KeyPair, bool), TlsError> {
    if let Some(pem) = secret.private_key_pem() {
        if let Some(key) = parse_private_key_pem(pem) {
            return Ok((key, true));
        }
        debug!("existing private key is not a usable signer; generating a new key");
    }
    Ok((new_private_key()?, false))
}
