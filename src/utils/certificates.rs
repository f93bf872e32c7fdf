use std::{fmt, fs, net::IpAddr, path::Path};

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber, PKCS_ECDSA_P256_SHA256,
};
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use rustls::pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use simple_asn1::{ASN1Block, BigInt, BigUint, OID};
use time::{Duration, OffsetDateTime};
use x509_parser::{
    certificate::X509Certificate,
    extensions::GeneralName,
    prelude::FromDer,
    time::ASN1Time,
};
use zeroize::Zeroizing;

use crate::errors::TlsError;

const CERTIFICATE_BLOCK_TYPE: &str = "CERTIFICATE";

/// Longest validity, in days, accepted for CA and leaf certificates.
pub const MAX_VALIDITY_DAYS: i64 = 36_500;

const EC_PUBLIC_KEY_OID: &[u64] = &[1, 2, 840, 10045, 2, 1];
const RSA_ENCRYPTION_OID: &[u64] = &[1, 2, 840, 113549, 1, 1, 1];
// P-256, P-384
const EC_CURVE_OIDS: [&[u64]; 2] = [&[1, 2, 840, 10045, 3, 1, 7], &[1, 3, 132, 0, 34]];

/// Metadata extracted from a leaf certificate for status output and checks.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

/// Signing CA: an ordered certificate list (index 0 signs) and its key.
pub struct CertificateAuthority {
    certs: Vec<CertificateDer<'static>>,
    issuer: Certificate,
    key: KeyPair,
    not_before: OffsetDateTime,
}

impl fmt::Debug for CertificateAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateAuthority")
            .field("certs", &self.certs.len())
            .field("not_before", &self.not_before)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CertificateAuthority {
    /// Build a CA from DER certificates (signer first) and the signer's key.
    pub fn from_der_chain(
        certs: Vec<CertificateDer<'static>>,
        key: KeyPair,
    ) -> Result<Self, TlsError> {
        let signer = certs.first().ok_or(TlsError::EmptyCertificateChain)?;

        let (_, parsed) = X509Certificate::from_der(signer.as_ref())
            .map_err(|e| TlsError::CertificateParse(e.to_string()))?;
        let not_before = parsed.validity().not_before.to_datetime();
        if *parsed.public_key().subject_public_key.data != *key.public_key_raw() {
            return Err(TlsError::CertificateKeyMismatch);
        }

        // rcgen signs against an issuer Certificate; rebuild one carrying the
        // signer's subject and key identifier.
        let issuer = CertificateParams::from_ca_cert_der(signer)
            .and_then(|params| params.self_signed(&key))
            .map_err(|source| TlsError::InvalidIssuer { source })?;

        Ok(Self { certs, issuer, key, not_before })
    }

    /// Build a CA from a PEM certificate chain and a PEM private key.
    pub fn from_pem(cert_pem: &[u8], key_pem: &str) -> Result<Self, TlsError> {
        let certs = parse_certs_pem(cert_pem)?;
        let key = load_private_key_pem(key_pem.as_bytes())?;
        Self::from_der_chain(certs, key)
    }

    /// Load CA material from disk.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        let cert_bytes = fs::read(cert_path).map_err(|e| TlsError::CertificateReadError {
            path: cert_path.to_path_buf(),
            source: e,
        })?;
        let key_pem = Zeroizing::new(fs::read_to_string(key_path).map_err(|e| {
            TlsError::PrivateKeyReadError { path: key_path.to_path_buf(), source: e }
        })?);

        Self::from_pem(&cert_bytes, &key_pem)
    }

    /// Generate a self-signed CA valid for `validity_days` from now.
    pub fn generate(
        common_name: &str,
        organization: &[String],
        validity_days: i64,
    ) -> Result<Self, TlsError> {
        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name, organization);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.serial_number = Some(random_serial());

        let now = OffsetDateTime::now_utc();
        params.not_before = now - Duration::hours(1);
        params.not_after = expiry_after(now, validity_days)?;
        let not_before = params.not_before;

        let key = new_private_key()?;
        let issuer = params.self_signed(&key).map_err(|source| TlsError::Signing { source })?;

        Ok(Self { certs: vec![issuer.der().clone()], issuer, key, not_before })
    }

    /// CA certificates in chain order; index 0 is the signer.
    pub fn certs(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    pub(crate) fn issuer(&self) -> &Certificate {
        &self.issuer
    }

    pub(crate) fn key(&self) -> &KeyPair {
        &self.key
    }

    /// Start of the signer's validity window; issued leaves share it.
    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    /// PEM encoding of the full CA certificate list.
    pub fn cert_pem(&self) -> String {
        encode_certs_pem(&self.certs)
    }

    /// PKCS#8 PEM of the signing key.
    pub fn key_pem(&self) -> Zeroizing<String> {
        Zeroizing::new(self.key.serialize_pem())
    }
}

/// Parse every certificate block out of PEM data.
pub fn parse_certs_pem(data: &[u8]) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs: Vec<CertificateDer<'static>> = CertificateDer::pem_slice_iter(data)
        .map(|result| result.map_err(|err| TlsError::InvalidCertificatePem { source: anyhow!(err) }))
        .collect::<Result<_, _>>()?;

    if certs.is_empty() {
        return Err(TlsError::EmptyCertificateChain);
    }
    Ok(certs)
}

/// Load a PEM private key (PKCS#8, SEC1 or PKCS#1) as a signing key pair.
pub fn load_private_key_pem(data: &[u8]) -> Result<KeyPair, TlsError> {
    let der = PrivateKeyDer::from_pem_slice(data)
        .map_err(|err| TlsError::InvalidPrivateKey { source: anyhow!(err) })?;

    // The ring backend only signs with PKCS#8, so legacy encodings are wrapped.
    let candidates = match &der {
        PrivateKeyDer::Pkcs8(key) => vec![key.secret_pkcs8_der().to_vec()],
        // SEC1 keys may omit the curve; let the key length pick the one that loads.
        PrivateKeyDer::Sec1(key) => EC_CURVE_OIDS
            .iter()
            .map(|curve| {
                wrap_pkcs8(vec![oid(EC_PUBLIC_KEY_OID), oid(curve)], key.secret_sec1_der())
            })
            .collect::<Result<_, _>>()?,
        PrivateKeyDer::Pkcs1(key) => vec![wrap_pkcs8(
            vec![oid(RSA_ENCRYPTION_OID), ASN1Block::Null(0)],
            key.secret_pkcs1_der(),
        )?],
        _ => {
            return Err(TlsError::InvalidPrivateKey {
                source: anyhow!("unsupported private key encoding"),
            })
        }
    };

    let mut last_error = anyhow!("private key did not load");
    for pkcs8 in candidates {
        match KeyPair::try_from(&PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(pkcs8))) {
            Ok(key) => return Ok(key),
            Err(err) => last_error = anyhow!(err),
        }
    }
    Err(TlsError::InvalidPrivateKey { source: last_error })
}

/// Parse a PEM private key into a signing key pair, if it is one we can sign with.
pub fn parse_private_key_pem(data: &[u8]) -> Option<KeyPair> {
    load_private_key_pem(data).ok()
}

/// Generate a new ECDSA P-256 key pair.
pub fn new_private_key() -> Result<KeyPair, TlsError> {
    KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256).map_err(|source| TlsError::KeyGeneration { source })
}

/// Serialize the key and certificate chain as PEM, returning `(key, chain)`.
pub fn marshal_chain(key: &KeyPair, certs: &[CertificateDer<'_>]) -> (Vec<u8>, Vec<u8>) {
    (key.serialize_pem().into_bytes(), encode_certs_pem(certs).into_bytes())
}

/// Serialize a single certificate and key as PEM, returning `(cert, key)`.
pub fn marshal(cert: &CertificateDer<'_>, key: &KeyPair) -> (Vec<u8>, Vec<u8>) {
    let (key_bytes, cert_bytes) = marshal_chain(key, std::slice::from_ref(cert));
    (cert_bytes, key_bytes)
}

/// `SHA1=<HEX>` digest of a DER certificate.
pub fn fingerprint(der: &[u8]) -> String {
    format!("SHA1={}", hex::encode_upper(digest(&SHA1_FOR_LEGACY_USE_ONLY, der)))
}

/// Read subject, issuer, validity and SANs from a DER certificate.
pub fn certificate_info(der: &[u8]) -> Result<CertificateInfo, TlsError> {
    let (_, cert) =
        X509Certificate::from_der(der).map_err(|e| TlsError::CertificateParse(e.to_string()))?;

    let mut dns_names = Vec::new();
    let mut ip_addresses = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            match name {
                GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(CertificateInfo {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        serial: format!("{:x}", cert.serial),
        not_before: asn1_to_chrono(&cert.validity().not_before)?,
        not_after: asn1_to_chrono(&cert.validity().not_after)?,
        dns_names,
        ip_addresses,
    })
}

/// `from` plus `days`, rejecting periods outside `1..=MAX_VALIDITY_DAYS`.
pub(crate) fn expiry_after(from: OffsetDateTime, days: i64) -> Result<OffsetDateTime, TlsError> {
    let invalid = || TlsError::InvalidValidity { days, max: MAX_VALIDITY_DAYS };
    if !(1..=MAX_VALIDITY_DAYS).contains(&days) {
        return Err(invalid());
    }
    from.checked_add(Duration::days(days)).ok_or_else(invalid)
}

pub(crate) fn asn1_to_chrono(value: &ASN1Time) -> Result<DateTime<Utc>, TlsError> {
    Utc.timestamp_opt(value.timestamp(), 0)
        .single()
        .ok_or_else(|| TlsError::CertificateParse("failed to convert certificate time".to_string()))
}

pub(crate) fn distinguished_name(common_name: &str, organization: &[String]) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    // rcgen keeps one value per attribute type
    if !organization.is_empty() {
        dn.push(DnType::OrganizationName, organization.join(", "));
    }
    dn
}

pub(crate) fn random_serial() -> SerialNumber {
    let mut bytes: [u8; 16] = rand::random();
    // positive, non-zero leading byte
    bytes[0] = (bytes[0] & 0x7f) | 0x01;
    SerialNumber::from_slice(&bytes)
}

fn encode_certs_pem(certs: &[CertificateDer<'_>]) -> String {
    let blocks: Vec<pem::Pem> = certs
        .iter()
        .map(|cert| pem::Pem::new(CERTIFICATE_BLOCK_TYPE, cert.as_ref().to_vec()))
        .collect();
    pem::encode_many_config(
        &blocks,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

fn oid(arcs: &[u64]) -> ASN1Block {
    ASN1Block::ObjectIdentifier(0, OID::new(arcs.iter().map(|arc| BigUint::from(*arc)).collect()))
}

/// PrivateKeyInfo { version 0, algorithm, key } around a raw SEC1 or PKCS#1 key.
fn wrap_pkcs8(algorithm: Vec<ASN1Block>, key: &[u8]) -> Result<Vec<u8>, TlsError> {
    let info = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Integer(0, BigInt::from(0)),
            ASN1Block::Sequence(0, algorithm),
            ASN1Block::OctetString(0, key.to_vec()),
        ],
    );
    simple_asn1::to_der(&info).map_err(|err| TlsError::InvalidPrivateKey { source: anyhow!(err) })
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}
