use std::{fs, net::IpAddr, path::PathBuf};

use anyhow::Context;
use dyncert::{
    config::FactoryConfig,
    domain::Secret,
    factory::{annotation_key, STATIC_ANNOTATION},
    utils::{certificate_info, parse_certs_pem, CertificateAuthority, CertificateInfo},
    TlsFactory,
};
use tempfile::TempDir;

/// Build a throwaway CA valid for a year.
pub fn test_ca(common_name: &str) -> anyhow::Result<CertificateAuthority> {
    CertificateAuthority::generate(common_name, &["dyncert tests".to_string()], 365)
        .context("generate test CA")
}

/// Factory with default settings and a fresh CA.
pub fn test_factory() -> anyhow::Result<TlsFactory> {
    factory_with(FactoryConfig { cn: "dyncert-test".to_string(), ..Default::default() })
}

/// Factory with the given settings and a fresh CA.
pub fn factory_with(config: FactoryConfig) -> anyhow::Result<TlsFactory> {
    Ok(TlsFactory::new(test_ca("dyncert test CA")?, &config))
}

/// Secret whose annotations record `cns` without carrying any certificate.
pub fn annotated_secret(cns: &[&str]) -> Secret {
    cns.iter().fold(Secret::new(), |secret, cn| secret.with_annotation(annotation_key(cn), *cn))
}

/// Mark a secret as static.
pub fn make_static(secret: Secret) -> Secret {
    secret.with_annotation(STATIC_ANNOTATION, "true")
}

/// Parsed leaf certificate of a secret.
pub fn leaf_info(secret: &Secret) -> anyhow::Result<CertificateInfo> {
    let pem = secret.certificate_pem().context("secret has no certificate")?;
    let chain = parse_certs_pem(pem)?;
    Ok(certificate_info(chain[0].as_ref())?)
}

/// DNS and IP SANs of a secret's leaf certificate.
pub fn san_names(secret: &Secret) -> anyhow::Result<(Vec<String>, Vec<IpAddr>)> {
    let info = leaf_info(secret)?;
    Ok((info.dns_names, info.ip_addresses))
}

/// CA material written to a temporary directory.
pub struct TestCaFiles {
    _temp_dir: TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl TestCaFiles {
    pub fn write(ca: &CertificateAuthority) -> anyhow::Result<Self> {
        let temp_dir = TempDir::new().context("create temp dir")?;
        let cert_path = temp_dir.path().join("ca.crt");
        let key_path = temp_dir.path().join("ca.key");

        fs::write(&cert_path, ca.cert_pem()).context("write CA certificate")?;
        fs::write(&key_path, ca.key_pem().as_bytes()).context("write CA key")?;

        Ok(Self { _temp_dir: temp_dir, cert_path, key_path })
    }
}
