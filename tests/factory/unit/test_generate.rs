use std::net::IpAddr;

use dyncert::{
    config::FactoryConfig,
    domain::{Secret, SecretType, TLS_CERT_KEY, TLS_PRIVATE_KEY_KEY},
    factory::FINGERPRINT_ANNOTATION,
    utils::{fingerprint, load_private_key_pem, parse_certs_pem},
    TlsError,
};
use x509_parser::{certificate::X509Certificate, extensions::ParsedExtension, prelude::FromDer};

use super::super::support::{factory_with, leaf_info, san_names, test_factory};

#[test]
fn test_generate_without_record_yields_exact_sans() -> anyhow::Result<()> {
    let factory = test_factory()?;

    let secret = factory.generate(None, ["10.0.0.5", "svc.local"])?;

    assert_eq!(secret.secret_type, SecretType::Tls);
    assert!(secret.data.contains_key(TLS_CERT_KEY));
    assert!(secret.data.contains_key(TLS_PRIVATE_KEY_KEY));

    let (domains, ips) = san_names(&secret)?;
    assert_eq!(domains, vec!["svc.local".to_string()]);
    assert_eq!(ips, vec!["10.0.0.5".parse::<IpAddr>()?]);
    Ok(())
}

#[test]
fn test_chain_is_leaf_then_ca() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = factory.generate(None, ["a.local"])?;

    let chain = parse_certs_pem(secret.certificate_pem().unwrap_or_default())?;
    assert_eq!(chain.len(), 1 + factory.ca().certs().len());
    assert_eq!(&chain[1..], factory.ca().certs());

    assert_eq!(
        secret.annotations.get(FINGERPRINT_ANNOTATION),
        Some(&fingerprint(chain[0].as_ref()))
    );
    Ok(())
}

#[test]
fn test_subject_uses_configured_identity() -> anyhow::Result<()> {
    let factory = factory_with(FactoryConfig {
        cn: "edge-listener".to_string(),
        organization: vec!["Acme".to_string(), "Platform".to_string()],
        ..Default::default()
    })?;

    let info = leaf_info(&factory.generate(None, ["a.local"])?)?;

    assert!(info.subject.contains("CN=edge-listener"), "subject: {}", info.subject);
    assert!(info.subject.contains("Acme"), "subject: {}", info.subject);
    assert!(info.issuer.contains("CN=dyncert test CA"), "issuer: {}", info.issuer);
    Ok(())
}

#[test]
fn test_validity_follows_configuration() -> anyhow::Result<()> {
    let factory = factory_with(FactoryConfig { validity_days: 10, ..Default::default() })?;

    let info = leaf_info(&factory.generate(None, ["a.local"])?)?;

    let remaining = info.not_after - chrono::Utc::now();
    assert!(remaining.num_days() >= 9 && remaining.num_days() <= 10, "{remaining}");
    assert!(info.not_before <= chrono::Utc::now());
    Ok(())
}

#[test]
fn test_sans_are_sorted_regardless_of_input_order() -> anyhow::Result<()> {
    let factory = test_factory()?;

    let forward = factory.generate(None, ["b.local", "a.local", "10.0.0.2", "10.0.0.1"])?;
    let backward = factory.generate(None, ["10.0.0.1", "a.local", "10.0.0.2", "b.local"])?;

    assert_eq!(san_names(&forward)?, san_names(&backward)?);
    let (domains, _) = san_names(&forward)?;
    assert_eq!(domains, vec!["a.local".to_string(), "b.local".to_string()]);
    Ok(())
}

#[test]
fn test_each_signature_gets_a_unique_serial() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let first = leaf_info(&factory.generate(None, ["a.local"])?)?;
    let second = leaf_info(&factory.generate(None, ["a.local"])?)?;

    assert_ne!(first.serial, second.serial);
    Ok(())
}

#[test]
fn test_sec1_record_key_is_reused_verbatim() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let sec1 = include_str!("../../fixtures/ec_p256_sec1.key");
    let mut record = Secret::new();
    record.data.insert(TLS_PRIVATE_KEY_KEY.to_string(), sec1.as_bytes().to_vec());

    let secret = factory.generate(Some(&record), ["a.local"])?;
    assert_eq!(secret.private_key_pem(), Some(sec1.as_bytes()));

    let renewed = factory.renew(&secret)?;
    assert_eq!(renewed.private_key_pem(), Some(sec1.as_bytes()));

    let key = load_private_key_pem(sec1.as_bytes())?;
    let chain = parse_certs_pem(renewed.certificate_pem().unwrap_or_default())?;
    let (_, leaf) = X509Certificate::from_der(chain[0].as_ref())?;
    assert_eq!(&*leaf.public_key().subject_public_key.data, key.public_key_raw());
    Ok(())
}

#[test]
fn test_pkcs1_record_key_is_reused() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let pkcs1 = include_str!("../../fixtures/rsa_pkcs1.key");
    let mut record = Secret::new();
    record.data.insert(TLS_PRIVATE_KEY_KEY.to_string(), pkcs1.as_bytes().to_vec());

    let secret = factory.generate(Some(&record), ["a.local"])?;

    assert_eq!(secret.private_key_pem(), Some(pkcs1.as_bytes()));
    factory.verify(&secret)?;
    Ok(())
}

#[test]
fn test_leaf_carries_authority_key_identifier() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = factory.generate(None, ["a.local"])?;

    let chain = parse_certs_pem(secret.certificate_pem().unwrap_or_default())?;
    let (_, leaf) = X509Certificate::from_der(chain[0].as_ref())?;
    let (_, ca) = X509Certificate::from_der(chain[1].as_ref())?;

    let aki = leaf.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::AuthorityKeyIdentifier(aki) => aki.key_identifier.as_ref(),
        _ => None,
    });
    let ski = ca.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::SubjectKeyIdentifier(ski) => Some(ski),
        _ => None,
    });

    let aki = aki.expect("leaf has an authority key identifier");
    if let Some(ski) = ski {
        assert_eq!(aki.0, ski.0);
    }
    Ok(())
}

#[test]
fn test_out_of_range_validity_is_an_error() -> anyhow::Result<()> {
    for validity_days in [0, -5, i64::MAX] {
        let factory = factory_with(FactoryConfig { validity_days, ..Default::default() })?;

        let err = factory.generate(None, ["a.local"]).unwrap_err();
        assert!(matches!(err, TlsError::InvalidValidity { days, .. } if days == validity_days));
    }
    Ok(())
}
