use dyncert::{
    factory::{cns_of, FINGERPRINT_ANNOTATION},
    TlsError,
};

use super::super::support::{annotated_secret, leaf_info, make_static, test_factory};

#[test]
fn test_renew_keeps_key_and_names() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = factory.generate(None, ["a.local", "10.0.0.9"])?;

    let renewed = factory.renew(&secret)?;

    assert_eq!(renewed.private_key_pem(), secret.private_key_pem());
    assert_ne!(renewed.certificate_pem(), secret.certificate_pem());
    assert_eq!(cns_of(&renewed), cns_of(&secret));
    assert_ne!(
        renewed.annotations.get(FINGERPRINT_ANNOTATION),
        secret.annotations.get(FINGERPRINT_ANNOTATION)
    );
    Ok(())
}

#[test]
fn test_renew_strips_foreign_annotations() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = factory.generate(None, ["a.local"])?.with_annotation("team/owner", "edge");

    let renewed = factory.renew(&secret)?;

    assert!(!renewed.annotations.contains_key("team/owner"));
    assert!(renewed.annotations.contains_key(FINGERPRINT_ANNOTATION));
    Ok(())
}

#[test]
fn test_renew_rejects_static_records() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = make_static(factory.generate(None, ["a.local"])?);
    let snapshot = secret.clone();

    let err = factory.renew(&secret).unwrap_err();

    assert!(matches!(err, TlsError::StaticCertificate));
    assert_eq!(err.to_string(), "cannot renew static certificate");
    assert_eq!(secret, snapshot);
    Ok(())
}

#[test]
fn test_regenerate_rotates_key_and_keeps_names() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret =
        factory.generate(None, ["a.local", "b.local"])?.with_annotation("team/owner", "edge");

    let regenerated = factory.regenerate(&secret)?;

    assert_ne!(regenerated.private_key_pem(), secret.private_key_pem());
    assert_eq!(cns_of(&regenerated), cns_of(&secret));
    assert!(!regenerated.annotations.contains_key("team/owner"));
    assert_eq!(leaf_info(&regenerated)?.dns_names, vec!["a.local", "b.local"]);
    Ok(())
}

#[test]
fn test_regenerate_rejects_static_records() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let secret = make_static(annotated_secret(&["a.local"]));

    let err = factory.regenerate(&secret).unwrap_err();

    assert!(matches!(err, TlsError::StaticCertificate));
    Ok(())
}

#[test]
fn test_regenerate_record_without_names() -> anyhow::Result<()> {
    let factory = test_factory()?;
    let regenerated = factory.regenerate(&dyncert::Secret::new())?;

    assert!(cns_of(&regenerated).is_empty());
    assert!(regenerated.certificate_pem().is_some());
    Ok(())
}
