//! # Certificate Factory
//!
//! Keeps a secret's TLS certificate in step with the set of names it has to
//! serve. The factory decides between reusing an existing secret, preferring
//! an alternative candidate, or signing a new leaf with the configured CA, and
//! keeps the per-CN annotations consistent with what the certificate covers.
//!
//! Every operation is pure with respect to its inputs: unchanged results are
//! handed back as [`Cow::Borrowed`] references to the caller's secret, changed
//! results are fresh copies. Static (user-provided) secrets are never altered.

pub mod annotations;
pub mod expiration;
pub mod filter;
pub mod generate;
pub mod names;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::FactoryConfig;
use crate::domain::Secret;
use crate::errors::TlsError;
use crate::utils::CertificateAuthority;

pub use annotations::{
    annotation_key, cns, cns_of, is_static, needs_update, AnnotationCodec, CN_PREFIX,
    FINGERPRINT_ANNOTATION, STATIC_ANNOTATION,
};
pub use filter::{CnFilter, SuffixFilter};
pub use names::{classify, is_valid_cn};

/// Issues and maintains dynamic-SAN certificates signed by one CA.
#[derive(Clone)]
pub struct TlsFactory {
    ca: Arc<CertificateAuthority>,
    cn: String,
    organization: Vec<String>,
    filter_cn: Option<Arc<dyn CnFilter>>,
    expiration_days_check: i64,
    validity_days: i64,
    codec: AnnotationCodec,
}

impl fmt::Debug for TlsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsFactory")
            .field("ca", &self.ca)
            .field("cn", &self.cn)
            .field("organization", &self.organization)
            .field("filter_cn", &self.filter_cn.is_some())
            .field("expiration_days_check", &self.expiration_days_check)
            .field("validity_days", &self.validity_days)
            .field("codec", &self.codec)
            .finish()
    }
}

impl TlsFactory {
    pub fn new(ca: impl Into<Arc<CertificateAuthority>>, config: &FactoryConfig) -> Self {
        Self {
            ca: ca.into(),
            cn: config.cn.clone(),
            organization: config.organization.clone(),
            filter_cn: None,
            expiration_days_check: config.expiration_days_check,
            validity_days: config.validity_days,
            codec: AnnotationCodec::new(config.annotation_key_limits),
        }
    }

    /// Install a CN approval policy applied by [`TlsFactory::add_cn`].
    pub fn with_filter(mut self, filter: impl CnFilter + 'static) -> Self {
        self.filter_cn = Some(Arc::new(filter));
        self
    }

    pub fn ca(&self) -> &CertificateAuthority {
        &self.ca
    }

    pub fn codec(&self) -> &AnnotationCodec {
        &self.codec
    }

    /// See [`AnnotationCodec::needs_update`].
    pub fn needs_update<S: AsRef<str>>(
        &self,
        max_sans: usize,
        secret: Option<&Secret>,
        cns: &[S],
    ) -> bool {
        self.codec.needs_update(max_sans, secret, cns)
    }

    /// Apply the configured CN policy. Without a policy, or for an empty
    /// request, the CNs are returned untouched.
    pub fn filter(&self, cns: Vec<String>) -> Vec<String> {
        match &self.filter_cn {
            Some(filter) if !cns.is_empty() => filter.filter(cns),
            _ => cns,
        }
    }

    /// Combine the SANs of `target` and `additional`.
    ///
    /// Returns the chosen secret and whether it differs from `target`:
    /// - a static `target` is returned as-is;
    /// - `additional` wins if it already covers every CN of both and has not
    ///   expired, so rotated or regenerated certificates take over;
    /// - otherwise `target` is kept if it covers every CN and has not expired;
    /// - otherwise a new certificate for the union is signed using `target`'s key.
    pub fn merge<'a>(
        &self,
        target: Option<&'a Secret>,
        additional: Option<&'a Secret>,
    ) -> Result<(Cow<'a, Secret>, bool), TlsError> {
        let _span = crate::cert_span!("merge").entered();

        if let Some(target) = target.filter(|s| is_static(s)) {
            debug!("target certificate is static; skipping merge");
            return Ok((Cow::Borrowed(target), false));
        }

        let mut merged = cns(target);
        merged.extend(cns(additional));
        let merged: Vec<String> = merged.into_iter().collect();

        if let Some(additional) = additional.filter(|s| self.is_acceptable(s, &merged)) {
            debug!(cns = merged.len(), "additional certificate covers all CNs");
            return Ok((Cow::Borrowed(additional), true));
        }

        if let Some(target) = target.filter(|s| self.is_acceptable(s, &merged)) {
            debug!(cns = merged.len(), "target certificate covers all CNs");
            return Ok((Cow::Borrowed(target), false));
        }

        let secret = self.generate(target, &merged)?;
        Ok((Cow::Owned(secret), true))
    }

    /// Re-sign the certificate with the same key and CNs to extend its
    /// validity. All other annotations are dropped.
    pub fn renew(&self, secret: &Secret) -> Result<Secret, TlsError> {
        let _span = crate::cert_span!("renew").entered();

        if is_static(secret) {
            return Err(TlsError::StaticCertificate);
        }

        let cns = cns_of(secret);
        let mut base = secret.clone();
        base.annotations.clear();
        self.generate_owned(base, &cns)
    }

    /// Add CNs to the secret's certificate, returning the possibly new secret
    /// and whether it changed.
    ///
    /// CNs pass through the filter first. Static secrets and secrets that
    /// already cover every requested CN are returned unchanged.
    pub fn add_cn<'a, S: AsRef<str>>(
        &self,
        secret: Option<&'a Secret>,
        cns: &[S],
    ) -> Result<(Cow<'a, Secret>, bool), TlsError> {
        let _span = crate::cert_span!("add_cn", requested = cns.len()).entered();

        let cns = self.filter(cns.iter().map(|cn| cn.as_ref().to_string()).collect());

        if let Some(secret) =
            secret.filter(|s| is_static(s) || !self.codec.needs_update(0, Some(*s), cns.as_slice()))
        {
            return Ok((Cow::Borrowed(secret), false));
        }

        let secret = self.generate(secret, &cns)?;
        Ok((Cow::Owned(secret), true))
    }

    /// Issue a brand-new key and certificate covering the same CNs.
    ///
    /// The result starts from an empty secret, so data and annotations other
    /// than the CNs are not carried over. Static secrets are rejected.
    pub fn regenerate(&self, secret: &Secret) -> Result<Secret, TlsError> {
        let _span = crate::cert_span!("regenerate").entered();

        if is_static(secret) {
            return Err(TlsError::StaticCertificate);
        }

        let cns = cns_of(secret);
        self.generate(None, &cns)
    }

    fn is_acceptable(&self, secret: &Secret, cns: &[String]) -> bool {
        !self.codec.needs_update(0, Some(secret), cns) && !self.is_expired(secret)
    }
}
