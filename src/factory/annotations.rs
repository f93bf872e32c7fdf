//! Annotation bookkeeping: which CNs a secret's certificate covers, whether
//! it is static, and its fingerprint.
//!
//! Each covered CN is stored as one annotation whose value is the exact CN and
//! whose key is derived from it by [`AnnotationCodec::key`]. Keys may be
//! truncated and hashed to respect key length limits; the value is what gets
//! read back, so the mapping never has to be reversed.

use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::config::AnnotationKeyLimits;
use crate::domain::Secret;

/// Prefix shared by every per-CN annotation key.
pub const CN_PREFIX: &str = "listener.dyncert.io/cn-";

/// Annotation marking a secret as static (user-provided) when set to `"true"`.
pub const STATIC_ANNOTATION: &str = "listener.dyncert.io/static";

/// Annotation holding the `SHA1=<HEX>` fingerprint of the leaf certificate.
pub const FINGERPRINT_ANNOTATION: &str = "listener.dyncert.io/fingerprint";

/// Maps CNs to bounded-length annotation keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCodec {
    limits: AnnotationKeyLimits,
}

impl AnnotationCodec {
    pub fn new(limits: AnnotationKeyLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> AnnotationKeyLimits {
        self.limits
    }

    /// Annotation key for a CN.
    ///
    /// IPv4 addresses and short hostnames are stored as-is. Longer names and
    /// IPv6 addresses have `:` replaced with `_`, are truncated, and get a
    /// SHA-256 suffix of the unmodified key to keep similar names apart.
    pub fn key(&self, cn: &str) -> String {
        let key = format!("{CN_PREFIX}{cn}");
        if key.len() < self.limits.max_key_len && !key.contains(':') {
            return key;
        }

        let digest = hex::encode(Sha256::digest(key.as_bytes()));
        let mut key = key.replace(':', "_");
        let mut len = key.len().min(self.limits.truncated_len);
        while !key.is_char_boundary(len) {
            len -= 1;
        }
        key.truncate(len);

        let suffix_len = self.limits.digest_chars.min(digest.len());
        format!("{}-{}", key, &digest[..suffix_len])
    }

    /// Whether the secret records `cn` as covered.
    pub fn covers(&self, secret: &Secret, cn: &str) -> bool {
        secret.annotations.get(&self.key(cn)).is_some_and(|value| !value.is_empty())
    }

    /// Reports whether `secret` must be regenerated to cover `cns`.
    ///
    /// An absent secret always needs an update. Otherwise the first CN not yet
    /// recorded triggers an update, unless `max_sans` is non-zero and the secret
    /// already carries at least that many CN annotations, in which case growth stops.
    pub fn needs_update<S: AsRef<str>>(
        &self,
        max_sans: usize,
        secret: Option<&Secret>,
        cns: &[S],
    ) -> bool {
        let Some(secret) = secret else {
            return true;
        };

        for cn in cns {
            if !self.covers(secret, cn.as_ref()) {
                if max_sans > 0 && recorded_cn_keys(secret) >= max_sans {
                    return false;
                }
                return true;
            }
        }

        false
    }
}

/// Annotation key for a CN under the default limits.
pub fn annotation_key(cn: &str) -> String {
    AnnotationCodec::default().key(cn)
}

/// CNs recorded on a secret.
pub fn cns_of(secret: &Secret) -> BTreeSet<String> {
    secret
        .annotations
        .iter()
        .filter(|(key, _)| key.starts_with(CN_PREFIX))
        .map(|(_, value)| value.clone())
        .collect()
}

/// CNs recorded on an optional secret; empty when absent.
pub fn cns(secret: Option<&Secret>) -> BTreeSet<String> {
    secret.map(cns_of).unwrap_or_default()
}

/// Whether the secret holds a static (user-provided) certificate.
pub fn is_static(secret: &Secret) -> bool {
    secret.annotations.get(STATIC_ANNOTATION).is_some_and(|value| value == "true")
}

/// Number of CN annotation keys on the secret, duplicates and empty values included.
fn recorded_cn_keys(secret: &Secret) -> usize {
    secret.annotations.keys().filter(|key| key.starts_with(CN_PREFIX)).count()
}

/// Needs-update check under the default key limits.
pub fn needs_update<S: AsRef<str>>(max_sans: usize, secret: Option<&Secret>, cns: &[S]) -> bool {
    AnnotationCodec::default().needs_update(max_sans, secret, cns)
}
