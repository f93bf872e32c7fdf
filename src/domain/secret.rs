//! Secret record carrying a TLS key pair plus metadata annotations.
//!
//! The record mirrors a Kubernetes-style secret: string annotations, binary
//! data blobs under well-known keys and a type tag. The factory never mutates
//! a caller's record in place; every change is made on a clone.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Data key holding the PEM certificate chain (leaf first).
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Data key holding the PEM private key.
pub const TLS_PRIVATE_KEY_KEY: &str = "tls.key";

/// Secret type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// Arbitrary key/value data
    #[default]
    Opaque,
    /// Certificate chain plus private key
    Tls,
}

impl SecretType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Tls => "tls",
        }
    }
}

impl FromStr for SecretType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opaque" => Ok(Self::Opaque),
            "tls" => Ok(Self::Tls),
            _ => Err(format!("Unknown secret type: {}", s)),
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque record holding certificate material and annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Binary blobs, base64-encoded when serialized.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", with = "base64_data")]
    pub data: BTreeMap<String, Vec<u8>>,

    #[serde(default, rename = "type")]
    pub secret_type: SecretType,
}

impl Secret {
    pub fn new() -> Self {
        Self::default()
    }

    /// PEM certificate chain, if present and non-empty.
    pub fn certificate_pem(&self) -> Option<&[u8]> {
        self.data.get(TLS_CERT_KEY).map(Vec::as_slice).filter(|bytes| !bytes.is_empty())
    }

    /// PEM private key, if present and non-empty.
    pub fn private_key_pem(&self) -> Option<&[u8]> {
        self.data.get(TLS_PRIVATE_KEY_KEY).map(Vec::as_slice).filter(|bytes| !bytes.is_empty())
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

mod base64_data {
    use std::collections::BTreeMap;

    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(data: &BTreeMap<String, Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        data.iter()
            .map(|(key, value)| (key, STANDARD.encode(value)))
            .collect::<BTreeMap<_, _>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, value)| {
                STANDARD
                    .decode(value.as_bytes())
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| D::Error::custom(format!("data key '{}': {}", key, e)))
            })
            .collect()
    }
}
