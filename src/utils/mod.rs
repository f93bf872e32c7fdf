//! Utility functions and helpers

pub mod certificates;

pub use certificates::{
    certificate_info, fingerprint, load_private_key_pem, marshal, marshal_chain, new_private_key,
    parse_certs_pem, parse_private_key_pem, CertificateAuthority, CertificateInfo,
    MAX_VALIDITY_DAYS,
};
