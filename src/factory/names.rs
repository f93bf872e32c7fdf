//! CN validation and domain/IP classification.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

/// A CN must start and end with an alphanumeric or `:` and may contain `-_.:` in between.
pub static CN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9:][-A-Za-z0-9_.:]*)?[A-Za-z0-9:]$").expect("valid CN regex")
});

pub fn is_valid_cn(cn: &str) -> bool {
    CN_REGEX.is_match(cn)
}

/// Split CNs into domains and IP addresses.
///
/// Input is sorted first so the resulting certificate is identical for the
/// same set of names regardless of the order they were collected in.
pub fn classify<I, S>(cns: I) -> (Vec<String>, Vec<IpAddr>)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut sorted: Vec<String> = cns.into_iter().map(Into::into).collect();
    sorted.sort();

    let mut domains = Vec::new();
    let mut ips = Vec::new();
    for cn in sorted {
        match cn.parse::<IpAddr>() {
            Ok(ip) => ips.push(ip),
            Err(_) => domains.push(cn),
        }
    }
    (domains, ips)
}
