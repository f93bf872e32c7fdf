//! Pluggable CN approval policy.

/// Policy deciding which requested CNs may be added to a certificate.
///
/// Implementations receive the requested CNs and return the approved subset,
/// possibly transformed. The factory treats them as pure functions.
pub trait CnFilter: Send + Sync {
    fn filter(&self, cns: Vec<String>) -> Vec<String>;
}

impl<F> CnFilter for F
where
    F: Fn(Vec<String>) -> Vec<String> + Send + Sync,
{
    fn filter(&self, cns: Vec<String>) -> Vec<String> {
        self(cns)
    }
}

/// Approves only CNs ending in one of the given suffixes.
#[derive(Debug, Clone)]
pub struct SuffixFilter {
    suffixes: Vec<String>,
}

impl SuffixFilter {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { suffixes: suffixes.into_iter().map(Into::into).collect() }
    }
}

impl CnFilter for SuffixFilter {
    fn filter(&self, cns: Vec<String>) -> Vec<String> {
        cns.into_iter()
            .filter(|cn| self.suffixes.iter().any(|suffix| cn.ends_with(suffix.as_str())))
            .collect()
    }
}
