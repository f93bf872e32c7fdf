use dyncert::config::AnnotationKeyLimits;
use dyncert::domain::Secret;
use dyncert::factory::{annotation_key, cns_of, needs_update, AnnotationCodec, CN_PREFIX};
use proptest::prelude::*;

use super::super::support::annotated_secret;

fn cn_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9]([a-z0-9.-]{0,80}[a-z0-9])?",
        any::<std::net::Ipv4Addr>().prop_map(|ip| ip.to_string()),
        any::<std::net::Ipv6Addr>().prop_map(|ip| ip.to_string()),
    ]
}

proptest! {
    #[test]
    fn prop_annotation_key_is_deterministic(cn in cn_strategy()) {
        prop_assert_eq!(annotation_key(&cn), annotation_key(&cn));
    }

    #[test]
    fn prop_annotation_key_is_bounded(cn in cn_strategy()) {
        let key = annotation_key(&cn);
        prop_assert!(key.len() <= 63, "{} is {} bytes", key, key.len());
        prop_assert!(key.starts_with(CN_PREFIX));
        prop_assert!(!key.contains(':'));
    }

    #[test]
    fn prop_short_names_keep_readable_keys(cn in "[a-z0-9]([a-z0-9.-]{0,38}[a-z0-9])?") {
        prop_assert_eq!(annotation_key(&cn), format!("{CN_PREFIX}{cn}"));
    }

    #[test]
    fn prop_coverage_reads_back_exact_names(cns in prop::collection::btree_set(cn_strategy(), 0..8)) {
        let refs: Vec<&str> = cns.iter().map(String::as_str).collect();
        let secret = annotated_secret(&refs);
        prop_assert_eq!(cns_of(&secret), cns);
    }

    #[test]
    fn prop_needs_update_false_iff_all_covered(
        recorded in prop::collection::btree_set(cn_strategy(), 0..6),
        requested in prop::collection::vec(cn_strategy(), 0..6),
    ) {
        let refs: Vec<&str> = recorded.iter().map(String::as_str).collect();
        let secret = annotated_secret(&refs);
        let all_covered = requested.iter().all(|cn| recorded.contains(cn));
        prop_assert_eq!(needs_update(0, Some(&secret), &requested), !all_covered);
    }

    #[test]
    fn prop_needs_update_caps_growth(
        recorded in prop::collection::btree_set(cn_strategy(), 1..6),
        requested in prop::collection::vec(cn_strategy(), 1..6),
    ) {
        let refs: Vec<&str> = recorded.iter().map(String::as_str).collect();
        let secret = annotated_secret(&refs);
        for cap in 1..=recorded.len() {
            prop_assert!(!needs_update(cap, Some(&secret), &requested));
        }
    }

    #[test]
    fn prop_custom_limits_bound_keys(cn in cn_strategy(), digest_chars in 4usize..16) {
        let limits = AnnotationKeyLimits { max_key_len: 48, truncated_len: 30, digest_chars };
        let key = AnnotationCodec::new(limits).key(&cn);
        prop_assert!(key.len() < limits.max_key_len);
    }
}

#[test]
fn test_ipv6_key_matches_documented_shape() {
    let key = annotation_key("2001:db8::1");

    assert!(key.len() <= 63);
    assert!(!key.contains(':'));
    let (_, suffix) = key.rsplit_once('-').unwrap();
    assert_eq!(suffix.len(), 6);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_absent_record_always_needs_update() {
    assert!(needs_update::<&str>(0, None, &[]));
    assert!(needs_update(5, None::<&Secret>, &["a.local"]));
}
