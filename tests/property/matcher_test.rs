// tests/property/matcher_test.rs

//! Property-based tests for the wildcard filter matcher.

use indexfence::core::matcher::FilterMatcher;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn literal_filters_cover_only_equal_resources(
        resource in "[a-z0-9_.-]{0,12}",
        filter in "[a-z0-9_.-]{1,12}",
    ) {
        let matcher = FilterMatcher::new();
        let expected = resource == filter;
        prop_assert_eq!(matcher.covers(&resource, &filter), expected);
        // the leading slash is stripped on both sides
        prop_assert_eq!(
            matcher.covers(&format!("/{resource}"), &format!("/{filter}")),
            expected
        );
    }

    #[test]
    fn the_bare_star_resource_matches_every_literal_filter(
        filter in "[a-z0-9_.-]{1,12}",
    ) {
        let matcher = FilterMatcher::new();
        prop_assert!(matcher.covers("*", &filter));
        prop_assert!(matcher.covers("/*", &filter));
    }

    #[test]
    fn trailing_wildcard_covers_every_extension(
        prefix in "[a-z_]{1,8}",
        suffix in "[a-z0-9_]{0,8}",
    ) {
        let matcher = FilterMatcher::new();
        let filter = format!("/{prefix}*");
        let resource = format!("/{prefix}{suffix}");
        prop_assert!(matcher.covers(&resource, &filter));
    }

    #[test]
    fn leading_wildcard_covers_every_prefix(
        prefix in "[a-z0-9_]{0,8}",
        suffix in "[a-z_]{1,8}",
    ) {
        let matcher = FilterMatcher::new();
        let filter = format!("/*{suffix}");
        let resource = format!("/{prefix}{suffix}");
        prop_assert!(matcher.covers(&resource, &filter));
    }

    #[test]
    fn trailing_wildcard_never_covers_a_different_prefix(
        prefix in "[a-z]{2,8}",
        resource in "[a-z0-9_]{1,12}",
    ) {
        let matcher = FilterMatcher::new();
        prop_assume!(!resource.starts_with(&prefix));
        let resource = format!("/{resource}");
        let filter = format!("/{prefix}*");
        prop_assert!(!matcher.covers(&resource, &filter));
    }

    #[test]
    fn wildcarded_resources_match_filters_only_textually(
        left in "[a-z0-9_]{0,6}",
        middle in "[a-z0-9_]{0,6}",
        right in "[a-z0-9_]{0,6}",
    ) {
        let matcher = FilterMatcher::new();
        let resource = format!("/{left}*{middle}");
        let filter = format!("/{middle}*{right}");
        prop_assert_eq!(matcher.covers(&resource, &filter), resource == filter);
    }

    #[test]
    fn covering_is_deterministic_across_repeated_calls(
        resource in "[a-z0-9_*.-]{0,12}",
        filter in "[a-z0-9_*.-]{0,12}",
    ) {
        let matcher = FilterMatcher::new();
        let first = matcher.covers(&resource, &filter);
        for _ in 0..4 {
            prop_assert_eq!(matcher.covers(&resource, &filter), first);
        }
    }
}
