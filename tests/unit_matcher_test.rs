use indexfence::core::matcher::FilterMatcher;

#[test]
fn exact_filters_cover_only_themselves() {
    let matcher = FilterMatcher::new();
    assert!(matcher.covers("/test_index", "/test_index"));
    assert!(!matcher.covers("/test_index", "/other_index"));
    assert!(!matcher.covers("/test_index1", "/test_index"));
}

#[test]
fn bare_wildcard_resource_is_covered_by_any_concrete_filter() {
    let matcher = FilterMatcher::new();
    assert!(matcher.covers("*", "/test_index"));
    assert!(matcher.covers("/*", "/test_index"));
    assert!(matcher.covers("/*", "/x"));
}

#[test]
fn empty_operands() {
    let matcher = FilterMatcher::new();
    // both empty after stripping the leading slash
    assert!(matcher.covers("/", "/"));
    assert!(matcher.covers("", ""));
    // exactly one empty never matches
    assert!(!matcher.covers("/", "/test_index"));
    assert!(!matcher.covers("/test_index", "/"));
}

#[test]
fn trailing_wildcard() {
    let matcher = FilterMatcher::new();
    let filter = "/test_index*";
    assert!(matcher.covers("/test_index", filter));
    assert!(matcher.covers("/test_index1", filter));
    assert!(!matcher.covers("/test_1index", filter));
    assert!(!matcher.covers("/1test_index", filter));
}

#[test]
fn inner_wildcard() {
    let matcher = FilterMatcher::new();
    let filter = "/test_*index";
    assert!(matcher.covers("/test_index", filter));
    assert!(matcher.covers("/test_1index", filter));
    assert!(!matcher.covers("/test_index1", filter));
    assert!(!matcher.covers("/1test_index", filter));
}

#[test]
fn leading_and_trailing_wildcards() {
    let matcher = FilterMatcher::new();
    let filter = "/*test_index*";
    assert!(matcher.covers("/test_index", filter));
    assert!(matcher.covers("/test_index1", filter));
    assert!(matcher.covers("/1test_index", filter));
    assert!(!matcher.covers("/test_1index", filter));
}

#[test]
fn wildcarded_operands_only_match_textually() {
    let matcher = FilterMatcher::new();
    assert!(!matcher.covers("/test_index*", "/test_*index"));
    assert!(!matcher.covers("/test_*index", "/test_index*"));
    assert!(matcher.covers("/test_index*", "/test_index*"));
}

#[test]
fn repeated_lookups_reuse_the_cached_pattern() {
    let matcher = FilterMatcher::new();
    for _ in 0..3 {
        assert!(matcher.covers("/logs-2024", "/logs-*"));
        assert!(!matcher.covers("/metrics-2024", "/logs-*"));
    }
}
