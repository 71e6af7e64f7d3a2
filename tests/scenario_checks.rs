use ct_sentinel::config::TargetConfig;
use ct_sentinel::core::types::RuleKind;
use ct_sentinel::layers::detective::Detective;
use ct_sentinel::ondemand::OnDemandScanner;
use ct_sentinel::permutation::PermutationIndex;
use ct_sentinel::whitelist::{is_whitelisted, normalize_fqdn};

/// "krunqthai.com" (q substituted for g) must resolve through the index as
/// a homoglyph hit against "krungthai", not keyword-match or transposition.
#[test]
fn homoglyph_variant_resolves_to_correct_brand_and_rule() {
    let config = TargetConfig::demo();
    let index = PermutationIndex::build(&config.brands, &config.addition_words);
    let hit = index.lookup("krunqthai.com");
    assert_eq!(hit, Some(("krungthai".to_string(), RuleKind::Homoglyph)));
}

/// The legitimate brand domain itself must never be treated as a detection.
#[test]
fn whitelist_dominates_over_keyword_containment() {
    let config = TargetConfig::demo();
    assert!(is_whitelisted("kbank.com", &config.whitelist));
    assert!(is_whitelisted("www.kbank.com", &config.whitelist));

    let scanner = OnDemandScanner::new(config);
    let result = scanner.quick_check("kbank.com");
    assert!(!result.is_suspicious);
}

/// A wildcard SAN must be stripped to its bare label before matching, so
/// `*.kbank-phish.xyz` is treated identically to `kbank-phish.xyz`.
#[test]
fn wildcard_san_is_stripped_before_matching() {
    let normalized = normalize_fqdn("*.kbank-phish.xyz").expect("valid fqdn after stripping");
    assert_eq!(normalized, "kbank-phish.xyz");

    let config = TargetConfig::demo();
    let index = PermutationIndex::build(&config.brands, &config.addition_words);
    assert_eq!(
        index.contains_brand_keyword(&normalized),
        Some("kbank".to_string())
    );
}

/// Once the browser path fails once, it must latch off: a second, unrelated
/// call on the same Detective must go straight to HTTP fallback without
/// attempting to launch a browser again.
#[tokio::test]
async fn browser_failure_latches_off_for_later_calls() {
    // A chrome_path that cannot possibly exist forces a genuine launch
    // failure on the first call, exercising the real latch mutation rather
    // than just a statically-disabled browser path.
    let detective = Detective::with_chrome_path(
        true,
        vec![],
        5_000,
        Some(std::path::PathBuf::from("/nonexistent/definitely-not-a-browser")),
    );

    let server_a = httpmock::MockServer::start();
    server_a.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(200).body("<html><body>first target</body></html>");
    });
    let result_a = detective
        .analyze_url(&format!("http://{}/", server_a.address()))
        .await;
    assert!(result_a.used_http_fallback);

    let server_b = httpmock::MockServer::start();
    server_b.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/");
        then.status(200).body("<html><body>second target</body></html>");
    });
    let result_b = detective
        .analyze_url(&format!("http://{}/", server_b.address()))
        .await;
    assert!(result_b.used_http_fallback);
}
