use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tokio::time::timeout;

use crate::core::types::{L1Result, RuleKind};

const ADDITION_WORDS: [&str; 8] = [
    "secure",
    "login",
    "official",
    "verify",
    "update",
    "account",
    "thailand",
    "th",
];

const SUSPICIOUS_TLDS: [&str; 25] = [
    ".xyz", ".top", ".club", ".online", ".site", ".info", ".work", ".click", ".link", ".buzz",
    ".live", ".store", ".space", ".fun", ".icu", ".pw", ".cc", ".tk", ".ml", ".ga", ".cf", ".gq",
    ".cam", ".rest", ".monster",
];

/// Cheap, local-only checks. The only layer allowed to run on domains that
/// don't even resolve.
pub async fn run(fqdn: &str, target_brand: &str, dns_timeout_ms: u64) -> L1Result {
    let mut result = L1Result::default();
    let label = second_level_label(fqdn);

    let a_records = resolve_a_records(fqdn, dns_timeout_ms).await;
    if !a_records.is_empty() {
        result.is_registered = true;
        result.a_records = a_records;
        result.score = result.score.saturating_add(20);
        result.factors.push("Domain is registered and resolves".to_string());
    }

    let normalized = homoglyph_normalize(&label);
    if normalized != label && normalized.contains(target_brand) {
        result.rule_kind = Some(RuleKind::Homoglyph);
        result.score = result.score.saturating_add(30);
        result
            .factors
            .push("Homoglyph-normalized label matches target brand".to_string());
    }

    if let Some(word) = ADDITION_WORDS
        .iter()
        .find(|w| label.contains(*w) && !target_brand.contains(*w))
    {
        result.score = result.score.saturating_add(25);
        result
            .factors
            .push(format!("Deceptive addition word: {}", word));
        if result.rule_kind.is_none() {
            result.rule_kind = Some(RuleKind::Addition);
        }
    }

    if label.contains(target_brand) && label != target_brand {
        result.score = result.score.saturating_add(20);
        if result.rule_kind.is_none() {
            result.rule_kind = Some(RuleKind::KeywordMatch);
        }
    }

    let fqdn_lower = fqdn.to_lowercase();
    if let Some(tld) = SUSPICIOUS_TLDS.iter().find(|t| fqdn_lower.ends_with(*t)) {
        result.score = result.score.saturating_add(20);
        result.factors.push(format!("Suspicious TLD: {}", tld));
    }

    if fqdn_lower.matches('-').count() >= 2 {
        result.score = result.score.saturating_add(10);
        result.factors.push("Multiple hyphens in domain".to_string());
    }

    if label.len() > 25 {
        result.score = result.score.saturating_add(10);
        result.factors.push("Unusually long label".to_string());
    }

    result.score = result.score.min(100);
    result
}

async fn resolve_a_records(fqdn: &str, timeout_ms: u64) -> Vec<String> {
    let resolver = match TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    {
        resolver => resolver,
    };

    match timeout(Duration::from_millis(timeout_ms), resolver.lookup_ip(fqdn)).await {
        Ok(Ok(lookup)) => lookup.iter().map(|ip| ip.to_string()).collect(),
        _ => Vec::new(),
    }
}

fn second_level_label(fqdn: &str) -> String {
    fqdn.split('.').next().unwrap_or(fqdn).to_lowercase()
}

fn homoglyph_normalize(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '0' => 'o',
            '1' => 'l',
            '3' => 'e',
            '4' => 'a',
            '5' => 's',
            '@' => 'a',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homoglyph_normalization_maps_digits_to_letters() {
        assert_eq!(homoglyph_normalize("kb4nk"), "kbank");
        assert_eq!(homoglyph_normalize("kbank"), "kbank");
    }

    #[test]
    fn second_level_label_strips_tld() {
        assert_eq!(second_level_label("kbank-secure.xyz"), "kbank-secure");
    }

    #[tokio::test]
    async fn addition_word_score_applies_alongside_homoglyph() {
        // "kb4nk-secure" both homoglyph-normalizes to "kbank-secure" and
        // contains the addition word "secure"; both contributions must land.
        let result = run("kb4nk-secure.com", "kbank", 1).await;
        assert_eq!(result.rule_kind, Some(RuleKind::Homoglyph));
        assert!(result
            .factors
            .iter()
            .any(|f| f.starts_with("Deceptive addition word")));
    }
}
