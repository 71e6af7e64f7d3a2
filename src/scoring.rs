use crate::core::types::RuleKind;

const SECURITY_KEYWORDS: [&str; 6] = ["secure", "verify", "login", "update", "confirm", "auth"];

const SUSPICIOUS_TLDS: [&str; 25] = [
    ".xyz", ".top", ".club", ".online", ".site", ".info", ".work", ".click", ".link", ".buzz",
    ".live", ".store", ".space", ".fun", ".icu", ".pw", ".cc", ".tk", ".ml", ".ga", ".cf", ".gq",
    ".cam", ".rest", ".monster",
];

/// Deterministic, pure additive scoring from the fqdn, matched brand, and
/// rule kind that produced the match. Factors are emitted in trigger order;
/// the score is clamped to [0, 100].
pub fn score(fqdn: &str, matched_brand: &str, rule_kind: RuleKind) -> (u8, Vec<String>) {
    let fqdn_lower = fqdn.to_lowercase();
    let mut score: i32 = 0;
    let mut factors: Vec<String> = Vec::new();

    if rule_kind == RuleKind::KeywordMatch {
        score += 25;
        factors.push(format!("Contains target keyword: {}", matched_brand));
        score += 20;
    } else if rule_kind.is_high_risk() {
        score += 40;
        factors.push(format!("High-risk fuzzer: {}", rule_kind.as_str()));
    } else if rule_kind.is_medium_risk() {
        score += 30;
        factors.push(format!("Medium-risk fuzzer: {}", rule_kind.as_str()));
    } else {
        score += 25;
        factors.push(format!("Typosquatting: {}", rule_kind.as_str()));
    }

    for tld in SUSPICIOUS_TLDS {
        if fqdn_lower.ends_with(tld) {
            score += 25;
            factors.push(format!("Suspicious TLD: {}", tld));
            break;
        }
    }

    if fqdn_lower.matches('-').count() >= 2 {
        score += 15;
        factors.push("Multiple hyphens in domain".to_string());
    }

    if fqdn_lower.len() > 30 {
        score += 10;
        factors.push("Unusually long domain".to_string());
    }

    for word in SECURITY_KEYWORDS {
        if fqdn_lower.contains(word) {
            score += 15;
            factors.push(format!("Security keyword: {}", word));
            break;
        }
    }

    if fqdn_lower.chars().any(|c| c.is_ascii_digit()) {
        score += 5;
        factors.push("Contains numbers".to_string());
    }

    (score.clamp(0, 100) as u8, factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_exceeds_range() {
        let (s, _) = score(
            "secure-login-verify-update-123456789012345.xyz",
            "kbank",
            RuleKind::Homoglyph,
        );
        assert!(s <= 100);
    }

    #[test]
    fn kbank_secure_xyz_scores_85() {
        let (s, factors) = score("kbank-secure.xyz", "kbank", RuleKind::KeywordMatch);
        assert_eq!(s, 85, "factors: {:?}", factors);
    }

    #[test]
    fn homoglyph_base_is_forty() {
        let (s, factors) = score("krunqthai.com", "krungthai", RuleKind::Homoglyph);
        assert!(factors.contains(&"High-risk fuzzer: homoglyph".to_string()));
        assert_eq!(s, 40);
    }
}
