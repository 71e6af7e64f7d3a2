use crate::core::types::{L1Result, L2Result, L3Result, Recommendation, RuleKind, Verdict};

/// Aggregates L1/L2 evidence into a verdict, recommendation, and confidence.
/// Pure function: same inputs always produce the same output.
pub fn judge(l1: &L1Result, l2: &L2Result) -> L3Result {
    let mut reasons: Vec<&str> = Vec::new();
    let mut n: u32 = 0;

    if l1.is_registered {
        n += 1;
        reasons.push("domain is registered");
    }
    if l1.rule_kind == Some(RuleKind::Homoglyph) {
        n += 2;
        reasons.push("homoglyph rule matched");
    }
    if l1.factors.iter().any(|f| f.starts_with("Suspicious TLD")) {
        n += 1;
        reasons.push("suspicious TLD");
    }
    if l2.page_accessible && l2.dom.has_login_form {
        n += 2;
        reasons.push("login form reachable");
    }
    if !l2.dom.thai_keywords_found.is_empty() {
        n += 2;
        reasons.push("Thai phishing keywords found");
    }
    if l2.dom.has_password_field {
        n += 2;
        reasons.push("password field present");
    }

    let (verdict, recommendation, confidence) = match n {
        4.. => (
            Verdict::Phishing,
            Recommendation::Takedown,
            (0.60 + 0.08 * n as f32).min(0.95),
        ),
        2 | 3 => (
            Verdict::Suspicious,
            Recommendation::Investigate,
            (0.50 + 0.10 * n as f32).min(0.85),
        ),
        1 => (Verdict::Suspicious, Recommendation::Monitor, 0.50),
        _ => (Verdict::Unknown, Recommendation::Monitor, 0.30),
    };

    let reasoning = if reasons.is_empty() {
        "No corroborating indicators found".to_string()
    } else {
        reasons.join("; ")
    };

    L3Result {
        verdict,
        recommendation,
        confidence,
        reasoning,
        score: (10 * n).min(100) as u8,
    }
}

/// Final recommendation derived from the blended DeepAnalysisResult score,
/// independent of L3's own recommendation.
pub fn final_recommendation(final_score: u8) -> Recommendation {
    match final_score {
        80..=100 => Recommendation::Takedown,
        60..=79 => Recommendation::Investigate,
        40..=59 => Recommendation::Monitor,
        _ => Recommendation::Safe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DomAnalysis;

    #[test]
    fn zero_indicators_yields_unknown() {
        let l1 = L1Result::default();
        let l2 = L2Result::default();
        let result = judge(&l1, &l2);
        assert_eq!(result.verdict, Verdict::Unknown);
        assert_eq!(result.recommendation, Recommendation::Monitor);
    }

    #[test]
    fn registered_plus_homoglyph_is_phishing() {
        let l1 = L1Result {
            is_registered: true,
            rule_kind: Some(RuleKind::Homoglyph),
            ..Default::default()
        };
        let l2 = L2Result::default();
        let result = judge(&l1, &l2);
        assert_eq!(result.verdict, Verdict::Phishing);
        assert_eq!(result.recommendation, Recommendation::Takedown);
    }

    #[test]
    fn single_login_form_indicator_is_suspicious_investigate() {
        let l1 = L1Result::default();
        let l2 = L2Result {
            page_accessible: true,
            dom: DomAnalysis {
                has_login_form: true,
                ..Default::default()
            },
            ..Default::default()
        };
        // has_login_form weighs 2, landing in the 2-3 bucket.
        let result = judge(&l1, &l2);
        assert_eq!(result.verdict, Verdict::Suspicious);
        assert_eq!(result.recommendation, Recommendation::Investigate);
    }

    #[test]
    fn final_recommendation_thresholds() {
        assert_eq!(final_recommendation(85), Recommendation::Takedown);
        assert_eq!(final_recommendation(65), Recommendation::Investigate);
        assert_eq!(final_recommendation(45), Recommendation::Monitor);
        assert_eq!(final_recommendation(10), Recommendation::Safe);
    }
}
