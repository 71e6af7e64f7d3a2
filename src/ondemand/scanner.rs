use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tokio::sync::Semaphore;

use crate::config::TargetConfig;
use crate::core::error::HunterError;
use crate::core::hash::stable_detection_id;
use crate::core::time::{now_utc, run_window};
use crate::core::types::{
    Detection, DeepAnalysisResult, L2Result, L3Result, PermutationSummary, QuickCheckResult,
    Recommendation, RuleKind, Verdict,
};
use crate::layers::{bouncer, detective::Detective, judge};
use crate::permutation::engine::generate_variants;
use crate::permutation::PermutationIndex;
use crate::scoring;
use crate::whitelist::is_whitelisted;

const DEFAULT_CONCURRENCY: usize = 20;

/// How many `scan`/`analyze_single` calls this scanner services at once.
/// Overflow is rejected with `HunterError::Busy` rather than queued, since
/// both of those calls are themselves heavy (permutation fan-out, or a full
/// three-layer analysis) and queuing would just hide the saturation.
const MAX_CONCURRENT_REQUESTS: usize = 4;

pub struct OnDemandScanner {
    config: TargetConfig,
    request_slots: Arc<Semaphore>,
}

impl OnDemandScanner {
    pub fn new(config: TargetConfig) -> Self {
        OnDemandScanner {
            config,
            request_slots: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
        }
    }

    /// Generates permutations for a target brand without resolving them.
    pub fn permutations(&self, target: &str) -> Vec<Detection> {
        generate_variants(target, &self.config.addition_words)
            .into_iter()
            .map(|variant| {
                let fqdn = format!("{}.com", variant.label);
                let (risk_score, risk_factors) = scoring::score(&fqdn, target, variant.rule_kind);
                let id = stable_detection_id(&fqdn, target, variant.rule_kind.as_str());
                Detection {
                    id,
                    fqdn,
                    matched_brand: target.to_string(),
                    rule_kind: variant.rule_kind,
                    risk_score,
                    risk_factors,
                    detected_at: now_utc(),
                    cert_issuer_org: String::new(),
                    sibling_sans: vec![],
                }
            })
            .collect()
    }

    /// Generates, resolves, and scores every permutation of `target`,
    /// optionally escalating the highest-scoring registered candidates.
    pub async fn scan(
        &self,
        target: &str,
        escalate_top_n: usize,
    ) -> Result<PermutationSummary, HunterError> {
        let _slot = self.request_slots.try_acquire().map_err(|_| HunterError::Busy)?;
        let variants = generate_variants(target, &self.config.addition_words);
        let total_permutations = variants.len();
        let semaphore = Arc::new(Semaphore::new(DEFAULT_CONCURRENCY));
        let dns_timeout_ms = self.config.dns_timeout_ms;
        let target_owned = target.to_string();

        let window = run_window(chrono::Duration::milliseconds(
            self.config.scan_budget_ms as i64,
        ));

        let mut resolved = stream::iter(variants)
            .map(|variant| {
                let semaphore = semaphore.clone();
                let target = target_owned.clone();
                async move {
                    let _permit = semaphore.acquire().await.ok()?;
                    let fqdn = format!("{}.com", variant.label);
                    let registered = resolve_a_records(&fqdn, dns_timeout_ms)
                        .await
                        .map(|records| !records.is_empty())
                        .unwrap_or(false);
                    if !registered {
                        return None;
                    }
                    let (risk_score, mut risk_factors) =
                        scoring::score(&fqdn, &target, variant.rule_kind);
                    risk_factors.insert(0, "Domain is registered".to_string());
                    let id = stable_detection_id(&fqdn, &target, variant.rule_kind.as_str());
                    Some(Detection {
                        id,
                        fqdn,
                        matched_brand: target,
                        rule_kind: variant.rule_kind,
                        risk_score,
                        risk_factors,
                        detected_at: now_utc(),
                        cert_issuer_org: String::new(),
                        sibling_sans: vec![],
                    })
                }
            })
            .buffer_unordered(DEFAULT_CONCURRENCY)
            .filter_map(|item| async move { item });

        // The whole fan-out is bounded by a single wall-clock window rather
        // than per-domain timeouts alone, so a scan over many permutations
        // can't run unbounded; anything still in flight past the deadline is
        // dropped from the results rather than awaited.
        let mut results: Vec<Detection> = Vec::new();
        loop {
            let remaining = match (window.end - now_utc()).to_std() {
                Ok(d) if !d.is_zero() => d,
                _ => break,
            };
            match tokio::time::timeout(remaining, resolved.next()).await {
                Ok(Some(detection)) => results.push(detection),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        results.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
        let registered_count = results.len();
        let high_risk_count = results.iter().filter(|d| d.is_high_risk()).count();

        let mut deep_analysis = Vec::new();
        if escalate_top_n > 0 {
            let detective = Detective::new(
                self.config.browser_enabled,
                self.config.thai_phishing_keywords.clone(),
                self.config.layer2_budget_ms,
            );
            for detection in results.iter().take(escalate_top_n) {
                let deep = self.deep_analyze(detection.clone(), &detective).await;
                deep_analysis.push(deep);
            }
        }

        Ok(PermutationSummary {
            target: target.to_string(),
            total_permutations,
            registered_count,
            high_risk_count,
            results,
            deep_analysis,
        })
    }

    /// Cheap substring-based check, whitelisting legitimate brand domains.
    pub fn quick_check(&self, fqdn: &str) -> QuickCheckResult {
        let fqdn_lower = fqdn.to_lowercase();

        let legit_variants: Vec<String> = self
            .config
            .brands
            .iter()
            .flat_map(|brand| {
                vec![
                    format!("{}.com", brand),
                    format!("{}.co.th", brand),
                    format!("{}.th", brand),
                ]
            })
            .collect();

        if is_whitelisted(&fqdn_lower, &legit_variants) || is_whitelisted(&fqdn_lower, &self.config.whitelist)
        {
            return QuickCheckResult {
                is_suspicious: false,
                matched_target: None,
            };
        }

        for brand in &self.config.brands {
            if fqdn_lower.contains(brand.as_str()) {
                return QuickCheckResult {
                    is_suspicious: true,
                    matched_target: Some(brand.clone()),
                };
            }
        }
        QuickCheckResult {
            is_suspicious: false,
            matched_target: None,
        }
    }

    /// Full three-layer analysis of a single fqdn against a target brand (or
    /// the best keyword/permutation match if no target is given).
    pub async fn analyze_single(
        &self,
        fqdn: &str,
        target: Option<&str>,
    ) -> Result<DeepAnalysisResult, HunterError> {
        let _slot = self.request_slots.try_acquire().map_err(|_| HunterError::Busy)?;
        let index = PermutationIndex::build(&self.config.brands, &self.config.addition_words);
        let target_brand = match target {
            Some(t) => t.to_string(),
            None => index
                .contains_brand_keyword(fqdn)
                .or_else(|| index.lookup(fqdn).map(|(b, _)| b))
                .unwrap_or_else(|| self.config.brands.first().cloned().unwrap_or_default()),
        };

        let rule_kind = index
            .lookup(fqdn)
            .map(|(_, r)| r)
            .unwrap_or(RuleKind::KeywordMatch);
        let (risk_score, risk_factors) = scoring::score(fqdn, &target_brand, rule_kind);

        let id = stable_detection_id(fqdn, &target_brand, rule_kind.as_str());
        let detection = Detection {
            id,
            fqdn: fqdn.to_string(),
            matched_brand: target_brand,
            rule_kind,
            risk_score,
            risk_factors,
            detected_at: now_utc(),
            cert_issuer_org: String::new(),
            sibling_sans: vec![],
        };

        let detective = Detective::new(
            self.config.browser_enabled,
            self.config.thai_phishing_keywords.clone(),
            self.config.layer2_budget_ms,
        );
        Ok(self.deep_analyze(detection, &detective).await)
    }

    /// Runs L1 always; L2 and L3 only when L1 shows the domain is
    /// registered. An unregistered domain has nothing for a browser to
    /// render and no DOM/verdict evidence to aggregate, so both are skipped
    /// rather than run against empty input.
    async fn deep_analyze(&self, detection: Detection, detective: &Detective) -> DeepAnalysisResult {
        let l1 = bouncer::run(&detection.fqdn, &detection.matched_brand, self.config.dns_timeout_ms)
            .await;

        if !l1.is_registered {
            let l2 = L2Result::default();
            let l3 = L3Result {
                verdict: Verdict::Unknown,
                recommendation: Recommendation::Monitor,
                confidence: 0.0,
                reasoning: "domain is not registered; layers 2 and 3 skipped".to_string(),
                score: 0,
            };
            let final_score = l1.score;
            let final_recommendation = judge::final_recommendation(final_score);
            return DeepAnalysisResult {
                detection,
                l1,
                l2,
                l3,
                final_score,
                final_recommendation,
            };
        }

        let l2 = detective.analyze(&detection.fqdn).await;
        let l3: L3Result = judge::judge(&l1, &l2);

        let final_score = ((0.3 * l1.score as f32) + (0.4 * l2.score as f32) + (0.3 * l3.score as f32))
            .round()
            .clamp(0.0, 100.0) as u8;
        let final_recommendation = judge::final_recommendation(final_score);

        DeepAnalysisResult {
            detection,
            l1,
            l2,
            l3,
            final_score,
            final_recommendation,
        }
    }
}

async fn resolve_a_records(fqdn: &str, timeout_ms: u64) -> Option<Vec<String>> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    match tokio::time::timeout(Duration::from_millis(timeout_ms), resolver.lookup_ip(fqdn)).await {
        Ok(Ok(lookup)) => Some(lookup.iter().map(|ip| ip.to_string()).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_check_flags_keyword_containment() {
        let scanner = OnDemandScanner::new(TargetConfig::demo());
        let result = scanner.quick_check("kbank-verify-account.top");
        assert!(result.is_suspicious);
        assert_eq!(result.matched_target, Some("kbank".to_string()));
    }

    #[test]
    fn quick_check_whitelists_legit_domain() {
        let scanner = OnDemandScanner::new(TargetConfig::demo());
        let result = scanner.quick_check("www.kbank.com");
        assert!(!result.is_suspicious);
    }

    #[test]
    fn permutations_yields_scored_detections() {
        let scanner = OnDemandScanner::new(TargetConfig::demo());
        let detections = scanner.permutations("kbank");
        assert!(!detections.is_empty());
        assert!(detections.iter().all(|d| d.risk_score <= 100));
    }

    #[tokio::test]
    async fn scan_rejects_with_busy_when_request_slots_are_saturated() {
        let scanner = OnDemandScanner::new(TargetConfig::demo());
        let mut held = Vec::new();
        for _ in 0..MAX_CONCURRENT_REQUESTS {
            held.push(scanner.request_slots.clone().acquire_owned().await.unwrap());
        }

        let result = scanner.scan("kbank", 0).await;
        assert!(matches!(result, Err(HunterError::Busy)));
    }
}
