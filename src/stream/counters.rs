use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;

use crate::core::types::{Detection, StatsSnapshot};

/// Monotonic, thread-safe counters for the CT stream consumer. Cheap to
/// update from the hot path; `snapshot` copies out a point-in-time view.
pub struct Counters {
    started_at: Instant,
    certs_processed: AtomicU64,
    domains_checked: AtomicU64,
    detections: AtomicU64,
    high_risk: AtomicU64,
    dropped: AtomicU64,
    by_brand: DashMap<String, u64>,
    by_rule: DashMap<String, u64>,
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            started_at: Instant::now(),
            certs_processed: AtomicU64::new(0),
            domains_checked: AtomicU64::new(0),
            detections: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            by_brand: DashMap::new(),
            by_rule: DashMap::new(),
        }
    }
}

impl Counters {
    pub fn record_cert(&self) {
        self.certs_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_domain(&self) {
        self.domains_checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_detection(&self, detection: &Detection) {
        self.detections.fetch_add(1, Ordering::Relaxed);
        if detection.is_high_risk() {
            self.high_risk.fetch_add(1, Ordering::Relaxed);
        }
        *self
            .by_brand
            .entry(detection.matched_brand.clone())
            .or_insert(0) += 1;
        *self
            .by_rule
            .entry(detection.rule_kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let uptime = self.started_at.elapsed().as_secs_f64();
        let certs = self.certs_processed.load(Ordering::Relaxed);
        let rate = if uptime > 0.0 {
            certs as f64 / uptime
        } else {
            0.0
        };

        let by_brand: BTreeMap<String, u64> = self
            .by_brand
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        let by_rule: BTreeMap<String, u64> = self
            .by_rule
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();

        StatsSnapshot {
            uptime_seconds: uptime,
            certs_processed: certs,
            domains_checked: self.domains_checked.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            high_risk: self.high_risk.load(Ordering::Relaxed),
            by_brand,
            by_rule,
            dropped: self.dropped.load(Ordering::Relaxed),
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::RuleKind;

    #[test]
    fn snapshot_reflects_recorded_detection() {
        let counters = Counters::default();
        counters.record_cert();
        counters.record_domain();
        counters.record_detection(&Detection {
            id: String::new(),
            fqdn: "kbank-secure.xyz".into(),
            matched_brand: "kbank".into(),
            rule_kind: RuleKind::KeywordMatch,
            risk_score: 85,
            risk_factors: vec![],
            detected_at: now_utc(),
            cert_issuer_org: String::new(),
            sibling_sans: vec![],
        });

        let snap = counters.snapshot();
        assert_eq!(snap.certs_processed, 1);
        assert_eq!(snap.detections, 1);
        assert_eq!(snap.high_risk, 1);
        assert_eq!(snap.by_brand.get("kbank"), Some(&1));
    }
}
