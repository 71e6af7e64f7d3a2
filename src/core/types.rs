use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A label we protect against impersonation, e.g. "kbank".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Brand(pub String);

impl Brand {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RuleKind {
    Bitsquatting,
    Homoglyph,
    Hyphenation,
    Insertion,
    Omission,
    Repetition,
    Replacement,
    Transposition,
    VowelSwap,
    Addition,
    KeywordMatch,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Bitsquatting => "bitsquatting",
            RuleKind::Homoglyph => "homoglyph",
            RuleKind::Hyphenation => "hyphenation",
            RuleKind::Insertion => "insertion",
            RuleKind::Omission => "omission",
            RuleKind::Repetition => "repetition",
            RuleKind::Replacement => "replacement",
            RuleKind::Transposition => "transposition",
            RuleKind::VowelSwap => "vowel-swap",
            RuleKind::Addition => "addition",
            RuleKind::KeywordMatch => "keyword-match",
        }
    }

    pub fn is_high_risk(&self) -> bool {
        matches!(self, RuleKind::Homoglyph | RuleKind::Bitsquatting)
    }

    pub fn is_medium_risk(&self) -> bool {
        matches!(self, RuleKind::Addition | RuleKind::Hyphenation)
    }
}

/// One generated typosquat candidate for a brand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    pub label: String,
    pub rule_kind: RuleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Stable identifier derived from `fqdn`/`matched_brand`/`rule_kind`, so
    /// the same candidate re-detected across runs carries the same id.
    #[serde(default)]
    pub id: String,
    pub fqdn: String,
    pub matched_brand: String,
    pub rule_kind: RuleKind,
    pub risk_score: u8,
    pub risk_factors: Vec<String>,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub cert_issuer_org: String,
    #[serde(default)]
    pub sibling_sans: Vec<String>,
}

impl Detection {
    pub fn is_high_risk(&self) -> bool {
        self.risk_score >= 70
    }

    /// CSV row matching the header `timestamp,domain,target,fuzzer_type,risk_score,risk_factors,issuer`.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.detected_at.to_rfc3339(),
            self.fqdn,
            self.matched_brand,
            self.rule_kind.as_str(),
            self.risk_score,
            self.risk_factors.join("; "),
            self.cert_issuer_org,
        )
    }

    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Suspicious,
    Phishing,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Recommendation {
    Safe,
    Monitor,
    Investigate,
    Takedown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct L1Result {
    pub is_registered: bool,
    pub a_records: Vec<String>,
    pub rule_kind: Option<RuleKind>,
    pub score: u8,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomAnalysis {
    pub has_login_form: bool,
    pub has_password_field: bool,
    pub form_count: usize,
    pub form_action_urls: Vec<String>,
    pub input_descriptors: Vec<String>,
    pub external_link_hosts: Vec<String>,
    pub thai_keywords_found: Vec<String>,
    pub title: String,
    pub description: String,
    pub visible_text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct L2Result {
    pub page_accessible: bool,
    pub used_http_fallback: bool,
    pub redirect_chain: Vec<String>,
    pub screenshot: Option<Vec<u8>>,
    pub dom: DomAnalysis,
    pub score: u8,
    pub factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L3Result {
    pub verdict: Verdict,
    pub recommendation: Recommendation,
    pub confidence: f32,
    pub reasoning: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepAnalysisResult {
    pub detection: Detection,
    pub l1: L1Result,
    pub l2: L2Result,
    pub l3: L3Result,
    pub final_score: u8,
    pub final_recommendation: Recommendation,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub uptime_seconds: f64,
    pub certs_processed: u64,
    pub domains_checked: u64,
    pub detections: u64,
    pub high_risk: u64,
    pub by_brand: std::collections::BTreeMap<String, u64>,
    pub by_rule: std::collections::BTreeMap<String, u64>,
    pub dropped: u64,
    pub rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationSummary {
    pub target: String,
    pub total_permutations: usize,
    pub registered_count: usize,
    pub high_risk_count: usize,
    pub results: Vec<Detection>,
    #[serde(default)]
    pub deep_analysis: Vec<DeepAnalysisResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickCheckResult {
    pub is_suspicious: bool,
    pub matched_target: Option<String>,
}
