use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::core::error::HunterError;

/// Permissive TOML shape; every field defaults so a partial file still loads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub ct_stream_url: Option<String>,
    #[serde(default)]
    pub queue_capacity: Option<usize>,
    #[serde(default)]
    pub browser_enabled: Option<bool>,
    #[serde(default)]
    pub dns_timeout_ms: Option<u64>,
    #[serde(default)]
    pub layer2_budget_ms: Option<u64>,
    #[serde(default)]
    pub scan_budget_ms: Option<u64>,
    #[serde(default)]
    pub thai_banks: Vec<String>,
    #[serde(default)]
    pub thai_gov: Vec<String>,
    #[serde(default)]
    pub thai_ewallet: Vec<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub suspicious_tlds: Vec<String>,
    #[serde(default)]
    pub thai_phishing_keywords: Vec<String>,
    #[serde(default)]
    pub addition_words: Vec<String>,
}

/// Compiled, immutable configuration used by the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub ct_stream_url: String,
    pub queue_capacity: usize,
    pub browser_enabled: bool,
    pub dns_timeout_ms: u64,
    pub layer2_budget_ms: u64,
    pub scan_budget_ms: u64,
    pub brands: Vec<String>,
    pub aliases: BTreeMap<String, Vec<String>>,
    pub whitelist: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub thai_phishing_keywords: Vec<String>,
    pub addition_words: Vec<String>,
}

impl TargetConfig {
    pub fn from_raw(raw: RawConfig) -> Result<Self, HunterError> {
        let mut brands: Vec<String> = Vec::new();
        brands.extend(raw.thai_banks.iter().cloned());
        brands.extend(raw.thai_gov.iter().cloned());
        brands.extend(raw.thai_ewallet.iter().cloned());
        if brands.is_empty() {
            return Err(HunterError::Config(
                "config must name at least one brand".into(),
            ));
        }
        for b in &brands {
            if b.is_empty() || !b.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(HunterError::Config(format!("invalid brand label: {}", b)));
            }
        }

        Ok(TargetConfig {
            ct_stream_url: raw
                .ct_stream_url
                .unwrap_or_else(|| "wss://certstream.calidog.io/".to_string()),
            queue_capacity: raw.queue_capacity.unwrap_or(1024),
            browser_enabled: raw.browser_enabled.unwrap_or(true),
            dns_timeout_ms: raw.dns_timeout_ms.unwrap_or(2_000),
            layer2_budget_ms: raw.layer2_budget_ms.unwrap_or(15_000),
            scan_budget_ms: raw.scan_budget_ms.unwrap_or(60_000),
            brands,
            aliases: raw.aliases,
            whitelist: if raw.whitelist.is_empty() {
                default_whitelist()
            } else {
                raw.whitelist
            },
            suspicious_tlds: if raw.suspicious_tlds.is_empty() {
                default_suspicious_tlds()
            } else {
                raw.suspicious_tlds
            },
            thai_phishing_keywords: if raw.thai_phishing_keywords.is_empty() {
                default_thai_keywords()
            } else {
                raw.thai_phishing_keywords
            },
            addition_words: if raw.addition_words.is_empty() {
                default_addition_words()
            } else {
                raw.addition_words
            },
        })
    }

    /// A workable configuration for the demo brand set, no file required.
    pub fn demo() -> Self {
        let raw = RawConfig {
            thai_banks: vec![
                "kbank".into(),
                "scb".into(),
                "bbl".into(),
                "ktb".into(),
                "krungthai".into(),
                "gsb".into(),
                "ttb".into(),
                "kkp".into(),
            ],
            whitelist: vec![
                "kbank.com".into(),
                "kasikornbank.com".into(),
                "scb.co.th".into(),
                "bangkokbank.com".into(),
                "ktb.co.th".into(),
                "gsb.or.th".into(),
            ],
            ..Default::default()
        };
        TargetConfig::from_raw(raw).expect("demo config is always valid")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<TargetConfig, HunterError> {
    let default_path = Path::new("config/ctsentinel.toml");
    let path = path.unwrap_or(default_path);

    if !path.exists() {
        return Ok(TargetConfig::demo());
    }

    let content = fs::read_to_string(path).map_err(|e| HunterError::Config(e.to_string()))?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| HunterError::Config(e.to_string()))?;
    TargetConfig::from_raw(raw)
}

fn default_whitelist() -> Vec<String> {
    vec![
        "kbank.com".into(),
        "kasikornbank.com".into(),
        "scb.co.th".into(),
        "bangkokbank.com".into(),
        "ktb.co.th".into(),
    ]
}

fn default_suspicious_tlds() -> Vec<String> {
    vec![
        ".xyz", ".top", ".club", ".online", ".site", ".info", ".work", ".click", ".link",
        ".buzz", ".live", ".store", ".space", ".fun", ".icu", ".pw", ".cc", ".tk", ".ml", ".ga",
        ".cf", ".gq", ".cam", ".rest", ".monster",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_thai_keywords() -> Vec<String> {
    vec![
        "เข้าสู่ระบบ",
        "รหัสผ่าน",
        "ยืนยันตัวตน",
        "otp",
        "บัญชีธนาคาร",
        "ด่วน",
        "อายัดบัญชี",
        "kbank",
        "scb easy",
        "verify account",
        "suspended account",
        "click here to verify",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_addition_words() -> Vec<String> {
    vec![
        "secure", "login", "signin", "verify", "update", "confirm", "account", "online",
        "mobile", "app", "auth", "portal", "service", "support", "help", "official", "real",
        "true", "thailand", "thai", "th", "bkk",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
