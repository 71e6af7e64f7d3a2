use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Stable identifier for a Detection, independent of insertion order of its
/// risk factors.
pub fn stable_detection_id(fqdn: &str, matched_brand: &str, rule_kind: &str) -> String {
    let buf = format!("{}|{}|{}", fqdn, matched_brand, rule_kind);
    format!("det_{}", sha256_hex(buf.as_bytes()))
}

pub fn git_hash() -> String {
    std::env::var("GITHUB_SHA")
        .or_else(|_| std::env::var("GIT_HASH"))
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = stable_detection_id("kbank-secure.xyz", "kbank", "keyword-match");
        let b = stable_detection_id("kbank-secure.xyz", "kbank", "keyword-match");
        assert_eq!(a, b);
    }

    #[test]
    fn stable_id_differs_on_fqdn() {
        let a = stable_detection_id("kbank-secure.xyz", "kbank", "keyword-match");
        let b = stable_detection_id("kbank-login.xyz", "kbank", "keyword-match");
        assert_ne!(a, b);
    }
}
