/// Normalizes an incoming SAN entry: strips a leading wildcard label and
/// lowercases. Returns `None` if the remainder is not a plausible FQDN.
pub fn normalize_fqdn(raw: &str) -> Option<String> {
    let stripped = raw.strip_prefix("*.").unwrap_or(raw);
    let lowered = stripped.to_lowercase();
    if is_valid_fqdn(&lowered) {
        Some(lowered)
    } else {
        None
    }
}

/// RFC 1035-ish label validation: 1-63 chars per label, alphanumeric and
/// hyphen, no leading/trailing hyphen, at least one dot.
pub fn is_valid_fqdn(fqdn: &str) -> bool {
    if fqdn.is_empty() || fqdn.len() > 253 || !fqdn.contains('.') {
        return false;
    }
    fqdn.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// True if `fqdn` equals, or is a DNS descendant of, any whitelist entry.
pub fn is_whitelisted(fqdn: &str, whitelist: &[String]) -> bool {
    let fqdn = fqdn.to_lowercase();
    whitelist.iter().any(|safe| {
        let safe = safe.to_lowercase();
        fqdn == safe || fqdn.ends_with(&format!(".{}", safe))
    })
}
