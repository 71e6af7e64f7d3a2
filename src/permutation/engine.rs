use std::collections::HashSet;

use crate::core::types::{RuleKind, Variant};

const QWERTY_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];
const VOWELS: [char; 5] = ['a', 'e', 'i', 'o', 'u'];

/// Enumerate every typosquat variant of `brand` across the fixed rule set.
/// Deterministic: the same brand and addition-word list always yield the
/// same set. Duplicates across rules keep the first rule encountered, in
/// the order the rules are applied below.
pub fn generate_variants(brand: &str, addition_words: &[String]) -> Vec<Variant> {
    let brand = brand.to_lowercase();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<Variant> = Vec::new();

    let mut push = |label: String, rule_kind: RuleKind, out: &mut Vec<Variant>| {
        if label == brand || label.is_empty() {
            return;
        }
        if seen.insert(label.clone()) {
            out.push(Variant { label, rule_kind });
        }
    };

    for label in bitsquatting(&brand) {
        push(label, RuleKind::Bitsquatting, &mut out);
    }
    for label in homoglyph(&brand) {
        push(label, RuleKind::Homoglyph, &mut out);
    }
    for label in hyphenation(&brand) {
        push(label, RuleKind::Hyphenation, &mut out);
    }
    for label in insertion(&brand) {
        push(label, RuleKind::Insertion, &mut out);
    }
    for label in omission(&brand) {
        push(label, RuleKind::Omission, &mut out);
    }
    for label in repetition(&brand) {
        push(label, RuleKind::Repetition, &mut out);
    }
    for label in replacement(&brand) {
        push(label, RuleKind::Replacement, &mut out);
    }
    for label in transposition(&brand) {
        push(label, RuleKind::Transposition, &mut out);
    }
    for label in vowel_swap(&brand) {
        push(label, RuleKind::VowelSwap, &mut out);
    }
    for label in addition(&brand, addition_words) {
        push(label, RuleKind::Addition, &mut out);
    }

    out
}

fn bitsquatting(brand: &str) -> Vec<String> {
    let bytes = brand.as_bytes();
    let masks: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
    let mut out = Vec::new();
    for i in 0..bytes.len() {
        for mask in masks {
            let flipped = bytes[i] ^ mask;
            if !is_domain_char(flipped) {
                continue;
            }
            let mut candidate = bytes.to_vec();
            candidate[i] = flipped;
            if let Ok(s) = String::from_utf8(candidate) {
                out.push(s);
            }
        }
    }
    out
}

fn homoglyph_table() -> Vec<(&'static str, &'static str)> {
    vec![
        ("o", "0"),
        ("0", "o"),
        ("l", "1"),
        ("l", "i"),
        ("i", "l"),
        ("rn", "m"),
        ("cl", "d"),
        ("vv", "w"),
        ("w", "vv"),
        ("m", "rn"),
    ]
}

fn homoglyph(brand: &str) -> Vec<String> {
    let mut out = Vec::new();
    let table = homoglyph_table();
    for (from, to) in &table {
        let mut start = 0;
        while let Some(pos) = brand[start..].find(from) {
            let idx = start + pos;
            let mut candidate = String::with_capacity(brand.len());
            candidate.push_str(&brand[..idx]);
            candidate.push_str(to);
            candidate.push_str(&brand[idx + from.len()..]);
            out.push(candidate);
            start = idx + from.len().max(1);
            if start >= brand.len() {
                break;
            }
        }
    }
    out
}

fn hyphenation(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 1..chars.len() {
        let mut candidate: String = chars[..i].iter().collect();
        candidate.push('-');
        candidate.extend(&chars[i..]);
        out.push(candidate);
    }
    out
}

fn adjacent_keys(c: char) -> Vec<char> {
    for row_idx in 0..QWERTY_ROWS.len() {
        let row = QWERTY_ROWS[row_idx];
        if let Some(pos) = row.find(c) {
            let mut neighbors = Vec::new();
            if pos > 0 {
                neighbors.push(row.as_bytes()[pos - 1] as char);
            }
            if pos + 1 < row.len() {
                neighbors.push(row.as_bytes()[pos + 1] as char);
            }
            return neighbors;
        }
    }
    Vec::new()
}

fn insertion(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        for key in adjacent_keys(chars[i]) {
            let mut before: String = chars[..i].iter().collect();
            before.push(key);
            before.extend(&chars[i..]);
            out.push(before);

            let mut after: String = chars[..=i].iter().collect();
            after.push(key);
            after.extend(&chars[i + 1..]);
            out.push(after);
        }
    }
    out
}

fn omission(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        let mut candidate: String = chars[..i].iter().collect();
        candidate.extend(&chars[i + 1..]);
        out.push(candidate);
    }
    out
}

fn repetition(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        let mut candidate: String = chars[..=i].iter().collect();
        candidate.push(chars[i]);
        candidate.extend(&chars[i + 1..]);
        out.push(candidate);
    }
    out
}

fn replacement(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len() {
        for key in adjacent_keys(chars[i]) {
            let mut candidate: String = chars[..i].iter().collect();
            candidate.push(key);
            candidate.extend(&chars[i + 1..]);
            out.push(candidate);
        }
    }
    out
}

fn transposition(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for i in 0..chars.len().saturating_sub(1) {
        let mut candidate = chars.clone();
        candidate.swap(i, i + 1);
        out.push(candidate.into_iter().collect());
    }
    out
}

fn vowel_swap(brand: &str) -> Vec<String> {
    let chars: Vec<char> = brand.chars().collect();
    let mut out = Vec::new();
    for (i, &c) in chars.iter().enumerate() {
        if !VOWELS.contains(&c) {
            continue;
        }
        for &v in &VOWELS {
            if v == c {
                continue;
            }
            let mut candidate = chars.clone();
            candidate[i] = v;
            out.push(candidate.into_iter().collect());
        }
    }
    out
}

fn addition(brand: &str, words: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for word in words {
        out.push(format!("{}{}", word, brand));
        out.push(format!("{}{}", brand, word));
        out.push(format!("{}-{}", word, brand));
        out.push(format!("{}-{}", brand, word));
    }
    out
}

fn is_domain_char(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<String> {
        vec![
            "secure", "login", "signin", "verify", "update", "confirm", "account", "online",
            "mobile", "app", "auth", "portal", "service", "support", "help", "official", "real",
            "true", "thailand", "thai", "th", "bkk",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn self_exclusion() {
        let variants = generate_variants("kbank", &words());
        assert!(!variants.iter().any(|v| v.label == "kbank"));
    }

    #[test]
    fn kbank_has_many_variants() {
        let variants = generate_variants("kbank", &words());
        assert!(variants.len() > 500, "got {}", variants.len());
    }

    #[test]
    fn determinism() {
        let a = generate_variants("kbank", &words());
        let b = generate_variants("kbank", &words());
        assert_eq!(a, b);
    }

    #[test]
    fn qwerty_replacement_produces_kbamk() {
        // 'n' is QWERTY-adjacent to 'm' on the bottom row, so replacing it
        // turns "kbank" into "kbamk".
        let variants = generate_variants("kbank", &words());
        let hit = variants.iter().find(|v| v.label == "kbamk");
        assert_eq!(hit.map(|v| v.rule_kind), Some(RuleKind::Replacement));
    }

    #[test]
    fn transposition_swaps_adjacent_pair() {
        let variants = generate_variants("kbank", &words());
        let hit = variants.iter().find(|v| v.label == "kbnak");
        assert_eq!(hit.map(|v| v.rule_kind), Some(RuleKind::Transposition));
    }

    #[test]
    fn addition_produces_secure_prefix() {
        let variants = generate_variants("kbank", &words());
        assert!(variants
            .iter()
            .any(|v| v.label == "securekbank" && v.rule_kind == RuleKind::Addition));
    }
}
