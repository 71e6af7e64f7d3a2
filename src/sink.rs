use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::core::error::HunterError;
use crate::core::types::{Detection, StatsSnapshot};

/// External subscriber contract. Both methods must not block the caller for
/// long; the reference `FileSink` below does a simple append.
pub trait DetectionSink: Send + Sync {
    fn on_detection(&self, detection: &Detection);
    fn on_stats(&self, stats: &StatsSnapshot);
}

const CSV_HEADER: &str = "timestamp,domain,target,fuzzer_type,risk_score,risk_factors,issuer";

/// Minimal reference sink: appends to a CSV and a JSON-Lines file.
pub struct FileSink {
    csv_path: PathBuf,
    jsonl_path: PathBuf,
}

impl FileSink {
    pub fn new(csv_path: impl Into<PathBuf>, jsonl_path: impl Into<PathBuf>) -> Self {
        FileSink {
            csv_path: csv_path.into(),
            jsonl_path: jsonl_path.into(),
        }
    }

    fn append_csv(&self, detection: &Detection) -> Result<(), HunterError> {
        let needs_header = !self.csv_path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)?;
        if needs_header {
            writeln!(file, "{}", CSV_HEADER)?;
        }
        writeln!(file, "{}", detection.to_csv_row())?;
        Ok(())
    }

    fn append_jsonl(&self, detection: &Detection) -> Result<(), HunterError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.jsonl_path)?;
        let line = detection
            .to_json_line()
            .map_err(|e| HunterError::Internal(e.to_string()))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

impl DetectionSink for FileSink {
    fn on_detection(&self, detection: &Detection) {
        if let Err(err) = self.append_csv(detection) {
            tracing::warn!("failed to append csv detection: {}", err);
        }
        if let Err(err) = self.append_jsonl(detection) {
            tracing::warn!("failed to append jsonl detection: {}", err);
        }
    }

    fn on_stats(&self, stats: &StatsSnapshot) {
        tracing::info!(
            certs = stats.certs_processed,
            detections = stats.detections,
            high_risk = stats.high_risk,
            dropped = stats.dropped,
            "stats snapshot"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::now_utc;
    use crate::core::types::RuleKind;

    #[test]
    fn csv_row_matches_fixed_schema() {
        let detection = Detection {
            id: String::new(),
            fqdn: "kbank-secure.xyz".into(),
            matched_brand: "kbank".into(),
            rule_kind: RuleKind::KeywordMatch,
            risk_score: 85,
            risk_factors: vec!["Contains target keyword: kbank".into(), "Suspicious TLD: .xyz".into()],
            detected_at: now_utc(),
            cert_issuer_org: "Let's Encrypt".into(),
            sibling_sans: vec![],
        };
        let row = detection.to_csv_row();
        assert!(row.contains("kbank-secure.xyz"));
        assert!(row.contains("Contains target keyword: kbank; Suspicious TLD: .xyz"));
    }

    #[test]
    fn file_sink_writes_header_once() {
        let dir = std::env::temp_dir().join(format!("ctsentinel-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let csv_path = dir.join("detections.csv");
        let jsonl_path = dir.join("detections.jsonl");
        let _ = std::fs::remove_file(&csv_path);
        let _ = std::fs::remove_file(&jsonl_path);

        let sink = FileSink::new(&csv_path, &jsonl_path);
        let detection = Detection {
            id: String::new(),
            fqdn: "kbank-secure.xyz".into(),
            matched_brand: "kbank".into(),
            rule_kind: RuleKind::KeywordMatch,
            risk_score: 85,
            risk_factors: vec![],
            detected_at: now_utc(),
            cert_issuer_org: String::new(),
            sibling_sans: vec![],
        };
        sink.on_detection(&detection);
        sink.on_detection(&detection);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.matches(CSV_HEADER).count(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
