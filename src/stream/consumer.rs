use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{Mutex, Notify};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::TargetConfig;
use crate::core::time::now_utc;
use crate::core::types::Detection;
use crate::permutation::PermutationIndex;
use crate::scoring;
use crate::stream::counters::Counters;
use crate::whitelist::{is_whitelisted, normalize_fqdn};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct CertEvent {
    message_type: String,
    #[serde(default)]
    data: Option<CertEventData>,
}

#[derive(Debug, Deserialize)]
struct CertEventData {
    leaf_cert: LeafCert,
}

#[derive(Debug, Deserialize)]
struct LeafCert {
    all_domains: Vec<String>,
    #[serde(default)]
    issuer: Issuer,
}

#[derive(Debug, Default, Deserialize)]
struct Issuer {
    #[serde(rename = "O", default)]
    o: String,
}

/// A bounded, lossy queue: under backpressure the oldest Detection is
/// dropped rather than blocking the network reader.
pub struct DetectionQueue {
    inner: Mutex<VecDeque<Detection>>,
    capacity: usize,
    notify: Notify,
}

impl DetectionQueue {
    pub fn new(capacity: usize) -> Self {
        DetectionQueue {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            notify: Notify::new(),
        }
    }

    async fn push(&self, detection: Detection, counters: &Counters) {
        let mut guard = self.inner.lock().await;
        if guard.len() >= self.capacity {
            guard.pop_front();
            counters.record_dropped();
        }
        guard.push_back(detection);
        drop(guard);
        self.notify.notify_one();
    }

    pub async fn recv(&self) -> Detection {
        loop {
            {
                let mut guard = self.inner.lock().await;
                if let Some(d) = guard.pop_front() {
                    return d;
                }
            }
            self.notify.notified().await;
        }
    }
}

pub struct StreamConsumer {
    config: TargetConfig,
    index: PermutationIndex,
    counters: Arc<Counters>,
    queue: Arc<DetectionQueue>,
    running: Arc<AtomicBool>,
}

impl StreamConsumer {
    pub fn new(config: TargetConfig) -> Self {
        let index = PermutationIndex::build(&config.brands, &config.addition_words);
        let queue = Arc::new(DetectionQueue::new(config.queue_capacity));
        StreamConsumer {
            config,
            index,
            counters: Arc::new(Counters::default()),
            queue,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    pub fn queue(&self) -> Arc<DetectionQueue> {
        self.queue.clone()
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Runs the reconnect loop forever (until `stop()`), draining the CT
    /// firehose and pushing Detections onto the bounded queue.
    pub async fn run(&self) {
        let mut backoff = INITIAL_BACKOFF;

        while self.running.load(Ordering::Relaxed) {
            if let Err(err) = self.run_once(&mut backoff).await {
                tracing::warn!("ct stream disconnected: {}", err);
            }

            if !self.running.load(Ordering::Relaxed) {
                break;
            }

            let jitter_frac = rand::thread_rng().gen_range(-0.2..=0.2);
            let jittered = backoff.mul_f64(1.0 + jitter_frac);
            tracing::info!("reconnecting to ct stream in {:?}", jittered);
            tokio::time::sleep(jittered).await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    /// Reads until the connection drops. `backoff` is reset to
    /// `INITIAL_BACKOFF` after every successfully-read message, so a
    /// long-lived connection that eventually drops doesn't inherit a ratcheted
    /// delay from earlier in its own lifetime.
    async fn run_once(&self, backoff: &mut Duration) -> anyhow::Result<()> {
        let (ws_stream, _) = connect_async(&self.config.ct_stream_url).await?;
        let (mut write, mut read) = ws_stream.split();

        while self.running.load(Ordering::Relaxed) {
            let msg = match read.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(err)) => return Err(err.into()),
                None => return Err(anyhow::anyhow!("ct stream closed")),
            };

            match msg {
                Message::Text(text) => {
                    self.handle_message(&text).await;
                    *backoff = INITIAL_BACKOFF;
                }
                Message::Ping(payload) => {
                    let _ = write.send(Message::Pong(payload)).await;
                }
                Message::Close(_) => return Err(anyhow::anyhow!("ct stream closed by peer")),
                _ => {}
            }
        }
        Ok(())
    }

    async fn handle_message(&self, text: &str) {
        let event: CertEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(_) => return,
        };
        if event.message_type != "certificate_update" {
            return;
        }
        let Some(data) = event.data else { return };

        self.counters.record_cert();

        for raw_domain in &data.leaf_cert.all_domains {
            self.counters.record_domain();
            let Some(fqdn) = normalize_fqdn(raw_domain) else {
                continue;
            };
            if is_whitelisted(&fqdn, &self.config.whitelist) {
                continue;
            }

            let (matched_brand, rule_kind) =
                if let Some(brand) = self.index.contains_brand_keyword(&fqdn) {
                    (brand, crate::core::types::RuleKind::KeywordMatch)
                } else if let Some((brand, rule)) = self.index.lookup(&fqdn) {
                    (brand, rule)
                } else {
                    continue;
                };

            let (risk_score, risk_factors) =
                scoring::score(&fqdn, &matched_brand, rule_kind);

            let sibling_sans: Vec<String> = data
                .leaf_cert
                .all_domains
                .iter()
                .filter(|d| normalize_fqdn(d).as_deref() != Some(fqdn.as_str()))
                .cloned()
                .collect();

            let id = crate::core::hash::stable_detection_id(&fqdn, &matched_brand, rule_kind.as_str());

            let detection = Detection {
                id,
                fqdn,
                matched_brand,
                rule_kind,
                risk_score,
                risk_factors,
                detected_at: now_utc(),
                cert_issuer_org: data.leaf_cert.issuer.o.clone(),
                sibling_sans,
            };

            self.counters.record_detection(&detection);
            self.queue.push(detection, &self.counters).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_drops_oldest_under_pressure() {
        let queue = DetectionQueue::new(2);
        let counters = Counters::default();
        for i in 0..5 {
            queue
                .push(
                    Detection {
                        id: String::new(),
                        fqdn: format!("kbank-{}.xyz", i),
                        matched_brand: "kbank".into(),
                        rule_kind: crate::core::types::RuleKind::KeywordMatch,
                        risk_score: 50,
                        risk_factors: vec![],
                        detected_at: now_utc(),
                        cert_issuer_org: String::new(),
                        sibling_sans: vec![],
                    },
                    &counters,
                )
                .await;
        }
        let snap = counters.snapshot();
        assert_eq!(snap.dropped, 3);

        let first = queue.recv().await;
        assert_eq!(first.fqdn, "kbank-3.xyz");
    }

    #[tokio::test]
    async fn sibling_sans_excludes_the_matched_fqdn() {
        let config = crate::config::TargetConfig::demo();
        let consumer = StreamConsumer::new(config);

        let payload = r#"{
            "message_type": "certificate_update",
            "data": {
                "leaf_cert": {
                    "all_domains": ["kbank-secure.xyz", "www.kbank-secure.xyz", "other.kbank-secure.xyz"],
                    "issuer": {"O": "Let's Encrypt"}
                }
            }
        }"#;
        consumer.handle_message(payload).await;

        let detection = consumer.queue().recv().await;
        assert_eq!(detection.fqdn, "kbank-secure.xyz");
        assert!(!detection.sibling_sans.contains(&"kbank-secure.xyz".to_string()));
        assert!(detection.sibling_sans.contains(&"www.kbank-secure.xyz".to_string()));
    }
}
