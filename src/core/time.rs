use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct RunWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub fn run_window(budget: Duration) -> RunWindow {
    let now = now_utc();
    RunWindow {
        start: now,
        end: now + budget,
    }
}

/// Reads `CT_SENTINEL_FIXED_TIME` (RFC3339) so tests can pin the clock instead
/// of racing real time.
pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var("CT_SENTINEL_FIXED_TIME") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_time_override_is_honored() {
        std::env::set_var("CT_SENTINEL_FIXED_TIME", "2024-01-01T00:00:00Z");
        let now = now_utc();
        std::env::remove_var("CT_SENTINEL_FIXED_TIME");
        assert_eq!(now.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
