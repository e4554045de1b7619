// Trunkwatch — Reconnect backoff for the gateway bridge
//
// Exponential backoff with ±25% jitter: base 1s, doubling per attempt,
// capped at 5 minutes.

use std::time::{Duration, SystemTime};

const INITIAL_RECONNECT_DELAY_MS: u64 = 1_000;
const MAX_RECONNECT_DELAY_MS: u64 = 300_000;

/// Delay before reconnect `attempt` (0-based), without sleeping.
pub fn reconnect_backoff(attempt: u32) -> Duration {
    let base_ms = INITIAL_RECONNECT_DELAY_MS * 2u64.pow(attempt.min(12));
    let capped_ms = base_ms.min(MAX_RECONNECT_DELAY_MS);
    Duration::from_millis(apply_jitter(capped_ms))
}

/// Sleep for the reconnect backoff and return how long that was.
pub async fn reconnect_delay(attempt: u32) -> Duration {
    let delay = reconnect_backoff(attempt);
    tokio::time::sleep(delay).await;
    delay
}

fn apply_jitter(base_ms: u64) -> u64 {
    let jitter_range = (base_ms / 4) as i64;
    if jitter_range == 0 {
        return base_ms.max(100);
    }
    let offset = (rand_jitter() % (2 * jitter_range + 1)) - jitter_range;
    let result = base_ms as i64 + offset;
    result.max(100) as u64
}

/// Jitter from the clock's sub-second nanos.
fn rand_jitter() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    nanos as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_stays_within_jitter_band() {
        for attempt in 0..4 {
            let base = INITIAL_RECONNECT_DELAY_MS * 2u64.pow(attempt);
            let ms = reconnect_backoff(attempt).as_millis() as u64;
            assert!(ms >= base - base / 4 && ms <= base + base / 4, "attempt {} → {}ms", attempt, ms);
        }
    }

    #[test]
    fn backoff_is_capped() {
        let ms = reconnect_backoff(30).as_millis() as u64;
        assert!(ms <= MAX_RECONNECT_DELAY_MS + MAX_RECONNECT_DELAY_MS / 4);
    }
}
