// human
// the knobs the batch worker turns. parsed out of PushConfig by PushConfig::batch_policy,
// so by the time anything lands here the durations are real Durations and nothing is zero
// that shouldn't be.
use std::time::Duration;

/// 🔧 How the batch worker accumulates, flushes and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    /// flush as soon as this many entries are in the batch
    pub batch_size: usize,
    /// flush this long after the first entry of a batch arrived, full or not
    pub max_wait: Duration,
    /// extra attempts after the first failure
    pub retry: u32,
    /// fixed sleep between attempts
    pub retry_backoff: Duration,
    /// submission channel capacity
    pub queue_capacity: usize,
    /// upper bound on the last-gasp flush after cancellation
    pub shutdown_grace: Duration,
}

impl BatchPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retry.saturating_add(1)
    }
}
