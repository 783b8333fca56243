//! # Previously, on lokx...
//!
//! 🎬 Loki was down. Or not installed. Or on the other side of a VPN nobody
//! remembered the password to. The tests still had to run.
//!
//! `in_mem` provides an [`InMemorySink`] that keeps every batch it is handed
//! behind an `Arc<Mutex<...>>` so tests can inspect what arrived. It can be told
//! to fail its first few attempts, or to take its sweet time, which is exactly
//! what a retry loop and a cancellation path need to be tested against.
//!
//! 🦆
//!
//! ⚠️ This is NOT for production. Also handy for `--dry-run` style setups.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::backends::{Sink, validate_batch};
use crate::common::PushBatch;
use crate::error::{PushError, Result};

/// 📦 A sink that never forgets.
///
/// Clone-able because tests need to peek inside after handing the sink off
/// to the worker. Every clone shares the same recorder.
#[derive(Debug, Default, Clone)]
pub struct InMemorySink {
    /// 🔒 The evidence locker. Only successful attempts land here.
    received: Arc<Mutex<Vec<PushBatch>>>,
    /// 🔢 Every call to `send`, win or lose.
    attempts: Arc<AtomicU64>,
    /// 💀 How many of the upcoming attempts should fail with a 503.
    failures_left: Arc<AtomicU64>,
    /// 🐢 Simulated network latency per attempt.
    latency: Duration,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 💀 Fail the first `failures` attempts with a 503, then behave.
    pub fn failing_first(self, failures: u64) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    /// 💀 Never succeed. For when you need a Loki that is having a really bad day.
    pub fn always_failing(self) -> Self {
        self.failing_first(u64::MAX)
    }

    /// 🐢 Sleep this long inside every attempt (cancellable).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 📜 Snapshot of the batches that were accepted, in arrival order.
    pub async fn received(&self) -> Vec<PushBatch> {
        self.received.lock().await.clone()
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for InMemorySink {
    async fn send(&self, cancel: &CancellationToken, batch: &PushBatch) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        validate_batch(batch)?;

        if !self.latency.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PushError::Cancelled),
                _ = tokio::time::sleep(self.latency) => {}
            }
        } else if cancel.is_cancelled() {
            return Err(PushError::Cancelled);
        }

        // -- 💀 burn one scripted failure if there are any left
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(PushError::HttpStatus {
                status_code: 503,
                status_text: "503 Service Unavailable".into(),
                body: "in-memory sink was told to fail".into(),
            });
        }

        self.received.lock().await.push(batch.clone());
        Ok(())
    }
}
