//! 🎬 *[a channel fills with log lines. somewhere, a sink waits.]*
//! *[the clock on the wall reads 2:47am.]*
//!
//! 🗑️ The BatchWorker: the only consumer of the submission channel.
//!
//! It collects entries until the batch is full or `max_wait` has passed since
//! the first one showed up, whichever comes first. Then it hands the frozen
//! batch to the sink, retries it with a fixed pause up to `retry` more times,
//! and either counts a win or logs the loss and lets the batch go.
//!
//! ```text
//!   producers ──► channel ──► [ wait first ] ──► [ fill until full | deadline ] ──► dispatch
//!                                   ▲                                                  │
//!                                   └──────────────── next batch ◄─────────────────────┘
//! ```
//!
//! Batch N is fully resolved before batch N+1 starts filling. There is one
//! consumer, so the batch under construction is never shared.
//!
//! 🦆 (the duck has no comment at this time)

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, warn};

use super::Worker;
use crate::backends::{Sink, SinkBackend};
use crate::common::{PushBatch, StreamEntry};
use crate::error::PushError;
use crate::supervisors::EngineStats;
use crate::supervisors::config::BatchPolicy;

/// 🗑️ Takes entries from a channel, throws batches at a sink.
#[derive(Debug)]
pub(crate) struct BatchWorker {
    rx: Receiver<StreamEntry>,
    sink: SinkBackend,
    policy: BatchPolicy,
    cancel: CancellationToken,
    span: Span,
    stats: EngineStats,
}

/// 🚦 Why the fill loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillOutcome {
    Full,
    Deadline,
    /// every sender is gone
    Closed,
    Cancelled,
}

/// 🚦 What woke the idle wait.
enum Wake {
    Entry(StreamEntry),
    Closed,
    Cancelled,
}

impl BatchWorker {
    pub(crate) fn new(
        rx: Receiver<StreamEntry>,
        sink: SinkBackend,
        policy: BatchPolicy,
        cancel: CancellationToken,
        span: Span,
    ) -> Self {
        Self {
            rx,
            sink,
            policy,
            cancel,
            span,
            stats: EngineStats::default(),
        }
    }

    async fn run(mut self) -> EngineStats {
        debug!(
            batch_size = self.policy.batch_size,
            max_wait_ms = self.policy.max_wait.as_millis() as u64,
            retry = self.policy.retry,
            "📥 BatchWorker started draining channel..."
        );

        loop {
            // -- 💤 idle: nothing buffered, so no timer is running either
            let wake = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Wake::Cancelled,
                received = self.rx.recv() => match received {
                    Ok(entry) => Wake::Entry(entry),
                    Err(_) => Wake::Closed,
                },
            };

            let first = match wake {
                Wake::Entry(entry) => entry,
                Wake::Closed => {
                    debug!("🏁 BatchWorker: channel closed and empty. Shutting down.");
                    break;
                }
                Wake::Cancelled => {
                    self.shutdown_flush(PushBatch::default()).await;
                    break;
                }
            };

            let mut batch = PushBatch::with_capacity(self.policy.batch_size);
            batch.push(first);

            match self.fill(&mut batch).await {
                FillOutcome::Full | FillOutcome::Deadline => self.dispatch(batch).await,
                FillOutcome::Closed => {
                    debug!("🏁 BatchWorker: last sender dropped, flushing the leftovers.");
                    self.dispatch(batch).await;
                    break;
                }
                FillOutcome::Cancelled => {
                    self.shutdown_flush(batch).await;
                    break;
                }
            }
        }

        info!(
            batches_delivered = self.stats.batches_delivered,
            batches_dropped = self.stats.batches_dropped,
            entries_delivered = self.stats.entries_delivered,
            entries_dropped = self.stats.entries_dropped,
            attempts = self.stats.attempts,
            "🏁 BatchWorker finished"
        );
        self.stats
    }

    /// 📦 Keep pulling entries until the batch is full, the window closes, or the world ends.
    ///
    /// The window opens when the first entry arrived, which is just before this is called.
    async fn fill(&self, batch: &mut PushBatch) -> FillOutcome {
        let deadline = tokio::time::sleep(self.policy.max_wait);
        tokio::pin!(deadline);

        while batch.len() < self.policy.batch_size {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return FillOutcome::Cancelled,
                _ = &mut deadline => return FillOutcome::Deadline,
                received = self.rx.recv() => received,
            };
            match received {
                Ok(entry) => batch.push(entry),
                Err(_) => return FillOutcome::Closed,
            }
        }
        FillOutcome::Full
    }

    /// 🚀 Deliver one batch: up to `retry + 1` attempts with a fixed pause in between.
    async fn dispatch(&mut self, batch: PushBatch) {
        let entries = batch.len() as u64;
        let max_attempts = self.policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            self.stats.attempts += 1;

            let err = match self.sink.send(&self.cancel, &batch).await {
                Ok(()) => {
                    debug!(entries, lines = batch.line_count(), attempt, "✅ batch delivered");
                    self.stats.batches_delivered += 1;
                    self.stats.entries_delivered += entries;
                    return;
                }
                Err(err) => err,
            };

            if matches!(err, PushError::Cancelled) {
                warn!(entries, attempt, "🛑 cancelled while delivering, batch dropped");
                self.record_drop(entries);
                return;
            }
            if !err.is_retryable() || attempt >= max_attempts {
                error!(entries, attempts = attempt, error = %err, "💀 giving up on batch, dropping it");
                self.record_drop(entries);
                return;
            }

            warn!(
                entries,
                attempt,
                max_attempts,
                backoff_ms = self.policy.retry_backoff.as_millis() as u64,
                error = %err,
                "🔄 push attempt failed, retrying the same batch"
            );
            let cancelled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(self.policy.retry_backoff) => false,
            };
            if cancelled {
                warn!(entries, attempt, "🛑 cancelled during retry backoff, batch dropped");
                self.record_drop(entries);
                return;
            }
        }
    }

    /// 🗑️ Last gasp after cancellation: stop taking entries, scoop up what is
    /// already queued, and give it one attempt bounded by `shutdown_grace`.
    async fn shutdown_flush(&mut self, mut batch: PushBatch) {
        self.rx.close();
        while batch.len() < self.policy.batch_size {
            match self.rx.try_recv() {
                Ok(entry) => batch.push(entry),
                Err(_) => break,
            }
        }
        let mut left_behind = 0u64;
        while self.rx.try_recv().is_ok() {
            left_behind += 1;
        }
        if left_behind > 0 {
            warn!(left_behind, "🗑️ queued entries beyond the final batch are dropped");
            self.stats.entries_dropped += left_behind;
        }

        if batch.is_empty() {
            debug!("🛑 BatchWorker cancelled with nothing buffered.");
            return;
        }

        let entries = batch.len() as u64;
        info!(entries, grace_ms = self.policy.shutdown_grace.as_millis() as u64, "🛑 cancelled, attempting a final flush");
        self.stats.attempts += 1;

        // -- the original token already fired, so the final attempt gets its own
        let final_token = CancellationToken::new();
        match tokio::time::timeout(
            self.policy.shutdown_grace,
            self.sink.send(&final_token, &batch),
        )
        .await
        {
            Ok(Ok(())) => {
                debug!(entries, "✅ final batch delivered on the way out");
                self.stats.batches_delivered += 1;
                self.stats.entries_delivered += entries;
            }
            Ok(Err(err)) => {
                error!(entries, error = %err, "💀 final flush failed, batch dropped");
                self.record_drop(entries);
            }
            Err(_) => {
                error!(entries, "💀 final flush ran out of grace time, batch dropped");
                self.record_drop(entries);
            }
        }
    }

    fn record_drop(&mut self, entries: u64) {
        self.stats.batches_dropped += 1;
        self.stats.entries_dropped += entries;
    }
}

impl Worker for BatchWorker {
    type Output = EngineStats;

    fn start(self) -> JoinHandle<EngineStats> {
        let span = self.span.clone();
        tokio::spawn(self.run().instrument(span))
    }
}
