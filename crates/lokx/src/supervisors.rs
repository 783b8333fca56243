//! 🎬 *[camera pans across a dimly lit server room]*
//! 🎬 "In a world where log lines pile up faster than anyone reads them..."
//! 🎬 "One supervisor dared to batch them all."
//! 🎬 *[record scratch]* 🦆
//!
//! 📦 The Supervisor module: wires a submission channel to a batch worker and
//! hands the caller the sending half plus a join handle.
//!
//! ⚠️ The workers stay private. Callers talk to channels and handles, never to a worker.

mod workers;
pub mod config;

use async_channel::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::backends::SinkBackend;
use crate::common::StreamEntry;
use config::BatchPolicy;
use workers::{BatchWorker, Worker};

/// 📊 What the batch worker did with its life. Returned from its join handle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// batches that got a 2xx
    pub batches_delivered: u64,
    /// batches that ran out of attempts, got cancelled, or failed validation
    pub batches_dropped: u64,
    pub entries_delivered: u64,
    pub entries_dropped: u64,
    /// every call into the sink, successful or not
    pub attempts: u64,
}

/// 🧵 Spin up the channel and its single consumer.
///
/// The worker runs inside `span`, so everything it logs carries the caller's fields.
pub(crate) fn spawn_batch_worker(
    policy: BatchPolicy,
    sink: SinkBackend,
    cancel: CancellationToken,
    span: Span,
) -> (Sender<StreamEntry>, JoinHandle<EngineStats>) {
    let (tx, rx) = async_channel::bounded(policy.queue_capacity);
    let handle = BatchWorker::new(rx, sink, policy, cancel, span).start();
    (tx, handle)
}
