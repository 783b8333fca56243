// ai
//! 🚀 The client facade: config in, submission channel out.
//!
//! 🎬 *[a producer holds a `StreamEntry`. it looks for somewhere to put it.]*
//! *[a `Sender` appears. "drop it here," it says. "I'll take it from here."]*
//!
//! [`PushClient::start`] validates the config, builds the Loki sink, opens the
//! bounded channel and spawns the batch worker. Construction errors come back
//! right away as [`PushError::Config`]. After that, submission is fire-and-forget:
//! delivery failures are the worker's problem and end up in the logs, not at the
//! producer's feet.
//!
//! 🧠 Knowledge graph:
//! - logging is injected: pass a `tracing::Span` to [`PushClient::start_with_span`]
//!   and everything the worker logs lands inside it. No global logger handle.
//! - cancellation is injected too: a `CancellationToken` plays the part of a
//!   cancellable context.
//!
//! 🦆

use anyhow::Context;
use async_channel::Sender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Span, info_span};

use crate::app_config::PushConfig;
use crate::backends::{LokiSink, SinkBackend};
use crate::common::StreamEntry;
use crate::error::{PushError, Result};
use crate::supervisors::{EngineStats, spawn_batch_worker};

/// 📡 A running push pipeline: the sending half of the channel plus its worker.
#[derive(Debug)]
pub struct PushClient {
    tx: Sender<StreamEntry>,
    handle: JoinHandle<EngineStats>,
    cancel: CancellationToken,
}

impl PushClient {
    /// 🚀 Start a client that pushes to the configured Loki server.
    ///
    /// The worker logs inside an `info_span!("lokx", component = "lokiclient")`.
    /// Use [`PushClient::start_with_span`] to bring your own.
    pub fn start(config: &PushConfig, cancel: CancellationToken) -> Result<Self> {
        let span = info_span!("lokx", component = "lokiclient", url = %config.url);
        Self::start_with_span(config, cancel, span)
    }

    /// 🚀 Same as [`PushClient::start`], logging inside the given span.
    pub fn start_with_span(config: &PushConfig, cancel: CancellationToken, span: Span) -> Result<Self> {
        let sink = SinkBackend::Loki(LokiSink::new(config)?);
        Self::start_with_sink(config, sink, cancel, span)
    }

    /// 🧪 Start with an explicit sink. Tests and dry runs live here.
    pub fn start_with_sink(
        config: &PushConfig,
        sink: SinkBackend,
        cancel: CancellationToken,
        span: Span,
    ) -> Result<Self> {
        let policy = config.batch_policy()?;
        let (tx, handle) = spawn_batch_worker(policy, sink, cancel.clone(), span);
        Ok(Self { tx, handle, cancel })
    }

    /// ✉️ Another handle on the submission channel, for another producer.
    pub fn sender(&self) -> Sender<StreamEntry> {
        self.tx.clone()
    }

    /// ✉️ Queue one entry. Waits while the channel is full.
    ///
    /// Fails with [`PushError::Closed`] once the worker stopped accepting entries
    /// (cancelled, or already shut down).
    pub async fn submit(&self, entry: StreamEntry) -> Result<()> {
        self.tx.send(entry).await.map_err(|_| PushError::Closed)
    }

    /// 🛑 Pull the plug: stop accepting, best-effort final flush, abort in-flight work.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// 📦 Split into the raw channel and worker handle.
    pub fn into_parts(self) -> (Sender<StreamEntry>, JoinHandle<EngineStats>) {
        (self.tx, self.handle)
    }

    /// 🏁 Graceful shutdown: drop our sender and wait for the worker to drain.
    ///
    /// ⚠️ Clones handed out by [`PushClient::sender`] keep the channel open.
    /// Drop them first, or this waits for them.
    pub async fn shutdown(self) -> anyhow::Result<EngineStats> {
        drop(self.tx);
        self.handle
            .await
            .context("💀 The batch worker did not come home. It panicked, or someone aborted it.")
    }
}

impl PushConfig {
    /// 🚀 Start a client and hand back just the channel and the worker handle.
    pub fn new_client(
        &self,
        cancel: CancellationToken,
    ) -> Result<(Sender<StreamEntry>, JoinHandle<EngineStats>)> {
        PushClient::start(self, cancel).map(PushClient::into_parts)
    }
}
