//! 🚀 lokx: a Loki push client that batches so your app doesn't have to.
//!
//! 🎬 *[a log line is born. it has labels. it has dreams. it has a timestamp in nanoseconds.]*
//!
//! Producers drop [`StreamEntry`] values into a bounded channel. One batch worker
//! collects them until the batch is full or the interval runs out, then POSTs
//! them to `/loki/api/v1/push` as JSON (optionally gzipped), retrying a fixed
//! number of times before it gives up and logs the loss.
//!
//! The library API is [`PushClient`]. [`run`] is what the CLI calls: stdin in, Loki out.
//!
//! 🦆

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub mod app_config;
pub mod backends;
pub mod client;
pub mod common;
pub mod composers;
pub mod duration;
pub mod error;
pub mod report;
mod supervisors;

pub use app_config::{AppConfig, InputConfig, PushConfig};
pub use client::PushClient;
pub use common::{PushBatch, StreamEntry, push_item};
pub use error::PushError;
pub use supervisors::EngineStats;
pub use supervisors::config::BatchPolicy;

/// 🚀 Ship stdin to Loki until EOF or Ctrl-C, then report what happened.
pub async fn run(app_config: AppConfig) -> anyhow::Result<EngineStats> {
    let cancel = CancellationToken::new();

    // -- 🛑 Ctrl-C pulls the plug. Whatever is half-batched gets one last shot.
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 interrupt received, flushing what we have and leaving");
            trigger.cancel();
        }
    });

    ship_lines(&app_config, BufReader::new(tokio::io::stdin()), cancel).await
}

/// 📥 Read lines from `reader` and push them, one entry per line.
///
/// 🔧 Plain mode stamps every line with `input.labels` and the current time.
/// Raw mode (`input.raw = true`) expects each line to be a JSON stream entry,
/// `{"stream":{...},"values":[["<ns>","<line>"],...]}`, and skips the ones that
/// don't parse or carry a bad label key or timestamp. Blank lines are ignored either way.
pub async fn ship_lines<R>(
    app_config: &AppConfig,
    reader: R,
    cancel: CancellationToken,
) -> anyhow::Result<EngineStats>
where
    R: AsyncBufRead + Unpin,
{
    let client = PushClient::start(&app_config.push, cancel.clone())
        .context("💀 Couldn't start the push client. The config looked fine until we actually tried to use it.")?;
    info!(url = %app_config.push.url, raw = app_config.input.raw, "🚀 shipping lines to Loki");

    let mut lines = reader.lines();
    let mut line_no: u64 = 0;
    let mut skipped: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = lines.next_line() => next.context("💀 Failed to read the next input line")?,
        };
        let Some(line) = next else { break };
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }

        let entry = if app_config.input.raw {
            let parsed = serde_json::from_str::<StreamEntry>(&line)
                .map_err(|err| err.to_string())
                .and_then(|entry| entry.validate().map(|()| entry));
            match parsed {
                Ok(entry) => entry,
                Err(reason) => {
                    // -- 🧹 one bad line must not take its whole batch down with it
                    warn!(line_no, error = %reason, "⚠️ not a valid stream entry, skipping");
                    skipped += 1;
                    continue;
                }
            }
        } else {
            StreamEntry::new(&app_config.input.labels, [line])
        };

        if client.submit(entry).await.is_err() {
            // -- 🚪 the worker closed the door (cancelled). nothing left to do but go home.
            debug!(line_no, "🚪 submission channel closed, stopping input");
            break;
        }
    }

    info!(lines = line_no, skipped, "📥 input done, waiting for the last batch");
    client.shutdown().await
}
