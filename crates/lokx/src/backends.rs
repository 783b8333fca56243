//! 🔌 Backends: where the real I/O happens.
//!
//! 🕳️ A sink takes a frozen [`PushBatch`] and makes exactly one attempt to put it
//! somewhere. It does not buffer. It does not retry. The batch worker upstream
//! owns both of those jobs and calls `send` again if it feels like it.
//!
//! 🦆 The duck is here because every file must have one. Do not question the duck.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::common::PushBatch;
use crate::error::{PushError, Result};

pub mod in_mem;
pub mod loki;

pub use in_mem::InMemorySink;
pub use loki::{LOKI_PUSH_PATH, LokiSink};

/// 🕳️ One delivery attempt for one batch.
///
/// # Contract 📜
/// - exactly one attempt per call, no retries inside
/// - bail out promptly with [`PushError::Cancelled`] once `cancel` fires
/// - borrow the batch, keep nothing: the worker may hand the same batch over again
#[async_trait]
pub trait Sink: std::fmt::Debug + Send + Sync {
    async fn send(&self, cancel: &CancellationToken, batch: &PushBatch) -> Result<()>;
}

/// 🔍 Reject entries that skipped the builder and broke its rules.
///
/// Runs before encoding so a bad entry costs no network round trip.
pub(crate) fn validate_batch(batch: &PushBatch) -> Result<()> {
    for (index, entry) in batch.entries().iter().enumerate() {
        entry
            .validate()
            .map_err(|reason| PushError::TypeMismatch { index, reason })?;
    }
    Ok(())
}

/// 🎭 The many faces of a Sink: the worker never needs to know which one it got.
#[derive(Debug)]
pub enum SinkBackend {
    Loki(LokiSink),
    InMemory(InMemorySink),
}

#[async_trait]
impl Sink for SinkBackend {
    async fn send(&self, cancel: &CancellationToken, batch: &PushBatch) -> Result<()> {
        match self {
            SinkBackend::Loki(sink) => sink.send(cancel, batch).await,
            SinkBackend::InMemory(sink) => sink.send(cancel, batch).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::StreamEntry;

    #[test]
    fn the_one_where_validation_points_at_the_guilty_entry() {
        let good = StreamEntry::new([("ok", "1")], ["fine"]);
        let bad: StreamEntry =
            serde_json::from_str(r#"{"stream":{"not ok":"1"},"values":[["1","x"]]}"#)
                .expect("valid json");
        let batch = PushBatch::new(vec![good.clone(), good, bad]);

        match validate_batch(&batch) {
            Err(PushError::TypeMismatch { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("not ok"));
            }
            other => panic!("💀 expected a type mismatch, serde took us to {other:?}"),
        }
    }
}
