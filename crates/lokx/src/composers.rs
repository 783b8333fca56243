// ai
//! 🎬 *[the batch is frozen. the worker waits. the wire hungers.]*
//! *["Compose me," whispers the payload. "Make me whole. Maybe squish me a little."]*
//!
//! 🎼 The Composers module: turning a [`PushBatch`] into the bytes Loki expects.
//!
//! 🧠 Knowledge graph:
//! - **JSON** (`JsonComposer`): `{"streams":[...]}` as-is, no `Content-Encoding`.
//! - **Gzip JSON** (`GzipJsonComposer`): same JSON, squeezed through flate2, `Content-Encoding: gzip`.
//! - Resolution: from `PushConfig::gzip`, same trait → impls → enum pattern as the sinks.
//!
//! ```text
//! BatchWorker:
//!   channel(StreamEntry) → PushBatch → sink.send(batch) → composer.compose(batch) → POST
//! ```
//!
//! 🦆 (the duck composes... symphonies? payloads? both? the duck has no comment.)

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;

use crate::app_config::PushConfig;
use crate::common::{PushBatch, StreamEntry};
use crate::error::{PushError, Result};

/// 📡 The push API envelope. Borrowed, so composing never clones a single line.
#[derive(Serialize)]
struct PushBody<'a> {
    streams: &'a [StreamEntry],
}

/// 📦 What a composer hands to the sink: the bytes, and how they were encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: Vec<u8>,
    /// `Some("gzip")` when compressed, `None` for plain JSON.
    pub content_encoding: Option<&'static str>,
}

/// 🎼 Composes a batch into a wire-format body.
///
/// Pure function of the batch: composing twice gives the same bytes, because
/// timestamps were fixed when the entries were built, not now.
pub trait Composer: std::fmt::Debug {
    fn compose(&self, batch: &PushBatch) -> Result<EncodedBody>;
}

fn to_json(batch: &PushBatch) -> Result<Vec<u8>> {
    serde_json::to_vec(&PushBody {
        streams: batch.entries(),
    })
    .map_err(|err| PushError::Encoding {
        stage: "serialize",
        source: err.into(),
    })
}

// ===== JSON Composer =====

/// 📄 Plain JSON. What you see in the debugger is what goes over the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonComposer;

impl Composer for JsonComposer {
    fn compose(&self, batch: &PushBatch) -> Result<EncodedBody> {
        Ok(EncodedBody {
            body: to_json(batch)?,
            content_encoding: None,
        })
    }
}

// ===== Gzip JSON Composer =====

/// 🫁 JSON, then a complete gzip stream around it.
///
/// Log lines repeat themselves a lot (timestamps, label sets, "connection reset"),
/// so this usually shrinks the body by an order of magnitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipJsonComposer;

impl Composer for GzipJsonComposer {
    fn compose(&self, batch: &PushBatch) -> Result<EncodedBody> {
        let json = to_json(batch)?;
        let compress_failed = |source| PushError::Encoding {
            stage: "compress",
            source,
        };

        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
        encoder.write_all(&json).map_err(compress_failed)?;
        // -- ✅ finish() writes the gzip trailer. skip it and Loki gets a truncated stream.
        let body = encoder.finish().map_err(compress_failed)?;

        Ok(EncodedBody {
            body,
            content_encoding: Some("gzip"),
        })
    }
}

// ===== Dispatcher Enum =====

/// 🎭 The polymorphic composer: wraps the concrete composers, dispatches via match.
#[derive(Debug, Clone, Copy)]
pub enum ComposerBackend {
    Json(JsonComposer),
    GzipJson(GzipJsonComposer),
}

impl ComposerBackend {
    pub fn from_gzip(gzip: bool) -> Self {
        if gzip {
            Self::GzipJson(GzipJsonComposer)
        } else {
            Self::Json(JsonComposer)
        }
    }

    /// 🔧 Resolve the composer from the push config.
    ///
    /// | `gzip` | Composer | `Content-Encoding` |
    /// |---|---|---|
    /// | `false` | JsonComposer | none |
    /// | `true` | GzipJsonComposer | `gzip` |
    pub fn from_push_config(config: &PushConfig) -> Self {
        Self::from_gzip(config.gzip)
    }
}

impl Composer for ComposerBackend {
    #[inline]
    fn compose(&self, batch: &PushBatch) -> Result<EncodedBody> {
        match self {
            Self::Json(c) => c.compose(batch),
            Self::GzipJson(c) => c.compose(batch),
        }
    }
}
