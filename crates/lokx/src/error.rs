// ai
//! 💀 Errors: every way a push can go sideways, sorted into labelled bins.
//!
//! 🎬 *[a batch leaves the worker. it does not come back. the logs know why.]*
//!
//! The batching engine owns the retry decision, so every variant answers one
//! question via [`PushError::is_retryable`]: "is it worth knocking again?"
//! Config problems are fatal at construction. A malformed entry fails its batch.
//! Network and status failures get another go, up to the configured limit.
//!
//! 🦆 The duck is retryable. The duck always comes back.

use thiserror::Error;

/// 📦 Result alias for everything the library does. One less generic to type at 3am.
pub type Result<T> = std::result::Result<T, PushError>;

/// 💀 The typed failure taxonomy for building and delivering push requests.
#[derive(Debug, Error)]
pub enum PushError {
    /// 🔧 Malformed configuration. Surfaces at construction, never retried.
    #[error("💀 invalid lokx configuration: {message}")]
    Config {
        /// What was wrong, in human words.
        message: String,
    },

    /// 🧬 An entry reached delivery without being a well-formed stream entry.
    #[error("💀 entry #{index} of the batch is not a well-formed stream entry: {reason}")]
    TypeMismatch {
        /// Position of the offending entry inside the batch.
        index: usize,
        /// Which rule it broke.
        reason: String,
    },

    /// 🫁 The body could not be serialized or compressed.
    #[error("💀 failed to {stage} the push body")]
    Encoding {
        /// `"serialize"` or `"compress"`.
        stage: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// 📡 The request never got an HTTP answer: refused, reset, timed out, DNS, etc.
    #[error("💀 request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// 🚫 Loki answered, just not with a 2xx.
    #[error("💀 http return error, status code = {status_code}, {status_text}. {body}")]
    HttpStatus {
        status_code: u16,
        status_text: String,
        body: String,
    },

    /// 🛑 The cancellation token fired while the attempt was in flight.
    #[error("🛑 push attempt cancelled")]
    Cancelled,

    /// 🚪 Submission after the engine stopped taking entries.
    #[error("🚪 submission channel is closed, the batch worker has left the building")]
    Closed,
}

impl PushError {
    /// 🔧 Shorthand for [`PushError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 🔄 Whether the batching engine should try the same batch again.
    ///
    /// Encoding failures are usually deterministic, but a compressor can still
    /// hiccup, so they get the benefit of the doubt like network errors do.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Encoding { .. } | Self::Transport { .. } | Self::HttpStatus { .. }
        )
    }

    /// 🔢 The HTTP status code, if Loki got far enough to send one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
