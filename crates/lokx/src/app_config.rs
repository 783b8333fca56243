//! 🔧 App Configuration: the sacred TOML-to-struct pipeline.
//!
//! 📡 "Config not found: We looked everywhere. Under the couch. Behind the fridge.
//! In the junk drawer. Nothing." (every developer at 3am 🦆)
//!
//! 🏗️ Powered by Figment, because manually parsing env vars is a form of
//! self-harm that even the borrow checker wouldn't approve of.
//!
//! Durations stay strings here (`"10s"`, `"200ms"`) and get parsed when a client
//! is built, so a typo surfaces as a [`PushError::Config`] at startup instead of
//! a silent default.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::duration::parse_duration;
use crate::error::{PushError, Result};
use crate::supervisors::config::BatchPolicy;

/// 📦 The AppConfig: one struct to rule them all.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// 📡 Where to push, how to batch, how hard to retry.
    pub push: PushConfig,
    /// 📥 What the CLI does with the lines it reads.
    #[serde(default)]
    pub input: InputConfig,
}

/// 📡 Everything a push client needs: endpoint, auth, batching knobs.
///
/// Field names follow the usual Loki client knobs (`url`, `interval`, `batch`, ...),
/// all lowercase, because TOML people like lowercase.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// 📡 Base URL of the Loki server, e.g. `http://127.0.0.1:3100`. `/loki/api/v1/push` gets appended.
    pub url: String,
    /// 🔒 Basic auth user. Empty or missing means no `Authorization` header at all.
    #[serde(default)]
    pub user: Option<String>,
    /// 🔒 Basic auth password. Ignored without a user.
    #[serde(default)]
    pub password: Option<String>,
    /// ⏱️ Max wait after the first entry of a batch before it ships anyway.
    #[serde(default = "default_interval")]
    pub interval: String,
    /// 📦 Entries per batch. Hit this and the batch ships immediately.
    #[serde(default = "default_batch")]
    pub batch: usize,
    /// 🔄 Extra attempts after the first one fails. 0 = one shot.
    #[serde(default)]
    pub retry: u32,
    /// 🫁 Gzip the body.
    #[serde(default)]
    pub gzip: bool,
    /// ⏱️ Fixed pause between attempts of the same batch.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: String,
    /// ⏱️ Per-request HTTP timeout.
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// 📬 Submission channel capacity. Producers wait when it is full.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// ⏱️ How long the final flush may take after cancellation.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,
}

fn default_interval() -> String {
    "10s".to_string()
}

fn default_batch() -> usize {
    100
}

fn default_retry_backoff() -> String {
    "1s".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

// 📬 1024 entries in flight before producers start feeling it
fn default_queue_capacity() -> usize {
    1024
}

fn default_shutdown_grace() -> String {
    "5s".to_string()
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            user: None,
            password: None,
            interval: default_interval(),
            batch: default_batch(),
            retry: 0,
            gzip: false,
            retry_backoff: default_retry_backoff(),
            timeout: default_timeout(),
            queue_capacity: default_queue_capacity(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl PushConfig {
    /// 🔧 Parse and validate the knobs the batch worker cares about.
    pub fn batch_policy(&self) -> Result<BatchPolicy> {
        if self.batch == 0 {
            return Err(PushError::config("batch must be a positive number of entries"));
        }
        if self.queue_capacity == 0 {
            return Err(PushError::config("queue_capacity must be at least 1"));
        }
        Ok(BatchPolicy {
            batch_size: self.batch,
            max_wait: parse_duration(&self.interval)?,
            retry: self.retry,
            retry_backoff: parse_duration(&self.retry_backoff)?,
            queue_capacity: self.queue_capacity,
            shutdown_grace: parse_duration(&self.shutdown_grace)?,
        })
    }

    /// 🔒 The user to authenticate as, if any. Empty strings count as "none".
    pub fn basic_auth_user(&self) -> Option<&str> {
        self.user.as_deref().filter(|user| !user.is_empty())
    }
}

/// 📥 CLI input handling.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct InputConfig {
    /// 🏷️ Labels stamped on every line read from stdin.
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// 🧾 Treat each stdin line as a ready-made JSON stream entry instead of a log line.
    #[serde(default)]
    pub raw: bool,
}

/// 🚀 Load the config from env vars, a TOML file, or both.
///
/// 🔧 Environment variables use the `LOKX_` prefix and `__` for nesting,
/// e.g. `LOKX_PUSH__URL=http://loki:3100`.
///
/// 📐 DESIGN NOTE:
///   - `config_file_name` is None → env vars only.
///   - `config_file_name` is Some → env vars + TOML file, merged. TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "🔧 Loading configuration: {:#?}",
        config_file_name.unwrap_or(Path::new(""))
    );

    let config = Figment::new().merge(Env::prefixed("LOKX_").split("__"));

    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "💀 Failed to parse configuration from file '{}' and environment variables (LOKX_*). \
             The file exists in our hearts, but apparently not on disk.",
            path.display()
        ),
        None => "💀 Failed to parse configuration from environment variables (LOKX_*). \
                 No file was provided, so this one's all on the environment. Classic."
            .to_string(),
    };

    config.extract().context(context_msg)
}
