//! 🚀 lokx-cli: pipe logs in, watch them show up in Grafana.
//!
//! 🎬 *[narrator voice]* "It all started with `tail -f app.log | lokx`..."
//! 📦 Thin wrapper: set up logging, load config, hand stdin to the library,
//! print a table of what happened. 🦆

use anyhow::{Context, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// 🔧 Steps:
/// 1. Init tracing (stderr, so stdout stays clean for the report)
/// 2. Pick the config file: first arg, or `lokx.toml` if it exists
/// 3. Load config (file + `LOKX_*` env)
/// 4. Ship stdin until EOF or Ctrl-C
/// 5. Print the stats, or the error chain (config, input, worker join) and exit 1
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path_arg = std::env::args().nth(1).unwrap_or_else(|| "lokx.toml".to_string());

    // 🔒 A missing file is fine, env vars alone can carry the whole config
    let config_file = std::path::Path::new(&path_arg);
    let config_file_if_it_exists = config_file
        .try_exists()
        .context(format!(
            "💀 Couldn't even check whether the config file exists. Permissions, maybe? Was checking here: '{}'",
            config_file.display()
        ))?
        .then_some(config_file);

    let app_config = lokx::app_config::load_config(config_file_if_it_exists).context(
        "💀 In lokx-cli, main, we couldn't load the config. \
         Check the TOML, or set LOKX_PUSH__URL and friends.",
    )?;

    match lokx::run(app_config).await {
        Ok(stats) => {
            println!("{}", lokx::report::render_stats(&stats));
            Ok(())
        }
        Err(err) => {
            error!("💀 error: {}", err);
            // -- 🧅 peel the onion, one layer of sadness at a time. delivery failures
            // -- never land here: the worker logs and drops them, and the stats table says so.
            for cause in err.chain().skip(1) {
                error!("⚠️  cause: {}", cause);
            }

            std::process::exit(1);
        }
    }
}
