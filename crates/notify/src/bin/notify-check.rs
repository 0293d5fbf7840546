//! notify-check: validate notification channels from a monitor config.
//!
//! Loads the `notifications` section of the JSON config, initializes every
//! channel (address validation + reachability check) and optionally sends a
//! test notification through the ones that came up.

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use statuswatch_notify::{Dispatcher, NotificationsConfig};

// ── CLI ─────────────────────────────────────────────────────────────

/// Check that configured notification channels are usable.
#[derive(Parser, Debug)]
#[command(name = "notify-check", version, about)]
struct Cli {
    /// Path to the monitor's JSON config file.
    #[arg(long, env = "NOTIFY_CONFIG", default_value = "config/notify.json")]
    config: String,

    /// Send a test notification through every channel that initialized.
    #[arg(long)]
    send_test: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = NotificationsConfig::from_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;
    info!(path = %cli.config, "loaded notification config");

    let mut dispatcher = Dispatcher::new(config.build_channels()?);
    if dispatcher.is_empty() {
        bail!("no notification channels configured in {}", cli.config);
    }

    let failed = dispatcher.initialize_all().await;
    for (channel, error) in &failed {
        tracing::error!(%channel, %error, "channel unusable");
    }
    if !failed.is_empty() {
        bail!("{} notification channel(s) failed to initialize", failed.len());
    }

    if cli.send_test {
        let results = dispatcher.test_all().await;
        let failures = results.iter().filter(|r| !r.success).count();
        if failures > 0 {
            bail!("{failures} test notification(s) failed");
        }
        info!(channels = results.len(), "test notifications sent");
    }

    info!(channels = ?dispatcher.channel_names(), "all notification channels ready");
    Ok(())
}
