use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use slipway::{Cli, Pipeline, Settings};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(&cli.settings).with_context(|| {
        format!(
            "could not load settings from {}",
            cli.settings.display()
        )
    })?;

    Pipeline::from_settings(settings).dispatch(&cli.command)?;
    Ok(())
}
