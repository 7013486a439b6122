//! Wallet shell: headless screens driving the swipe-to-confirm workflow.

mod demo;
mod flow_bridge;
mod screens;

use eyre::WrapErr;
use wallet_flow_adapters::FlowAdapterConfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting wallet shell");

    let config = match std::env::args().nth(1) {
        Some(path) => load_config(&path)?,
        None => FlowAdapterConfig::default(),
    };
    demo::run(config).await
}

fn load_config(path: &str) -> eyre::Result<FlowAdapterConfig> {
    let text =
        std::fs::read_to_string(path).wrap_err_with(|| format!("reading config {path}"))?;
    FlowAdapterConfig::from_json_str(&text).wrap_err_with(|| format!("parsing config {path}"))
}
