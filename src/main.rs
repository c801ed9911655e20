use std::io;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};
use vitals_dashboard::{DashboardConfig, JsonLinesSink, ViewSelection, run_once};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(io::stderr)
        .init();

    let config = DashboardConfig::from_env()?;
    let selection = ViewSelection::from_env()?;

    info!(
        "{} dashboard, {} view around {} from {}",
        selection.dashboard, selection.granularity, selection.anchor, config.base_url
    );

    run_once(&config, &selection, JsonLinesSink::new(io::stdout().lock())).await?;

    Ok(())
}
