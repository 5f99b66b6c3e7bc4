use donation_tracker::config::Config;
use donation_tracker::initialize_backend;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins; plain info otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    let app_state = initialize_backend(&config).await?;

    info!("Starting donation reconciliation sweeper");
    app_state.sweep.run(tokio::signal::ctrl_c()).await;
    info!("Donation sweeper stopped");

    Ok(())
}
