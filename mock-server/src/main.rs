use anyhow::Context;
use mock_server::MockConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mock_server=info,info".into()))
        .with(fmt::layer())
        .init();

    let config = MockConfig::load().context("invalid MOCK_* configuration")?;
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, superuser = %config.first_superuser, "mock admin API listening");
    mock_server::run(listener, &config).await?;
    Ok(())
}
