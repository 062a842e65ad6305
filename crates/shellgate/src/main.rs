//! Shellgate server binary.

use shellgate::{Gateway, GatewayConfig, GatewayError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shellgate=info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    let gateway = Gateway::bind(config).await?;
    tracing::info!(addr = %gateway.local_addr()?, "shellgate listening");
    gateway.run().await
}
