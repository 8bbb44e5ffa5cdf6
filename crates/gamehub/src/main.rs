//! Hub server binary.
//!
//! Usage: `gamehub [bind_addr]` — defaults to the well-known port on all
//! interfaces. `RUST_LOG` controls log verbosity.

use gamehub::{DEFAULT_ADDR, GameHubServerBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let server = GameHubServerBuilder::new().bind(&addr).build().await?;
    tracing::info!(%addr, "gamehub starting");
    server.run().await?;
    Ok(())
}
