//! Typespell server binary.
//!
//! Binds to the address given as the first argument, or
//! `127.0.0.1:3000` by default. Log filtering follows `RUST_LOG`.

use tracing_subscriber::EnvFilter;
use typespell::{ServerError, TypespellServer};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());

    let server = TypespellServer::builder().bind(&addr).build().await?;
    tracing::info!(%addr, "Typespell listening");
    server.run().await
}
