use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ember_server=debug,ember_api=debug,ember_gateway=debug,ember_db=debug,tower_http=debug"
                    .into()
            }),
        )
        .init();

    // Config
    let token_secret =
        std::env::var("EMBER_TOKEN_SECRET").context("EMBER_TOKEN_SECRET must be set")?;
    let db_path = std::env::var("EMBER_DB_PATH").unwrap_or_else(|_| "ember.db".into());
    let host = std::env::var("EMBER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("EMBER_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    let state = ember_server::build_state(&PathBuf::from(&db_path), &token_secret)?;
    let app = ember_server::app(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("ember server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
