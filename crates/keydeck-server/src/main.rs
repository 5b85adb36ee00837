use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use keydeck_server::auth;
use keydeck_server::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::parse();
    let db = keydeck_db::open(&config.db_config()).await?;

    let auth = auth::build_auth_config(config.service_key.as_deref());
    if auth.is_some() {
        info!("service key required");
    } else {
        info!("service key disabled (no KEYDECK_SERVICE_KEY)");
    }

    let addr = config.addr();
    let listener = TcpListener::bind(addr).await?;
    info!("keydeck-server listening on http://{addr}");

    keydeck_server::serve(listener, db, auth).await?;
    Ok(())
}
