use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use keydeck_db::DbConfig;

#[derive(Debug, Parser)]
#[command(name = "keydeck-server", about = "keydeck record store")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "KEYDECK_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(long, env = "KEYDECK_PORT", default_value = "3720")]
    pub port: u16,

    /// Postgres connection URL. Only honoured when built with the `postgres` feature.
    #[arg(long, env = "KEYDECK_DATABASE_URL")]
    pub database_url: Option<String>,

    /// SQLite database file
    #[arg(long, env = "KEYDECK_SQLITE_PATH")]
    pub sqlite_path: Option<String>,

    /// Pre-shared bearer key required on every route except health
    #[arg(long, env = "KEYDECK_SERVICE_KEY", hide_env_values = true)]
    pub service_key: Option<String>,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            sqlite_path: self.sqlite_path.clone(),
        }
    }
}
