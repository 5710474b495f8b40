//! Shadow OAuth - Entry Point

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use shadow_oauth::{
    config::{Config, seed_client},
    models::Client,
    server::OAuthServer,
    store::MemoryStore,
};

#[derive(Parser, Debug)]
#[command(name = "shadow-oauth")]
#[command(about = "OAuth 2.0 authorization code server")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value = "8080", env = "PORT")]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Client registered at startup
    #[arg(long, default_value = seed_client::CLIENT_ID, env = "OAUTH_CLIENT_ID")]
    client_id: String,

    #[arg(long, default_value = seed_client::CLIENT_SECRET, env = "OAUTH_CLIENT_SECRET")]
    client_secret: String,

    #[arg(long, default_value = seed_client::NAME, env = "OAUTH_CLIENT_NAME")]
    client_name: String,

    #[arg(long, default_value = seed_client::REDIRECT_URI, env = "OAUTH_CLIENT_REDIRECT_URI")]
    client_redirect_uri: String,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting OAuth server");

    let config = Config::from_env()?;
    if config.uses_default_secret() {
        tracing::warn!("Signing tokens with the development secret");
    }

    let server = OAuthServer::new(&config, Arc::new(MemoryStore::new()));

    let client =
        Client::new(cli.client_id, cli.client_secret, cli.client_name, cli.client_redirect_uri);
    server.state().oauth.registry().register(client).await?;

    server.run_http(cli.port).await
}
