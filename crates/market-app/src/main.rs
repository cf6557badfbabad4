use market_hex::config::Config;
use market_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use market_hex::seed::{seed, Fixtures, SeedReport};
use market_repo::{build_repo, Repo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / SERVER_PORT when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string()))
        .init();

    let config = Config::from_env()?;
    let repo: Repo = build_repo(config.database_url.as_deref()).await?;
    tracing::info!(backend = repo.backend(), "store ready");

    let report = if config.seed {
        let fixtures = match &config.seed_path {
            Some(path) => Fixtures::from_path(path).await?,
            None => Fixtures::builtin()?,
        };
        seed(&repo, &fixtures).await?
    } else {
        SeedReport::default()
    };

    let state = AppState::new(repo, config.snapshot_settings(), &report);
    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(state, server_cfg).await?;
    http.run().await
}
