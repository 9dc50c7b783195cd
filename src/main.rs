use tracing::info;
use tracing_subscriber::EnvFilter;

use tsu_app::{AppConfig, Server, create_app, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is normal outside local development.
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tsu_app=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.addr().await?;

    let db = db::init(config.check_db_connection).await?;

    info!(
        environment = %config.environment,
        host = %config.host,
        port = config.port,
        "running API application"
    );

    Server::bind(addr).serve(create_app(Some(db))).await?;
    Ok(())
}
