// Klotski store - opens the database, applies migrations and reports
// what it holds.

use anyhow::Context;
use klotski_store::database::{self, schema};
use klotski_store::StoreConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "klotski_store=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Klotski store");

    let config = StoreConfig::from_env().context("failed to load store configuration")?;
    let repo = database::open(&config)
        .await
        .with_context(|| format!("failed to open store at {:?}", config.db_path))?;

    let version = schema::schema_version(repo.pool()).await?;
    tracing::info!("Schema version: {}", version);

    for (table, count) in repo.table_counts().await? {
        tracing::info!("{}: {} rows", table, count);
    }

    repo.pool().close().await;
    tracing::info!("Store closed");

    Ok(())
}
