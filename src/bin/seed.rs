//! Reloads every collection from the fixture files in `DATA_DIR`.

use music_store_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    services::loader_service,
    state::AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,music_store_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let conn = create_orm_conn(&config.database_url).await?;
    run_migrations(&conn).await?;

    let state = AppState::new(conn, &config);
    let report = loader_service::load_all(&state)
        .await
        .map_err(|err| anyhow::anyhow!("seed failed: {err}"))?;

    for entry in report.collections {
        match (entry.inserted, entry.skipped) {
            (Some(count), _) => println!("{:<8} {count} records", entry.collection),
            (None, Some(reason)) => println!("{:<8} skipped: {reason}", entry.collection),
            (None, None) => println!("{:<8} untouched", entry.collection),
        }
    }
    Ok(())
}
