use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Connection pool backing the GenerationRecord store. Pool size comes from
/// configuration — record writes are short and bursty, one per pipeline
/// termination.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!(max_connections, "record-store database pool ready");
    Ok(pool)
}
