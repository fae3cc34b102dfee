mod artifacts;
mod cache;
mod classify;
mod config;
mod db;
mod errors;
mod gateway;
mod layout;
mod metering;
mod models;
mod pipeline;
mod reasoning;
mod render;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::artifacts::S3ArtifactStore;
use crate::cache::RedisCache;
use crate::config::Config;
use crate::db::create_pool;
use crate::gateway::providers::{AnthropicTransport, OpenAiTransport, ProviderTransport};
use crate::gateway::LlmGateway;
use crate::layout::text_measure::FontRegistry;
use crate::metering::rate_limit::RateLimiter;
use crate::metering::records::PgRecordStore;
use crate::metering::Meter;
use crate::pipeline::Pipeline;
use crate::reasoning::ReasoningService;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Slidesmith API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize Redis-backed cache capability
    let redis_cache = Arc::new(RedisCache::connect(&config.redis_url).await?);
    info!("Redis cache connected");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Font registry: immutable after startup load
    let fonts = Arc::new(FontRegistry::new(&config.font_fallback_chain));

    // Provider transports behind the gateway. One HTTP client for all.
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .build()
        .expect("Failed to build HTTP client");
    let mut transports: Vec<Arc<dyn ProviderTransport>> = vec![Arc::new(AnthropicTransport::new(
        http.clone(),
        config.anthropic_api_key.clone(),
    ))];
    if let Some(openai_key) = &config.openai_api_key {
        transports.push(Arc::new(OpenAiTransport::new(http, openai_key.clone())));
    }

    let gateway = Arc::new(LlmGateway::new(
        transports,
        redis_cache.clone(),
        config.model_map.clone(),
        config.llm_cache_ttl_seconds,
        config.cost_budget_daily_usd,
    ));
    info!("LLM gateway initialized ({} tiers)", config.model_map.len());

    // Wire the pipeline from capabilities; no singletons outside this root.
    let pipeline = Arc::new(Pipeline {
        fonts,
        reasoning: ReasoningService::new(gateway),
        meter: Meter::new(redis_cache.clone()),
        rate_limiter: RateLimiter::new(redis_cache),
        records: Arc::new(PgRecordStore::new(pool)),
        artifacts: Arc::new(S3ArtifactStore::new(s3, config.s3_bucket.clone())),
        plans: config.plan_limits.clone(),
    });

    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "slidesmith-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.artifact_storage_url)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
