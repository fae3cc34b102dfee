//! Application configuration — a closed set of options loaded at startup.
//!
//! Unknown plan options or model-map tiers are rejected at load time, not
//! discovered at request time. Required variables fail fast in `main`.

use anyhow::{Context, Result};

use crate::gateway::{default_model_map, ModelMap};
use crate::metering::{default_plan_table, PlanTable};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub s3_bucket: String,
    /// Object store endpoint (MinIO locally, AWS in production).
    pub artifact_storage_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub openai_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Ordered provider/model chain per tier.
    pub model_map: ModelMap,
    pub llm_cache_ttl_seconds: u64,
    /// Soft alarm threshold; exceeding it logs, never blocks.
    pub cost_budget_daily_usd: Option<f64>,
    /// Per-plan caps, including rate-limit bounds.
    pub plan_limits: PlanTable,
    /// Ordered font family list; the first entry is the brand font.
    pub font_fallback_chain: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let model_map = match std::env::var("MODEL_MAP") {
            Ok(raw) => serde_json::from_str(&raw).context("MODEL_MAP is not a valid tier map")?,
            Err(_) => default_model_map(),
        };

        let plan_limits = match std::env::var("PLAN_LIMITS") {
            Ok(raw) => {
                serde_json::from_str(&raw).context("PLAN_LIMITS is not a valid plan table")?
            }
            Err(_) => default_plan_table(),
        };

        let font_fallback_chain = std::env::var("FONT_FALLBACK_CHAIN")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "Calibri".to_string(),
                    "Noto Sans CJK".to_string(),
                    "Noto Sans Arabic".to_string(),
                    "Noto Sans Hebrew".to_string(),
                    "DejaVu Sans".to_string(),
                ]
            });

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be an integer")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            artifact_storage_url: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            model_map,
            llm_cache_ttl_seconds: std::env::var("LLM_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse::<u64>()
                .context("LLM_CACHE_TTL_SECONDS must be an integer")?,
            cost_budget_daily_usd: match std::env::var("COST_BUDGET_DAILY_USD") {
                Ok(raw) => Some(
                    raw.parse::<f64>()
                        .context("COST_BUDGET_DAILY_USD must be a number")?,
                ),
                Err(_) => None,
            },
            plan_limits,
            font_fallback_chain,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Tier;
    use crate::metering::PlanTier;

    #[test]
    fn test_model_map_env_parses_tier_keys() {
        let raw = r#"{"FAST": ["anthropic/claude-3-5-haiku"], "STANDARD": [], "PREMIUM": [], "VISION": []}"#;
        let map: ModelMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map.get(&Tier::Fast).unwrap().len(), 1);
    }

    #[test]
    fn test_plan_table_env_rejects_unknown_option() {
        let raw = r#"{"free": {
            "generations_per_month": 5,
            "max_entities_per_diagram": 10,
            "allowed_model_tiers": ["FAST"],
            "allowed_output_formats": ["svg"],
            "artifact_ttl_hours": 24,
            "requests_per_minute": 5,
            "requests_per_day": 10,
            "surprise_option": 1
        }}"#;
        let parsed: Result<PlanTable, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_plan_table_env_parses_valid_table() {
        let raw = r#"{"enterprise": {
            "generations_per_month": -1,
            "max_entities_per_diagram": 15,
            "allowed_model_tiers": ["FAST", "PREMIUM"],
            "allowed_output_formats": ["editable_slide", "svg"],
            "artifact_ttl_hours": 720,
            "requests_per_minute": 100,
            "requests_per_day": 5000
        }}"#;
        let table: PlanTable = serde_json::from_str(raw).unwrap();
        assert_eq!(
            table.get(&PlanTier::Enterprise).unwrap().generations_per_month,
            -1
        );
    }
}
