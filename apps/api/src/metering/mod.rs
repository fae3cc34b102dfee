//! Metering — plan limits, quotas, and usage counting.
//!
//! Plan checks run BEFORE the gateway is called; a request refused here
//! never accrues cost. The monthly generation counter is an atomic cache
//! increment so concurrent requests cannot double-admit past the cap.

pub mod rate_limit;
pub mod records;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cache::Cache;
use crate::gateway::Tier;
use crate::render::OutputFormat;

/// A generation cap of −1 disables the cap.
pub const UNCAPPED: i64 = -1;

const MONTHLY_COUNTER_TTL_SECS: u64 = 35 * 24 * 3600;

// ────────────────────────────────────────────────────────────────────────────
// Plans
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Business,
    Enterprise,
}

impl PlanTier {
    pub fn parse(s: &str) -> Option<PlanTier> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "pro" => Some(PlanTier::Pro),
            "business" => Some(PlanTier::Business),
            "enterprise" => Some(PlanTier::Enterprise),
            _ => None,
        }
    }
}

/// Per-plan caps. Unknown options are rejected when the table is loaded
/// from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanLimits {
    pub generations_per_month: i64,
    pub max_entities_per_diagram: usize,
    pub allowed_model_tiers: Vec<Tier>,
    pub allowed_output_formats: Vec<OutputFormat>,
    pub artifact_ttl_hours: u64,
    pub requests_per_minute: u32,
    pub requests_per_day: u32,
}

pub type PlanTable = HashMap<PlanTier, PlanLimits>;

pub fn default_plan_table() -> PlanTable {
    let mut table = PlanTable::new();
    table.insert(
        PlanTier::Free,
        PlanLimits {
            generations_per_month: 10,
            max_entities_per_diagram: 10,
            allowed_model_tiers: vec![Tier::Fast, Tier::Standard],
            allowed_output_formats: vec![OutputFormat::Svg],
            artifact_ttl_hours: 24,
            requests_per_minute: 5,
            requests_per_day: 20,
        },
    );
    table.insert(
        PlanTier::Pro,
        PlanLimits {
            generations_per_month: 200,
            max_entities_per_diagram: 15,
            allowed_model_tiers: vec![Tier::Fast, Tier::Standard, Tier::Vision],
            allowed_output_formats: vec![OutputFormat::EditableSlide, OutputFormat::Svg],
            artifact_ttl_hours: 24 * 7,
            requests_per_minute: 20,
            requests_per_day: 400,
        },
    );
    table.insert(
        PlanTier::Business,
        PlanLimits {
            generations_per_month: 1000,
            max_entities_per_diagram: 15,
            allowed_model_tiers: vec![Tier::Fast, Tier::Standard, Tier::Premium, Tier::Vision],
            allowed_output_formats: vec![OutputFormat::EditableSlide, OutputFormat::Svg],
            artifact_ttl_hours: 24 * 30,
            requests_per_minute: 60,
            requests_per_day: 2000,
        },
    );
    table.insert(
        PlanTier::Enterprise,
        PlanLimits {
            generations_per_month: UNCAPPED,
            max_entities_per_diagram: 15,
            allowed_model_tiers: vec![Tier::Fast, Tier::Standard, Tier::Premium, Tier::Vision],
            allowed_output_formats: vec![OutputFormat::EditableSlide, OutputFormat::Svg],
            artifact_ttl_hours: 24 * 90,
            requests_per_minute: 120,
            requests_per_day: 10_000,
        },
    );
    table
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MeteringError {
    #[error("monthly generation quota exhausted ({used}/{cap})")]
    QuotaExceeded { used: i64, cap: i64 },

    #[error("plan does not allow model tier {tier}")]
    PlanForbidsTier { tier: Tier },

    #[error("diagram has {count} entities; plan allows at most {max}")]
    PlanLimitExceeded { count: usize, max: usize },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Meter
// ────────────────────────────────────────────────────────────────────────────

pub struct Meter {
    cache: Arc<dyn Cache>,
}

impl Meter {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Checks `generations-per-month` against the caller's counter.
    pub async fn check_quota(&self, caller: &str, limits: &PlanLimits) -> Result<(), MeteringError> {
        if limits.generations_per_month == UNCAPPED {
            return Ok(());
        }
        let used = self.monthly_count(caller).await?;
        if used >= limits.generations_per_month {
            return Err(MeteringError::QuotaExceeded {
                used,
                cap: limits.generations_per_month,
            });
        }
        Ok(())
    }

    /// Refuses gateway tiers the plan does not include.
    pub fn check_tier(&self, limits: &PlanLimits, tier: Tier) -> Result<(), MeteringError> {
        if limits.allowed_model_tiers.contains(&tier) {
            Ok(())
        } else {
            Err(MeteringError::PlanForbidsTier { tier })
        }
    }

    /// Rejects Briefs with more entities than the plan allows.
    pub fn check_entity_count(
        &self,
        limits: &PlanLimits,
        count: usize,
    ) -> Result<(), MeteringError> {
        if count > limits.max_entities_per_diagram {
            return Err(MeteringError::PlanLimitExceeded {
                count,
                max: limits.max_entities_per_diagram,
            });
        }
        Ok(())
    }

    /// Intersects the requested formats with the plan's allowance. Formats
    /// outside the plan are dropped with a warning, not an error.
    pub fn allowed_formats(
        &self,
        limits: &PlanLimits,
        requested: &[OutputFormat],
        warnings: &mut Vec<String>,
    ) -> Vec<OutputFormat> {
        let mut allowed = Vec::new();
        for format in requested {
            if limits.allowed_output_formats.contains(format) {
                allowed.push(*format);
            } else {
                warnings.push(format!("plan does not include {format:?} output; skipped"));
            }
        }
        allowed
    }

    /// Counts one successful generation. Called exactly once per success at
    /// pipeline termination.
    pub async fn increment_monthly(&self, caller: &str) -> Result<i64> {
        let key = monthly_key(caller);
        self.cache.incr(&key, 1, MONTHLY_COUNTER_TTL_SECS).await
    }

    pub async fn monthly_count(&self, caller: &str) -> Result<i64> {
        let key = monthly_key(caller);
        let count = self
            .cache
            .get(&key)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        debug!(caller, count, "monthly generation count");
        Ok(count)
    }
}

fn monthly_key(caller: &str) -> String {
    let month = chrono::Utc::now().format("%Y%m");
    format!("gen:month:{caller}:{month}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    fn meter() -> Meter {
        Meter::new(Arc::new(InMemoryCache::new()))
    }

    fn free_limits() -> PlanLimits {
        default_plan_table().remove(&PlanTier::Free).unwrap()
    }

    #[tokio::test]
    async fn test_quota_allows_under_cap() {
        let m = meter();
        assert!(m.check_quota("alice", &free_limits()).await.is_ok());
    }

    #[tokio::test]
    async fn test_quota_blocks_at_cap() {
        let m = meter();
        for _ in 0..10 {
            m.increment_monthly("alice").await.unwrap();
        }
        let err = m.check_quota("alice", &free_limits()).await.unwrap_err();
        assert!(matches!(err, MeteringError::QuotaExceeded { used: 10, cap: 10 }));
    }

    #[tokio::test]
    async fn test_uncapped_plan_never_blocks() {
        let m = meter();
        let limits = default_plan_table().remove(&PlanTier::Enterprise).unwrap();
        for _ in 0..50 {
            m.increment_monthly("big-corp").await.unwrap();
        }
        assert!(m.check_quota("big-corp", &limits).await.is_ok());
    }

    #[test]
    fn test_free_plan_forbids_premium() {
        let m = meter();
        let err = m.check_tier(&free_limits(), Tier::Premium).unwrap_err();
        assert!(matches!(err, MeteringError::PlanForbidsTier { tier: Tier::Premium }));
        assert!(m.check_tier(&free_limits(), Tier::Fast).is_ok());
    }

    #[test]
    fn test_entity_count_enforced() {
        let m = meter();
        assert!(m.check_entity_count(&free_limits(), 10).is_ok());
        let err = m.check_entity_count(&free_limits(), 11).unwrap_err();
        assert!(matches!(
            err,
            MeteringError::PlanLimitExceeded { count: 11, max: 10 }
        ));
    }

    #[test]
    fn test_disallowed_formats_dropped_with_warning() {
        let m = meter();
        let mut warnings = Vec::new();
        let allowed = m.allowed_formats(
            &free_limits(),
            &[OutputFormat::EditableSlide, OutputFormat::Svg],
            &mut warnings,
        );
        assert_eq!(allowed, vec![OutputFormat::Svg]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_plan_limits_reject_unknown_options() {
        let json = r#"{
            "generations_per_month": 5,
            "max_entities_per_diagram": 10,
            "allowed_model_tiers": ["FAST"],
            "allowed_output_formats": ["svg"],
            "artifact_ttl_hours": 24,
            "requests_per_minute": 5,
            "requests_per_day": 10,
            "free_lunches": true
        }"#;
        let parsed: Result<PlanLimits, _> = serde_json::from_str(json);
        assert!(parsed.is_err(), "unknown plan options must be rejected");
    }

    #[test]
    fn test_default_table_covers_all_plans() {
        let table = default_plan_table();
        for plan in [PlanTier::Free, PlanTier::Pro, PlanTier::Business, PlanTier::Enterprise] {
            assert!(table.contains_key(&plan));
        }
    }
}
