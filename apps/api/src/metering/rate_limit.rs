//! Redis-backed sliding-window rate limiter, per caller.
//!
//! Two-bucket weighted window: the previous bucket's count is weighted by
//! the unexpired fraction of its window and added to the current bucket.
//! Per-minute and per-day bounds come from the caller's plan. Breaches are
//! retryable after the stated delay.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;

use crate::cache::Cache;
use crate::metering::PlanLimits;

const MINUTE_SECS: i64 = 60;
const DAY_SECS: i64 = 24 * 3600;

#[derive(Debug, Error)]
#[error("rate limit exceeded; retry after {retry_after_secs}s")]
pub struct RateLimitBreach {
    pub retry_after_secs: u64,
}

pub struct RateLimiter {
    cache: Arc<dyn Cache>,
}

impl RateLimiter {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Checks both windows and records the request. Consulted before any
    /// other admission work.
    pub async fn check(
        &self,
        caller: &str,
        limits: &PlanLimits,
    ) -> Result<Result<(), RateLimitBreach>> {
        self.check_at(caller, limits, chrono::Utc::now().timestamp())
            .await
    }

    /// Window math at an explicit clock, so tests can pin time.
    pub async fn check_at(
        &self,
        caller: &str,
        limits: &PlanLimits,
        now_secs: i64,
    ) -> Result<Result<(), RateLimitBreach>> {
        if let Some(breach) = self
            .window(caller, "m", MINUTE_SECS, limits.requests_per_minute, now_secs)
            .await?
        {
            return Ok(Err(breach));
        }
        if let Some(breach) = self
            .window(caller, "d", DAY_SECS, limits.requests_per_day, now_secs)
            .await?
        {
            return Ok(Err(breach));
        }

        // Admitted: count the request in both windows.
        let minute_key = bucket_key(caller, "m", now_secs / MINUTE_SECS);
        let day_key = bucket_key(caller, "d", now_secs / DAY_SECS);
        self.cache
            .incr(&minute_key, 1, (2 * MINUTE_SECS) as u64)
            .await?;
        self.cache.incr(&day_key, 1, (2 * DAY_SECS) as u64).await?;
        Ok(Ok(()))
    }

    async fn window(
        &self,
        caller: &str,
        kind: &str,
        window_secs: i64,
        limit: u32,
        now_secs: i64,
    ) -> Result<Option<RateLimitBreach>> {
        let bucket = now_secs / window_secs;
        let elapsed_fraction = (now_secs % window_secs) as f64 / window_secs as f64;

        let current = self.bucket_count(caller, kind, bucket).await?;
        let previous = self.bucket_count(caller, kind, bucket - 1).await?;
        let weighted = previous as f64 * (1.0 - elapsed_fraction) + current as f64;

        if weighted >= limit as f64 {
            let retry_after_secs = (window_secs - now_secs % window_secs).max(1) as u64;
            return Ok(Some(RateLimitBreach { retry_after_secs }));
        }
        Ok(None)
    }

    async fn bucket_count(&self, caller: &str, kind: &str, bucket: i64) -> Result<i64> {
        let count = self
            .cache
            .get(&bucket_key(caller, kind, bucket))
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Ok(count)
    }
}

fn bucket_key(caller: &str, kind: &str, bucket: i64) -> String {
    format!("rl:{kind}:{caller}:{bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::metering::{default_plan_table, PlanTier};

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(InMemoryCache::new()))
    }

    fn free_limits() -> PlanLimits {
        default_plan_table().remove(&PlanTier::Free).unwrap()
    }

    // Pin the clock to a bucket boundary so the previous bucket carries no
    // weight and the per-minute cap is exact.
    const T0: i64 = 1_700_000_040; // divisible by 60

    #[tokio::test]
    async fn test_admits_up_to_the_minute_cap() {
        let rl = limiter();
        let limits = free_limits();
        for _ in 0..5 {
            assert!(rl.check_at("alice", &limits, T0).await.unwrap().is_ok());
        }
        let breach = rl.check_at("alice", &limits, T0).await.unwrap().unwrap_err();
        assert!(breach.retry_after_secs >= 1);
        assert!(breach.retry_after_secs <= 60);
    }

    #[tokio::test]
    async fn test_callers_are_independent() {
        let rl = limiter();
        let limits = free_limits();
        for _ in 0..5 {
            rl.check_at("alice", &limits, T0).await.unwrap().unwrap();
        }
        assert!(rl.check_at("bob", &limits, T0).await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_previous_window_weight_decays() {
        let rl = limiter();
        let limits = free_limits();
        // Fill the cap in the first minute.
        for _ in 0..5 {
            rl.check_at("alice", &limits, T0).await.unwrap().unwrap();
        }
        // At the start of the next minute the previous bucket still counts
        // at full weight: blocked.
        assert!(rl
            .check_at("alice", &limits, T0 + 60)
            .await
            .unwrap()
            .is_err());
        // 54 seconds in, the previous bucket is nearly expired: admitted.
        assert!(rl
            .check_at("alice", &limits, T0 + 60 + 54)
            .await
            .unwrap()
            .is_ok());
    }

    #[tokio::test]
    async fn test_daily_window_blocks_after_cap() {
        let rl = limiter();
        let mut limits = free_limits();
        limits.requests_per_minute = 10_000; // keep the minute window out of the way
        limits.requests_per_day = 3;
        // Spread requests across minutes, same day bucket.
        for i in 0..3 {
            rl.check_at("alice", &limits, T0 + i * 120)
                .await
                .unwrap()
                .unwrap();
        }
        let outcome = rl.check_at("alice", &limits, T0 + 600).await.unwrap();
        assert!(outcome.is_err());
    }
}
