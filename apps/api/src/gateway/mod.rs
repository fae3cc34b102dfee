//! LLM Gateway — the single point of entry for any model call.
//!
//! ARCHITECTURAL RULE: no other module may talk to a provider directly. The
//! gateway owns tier routing, the response cache, the provider fallback
//! chain, retry with backoff, and cost accounting.
//!
//! Protocol per call: cache lookup (non-vision, cache not skipped) → iterate
//! the tier's model chain, up to 3 tries per model with 1 s / 2 s backoff on
//! rate limits only, immediate skip to the next model on unavailability or
//! malformed replies → cost from the posted rate table, cache write, atomic
//! daily cost counter. An exhausted chain surfaces `AllModelsFailed` wrapping
//! the last provider error.

pub mod pricing;
pub mod providers;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::Cache;
use self::providers::{ProviderError, ProviderRequest, ProviderTransport};

/// Tries per model; backoff between them is 1 s then 2 s.
const MAX_TRIES_PER_MODEL: u32 = 3;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);
const COST_COUNTER_TTL_SECS: u64 = 30 * 24 * 3600;

// ────────────────────────────────────────────────────────────────────────────
// Tiers and the model map
// ────────────────────────────────────────────────────────────────────────────

/// Priority class controlling which model chain the gateway attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Fast,
    Standard,
    Premium,
    Vision,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Fast => "FAST",
            Tier::Standard => "STANDARD",
            Tier::Premium => "PREMIUM",
            Tier::Vision => "VISION",
        };
        f.write_str(name)
    }
}

/// Ordered fallback chain of `provider/model` identifiers per tier.
pub type ModelMap = HashMap<Tier, Vec<String>>;

pub fn default_model_map() -> ModelMap {
    let mut map = ModelMap::new();
    map.insert(
        Tier::Fast,
        vec![
            "anthropic/claude-3-5-haiku".to_string(),
            "openai/gpt-4o-mini".to_string(),
        ],
    );
    map.insert(
        Tier::Standard,
        vec![
            "anthropic/claude-sonnet-4-5".to_string(),
            "openai/gpt-4o".to_string(),
            "anthropic/claude-3-5-haiku".to_string(),
        ],
    );
    map.insert(
        Tier::Premium,
        vec![
            "anthropic/claude-opus-4-1".to_string(),
            "anthropic/claude-sonnet-4-5".to_string(),
            "openai/gpt-4o".to_string(),
        ],
    );
    map.insert(
        Tier::Vision,
        vec![
            "anthropic/claude-sonnet-4-5".to_string(),
            "openai/gpt-4o".to_string(),
        ],
    );
    map
}

// ────────────────────────────────────────────────────────────────────────────
// Request options, response, errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CompleteOptions {
    pub response_json: bool,
    pub images: Vec<Vec<u8>>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub skip_cache: bool,
}

impl Default for CompleteOptions {
    fn default() -> Self {
        Self {
            response_json: false,
            images: Vec::new(),
            temperature: 0.3,
            max_tokens: 4096,
            skip_cache: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    /// The `provider/model` identifier that actually answered.
    pub model_used: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("all models failed for tier {tier}: {last_error}")]
    AllModelsFailed { tier: Tier, last_error: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmGateway {
    transports: HashMap<&'static str, Arc<dyn ProviderTransport>>,
    cache: Arc<dyn Cache>,
    model_map: ModelMap,
    cache_ttl_secs: u64,
    http_timeout: Duration,
    /// Soft alarm threshold; exceeding it logs, never blocks.
    daily_budget_usd: Option<f64>,
}

impl LlmGateway {
    pub fn new(
        transports: Vec<Arc<dyn ProviderTransport>>,
        cache: Arc<dyn Cache>,
        model_map: ModelMap,
        cache_ttl_secs: u64,
        daily_budget_usd: Option<f64>,
    ) -> Self {
        let transports = transports.into_iter().map(|t| (t.name(), t)).collect();
        Self {
            transports,
            cache,
            model_map,
            cache_ttl_secs,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            daily_budget_usd,
        }
    }

    #[cfg(test)]
    fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Completes a prompt at the given tier. Rate limiting and plan checks
    /// happen BEFORE this call — there is no admission gate here.
    pub async fn complete(
        &self,
        caller: &str,
        system: &str,
        user: &str,
        tier: Tier,
        opts: CompleteOptions,
    ) -> Result<LlmResponse, GatewayError> {
        let cacheable = !opts.skip_cache && opts.images.is_empty();
        let cache_key = cache_key(tier, system, user);

        if cacheable {
            let lookup_start = Instant::now();
            if let Ok(Some(stored)) = self.cache.get(&cache_key).await {
                if let Ok(mut response) = serde_json::from_str::<LlmResponse>(&stored) {
                    // Cache hits never mutate cost counters and carry no cost.
                    response.cache_hit = true;
                    response.cost_usd = 0.0;
                    response.latency_ms = lookup_start.elapsed().as_millis() as u64;
                    debug!(tier = %tier, "gateway cache hit");
                    return Ok(response);
                }
            }
        }

        let chain = self
            .model_map
            .get(&tier)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                GatewayError::Internal(anyhow::anyhow!("no model chain configured for tier {tier}"))
            })?;

        let mut last_error = format!("no models attempted for tier {tier}");

        for model_id in chain {
            let Some((provider, model)) = model_id.split_once('/') else {
                warn!(model_id, "model id missing provider prefix; skipping");
                last_error = format!("invalid model id: {model_id}");
                continue;
            };
            let Some(transport) = self.transports.get(provider) else {
                warn!(provider, "no transport registered; skipping model");
                last_error = format!("no transport for provider: {provider}");
                continue;
            };

            let request = ProviderRequest {
                model: model.to_string(),
                system: system.to_string(),
                user: user.to_string(),
                images: opts.images.clone(),
                temperature: opts.temperature,
                max_tokens: opts.max_tokens,
                response_json: opts.response_json,
            };

            if !transport.supports_prompt_caching() {
                warn!(provider, "provider-level prompt caching unavailable");
            }

            match self.try_model(transport.as_ref(), model_id, &request).await {
                Ok((reply, latency_ms)) => {
                    let cost_usd =
                        pricing::compute_cost(model_id, reply.input_tokens, reply.output_tokens);
                    let response = LlmResponse {
                        content: reply.content,
                        model_used: model_id.clone(),
                        input_tokens: reply.input_tokens,
                        output_tokens: reply.output_tokens,
                        cost_usd,
                        latency_ms,
                        cache_hit: false,
                    };

                    self.record_cost(caller, cost_usd).await;

                    if cacheable {
                        if let Ok(serialized) = serde_json::to_string(&response) {
                            if let Err(e) = self
                                .cache
                                .set_with_ttl(&cache_key, &serialized, self.cache_ttl_secs)
                                .await
                            {
                                warn!(error = %e, "failed to write gateway cache");
                            }
                        }
                    }

                    info!(
                        model = %model_id,
                        tier = %tier,
                        cost_usd,
                        latency_ms,
                        "gateway call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    last_error = format!("{model_id}: {e}");
                }
            }
        }

        Err(GatewayError::AllModelsFailed {
            tier,
            last_error,
        })
    }

    /// Attempts one model up to `MAX_TRIES_PER_MODEL` times. Backoff applies
    /// only after rate-limit responses; unavailability and malformed replies
    /// abandon the model immediately.
    async fn try_model(
        &self,
        transport: &dyn ProviderTransport,
        model_id: &str,
        request: &ProviderRequest,
    ) -> Result<(providers::ProviderReply, u64), ProviderError> {
        let mut last_error = ProviderError::Transport("not attempted".to_string());

        for attempt in 0..MAX_TRIES_PER_MODEL {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    model = model_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();
            let outcome = tokio::time::timeout(self.http_timeout, transport.send(request)).await;

            match outcome {
                Ok(Ok(reply)) => {
                    return Ok((reply, start.elapsed().as_millis() as u64));
                }
                Ok(Err(ProviderError::RateLimited)) => {
                    last_error = ProviderError::RateLimited;
                    continue;
                }
                Ok(Err(e @ ProviderError::Unavailable { .. })) => {
                    warn!(model = model_id, error = %e, "model unavailable, trying next");
                    return Err(e);
                }
                Ok(Err(e)) => {
                    warn!(model = model_id, error = %e, "model failed, trying next");
                    return Err(e);
                }
                Err(_) => {
                    let e = ProviderError::Transport(format!(
                        "timed out after {:?}",
                        self.http_timeout
                    ));
                    warn!(model = model_id, "model call timed out, trying next");
                    return Err(e);
                }
            }
        }

        Err(last_error)
    }

    async fn record_cost(&self, caller: &str, cost_usd: f64) {
        if cost_usd <= 0.0 {
            return;
        }
        let day = chrono::Utc::now().format("%Y%m%d");
        let key = format!("cost:daily:{caller}:{day}");
        match self
            .cache
            .incr_by_float(&key, cost_usd, COST_COUNTER_TTL_SECS)
            .await
        {
            Ok(total) => {
                if let Some(budget) = self.daily_budget_usd {
                    if total > budget {
                        warn!(caller, total, budget, "daily cost budget exceeded");
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to increment cost counter"),
        }
    }
}

fn cache_key(tier: Tier, system: &str, user: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(tier.to_string().as_bytes());
    hasher.update([0x1f]);
    hasher.update(system.as_bytes());
    hasher.update([0x1f]);
    hasher.update(user.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("llm:{hex}")
}

#[cfg(test)]
mod tests {
    use super::providers::ProviderReply;
    use super::*;
    use crate::cache::InMemoryCache;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport scripted per model name; records the order of calls.
    struct ScriptedTransport {
        script: Mutex<HashMap<String, VecDeque<Result<ProviderReply, ProviderError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                script: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn push(&self, model: &str, outcome: Result<ProviderReply, ProviderError>) {
            self.script
                .lock()
                .unwrap()
                .entry(model.to_string())
                .or_default()
                .push_back(outcome);
        }

        fn call_log(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProviderTransport for ScriptedTransport {
        async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
            self.calls.lock().unwrap().push(request.model.clone());
            self.script
                .lock()
                .unwrap()
                .get_mut(&request.model)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| {
                    Err(ProviderError::Transport("unscripted call".to_string()))
                })
        }

        fn name(&self) -> &'static str {
            "mock"
        }

        fn supports_prompt_caching(&self) -> bool {
            false
        }
    }

    fn reply(text: &str) -> ProviderReply {
        ProviderReply {
            content: text.to_string(),
            input_tokens: 1000,
            output_tokens: 500,
        }
    }

    fn test_map(models: &[&str]) -> ModelMap {
        let mut map = ModelMap::new();
        map.insert(
            Tier::Standard,
            models.iter().map(|m| format!("mock/{m}")).collect(),
        );
        map
    }

    fn gateway(
        transport: Arc<ScriptedTransport>,
        cache: Arc<dyn Cache>,
        map: ModelMap,
    ) -> LlmGateway {
        let transports: Vec<Arc<dyn ProviderTransport>> = vec![transport];
        LlmGateway::new(transports, cache, map, 3600, None)
            .with_http_timeout(Duration::from_secs(15))
    }

    #[tokio::test]
    async fn test_success_on_first_model() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Ok(reply("hello")));
        let gw = gateway(
            transport.clone(),
            Arc::new(InMemoryCache::new()),
            test_map(&["model-a", "model-b"]),
        );

        let response = gw
            .complete("caller-1", "sys", "user", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.model_used, "mock/model-a");
        assert!(!response.cache_hit);
        assert!(response.cost_usd >= 0.0);
        assert_eq!(transport.call_log(), vec!["model-a"]);
    }

    #[tokio::test]
    async fn test_second_call_is_a_cache_hit_with_zero_cost() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Ok(reply("cached answer")));
        let cache = Arc::new(InMemoryCache::new());
        let gw = gateway(transport.clone(), cache.clone(), test_map(&["model-a"]));

        let first = gw
            .complete("alice", "sys", "user", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();
        assert!(!first.cache_hit);

        // Different caller, same key — cache is keyed on (tier, system, user).
        let second = gw
            .complete("bob", "sys", "user", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();

        assert!(second.cache_hit);
        assert_eq!(second.cost_usd, 0.0);
        assert_eq!(second.content, "cached answer");
        // Only the first call reached the provider.
        assert_eq!(transport.call_log().len(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_does_not_touch_cost_counter() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Ok(reply("x")));
        let cache = Arc::new(InMemoryCache::new());
        let gw = gateway(transport, cache.clone(), test_map(&["model-a"]));

        gw.complete("alice", "s", "u", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();
        let day = chrono::Utc::now().format("%Y%m%d");
        let key = format!("cost:daily:alice:{day}");
        let after_first = cache.get(&key).await.unwrap();

        gw.complete("alice", "s", "u", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();
        let after_second = cache.get(&key).await.unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_skip_cache_bypasses_lookup_and_write() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Ok(reply("one")));
        transport.push("model-a", Ok(reply("two")));
        let gw = gateway(
            transport.clone(),
            Arc::new(InMemoryCache::new()),
            test_map(&["model-a"]),
        );
        let opts = CompleteOptions {
            skip_cache: true,
            ..Default::default()
        };

        let first = gw
            .complete("c", "s", "u", Tier::Standard, opts.clone())
            .await
            .unwrap();
        let second = gw
            .complete("c", "s", "u", Tier::Standard, opts)
            .await
            .unwrap();

        assert_eq!(first.content, "one");
        assert_eq!(second.content, "two");
        assert!(!second.cache_hit);
    }

    #[tokio::test]
    async fn test_unavailable_skips_to_next_model_without_retry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Err(ProviderError::Unavailable { status: 503 }));
        transport.push("model-b", Ok(reply("fallback answer")));
        let gw = gateway(
            transport.clone(),
            Arc::new(InMemoryCache::new()),
            test_map(&["model-a", "model-b"]),
        );

        let response = gw
            .complete("c", "s", "u", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.model_used, "mock/model-b");
        // Exactly one switch: a tried once, then b.
        assert_eq!(transport.call_log(), vec!["model-a", "model-b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_with_backoff_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Err(ProviderError::RateLimited));
        transport.push("model-a", Err(ProviderError::RateLimited));
        transport.push("model-a", Ok(reply("finally")));
        let gw = gateway(
            transport.clone(),
            Arc::new(InMemoryCache::new()),
            test_map(&["model-a"]),
        );

        let start = Instant::now();
        let response = gw
            .complete("c", "s", "u", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap();

        assert_eq!(response.model_used, "mock/model-a");
        assert_eq!(transport.call_log(), vec!["model-a", "model-a", "model-a"]);
        // 1s + 2s backoff before the second and third tries.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_chain_surfaces_all_models_failed() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..3 {
            transport.push("model-a", Err(ProviderError::RateLimited));
        }
        transport.push("model-b", Err(ProviderError::Unavailable { status: 503 }));
        let gw = gateway(
            transport,
            Arc::new(InMemoryCache::new()),
            test_map(&["model-a", "model-b"]),
        );

        let err = gw
            .complete("c", "s", "u", Tier::Standard, CompleteOptions::default())
            .await
            .unwrap_err();

        match err {
            GatewayError::AllModelsFailed { tier, last_error } => {
                assert_eq!(tier, Tier::Standard);
                assert!(last_error.contains("model-b"), "wraps the LAST error: {last_error}");
            }
            other => panic!("expected AllModelsFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_vision_requests_are_never_cached() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("model-a", Ok(reply("one")));
        transport.push("model-a", Ok(reply("two")));
        let mut map = ModelMap::new();
        map.insert(Tier::Vision, vec!["mock/model-a".to_string()]);
        let gw = gateway(transport.clone(), Arc::new(InMemoryCache::new()), map);
        let opts = CompleteOptions {
            images: vec![vec![0x89, b'P', b'N', b'G']],
            ..Default::default()
        };

        gw.complete("c", "s", "u", Tier::Vision, opts.clone()).await.unwrap();
        let second = gw.complete("c", "s", "u", Tier::Vision, opts).await.unwrap();

        assert!(!second.cache_hit);
        assert_eq!(transport.call_log().len(), 2);
    }

    #[test]
    fn test_cache_key_is_stable_and_tier_scoped() {
        let a = cache_key(Tier::Standard, "sys", "user");
        let b = cache_key(Tier::Standard, "sys", "user");
        let c = cache_key(Tier::Premium, "sys", "user");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("llm:"));
    }

    #[test]
    fn test_default_model_map_covers_all_tiers() {
        let map = default_model_map();
        for tier in [Tier::Fast, Tier::Standard, Tier::Premium, Tier::Vision] {
            assert!(!map.get(&tier).unwrap().is_empty());
        }
    }
}
