//! Reasoning service — turns a prompt into a validated Brief.
//!
//! Builds the system/user messages, invokes the gateway at the classified
//! tier with a JSON response requested, parses and validates the returned
//! Brief. One retry with the validation errors appended; two failures
//! surface `BriefRejected`. This module speaks only to the gateway — no
//! provider SDK or wire format leaks in here.

pub mod prompts;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::gateway::{CompleteOptions, GatewayError, LlmGateway, LlmResponse, Tier};
use crate::models::brief::Brief;
use self::prompts::{BRIEF_SYSTEM, VALIDATION_RETRY_PREFIX};

/// Total attempts: the initial call plus one validation retry.
const MAX_BRIEF_ATTEMPTS: u32 = 2;

/// Brand snapshot extracted from an uploaded template — a shallow read of
/// colors and font family, nothing deeper.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BrandSnapshot {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
    pub font_family: Option<String>,
}

#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("brief rejected after {attempts} attempts: {last_errors}")]
    BriefRejected { attempts: u32, last_errors: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The Brief plus the gateway metadata metering needs.
#[derive(Debug)]
pub struct ReasonedBrief {
    pub brief: Brief,
    pub llm: LlmResponse,
    pub warnings: Vec<String>,
}

pub struct ReasoningService {
    gateway: Arc<LlmGateway>,
}

impl ReasoningService {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    pub async fn produce_brief(
        &self,
        caller: &str,
        prompt: &str,
        palette: &[String],
        brand: Option<&BrandSnapshot>,
        images: Vec<Vec<u8>>,
        tier: Tier,
    ) -> Result<ReasonedBrief, ReasoningError> {
        let base_message = build_user_message(prompt, palette, brand);
        let mut warnings = Vec::new();
        let mut user_message = base_message.clone();
        let mut last_errors = String::new();

        for attempt in 1..=MAX_BRIEF_ATTEMPTS {
            let opts = CompleteOptions {
                response_json: true,
                images: images.clone(),
                // Retries must not replay the cached rejected answer.
                skip_cache: attempt > 1,
                ..Default::default()
            };

            let response = self
                .gateway
                .complete(caller, BRIEF_SYSTEM, &user_message, tier, opts)
                .await?;

            match parse_brief(&response.content) {
                Ok(mut brief) => {
                    brief.normalize();
                    let errors = brief.validate();
                    if errors.is_empty() {
                        info!(
                            attempt,
                            diagram_type = brief.diagram_type.as_str(),
                            entities = brief.entities.len(),
                            "brief accepted"
                        );
                        if attempt > 1 {
                            warnings.push("brief accepted after validation retry".to_string());
                        }
                        return Ok(ReasonedBrief {
                            brief,
                            llm: response,
                            warnings,
                        });
                    }
                    last_errors = errors.join("; ");
                }
                Err(e) => {
                    last_errors = format!("response is not a valid brief: {e}");
                }
            }

            warn!(attempt, errors = %last_errors, "brief failed validation");
            user_message = format!("{base_message}\n\n{VALIDATION_RETRY_PREFIX}\n- {last_errors}");
        }

        Err(ReasoningError::BriefRejected {
            attempts: MAX_BRIEF_ATTEMPTS,
            last_errors,
        })
    }
}

fn build_user_message(prompt: &str, palette: &[String], brand: Option<&BrandSnapshot>) -> String {
    let mut message = prompt.to_string();

    if !palette.is_empty() {
        message.push_str("\n\nUse this color palette (ordered, primary first): ");
        message.push_str(&palette.join(", "));
    }

    if let Some(brand) = brand {
        if let Ok(snapshot) = serde_json::to_string(brand) {
            message.push_str("\n\nBrand preset extracted from the uploaded template: ");
            message.push_str(&snapshot);
        }
    }

    message
}

fn parse_brief(content: &str) -> Result<Brief, serde_json::Error> {
    serde_json::from_str(strip_json_fences(content))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::gateway::providers::{
        ProviderError, ProviderReply, ProviderRequest, ProviderTransport,
    };
    use crate::gateway::ModelMap;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct CannedTransport {
        replies: Mutex<VecDeque<String>>,
        requests: Mutex<Vec<ProviderRequest>>,
    }

    impl CannedTransport {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|s| s.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProviderTransport for CannedTransport {
        async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ProviderError::Transport("out of canned replies".to_string()))?;
            Ok(ProviderReply {
                content,
                input_tokens: 800,
                output_tokens: 400,
            })
        }

        fn name(&self) -> &'static str {
            "mock"
        }

        fn supports_prompt_caching(&self) -> bool {
            true
        }
    }

    fn service(transport: Arc<CannedTransport>) -> ReasoningService {
        let mut map = ModelMap::new();
        for tier in [Tier::Fast, Tier::Standard, Tier::Premium, Tier::Vision] {
            map.insert(tier, vec!["mock/model".to_string()]);
        }
        let transports: Vec<Arc<dyn ProviderTransport>> = vec![transport];
        let gateway = Arc::new(LlmGateway::new(
            transports,
            Arc::new(InMemoryCache::new()),
            map,
            3600,
            None,
        ));
        ReasoningService::new(gateway)
    }

    const VALID_BRIEF: &str = r#"{
        "diagram_type": "process_flow",
        "title": "Onboarding",
        "entities": [
            {"id": "a", "label": "Sign up"},
            {"id": "b", "label": "Verify"}
        ],
        "connections": [{"from_id": "a", "to_id": "b"}]
    }"#;

    #[tokio::test]
    async fn test_valid_brief_accepted_first_attempt() {
        let transport = Arc::new(CannedTransport::new(vec![VALID_BRIEF]));
        let svc = service(transport.clone());

        let result = svc
            .produce_brief("c", "two step onboarding", &[], None, vec![], Tier::Fast)
            .await
            .unwrap();

        assert_eq!(result.brief.entities.len(), 2);
        assert!(result.warnings.is_empty());
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fenced_json_is_accepted() {
        let fenced = format!("```json\n{VALID_BRIEF}\n```");
        let transport = Arc::new(CannedTransport::new(vec![&fenced]));
        let svc = service(transport);

        let result = svc
            .produce_brief("c", "p", &[], None, vec![], Tier::Fast)
            .await
            .unwrap();
        assert_eq!(result.brief.title, "Onboarding");
    }

    #[tokio::test]
    async fn test_invalid_then_valid_retries_once_with_errors() {
        let invalid = r#"{"diagram_type": "process_flow", "title": "X", "entities": [],
                          "connections": [{"from_id": "ghost", "to_id": "ghost"}]}"#;
        let transport = Arc::new(CannedTransport::new(vec![invalid, VALID_BRIEF]));
        let svc = service(transport.clone());

        let result = svc
            .produce_brief("c", "p", &[], None, vec![], Tier::Fast)
            .await
            .unwrap();

        assert!(result.warnings.iter().any(|w| w.contains("retry")));
        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert!(
            requests[1].user.contains("failed validation"),
            "retry message must carry the validation errors"
        );
    }

    #[tokio::test]
    async fn test_two_failures_surface_brief_rejected() {
        let garbage = "this is not json at all";
        let transport = Arc::new(CannedTransport::new(vec![garbage, garbage]));
        let svc = service(transport);

        let err = svc
            .produce_brief("c", "p", &[], None, vec![], Tier::Fast)
            .await
            .unwrap_err();

        assert!(matches!(err, ReasoningError::BriefRejected { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn test_palette_and_brand_reach_the_user_message() {
        let transport = Arc::new(CannedTransport::new(vec![VALID_BRIEF]));
        let svc = service(transport.clone());
        let brand = BrandSnapshot {
            primary: Some("1b365d".to_string()),
            font_family: Some("Arial".to_string()),
            ..Default::default()
        };

        svc.produce_brief(
            "c",
            "diagram please",
            &["0073e6".to_string(), "6cc24a".to_string()],
            Some(&brand),
            vec![],
            Tier::Fast,
        )
        .await
        .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0].user.contains("0073e6"));
        assert!(requests[0].user.contains("1b365d"));
        assert!(requests[0].response_json);
    }

    #[test]
    fn test_strip_json_fences() {
        assert_eq!(strip_json_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_json_fences("{\"a\":1}"), "{\"a\":1}");
    }
}
