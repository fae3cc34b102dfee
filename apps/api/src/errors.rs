//! Application error taxonomy — a closed sum with typed payloads.
//!
//! Every stage surfaces its own kind; the orchestrator maps them onto this
//! stable outward-facing contract. Implements `IntoResponse` so Axum
//! handlers return `Result<T, AppError>` directly. Boundaries return
//! success-or-kind — no thrown panics in the request path.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gateway::{GatewayError, Tier};
use crate::metering::rate_limit::RateLimitBreach;
use crate::metering::MeteringError;
use crate::reasoning::ReasoningError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("monthly generation quota exhausted")]
    QuotaExceeded,

    #[error("plan limit exceeded: {0}")]
    PlanLimitExceeded(String),

    #[error("plan does not allow model tier {tier}")]
    PlanForbidsTier { tier: Tier },

    #[error("brief rejected: {0}")]
    BriefRejected(String),

    #[error("all models failed: {0}")]
    AllModelsFailed(String),

    #[error("deadline expired during {stage}")]
    Timeout { stage: &'static str },

    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("layout could not satisfy its invariants: {0}")]
    LayoutUnsatisfiable(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable kind string, used for GenerationRecord outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::RateLimited { .. } => "RateLimited",
            AppError::QuotaExceeded => "QuotaExceeded",
            AppError::PlanLimitExceeded(_) => "PlanLimitExceeded",
            AppError::PlanForbidsTier { .. } => "PlanForbidsTier",
            AppError::BriefRejected(_) => "BriefRejected",
            AppError::AllModelsFailed(_) => "AllModelsFailed",
            AppError::Timeout { .. } => "Timeout",
            AppError::InputInvalid(_) => "InputInvalid",
            AppError::LayoutUnsatisfiable(_) => "LayoutUnsatisfiable",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::AllModelsFailed { last_error, .. } => {
                AppError::AllModelsFailed(last_error)
            }
            GatewayError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl From<ReasoningError> for AppError {
    fn from(e: ReasoningError) -> Self {
        match e {
            ReasoningError::BriefRejected { last_errors, .. } => {
                AppError::BriefRejected(last_errors)
            }
            ReasoningError::Gateway(inner) => inner.into(),
        }
    }
}

impl From<MeteringError> for AppError {
    fn from(e: MeteringError) -> Self {
        match e {
            MeteringError::QuotaExceeded { .. } => AppError::QuotaExceeded,
            MeteringError::PlanForbidsTier { tier } => AppError::PlanForbidsTier { tier },
            MeteringError::PlanLimitExceeded { .. } => AppError::PlanLimitExceeded(e.to_string()),
            MeteringError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl From<RateLimitBreach> for AppError {
    fn from(e: RateLimitBreach) -> Self {
        AppError::RateLimited {
            retry_after_secs: e.retry_after_secs,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::RateLimited { .. } => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", self.to_string())
            }
            AppError::QuotaExceeded => (StatusCode::FORBIDDEN, "QUOTA_EXCEEDED", self.to_string()),
            AppError::PlanLimitExceeded(_) => {
                (StatusCode::FORBIDDEN, "PLAN_LIMIT_EXCEEDED", self.to_string())
            }
            AppError::PlanForbidsTier { .. } => {
                (StatusCode::FORBIDDEN, "PLAN_FORBIDS_TIER", self.to_string())
            }
            AppError::BriefRejected(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "BRIEF_REJECTED", self.to_string())
            }
            AppError::AllModelsFailed(_) => {
                tracing::error!("all models failed: {self}");
                (StatusCode::BAD_GATEWAY, "ALL_MODELS_FAILED", self.to_string())
            }
            AppError::Timeout { .. } => {
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", self.to_string())
            }
            AppError::InputInvalid(_) => {
                (StatusCode::BAD_REQUEST, "INPUT_INVALID", self.to_string())
            }
            AppError::LayoutUnsatisfiable(_) => {
                tracing::error!("layout unsatisfiable: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LAYOUT_UNSATISFIABLE",
                    self.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs } = &self {
            if let Ok(value) = header::HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_strings_are_stable() {
        assert_eq!(AppError::QuotaExceeded.kind(), "QuotaExceeded");
        assert_eq!(AppError::Timeout { stage: "reasoning" }.kind(), "Timeout");
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).kind(),
            "InternalError"
        );
    }

    #[test]
    fn test_rate_limited_response_carries_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }

    #[test]
    fn test_plan_errors_are_forbidden() {
        assert_eq!(
            AppError::PlanForbidsTier { tier: Tier::Premium }
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::QuotaExceeded.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_gateway_error_maps_to_all_models_failed() {
        let err: AppError = GatewayError::AllModelsFailed {
            tier: Tier::Standard,
            last_error: "503".to_string(),
        }
        .into();
        assert_eq!(err.kind(), "AllModelsFailed");
    }
}
