//! POST /api/v1/generate — the thin HTTP adapter over the pipeline.
//!
//! Authentication happens upstream; the adapter trusts the caller identity
//! and plan tag it is handed, decodes uploads, and delegates. Uploaded files
//! are opaque blobs with already-extracted hints.

use axum::{extract::State, Json};
use base64::Engine;
use serde::Deserialize;

use crate::errors::AppError;
use crate::metering::PlanTier;
use crate::pipeline::{GenerateRequest, GenerateResponse};
use crate::render::OutputFormat;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
    #[serde(default)]
    pub diagram_type_hint: Option<String>,
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default)]
    pub logo_base64: Option<String>,
    #[serde(default)]
    pub reference_image_base64: Option<String>,
    #[serde(default)]
    pub template_theme_base64: Option<String>,
    #[serde(default)]
    pub output_formats: Vec<OutputFormat>,
    #[serde(default)]
    pub language: Option<String>,
    pub caller: String,
    pub plan: String,
}

pub async fn handle_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateResponse>, AppError> {
    if body.prompt.trim().is_empty() {
        return Err(AppError::InputInvalid("prompt must not be empty".to_string()));
    }
    let plan = PlanTier::parse(&body.plan)
        .ok_or_else(|| AppError::InputInvalid(format!("unknown plan tier: {}", body.plan)))?;

    let request = GenerateRequest {
        prompt: body.prompt,
        diagram_type_hint: body.diagram_type_hint,
        palette: body.palette,
        logo: decode_upload("logo", body.logo_base64)?,
        reference_image: decode_upload("reference_image", body.reference_image_base64)?,
        template: decode_upload("template_theme", body.template_theme_base64)?,
        output_formats: body.output_formats,
        language: body.language,
        caller: body.caller,
        plan,
    };

    let response = state.pipeline.run(request).await?;
    Ok(Json(response))
}

fn decode_upload(field: &str, value: Option<String>) -> Result<Option<Vec<u8>>, AppError> {
    value
        .map(|encoded| {
            base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|_| AppError::InputInvalid(format!("{field} is not valid base64")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_upload_round_trip() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"bytes");
        let decoded = decode_upload("logo", Some(encoded)).unwrap().unwrap();
        assert_eq!(decoded, b"bytes");
    }

    #[test]
    fn test_decode_upload_rejects_garbage() {
        assert!(decode_upload("logo", Some("!!not-base64!!".to_string())).is_err());
    }

    #[test]
    fn test_body_deserializes_with_defaults() {
        let body: GenerateBody = serde_json::from_str(
            r#"{"prompt": "three steps", "caller": "u1", "plan": "pro"}"#,
        )
        .unwrap();
        assert!(body.palette.is_empty());
        assert!(body.output_formats.is_empty());
        assert_eq!(PlanTier::parse(&body.plan), Some(PlanTier::Pro));
    }
}
