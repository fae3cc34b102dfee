//! Pipeline orchestrator — the façade for one end-to-end generation.
//!
//! Flow: rate limit → quota → preprocess inputs → classify → plan tier check
//! → reasoning (Brief) → entity-count check → layout (pure, off the I/O
//! scheduler) → render fan-out → artifact storage → GenerationRecord.
//!
//! A GenerationRecord is persisted at termination regardless of outcome;
//! failures record the failure kind and zero tokens. Every suspension point
//! honours the stage deadlines; expiry surfaces `Timeout` and partial
//! results are discarded.

pub mod preprocess;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::artifacts::{Artifact, ArtifactStore, StoredArtifact};
use crate::classify::{classify, ClassifierInput};
use crate::errors::AppError;
use crate::layout::solvers;
use crate::layout::text_measure::FontRegistry;
use crate::metering::rate_limit::RateLimiter;
use crate::metering::records::{truncate_prompt, GenerationRecord, RecordStore};
use crate::metering::{Meter, PlanTable, PlanTier};
use crate::models::brief::DiagramType;
use crate::reasoning::ReasoningService;
use crate::render::{self, OutputFormat};

/// Stage deadlines: the reasoning call, then the whole request.
const REASONING_TIMEOUT: Duration = Duration::from_secs(20);
const TOTAL_BUDGET: Duration = Duration::from_secs(45);

// ────────────────────────────────────────────────────────────────────────────
// Request / response
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub diagram_type_hint: Option<String>,
    /// Ordered palette of up to 10 hex colors.
    #[serde(default)]
    pub palette: Vec<String>,
    /// Raw uploaded bytes, already extracted by the HTTP adapter.
    #[serde(default)]
    pub logo: Option<Vec<u8>>,
    #[serde(default)]
    pub reference_image: Option<Vec<u8>>,
    #[serde(default)]
    pub template: Option<Vec<u8>>,
    #[serde(default)]
    pub output_formats: Vec<OutputFormat>,
    #[serde(default)]
    pub language: Option<String>,
    pub caller: String,
    pub plan: PlanTier,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub generation_id: Uuid,
    pub diagram_type: String,
    pub title: String,
    pub artifacts: Vec<StoredArtifact>,
    pub warnings: Vec<String>,
    pub language: String,
    pub cache_hit: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub struct Pipeline {
    pub fonts: Arc<FontRegistry>,
    pub reasoning: ReasoningService,
    pub meter: Meter,
    pub rate_limiter: RateLimiter,
    pub records: Arc<dyn RecordStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub plans: PlanTable,
}

impl Pipeline {
    /// Runs one generation under the total soft budget and persists exactly
    /// one GenerationRecord whatever the outcome.
    pub async fn run(&self, request: GenerateRequest) -> Result<GenerateResponse, AppError> {
        let generation_id = Uuid::new_v4();
        let started = Instant::now();

        let outcome = match timeout(TOTAL_BUDGET, self.execute(generation_id, &request)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout { stage: "total" }),
        };

        match outcome {
            Ok((response, mut record)) => {
                record.wall_time_ms = started.elapsed().as_millis() as u64;
                if let Err(e) = self.records.append(&record).await {
                    warn!(error = %e, "failed to persist generation record");
                }
                if let Err(e) = self.meter.increment_monthly(&request.caller).await {
                    warn!(error = %e, "failed to increment monthly counter");
                }
                info!(
                    generation_id = %generation_id,
                    caller = %request.caller,
                    wall_time_ms = record.wall_time_ms,
                    "generation succeeded"
                );
                Ok(response)
            }
            Err(error) => {
                let record = GenerationRecord::failure(
                    generation_id,
                    &request.caller,
                    &request.prompt,
                    error.kind(),
                    started.elapsed().as_millis() as u64,
                );
                if let Err(e) = self.records.append(&record).await {
                    warn!(error = %e, "failed to persist failure record");
                }
                warn!(
                    generation_id = %generation_id,
                    kind = error.kind(),
                    "generation failed"
                );
                Err(error)
            }
        }
    }

    async fn execute(
        &self,
        generation_id: Uuid,
        request: &GenerateRequest,
    ) -> Result<(GenerateResponse, GenerationRecord), AppError> {
        let mut warnings: Vec<String> = Vec::new();

        let limits = self
            .plans
            .get(&request.plan)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("plan table missing {:?}", request.plan)))?;

        // 1. Rate limiter, before anything else.
        self.rate_limiter
            .check(&request.caller, limits)
            .await
            .map_err(AppError::Internal)?
            .map_err(AppError::from)?;

        // 2. Monthly quota.
        self.meter.check_quota(&request.caller, limits).await?;

        // 3. Preprocess inputs.
        let mut palette =
            preprocess::parse_palette(&request.palette).map_err(AppError::InputInvalid)?;
        if let Some(logo) = &request.logo {
            let logo_colors = preprocess::extract_logo_colors(logo)
                .map_err(|e| AppError::InputInvalid(e.to_string()))?;
            palette.extend(logo_colors);
            palette.truncate(preprocess::MAX_PALETTE_COLORS);
        }
        let brand = match &request.template {
            Some(template) => Some(
                preprocess::extract_template_snapshot(template)
                    .map_err(|e| AppError::InputInvalid(e.to_string()))?,
            ),
            None => None,
        };
        let language = request
            .language
            .clone()
            .unwrap_or_else(|| preprocess::detect_language(&request.prompt).to_string());

        // 4. Classify, then refuse disallowed tiers BEFORE any gateway call.
        // Auto-detect: the explicit hint wins, then a keyword pass.
        let hint = request
            .diagram_type_hint
            .as_deref()
            .and_then(DiagramType::parse)
            .or_else(|| solvers::detect_archetype(&request.prompt));
        let tier = classify(&ClassifierInput {
            prompt: &request.prompt,
            diagram_type_hint: hint,
            entity_count_hint: None,
            has_images: request.reference_image.is_some(),
        });
        self.meter.check_tier(limits, tier)?;

        // 5. Reasoning → Brief, under its stage deadline.
        let images: Vec<Vec<u8>> = request.reference_image.iter().cloned().collect();
        let reasoned = timeout(
            REASONING_TIMEOUT,
            self.reasoning.produce_brief(
                &request.caller,
                &request.prompt,
                &palette,
                brand.as_ref(),
                images,
                tier,
            ),
        )
        .await
        .map_err(|_| AppError::Timeout { stage: "reasoning" })??;
        warnings.extend(reasoned.warnings);
        let brief = reasoned.brief;
        let llm = reasoned.llm;

        // 6. Plan cap on entity count.
        self.meter.check_entity_count(limits, brief.entities.len())?;

        // 7–8. Measurement + layout are CPU-bound: off the I/O scheduler.
        let fonts = Arc::clone(&self.fonts);
        let solver_brief = brief.clone();
        let solved = tokio::task::spawn_blocking(move || solvers::solve(&solver_brief, &fonts))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("layout task panicked: {e}")))?;
        warnings.extend(solved.warnings);

        // The solvers guarantee their invariants; a violation here means
        // they are broken, not the input.
        let violations = solved.layout.validate();
        if !violations.is_empty() {
            return Err(AppError::LayoutUnsatisfiable(violations.join("; ")));
        }
        let layout = Arc::new(solved.layout);

        // 9. Render fan-out over the plan's allowed formats, in parallel.
        let requested = if request.output_formats.is_empty() {
            vec![OutputFormat::EditableSlide, OutputFormat::Svg]
        } else {
            request.output_formats.clone()
        };
        let formats = self.meter.allowed_formats(limits, &requested, &mut warnings);

        let mut render_tasks = Vec::new();
        for format in &formats {
            let format = *format;
            let layout = Arc::clone(&layout);
            render_tasks.push(tokio::task::spawn_blocking(move || {
                (format, render::render_format(format, &layout))
            }));
        }

        let mut stored = Vec::new();
        for task in render_tasks {
            let (format, rendered) = task
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("render task panicked: {e}")))?;
            match rendered.map_err(AppError::Internal)? {
                Some(bytes) => {
                    let artifact = Artifact::new(&brief, format, bytes);
                    let reference = self
                        .artifacts
                        .put(&artifact, limits.artifact_ttl_hours)
                        .await
                        .map_err(AppError::Internal)?;
                    stored.push(reference);
                }
                None => {
                    warnings.push(format!("{format:?} output has no renderer; skipped"));
                }
            }
        }

        // 10. Success record.
        let record = GenerationRecord {
            id: generation_id,
            caller: request.caller.clone(),
            created_at: Utc::now(),
            prompt: truncate_prompt(&request.prompt),
            diagram_type: Some(brief.diagram_type.as_str().to_string()),
            tier: Some(tier.to_string()),
            model_used: Some(llm.model_used.clone()),
            input_tokens: llm.input_tokens,
            output_tokens: llm.output_tokens,
            cost_usd: llm.cost_usd,
            wall_time_ms: 0, // stamped by run()
            cache_hit: llm.cache_hit,
            output_formats: stored
                .iter()
                .map(|a| a.format.extension().to_string())
                .collect(),
            entity_count: brief.entities.len() as u32,
            language: Some(language.clone()),
            outcome: "success".to_string(),
            warnings: warnings.clone(),
        };

        let response = GenerateResponse {
            generation_id,
            diagram_type: brief.diagram_type.as_str().to_string(),
            title: brief.title.clone(),
            artifacts: stored,
            warnings,
            language,
            cache_hit: llm.cache_hit,
        };
        Ok((response, record))
    }
}
