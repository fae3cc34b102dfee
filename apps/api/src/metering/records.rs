//! GenerationRecords — the append-only usage ledger.
#![allow(dead_code)]
//!
//! One record per pipeline run, success or failure, written at termination.
//! Writes are idempotent on the generation id: re-delivery never
//! double-counts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Mutex;
use uuid::Uuid;

/// Persisted prompts are truncated to this many characters.
pub const PROMPT_TRUNCATE_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    pub caller: String,
    pub created_at: DateTime<Utc>,
    pub prompt: String,
    pub diagram_type: Option<String>,
    pub tier: Option<String>,
    pub model_used: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: f64,
    pub wall_time_ms: u64,
    pub cache_hit: bool,
    pub output_formats: Vec<String>,
    pub entity_count: u32,
    pub language: Option<String>,
    /// "success" or the failure kind.
    pub outcome: String,
    pub warnings: Vec<String>,
}

impl GenerationRecord {
    /// A failure record: the failure kind and zero tokens.
    pub fn failure(id: Uuid, caller: &str, prompt: &str, kind: &str, wall_time_ms: u64) -> Self {
        Self {
            id,
            caller: caller.to_string(),
            created_at: Utc::now(),
            prompt: truncate_prompt(prompt),
            diagram_type: None,
            tier: None,
            model_used: None,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            wall_time_ms,
            cache_hit: false,
            output_formats: Vec::new(),
            entity_count: 0,
            language: None,
            outcome: kind.to_string(),
            warnings: Vec::new(),
        }
    }
}

pub fn truncate_prompt(prompt: &str) -> String {
    prompt.chars().take(PROMPT_TRUNCATE_CHARS).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Record store capability
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Appends a record. Idempotent on the record id.
    async fn append(&self, record: &GenerationRecord) -> Result<()>;
}

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn append(&self, record: &GenerationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO generation_records
                (id, caller, created_at, prompt, diagram_type, tier, model_used,
                 input_tokens, output_tokens, cost_usd, wall_time_ms, cache_hit,
                 output_formats, entity_count, language, outcome, warnings)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.caller)
        .bind(record.created_at)
        .bind(&record.prompt)
        .bind(&record.diagram_type)
        .bind(&record.tier)
        .bind(&record.model_used)
        .bind(record.input_tokens as i64)
        .bind(record.output_tokens as i64)
        .bind(record.cost_usd)
        .bind(record.wall_time_ms as i64)
        .bind(record.cache_hit)
        .bind(&record.output_formats)
        .bind(record.entity_count as i32)
        .bind(&record.language)
        .bind(&record.outcome)
        .bind(&record.warnings)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory store for tests; preserves the id-idempotency contract.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<GenerationRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<GenerationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(&self, record: &GenerationRecord) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if !records.iter().any(|r| r.id == record.id) {
            records.push(record.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_truncated_to_500_chars() {
        let long = "x".repeat(900);
        let record = GenerationRecord::failure(Uuid::new_v4(), "c", &long, "Timeout", 100);
        assert_eq!(record.prompt.chars().count(), PROMPT_TRUNCATE_CHARS);
    }

    #[test]
    fn test_failure_record_has_zero_tokens() {
        let record = GenerationRecord::failure(Uuid::new_v4(), "c", "p", "AllModelsFailed", 42);
        assert_eq!(record.input_tokens, 0);
        assert_eq!(record.output_tokens, 0);
        assert_eq!(record.cost_usd, 0.0);
        assert_eq!(record.outcome, "AllModelsFailed");
    }

    #[tokio::test]
    async fn test_append_is_idempotent_on_id() {
        let store = InMemoryRecordStore::new();
        let record = GenerationRecord::failure(Uuid::new_v4(), "c", "p", "Timeout", 1);
        store.append(&record).await.unwrap();
        store.append(&record).await.unwrap();
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_ids_both_stored() {
        let store = InMemoryRecordStore::new();
        store
            .append(&GenerationRecord::failure(Uuid::new_v4(), "c", "p", "Timeout", 1))
            .await
            .unwrap();
        store
            .append(&GenerationRecord::failure(Uuid::new_v4(), "c", "p", "Timeout", 1))
            .await
            .unwrap();
        assert_eq!(store.records().len(), 2);
    }
}
