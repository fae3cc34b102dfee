//! Artifacts — rendered output bytes, addressed by content hash.
#![allow(dead_code)]
//!
//! The hash covers the Brief, its theme, the archetype version, and the
//! output format, so identical inputs land on identical keys. Object
//! storage is write-once per hash: an existing object is never overwritten.
//! References handed back to callers are signed and expire with the plan's
//! artifact TTL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::brief::Brief;
use crate::render::OutputFormat;

/// Bumped when solver placement rules change, so stale cached artifacts
/// cannot be served for new geometry.
pub const ARCHETYPE_VERSION: u32 = 3;

#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub content_hash: String,
    pub format: OutputFormat,
}

/// A signed, expiring reference to a stored artifact.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredArtifact {
    pub format: OutputFormat,
    pub url: String,
    pub content_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl Artifact {
    pub fn new(brief: &Brief, format: OutputFormat, bytes: Vec<u8>) -> Self {
        let content_hash = content_hash(brief, format);
        Self {
            bytes,
            content_type: format.content_type(),
            content_hash,
            format,
        }
    }

    pub fn object_key(&self) -> String {
        format!("artifacts/{}.{}", self.content_hash, self.format.extension())
    }
}

/// SHA-256 over the canonical Brief JSON (sorted keys), the archetype
/// version, and the format.
pub fn content_hash(brief: &Brief, format: OutputFormat) -> String {
    let canonical = serde_json::to_value(brief)
        .map(|v| canonical_json(&v))
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hasher.update([0x1f]);
    hasher.update(ARCHETYPE_VERSION.to_be_bytes());
    hasher.update([0x1f]);
    hasher.update(format.extension().as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Canonical JSON: sorted keys, no whitespace. Deterministic across runs.
fn canonical_json(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                Value::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.clone(), sort(v)))
                        .collect(),
                )
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Artifact store capability
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores the artifact (skipping the write when the key already exists)
    /// and returns a signed reference valid for `ttl_hours`.
    async fn put(&self, artifact: &Artifact, ttl_hours: u64) -> Result<StoredArtifact>;
}

pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, artifact: &Artifact, ttl_hours: u64) -> Result<StoredArtifact> {
        let key = artifact.object_key();

        // Write-once per content hash: overwrites are forbidden.
        let exists = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .is_ok();
        if exists {
            debug!(key, "artifact already stored; skipping write");
        } else {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .content_type(artifact.content_type)
                .body(artifact.bytes.clone().into())
                .send()
                .await
                .with_context(|| format!("put artifact {key}"))?;
        }

        let ttl = Duration::from_secs(ttl_hours * 3600);
        let presigning = aws_sdk_s3::presigning::PresigningConfig::expires_in(ttl)
            .context("build presigning config")?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .presigned(presigning)
            .await
            .with_context(|| format!("presign artifact {key}"))?;

        Ok(StoredArtifact {
            format: artifact.format,
            url: presigned.uri().to_string(),
            content_hash: artifact.content_hash.clone(),
            expires_at: Utc::now() + chrono::Duration::hours(ttl_hours as i64),
        })
    }
}

/// In-memory store for tests; keeps the write-once contract observable.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, artifact: &Artifact, ttl_hours: u64) -> Result<StoredArtifact> {
        let key = artifact.object_key();
        self.objects
            .lock()
            .unwrap()
            .entry(key.clone())
            .or_insert_with(|| artifact.bytes.clone());
        Ok(StoredArtifact {
            format: artifact.format,
            url: format!("memory://{key}"),
            content_hash: artifact.content_hash.clone(),
            expires_at: Utc::now() + chrono::Duration::hours(ttl_hours as i64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::theme::Theme;
    use crate::models::brief::{DiagramType, Entity, BRIEF_SCHEMA_VERSION};

    fn brief() -> Brief {
        Brief {
            schema_version: BRIEF_SCHEMA_VERSION,
            diagram_type: DiagramType::ProcessFlow,
            title: "T".to_string(),
            subtitle: None,
            entities: vec![Entity {
                id: "a".to_string(),
                label: "A".to_string(),
                description: None,
                group: None,
                emphasis: Default::default(),
            }],
            layers: vec![],
            connections: vec![],
            theme: Theme::default(),
            layout_hint: None,
        }
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(
            content_hash(&brief(), OutputFormat::Svg),
            content_hash(&brief(), OutputFormat::Svg)
        );
    }

    #[test]
    fn test_hash_varies_by_format_and_content() {
        let base = content_hash(&brief(), OutputFormat::Svg);
        assert_ne!(base, content_hash(&brief(), OutputFormat::EditableSlide));

        let mut changed = brief();
        changed.title = "Different".to_string();
        assert_ne!(base, content_hash(&changed, OutputFormat::Svg));

        let mut themed = brief();
        themed.theme.primary = "1b365d".to_string();
        assert_ne!(base, content_hash(&themed, OutputFormat::Svg));
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let value = serde_json::json!({"z": 1, "a": {"c": 2, "b": 3}});
        assert_eq!(canonical_json(&value), r#"{"a":{"b":3,"c":2},"z":1}"#);
    }

    #[tokio::test]
    async fn test_write_once_per_hash() {
        let store = InMemoryArtifactStore::new();
        let artifact = Artifact::new(&brief(), OutputFormat::Svg, b"<svg/>".to_vec());
        store.put(&artifact, 24).await.unwrap();
        store.put(&artifact, 24).await.unwrap();
        assert_eq!(store.object_count(), 1);
    }

    #[test]
    fn test_object_key_carries_extension() {
        let artifact = Artifact::new(&brief(), OutputFormat::EditableSlide, vec![1]);
        assert!(artifact.object_key().starts_with("artifacts/"));
        assert!(artifact.object_key().ends_with(".pptx"));
    }
}
