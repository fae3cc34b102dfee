//! The Brief — the structured plan produced by the Reasoning Service.
//!
//! This is the wire contract between reasoning and the orchestrator. It is
//! versioned: `schema_version` accompanies every persisted Brief. Invariants
//! (unique entity ids, resolvable references, normalised colors) are enforced
//! by `normalize` + `validate` before a Brief crosses into layout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::layout::theme::Theme;

pub const BRIEF_SCHEMA_VERSION: u32 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Enums
// ────────────────────────────────────────────────────────────────────────────

/// The closed archetype set. One layout solver exists per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    Marketecture,
    ProcessFlow,
    TechStack,
    Comparison,
    Timeline,
    OrgStructure,
    ValueChain,
    HubSpoke,
}

impl DiagramType {
    pub const ALL: [DiagramType; 8] = [
        DiagramType::Marketecture,
        DiagramType::ProcessFlow,
        DiagramType::TechStack,
        DiagramType::Comparison,
        DiagramType::Timeline,
        DiagramType::OrgStructure,
        DiagramType::ValueChain,
        DiagramType::HubSpoke,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::Marketecture => "marketecture",
            DiagramType::ProcessFlow => "process_flow",
            DiagramType::TechStack => "tech_stack",
            DiagramType::Comparison => "comparison",
            DiagramType::Timeline => "timeline",
            DiagramType::OrgStructure => "org_structure",
            DiagramType::ValueChain => "value_chain",
            DiagramType::HubSpoke => "hub_spoke",
        }
    }

    /// Parses both `process_flow` and `process-flow` spellings.
    pub fn parse(s: &str) -> Option<DiagramType> {
        let normalised = s.trim().to_lowercase().replace('-', "_");
        DiagramType::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == normalised)
    }
}

/// Visual weight class mapped to theme roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    #[default]
    Normal,
    Primary,
    Secondary,
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPosition {
    Top,
    #[default]
    Middle,
    Bottom,
    CrossCutting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStyle {
    #[default]
    Arrow,
    Dashed,
    Bidirectional,
    Plain,
}

// ────────────────────────────────────────────────────────────────────────────
// Entities, layers, connections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Free-form grouping: comparison columns, org-structure parent ids.
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub position: LayerPosition,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from_id: String,
    pub to_id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub style: ConnectionStyle,
}

// ────────────────────────────────────────────────────────────────────────────
// Brief
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub diagram_type: DiagramType,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub layout_hint: Option<String>,
}

fn default_schema_version() -> u32 {
    BRIEF_SCHEMA_VERSION
}

impl Brief {
    /// Normalises the Brief in place: hex colors to 6 lowercase digits
    /// without `#`, duplicate entity ids de-duplicated by suffixing.
    pub fn normalize(&mut self) {
        for color in [
            &mut self.theme.primary,
            &mut self.theme.secondary,
            &mut self.theme.accent,
            &mut self.theme.background,
            &mut self.theme.text,
        ] {
            *color = normalize_hex(color).unwrap_or_else(|| color.clone());
        }

        let mut seen: HashSet<String> = HashSet::new();
        for entity in &mut self.entities {
            if !seen.insert(entity.id.clone()) {
                let mut n = 2;
                while seen.contains(&format!("{}-{n}", entity.id)) {
                    n += 1;
                }
                entity.id = format!("{}-{n}", entity.id);
                seen.insert(entity.id.clone());
            }
        }
    }

    /// Validates the Brief invariants. Returns error messages, empty when
    /// the Brief is acceptable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push("title must not be empty".to_string());
        }
        if self.entities.is_empty() {
            errors.push("at least one entity is required".to_string());
        }

        let mut ids: HashSet<&str> = HashSet::new();
        for entity in &self.entities {
            if entity.id.trim().is_empty() {
                errors.push("entity id must not be empty".to_string());
            }
            if !ids.insert(entity.id.as_str()) {
                errors.push(format!("duplicate entity id: {}", entity.id));
            }
            if entity.label.trim().is_empty() {
                errors.push(format!("entity {} has an empty label", entity.id));
            }
        }

        for conn in &self.connections {
            if !ids.contains(conn.from_id.as_str()) {
                errors.push(format!("connection references unknown entity: {}", conn.from_id));
            }
            if !ids.contains(conn.to_id.as_str()) {
                errors.push(format!("connection references unknown entity: {}", conn.to_id));
            }
        }

        for layer in &self.layers {
            for member in &layer.members {
                if !ids.contains(member.as_str()) {
                    errors.push(format!(
                        "layer {} references unknown entity: {member}",
                        layer.id
                    ));
                }
            }
        }

        for (name, color) in [
            ("primary", &self.theme.primary),
            ("secondary", &self.theme.secondary),
            ("accent", &self.theme.accent),
            ("background", &self.theme.background),
            ("text", &self.theme.text),
        ] {
            if !is_normalized_hex(color) {
                errors.push(format!("theme.{name} is not a 6-digit hex color: {color}"));
            }
        }

        errors
    }

    /// Entities that belong to no cross-cutting layer (the "main" set).
    pub fn main_entities(&self) -> Vec<&Entity> {
        let cross_cut: HashSet<&str> = self
            .layers
            .iter()
            .filter(|l| l.position == LayerPosition::CrossCutting)
            .flat_map(|l| l.members.iter().map(|m| m.as_str()))
            .collect();
        self.entities
            .iter()
            .filter(|e| !cross_cut.contains(e.id.as_str()))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hex helpers
// ────────────────────────────────────────────────────────────────────────────

/// Normalises `#RRGGBB` / `rrggbb` to 6 lowercase digits without `#`.
/// Returns `None` for malformed input.
pub fn normalize_hex(raw: &str) -> Option<String> {
    let hex = raw.trim().strip_prefix('#').unwrap_or(raw.trim());
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(hex.to_lowercase())
    } else {
        None
    }
}

pub fn is_normalized_hex(s: &str) -> bool {
    s.len() == 6
        && s.chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
