//! The contract between the layout engine and the renderers.
//!
//! Solvers output `PositionedLayout`; renderers (editable-slide, SVG) consume
//! it and NEVER compute positions themselves. All coordinates are inches
//! relative to the slide origin; conversion to EMU or pixels happens at the
//! renderer boundary.

use serde::{Deserialize, Serialize};

use crate::layout::text_measure::MeasuredText;

// ────────────────────────────────────────────────────────────────────────────
// Element kinds and styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Standard entity block.
    Block,
    /// Full-width horizontal band (cross-cutting layers). Renders behind
    /// blocks: z-order < 0.
    Band,
    Title,
    Subtitle,
    /// Standalone text label (no shape border).
    Label,
}

/// Renderer geometry hint. The kind stays the semantic classification; the
/// shape decides how the renderer draws the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeHint {
    #[default]
    RoundedRect,
    /// Hub-spoke center.
    Ellipse,
    /// Value-chain segment; the tip length comes from the corner radius slot.
    Chevron,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorStyle {
    /// Single arrowhead at the end.
    #[default]
    Arrow,
    /// Arrowheads at both ends.
    Bidirectional,
    /// Dashed line with arrowhead.
    Dashed,
    /// No arrowhead.
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

// ────────────────────────────────────────────────────────────────────────────
// Text
// ────────────────────────────────────────────────────────────────────────────

/// Text content with pre-computed sizing. The layout engine measures and
/// wraps BEFORE the renderer sees it; renderers use these values directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedText {
    pub measured: MeasuredText,
    pub font_family: String,
    pub bold: bool,
    /// Hex color, 6 lowercase digits, no `#`.
    pub color: String,
    pub align: TextAlign,
}

// ────────────────────────────────────────────────────────────────────────────
// Elements
// ────────────────────────────────────────────────────────────────────────────

/// A fully positioned, render-ready visual element. All geometry in inches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedElement {
    pub id: String,
    pub kind: ElementKind,
    pub shape: ShapeHint,
    pub x_in: f64,
    pub y_in: f64,
    pub width_in: f64,
    pub height_in: f64,
    /// Hex fill, 6 lowercase digits, no `#`. Title/subtitle/label elements
    /// carry the slide background here and render as text only.
    pub fill_color: String,
    pub stroke_color: Option<String>,
    pub stroke_width_pt: f64,
    pub corner_radius_in: f64,
    pub text: Option<PositionedText>,
    pub opacity: f64,
    /// Lower renders first (behind). Bands are negative.
    pub z_order: i32,
    pub layer_id: Option<String>,
}

impl PositionedElement {
    pub fn right_edge(&self) -> f64 {
        self.x_in + self.width_in
    }

    pub fn bottom_edge(&self) -> f64 {
        self.y_in + self.height_in
    }

    pub fn center_x(&self) -> f64 {
        self.x_in + self.width_in / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y_in + self.height_in / 2.0
    }

    pub fn overlaps(&self, other: &PositionedElement) -> bool {
        !(self.right_edge() <= other.x_in
            || other.right_edge() <= self.x_in
            || self.bottom_edge() <= other.y_in
            || other.bottom_edge() <= self.y_in)
    }
}

/// A connector line between two elements. Endpoints already sit outside the
/// shapes they connect (inset applied by the solver).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedConnector {
    pub id: String,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub style: ConnectorStyle,
    pub color: String,
    pub stroke_width_pt: f64,
    pub label: Option<PositionedText>,
    pub from_element_id: Option<String>,
    pub to_element_id: Option<String>,
}

impl PositionedConnector {
    pub fn midpoint(&self) -> (f64, f64) {
        (
            (self.start_x + self.end_x) / 2.0,
            (self.start_y + self.end_y) / 2.0,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout
// ────────────────────────────────────────────────────────────────────────────

/// Complete render-ready layout: absolute positions for every element,
/// renderers just plot them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedLayout {
    pub slide_width_in: f64,
    pub slide_height_in: f64,
    /// Hex, 6 lowercase digits, no `#`.
    pub background_color: String,
    pub title: Option<PositionedElement>,
    pub subtitle: Option<PositionedElement>,
    pub elements: Vec<PositionedElement>,
    pub connectors: Vec<PositionedConnector>,
}

impl PositionedLayout {
    pub fn element_by_id(&self, id: &str) -> Option<&PositionedElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Elements sorted back-to-front (lowest z first).
    pub fn elements_by_z(&self) -> Vec<&PositionedElement> {
        let mut sorted: Vec<&PositionedElement> = self.elements.iter().collect();
        sorted.sort_by_key(|e| e.z_order);
        sorted
    }

    /// Checks the layout invariants. Returns warnings, empty when clean:
    /// every element inside the canvas, no two same-z block overlaps.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for elem in &self.elements {
            if elem.x_in < -1e-9 || elem.y_in < -1e-9 {
                warnings.push(format!("element {} has negative position", elem.id));
            }
            if elem.right_edge() > self.slide_width_in + 1e-9 {
                warnings.push(format!("element {} extends beyond right edge", elem.id));
            }
            if elem.bottom_edge() > self.slide_height_in + 1e-9 {
                warnings.push(format!("element {} extends beyond bottom edge", elem.id));
            }
        }

        for (i, e1) in self.elements.iter().enumerate() {
            for e2 in &self.elements[i + 1..] {
                if e1.kind == ElementKind::Block
                    && e2.kind == ElementKind::Block
                    && e1.z_order >= 0
                    && e2.z_order >= 0
                    && e1.overlaps(e2)
                {
                    warnings.push(format!("elements {} and {} overlap", e1.id, e2.id));
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, x: f64, y: f64, w: f64, h: f64) -> PositionedElement {
        PositionedElement {
            id: id.to_string(),
            kind: ElementKind::Block,
            shape: ShapeHint::RoundedRect,
            x_in: x,
            y_in: y,
            width_in: w,
            height_in: h,
            fill_color: "0073e6".to_string(),
            stroke_color: None,
            stroke_width_pt: 1.0,
            corner_radius_in: 0.08,
            text: None,
            opacity: 1.0,
            z_order: 0,
            layer_id: None,
        }
    }

    fn layout_with(elements: Vec<PositionedElement>) -> PositionedLayout {
        PositionedLayout {
            slide_width_in: 13.333,
            slide_height_in: 7.5,
            background_color: "ffffff".to_string(),
            title: None,
            subtitle: None,
            elements,
            connectors: vec![],
        }
    }

    #[test]
    fn test_validate_clean_layout() {
        let layout = layout_with(vec![
            block("a", 1.0, 2.0, 2.0, 1.0),
            block("b", 4.0, 2.0, 2.0, 1.0),
        ]);
        assert!(layout.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_out_of_bounds() {
        let layout = layout_with(vec![block("a", 12.0, 2.0, 2.0, 1.0)]);
        let warnings = layout.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("right edge"));
    }

    #[test]
    fn test_validate_flags_block_overlap() {
        let layout = layout_with(vec![
            block("a", 1.0, 2.0, 2.0, 1.0),
            block("b", 2.0, 2.0, 2.0, 1.0),
        ]);
        let warnings = layout.validate();
        assert!(warnings.iter().any(|w| w.contains("overlap")));
    }

    #[test]
    fn test_band_behind_blocks_is_not_an_overlap() {
        let mut band = block("band", 0.6, 1.7, 12.1, 0.6);
        band.kind = ElementKind::Band;
        band.z_order = -1;
        let layout = layout_with(vec![band, block("a", 1.0, 1.8, 2.0, 0.4)]);
        assert!(layout.validate().is_empty());
    }

    #[test]
    fn test_elements_by_z_sorts_back_to_front() {
        let mut band = block("band", 0.6, 1.7, 12.0, 0.6);
        band.z_order = -1;
        let front = block("a", 1.0, 3.0, 2.0, 1.0);
        let layout = layout_with(vec![front, band]);
        let sorted = layout.elements_by_z();
        assert_eq!(sorted[0].id, "band");
        assert_eq!(sorted[1].id, "a");
    }

    #[test]
    fn test_touching_blocks_do_not_overlap() {
        let a = block("a", 1.0, 2.0, 2.0, 1.0);
        let b = block("b", 3.0, 2.0, 2.0, 1.0);
        assert!(!a.overlaps(&b));
    }
}
