//! Archetype layout solvers — one pure function per diagram family.
//!
//! Each solver consumes a Brief plus the font registry and emits a
//! `PositionedLayout`. Solvers never fail; they degrade, recording warnings
//! when text did not fit or when the uniform-scaling fallback had to run.
//! Global invariants are enforced after placement: every element inside the
//! margins, no same-z block overlap, bands behind blocks, connector
//! endpoints inset outside the shapes they touch.

mod comparison;
mod hub_spoke;
mod marketecture;
mod org_structure;
mod process_flow;
mod tech_stack;
mod timeline;
mod value_chain;

use tracing::debug;

use crate::layout::positioned::{
    ConnectorStyle, ElementKind, PositionedConnector, PositionedElement, PositionedLayout,
    PositionedText, ShapeHint, TextAlign,
};
use crate::layout::text_measure::FontRegistry;
use crate::layout::theme::{normal_tint, text_color_for, Theme};
use crate::layout::units::{
    clamp, CONNECTOR_INSET, CONNECTOR_STROKE_WIDTH_PT, CONTENT_HEIGHT, CONTENT_LEFT, CONTENT_TOP,
    CONTENT_WIDTH, GUTTER_H, MARGIN_BOTTOM, MARGIN_LEFT, MARGIN_RIGHT, MARGIN_TOP,
    MAX_BLOCK_HEIGHT, MAX_BLOCK_WIDTH, MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH, SLIDE_HEIGHT_IN,
    SLIDE_WIDTH_IN, SUBTITLE_FONT_SIZE_PT, SUBTITLE_HEIGHT, TITLE_FONT_SIZE_PT, TITLE_HEIGHT,
};
use crate::models::brief::{Brief, Connection, ConnectionStyle, DiagramType, Emphasis, Entity};

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SolveOutput {
    pub layout: PositionedLayout,
    pub warnings: Vec<String>,
}

/// Dispatches the Brief to its archetype solver and enforces the global
/// invariants on the result.
pub fn solve(brief: &Brief, fonts: &FontRegistry) -> SolveOutput {
    let archetype = select_archetype(brief);
    let mut warnings = Vec::new();

    let mut layout = PositionedLayout {
        slide_width_in: SLIDE_WIDTH_IN,
        slide_height_in: SLIDE_HEIGHT_IN,
        background_color: brief.theme.background.clone(),
        title: None,
        subtitle: None,
        elements: Vec::new(),
        connectors: Vec::new(),
    };

    let content_top = add_title_elements(brief, fonts, &mut layout);
    let ctx = Ctx {
        brief,
        fonts,
        content_top,
        content_height: CONTENT_HEIGHT - (content_top - CONTENT_TOP),
    };

    debug!(archetype = archetype.as_str(), entities = brief.entities.len(), "solving layout");

    match archetype {
        DiagramType::Marketecture => marketecture::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::ProcessFlow => process_flow::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::TechStack => tech_stack::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::Comparison => comparison::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::Timeline => timeline::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::OrgStructure => org_structure::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::ValueChain => value_chain::solve(&ctx, &mut layout, &mut warnings),
        DiagramType::HubSpoke => hub_spoke::solve(&ctx, &mut layout, &mut warnings),
    }

    enforce_invariants(&mut layout, &mut warnings);
    SolveOutput { layout, warnings }
}

/// The archetype actually solved: an explicit layout hint wins over the
/// Brief's diagram type.
pub fn select_archetype(brief: &Brief) -> DiagramType {
    brief
        .layout_hint
        .as_deref()
        .and_then(DiagramType::parse)
        .unwrap_or(brief.diagram_type)
}

/// Keyword pass used when the request carries no explicit hint. Returns the
/// first archetype whose keywords appear in the prompt.
pub fn detect_archetype(prompt: &str) -> Option<DiagramType> {
    const KEYWORDS: &[(&str, DiagramType)] = &[
        ("marketecture", DiagramType::Marketecture),
        ("org chart", DiagramType::OrgStructure),
        ("org structure", DiagramType::OrgStructure),
        ("reporting structure", DiagramType::OrgStructure),
        ("hub and spoke", DiagramType::HubSpoke),
        ("hub-spoke", DiagramType::HubSpoke),
        ("value chain", DiagramType::ValueChain),
        ("timeline", DiagramType::Timeline),
        ("roadmap", DiagramType::Timeline),
        ("milestone", DiagramType::Timeline),
        ("tech stack", DiagramType::TechStack),
        ("stack", DiagramType::TechStack),
        ("comparison", DiagramType::Comparison),
        ("versus", DiagramType::Comparison),
        (" vs ", DiagramType::Comparison),
        ("process", DiagramType::ProcessFlow),
        ("workflow", DiagramType::ProcessFlow),
        ("steps", DiagramType::ProcessFlow),
    ];
    let folded = prompt.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(kw, _)| folded.contains(kw))
        .map(|(_, d)| *d)
}

// ────────────────────────────────────────────────────────────────────────────
// Solver context and shared pre-step
// ────────────────────────────────────────────────────────────────────────────

pub(crate) struct Ctx<'a> {
    pub brief: &'a Brief,
    pub fonts: &'a FontRegistry,
    /// Top of the content area (below title and optional subtitle).
    pub content_top: f64,
    pub content_height: f64,
}

/// An entity with its fitted label and clamped block dimensions, ready for
/// placement by a solver.
pub(crate) struct SizedBlock<'a> {
    pub entity: &'a Entity,
    pub text: PositionedText,
    pub width: f64,
    pub height: f64,
}

/// The shared pre-step: estimate a per-cell width from the archetype's
/// target count per row, fit each label bold into it, and derive the block
/// height from the measured text.
pub(crate) fn size_blocks<'a>(
    ctx: &Ctx<'_>,
    entities: &[&'a Entity],
    per_row: usize,
    warnings: &mut Vec<String>,
) -> Vec<SizedBlock<'a>> {
    let per_row = per_row.max(1) as f64;
    let width = clamp(
        (CONTENT_WIDTH - (per_row - 1.0) * GUTTER_H) / per_row,
        MIN_BLOCK_WIDTH,
        MAX_BLOCK_WIDTH,
    );

    entities
        .iter()
        .map(|entity| size_block_at(ctx, entity, width, warnings))
        .collect()
}

/// Sizes a single block at an explicit width — used by solvers whose cell
/// width is geometric (spoke circles, full-width tiers) rather than derived
/// from a per-row count.
pub(crate) fn size_block_at<'a>(
    ctx: &Ctx<'_>,
    entity: &'a Entity,
    width: f64,
    warnings: &mut Vec<String>,
) -> SizedBlock<'a> {
    let theme = &ctx.brief.theme;
    let measured = ctx
        .fonts
        .fit_label(&entity.label, width, &theme.font_family, true);
    if !measured.fits {
        warnings.push(format!(
            "label for '{}' did not fit and was truncated",
            entity.id
        ));
    }
    let height = clamp(
        (measured.total_height_in + 2.0 * theme.padding_in).max(MIN_BLOCK_HEIGHT),
        MIN_BLOCK_HEIGHT,
        MAX_BLOCK_HEIGHT,
    );
    let fill = fill_for_emphasis(entity.emphasis, theme);
    let color = text_color_for(&fill, theme);
    SizedBlock {
        entity,
        text: PositionedText {
            measured,
            font_family: theme.font_family.clone(),
            bold: true,
            color,
            align: TextAlign::Center,
        },
        width,
        height,
    }
}

/// Maps an entity's emphasis to its theme role fill.
pub(crate) fn fill_for_emphasis(emphasis: Emphasis, theme: &Theme) -> String {
    match emphasis {
        Emphasis::Primary => theme.primary.clone(),
        Emphasis::Secondary => theme.secondary.clone(),
        Emphasis::Accent => theme.accent.clone(),
        Emphasis::Normal => normal_tint(theme),
    }
}

/// Builds the block element for a sized entity at an absolute position.
pub(crate) fn place_block(
    sized: &SizedBlock<'_>,
    x: f64,
    y: f64,
    theme: &Theme,
) -> PositionedElement {
    let fill = fill_for_emphasis(sized.entity.emphasis, theme);
    PositionedElement {
        id: sized.entity.id.clone(),
        kind: ElementKind::Block,
        shape: ShapeHint::RoundedRect,
        x_in: x,
        y_in: y,
        width_in: sized.width,
        height_in: sized.height,
        fill_color: fill,
        stroke_color: None,
        stroke_width_pt: 1.0,
        corner_radius_in: theme.corner_radius_in,
        text: Some(sized.text.clone()),
        opacity: 1.0,
        z_order: 0,
        layer_id: None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Title and subtitle
// ────────────────────────────────────────────────────────────────────────────

/// Adds the title (and subtitle when present) and returns the adjusted
/// content top.
fn add_title_elements(brief: &Brief, fonts: &FontRegistry, layout: &mut PositionedLayout) -> f64 {
    let theme = &brief.theme;
    let title_text = fonts.fit(
        &brief.title,
        CONTENT_WIDTH,
        &theme.font_family,
        18,
        TITLE_FONT_SIZE_PT,
        true,
    );
    layout.title = Some(PositionedElement {
        id: "title".to_string(),
        kind: ElementKind::Title,
        shape: ShapeHint::RoundedRect,
        x_in: CONTENT_LEFT,
        y_in: 0.25,
        width_in: CONTENT_WIDTH,
        height_in: TITLE_HEIGHT,
        fill_color: theme.background.clone(),
        stroke_color: None,
        stroke_width_pt: 0.0,
        corner_radius_in: 0.0,
        text: Some(PositionedText {
            measured: title_text,
            font_family: theme.font_family.clone(),
            bold: true,
            color: theme.text.clone(),
            align: TextAlign::Center,
        }),
        opacity: 1.0,
        z_order: 0,
        layer_id: None,
    });

    let mut content_top = CONTENT_TOP;
    if let Some(subtitle) = brief.subtitle.as_deref().filter(|s| !s.trim().is_empty()) {
        let subtitle_text = fonts.fit(
            subtitle,
            CONTENT_WIDTH,
            &theme.font_family,
            12,
            SUBTITLE_FONT_SIZE_PT,
            false,
        );
        layout.subtitle = Some(PositionedElement {
            id: "subtitle".to_string(),
            kind: ElementKind::Subtitle,
            shape: ShapeHint::RoundedRect,
            x_in: CONTENT_LEFT,
            y_in: 0.25 + TITLE_HEIGHT - 0.1,
            width_in: CONTENT_WIDTH,
            height_in: SUBTITLE_HEIGHT,
            fill_color: theme.background.clone(),
            stroke_color: None,
            stroke_width_pt: 0.0,
            corner_radius_in: 0.0,
            text: Some(PositionedText {
                measured: subtitle_text,
                font_family: theme.font_family.clone(),
                bold: false,
                color: theme.text.clone(),
                align: TextAlign::Center,
            }),
            opacity: 1.0,
            z_order: 0,
            layer_id: None,
        });
        content_top += 0.3;
    }

    content_top
}

// ────────────────────────────────────────────────────────────────────────────
// Connectors
// ────────────────────────────────────────────────────────────────────────────

pub(crate) fn connector_style(style: ConnectionStyle) -> ConnectorStyle {
    match style {
        ConnectionStyle::Arrow => ConnectorStyle::Arrow,
        ConnectionStyle::Dashed => ConnectorStyle::Dashed,
        ConnectionStyle::Bidirectional => ConnectorStyle::Bidirectional,
        ConnectionStyle::Plain => ConnectorStyle::Plain,
    }
}

/// The point where the ray from the rectangle's center toward `(tx, ty)`
/// exits the rectangle, pushed `CONNECTOR_INSET` further outward.
pub(crate) fn edge_point(elem: &PositionedElement, tx: f64, ty: f64) -> (f64, f64) {
    let cx = elem.center_x();
    let cy = elem.center_y();
    let dx = tx - cx;
    let dy = ty - cy;
    if dx.abs() < 1e-9 && dy.abs() < 1e-9 {
        return (elem.right_edge() + CONNECTOR_INSET, cy);
    }

    let half_w = elem.width_in / 2.0;
    let half_h = elem.height_in / 2.0;
    let tx_scale = if dx.abs() > 1e-9 {
        half_w / dx.abs()
    } else {
        f64::INFINITY
    };
    let ty_scale = if dy.abs() > 1e-9 {
        half_h / dy.abs()
    } else {
        f64::INFINITY
    };
    let t = tx_scale.min(ty_scale);
    let len = (dx * dx + dy * dy).sqrt();
    let inset_t = CONNECTOR_INSET / len;
    (cx + dx * (t + inset_t), cy + dy * (t + inset_t))
}

/// Builds a connector between two placed elements, endpoints inset outside
/// both shapes, labelled when the Brief supplies one.
pub(crate) fn connect(
    ctx: &Ctx<'_>,
    id: &str,
    from: &PositionedElement,
    to: &PositionedElement,
    connection: &Connection,
) -> PositionedConnector {
    let (sx, sy) = edge_point(from, to.center_x(), to.center_y());
    let (ex, ey) = edge_point(to, from.center_x(), from.center_y());
    let theme = &ctx.brief.theme;
    let label = connection.label.as_deref().map(|text| {
        let measured = ctx.fonts.fit(text, 1.6, &theme.font_family, 8, 12, false);
        PositionedText {
            measured,
            font_family: theme.font_family.clone(),
            bold: false,
            color: theme.text.clone(),
            align: TextAlign::Center,
        }
    });
    PositionedConnector {
        id: id.to_string(),
        start_x: sx,
        start_y: sy,
        end_x: ex,
        end_y: ey,
        style: connector_style(connection.style),
        color: "666666".to_string(),
        stroke_width_pt: CONNECTOR_STROKE_WIDTH_PT,
        label,
        from_element_id: Some(from.id.clone()),
        to_element_id: Some(to.id.clone()),
    }
}

/// Adds connectors for every Brief connection whose endpoints were placed.
pub(crate) fn add_brief_connectors(ctx: &Ctx<'_>, layout: &mut PositionedLayout) {
    let mut connectors = Vec::new();
    for (i, connection) in ctx.brief.connections.iter().enumerate() {
        let (Some(from), Some(to)) = (
            layout.element_by_id(&connection.from_id),
            layout.element_by_id(&connection.to_id),
        ) else {
            continue;
        };
        connectors.push(connect(
            ctx,
            &format!("connector_{i}"),
            from,
            to,
            connection,
        ));
    }
    layout.connectors.extend(connectors);
}

// ────────────────────────────────────────────────────────────────────────────
// Invariant enforcement
// ────────────────────────────────────────────────────────────────────────────

/// Uniformly scales the placed content back inside the margins when a first
/// pass overran them. Scaling preserves relative positions, so it can never
/// introduce an overlap.
fn enforce_invariants(layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    if layout.elements.is_empty() {
        return;
    }

    let left_bound = MARGIN_LEFT;
    let right_bound = SLIDE_WIDTH_IN - MARGIN_RIGHT;
    let top_bound = MARGIN_TOP;
    let bottom_bound = SLIDE_HEIGHT_IN - MARGIN_BOTTOM;

    let bb_left = layout.elements.iter().map(|e| e.x_in).fold(f64::MAX, f64::min);
    let bb_top = layout.elements.iter().map(|e| e.y_in).fold(f64::MAX, f64::min);
    let bb_right = layout
        .elements
        .iter()
        .map(|e| e.right_edge())
        .fold(f64::MIN, f64::max);
    let bb_bottom = layout
        .elements
        .iter()
        .map(|e| e.bottom_edge())
        .fold(f64::MIN, f64::max);

    let inside = bb_left >= left_bound - 1e-9
        && bb_right <= right_bound + 1e-9
        && bb_top >= top_bound - 1e-9
        && bb_bottom <= bottom_bound + 1e-9;
    if inside {
        return;
    }

    let bb_w = (bb_right - bb_left).max(1e-6);
    let bb_h = (bb_bottom - bb_top).max(1e-6);
    let scale = ((right_bound - left_bound) / bb_w)
        .min((bottom_bound - top_bound) / bb_h)
        .min(1.0);

    // Scale about the bounding-box origin, then center inside the margins.
    let offset_x = left_bound + ((right_bound - left_bound) - bb_w * scale) / 2.0;
    let offset_y = top_bound + ((bottom_bound - top_bound) - bb_h * scale) / 2.0;

    let map_x = |x: f64| offset_x + (x - bb_left) * scale;
    let map_y = |y: f64| offset_y + (y - bb_top) * scale;

    for elem in &mut layout.elements {
        elem.x_in = map_x(elem.x_in);
        elem.y_in = map_y(elem.y_in);
        elem.width_in *= scale;
        elem.height_in *= scale;
        elem.corner_radius_in *= scale;
    }
    for conn in &mut layout.connectors {
        conn.start_x = map_x(conn.start_x);
        conn.start_y = map_y(conn.start_y);
        conn.end_x = map_x(conn.end_x);
        conn.end_y = map_y(conn.end_y);
    }

    warnings.push(format!(
        "layout exceeded slide bounds; uniform scaling applied (factor {scale:.2})"
    ));
}
