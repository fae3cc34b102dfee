//! Tech stack — full-width tiers stacked vertically.
//!
//! One row per entity, full content width minus an inset. The listed order
//! reads top-down: applications first, infrastructure last (bottom).

use crate::layout::positioned::{ElementKind, PositionedElement, PositionedLayout, PositionedText, ShapeHint, TextAlign};
use crate::layout::theme::text_color_for;
use crate::layout::units::{
    clamp, CONTENT_WIDTH, GUTTER_V, MARGIN_LEFT, MAX_BLOCK_HEIGHT, MIN_BLOCK_HEIGHT,
};

use super::{fill_for_emphasis, Ctx};

/// Horizontal inset applied to each side of a tier.
const STACK_INSET: f64 = 0.5;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities = &ctx.brief.entities;
    if entities.is_empty() {
        return;
    }

    let theme = &ctx.brief.theme;
    let n = entities.len();
    let width = CONTENT_WIDTH - 2.0 * STACK_INSET;
    let row_h = clamp(
        (ctx.content_height - (n - 1) as f64 * GUTTER_V) / n as f64,
        MIN_BLOCK_HEIGHT,
        MAX_BLOCK_HEIGHT,
    );

    // Center the stack vertically when clamping shrank it.
    let stack_height = n as f64 * row_h + (n - 1) as f64 * GUTTER_V;
    let mut y = ctx.content_top + (ctx.content_height - stack_height).max(0.0) / 2.0;

    for entity in entities {
        let measured = ctx
            .fonts
            .fit_label(&entity.label, width, &theme.font_family, true);
        if !measured.fits {
            warnings.push(format!(
                "label for '{}' did not fit and was truncated",
                entity.id
            ));
        }
        let fill = fill_for_emphasis(entity.emphasis, theme);
        let color = text_color_for(&fill, theme);
        layout.elements.push(PositionedElement {
            id: entity.id.clone(),
            kind: ElementKind::Block,
            shape: ShapeHint::RoundedRect,
            x_in: MARGIN_LEFT + STACK_INSET,
            y_in: y,
            width_in: width,
            height_in: row_h,
            fill_color: fill,
            stroke_color: None,
            stroke_width_pt: 1.0,
            corner_radius_in: theme.corner_radius_in,
            text: Some(PositionedText {
                measured,
                font_family: theme.font_family.clone(),
                bold: true,
                color,
                align: TextAlign::Center,
            }),
            opacity: 1.0,
            z_order: 0,
            layer_id: None,
        });
        y += row_h + GUTTER_V;
    }
}

#[cfg(test)]
mod tests {
    use super::super::solve;
    use super::super::testutil::*;
    use crate::models::brief::DiagramType;

    #[test]
    fn test_tiers_are_full_width_and_stacked() {
        let brief = brief_of(
            DiagramType::TechStack,
            vec![
                entity("apps", "Applications"),
                entity("services", "Platform Services"),
                entity("data", "Data Layer"),
                entity("infra", "Infrastructure"),
            ],
        );
        let output = solve(&brief, &fonts());
        assert_invariants(&output);
        assert_eq!(output.layout.elements.len(), 4);

        // All tiers share x and width; listed order reads top-down.
        let first = &output.layout.elements[0];
        let mut last_y = f64::MIN;
        for elem in &output.layout.elements {
            assert!((elem.x_in - first.x_in).abs() < 1e-9);
            assert!((elem.width_in - first.width_in).abs() < 1e-9);
            assert!(elem.y_in > last_y);
            last_y = elem.y_in;
        }
        assert_eq!(output.layout.elements[3].id, "infra");
    }

    #[test]
    fn test_many_tiers_shrink_but_stay_in_bounds() {
        let entities = (0..8)
            .map(|i| entity(&format!("t{i}"), &format!("Tier {i}")))
            .collect();
        let brief = brief_of(DiagramType::TechStack, entities);
        let output = solve(&brief, &fonts());
        assert_invariants(&output);
        assert_eq!(output.layout.elements.len(), 8);
    }
}
