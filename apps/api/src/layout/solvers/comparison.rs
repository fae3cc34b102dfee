//! Comparison — options against criteria in a (M+1) × (N+1) grid.
//!
//! Columns come from entity groups (one column per option); ungrouped
//! entities are the criteria and become the header column. The header row
//! and column are smaller than the data cells; data rows alternate a subtle
//! tint so long tables stay readable.

use crate::layout::positioned::{
    ElementKind, PositionedElement, PositionedLayout, PositionedText, ShapeHint, TextAlign,
};
use crate::layout::theme::{lighten, normal_tint, text_color_for};
use crate::layout::units::{CONTENT_WIDTH, GUTTER_H, GUTTER_V, MARGIN_LEFT};
use crate::models::brief::Entity;

use super::Ctx;

const HEADER_COL_WIDTH: f64 = 2.0;
const HEADER_ROW_HEIGHT: f64 = 0.5;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let brief = ctx.brief;

    // Column order follows first appearance of each group.
    let mut columns: Vec<&str> = Vec::new();
    for entity in &brief.entities {
        if let Some(group) = entity.group.as_deref() {
            if !columns.contains(&group) {
                columns.push(group);
            }
        }
    }
    let criteria: Vec<&Entity> = brief.entities.iter().filter(|e| e.group.is_none()).collect();

    if columns.is_empty() {
        // Degenerate input: no options to compare — single column of cells.
        warnings.push("comparison brief has no grouped entities; using one column".to_string());
        columns.push("items");
    }

    let cells_per_column: Vec<Vec<&Entity>> = columns
        .iter()
        .map(|col| {
            brief
                .entities
                .iter()
                .filter(|e| e.group.as_deref() == Some(*col) || (*col == "items" && e.group.is_none()))
                .collect()
        })
        .collect();

    let m = columns.len();
    let n_rows = cells_per_column
        .iter()
        .map(|c| c.len())
        .max()
        .unwrap_or(0)
        .max(criteria.len());
    if n_rows == 0 {
        return;
    }

    let has_header_col = !criteria.is_empty() && columns[0] != "items";
    let header_col_w = if has_header_col { HEADER_COL_WIDTH } else { 0.0 };
    let cell_w = (CONTENT_WIDTH - header_col_w - m as f64 * GUTTER_H) / m as f64;
    let cell_h =
        (ctx.content_height - HEADER_ROW_HEIGHT - n_rows as f64 * GUTTER_V) / n_rows as f64;

    let theme = &brief.theme;
    let col_x =
        |j: usize| MARGIN_LEFT + header_col_w + GUTTER_H + j as f64 * (cell_w + GUTTER_H) - GUTTER_H;
    let row_y = |i: usize| {
        ctx.content_top + HEADER_ROW_HEIGHT + GUTTER_V + i as f64 * (cell_h + GUTTER_V) - GUTTER_V
    };

    // Header row: option names over each column.
    for (j, column) in columns.iter().enumerate() {
        if *column == "items" {
            continue;
        }
        let measured = ctx.fonts.fit(column, cell_w, &theme.font_family, 10, 16, true);
        layout.elements.push(label_element(
            &format!("header_col_{j}"),
            col_x(j),
            ctx.content_top,
            cell_w,
            HEADER_ROW_HEIGHT,
            theme.primary.clone(),
            PositionedText {
                measured,
                font_family: theme.font_family.clone(),
                bold: true,
                color: text_color_for(&theme.primary, theme),
                align: TextAlign::Center,
            },
        ));
    }

    // Header column: criteria labels down the left edge.
    if has_header_col {
        for (i, criterion) in criteria.iter().enumerate().take(n_rows) {
            let measured =
                ctx.fonts
                    .fit(&criterion.label, HEADER_COL_WIDTH, &theme.font_family, 10, 14, true);
            layout.elements.push(label_element(
                &criterion.id,
                MARGIN_LEFT,
                row_y(i),
                HEADER_COL_WIDTH,
                cell_h,
                theme.background.clone(),
                PositionedText {
                    measured,
                    font_family: theme.font_family.clone(),
                    bold: true,
                    color: theme.text.clone(),
                    align: TextAlign::Left,
                },
            ));
        }
    }

    // Data cells with alternating row tint.
    let even_tint = normal_tint(theme);
    let odd_tint = lighten(&theme.primary, 0.32);
    for (j, cells) in cells_per_column.iter().enumerate() {
        for (i, entity) in cells.iter().enumerate() {
            let fill = if i % 2 == 0 {
                even_tint.clone()
            } else {
                odd_tint.clone()
            };
            let measured = ctx
                .fonts
                .fit(&entity.label, cell_w, &theme.font_family, 9, 14, false);
            if !measured.fits {
                warnings.push(format!(
                    "cell text for '{}' did not fit and was truncated",
                    entity.id
                ));
            }
            let color = text_color_for(&fill, theme);
            layout.elements.push(PositionedElement {
                id: entity.id.clone(),
                kind: ElementKind::Block,
                shape: ShapeHint::RoundedRect,
                x_in: col_x(j),
                y_in: row_y(i),
                width_in: cell_w,
                height_in: cell_h,
                fill_color: fill,
                stroke_color: None,
                stroke_width_pt: 0.75,
                corner_radius_in: theme.corner_radius_in / 2.0,
                text: Some(PositionedText {
                    measured,
                    font_family: theme.font_family.clone(),
                    bold: false,
                    color,
                    align: TextAlign::Center,
                }),
                opacity: 1.0,
                z_order: 0,
                layer_id: None,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn label_element(
    id: &str,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    fill: String,
    text: PositionedText,
) -> PositionedElement {
    PositionedElement {
        id: id.to_string(),
        kind: ElementKind::Label,
        shape: ShapeHint::RoundedRect,
        x_in: x,
        y_in: y,
        width_in: w,
        height_in: h,
        fill_color: fill,
        stroke_color: None,
        stroke_width_pt: 0.0,
        corner_radius_in: 0.04,
        text: Some(text),
        opacity: 1.0,
        z_order: 0,
        layer_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::solve;
    use super::super::testutil::*;
    use crate::layout::positioned::ElementKind;
    use crate::models::brief::{DiagramType, Entity};

    fn cell(id: &str, label: &str, group: &str) -> Entity {
        let mut e = entity(id, label);
        e.group = Some(group.to_string());
        e
    }

    #[test]
    fn test_two_option_grid_with_criteria() {
        let brief = brief_of(
            DiagramType::Comparison,
            vec![
                entity("price", "Price"),
                entity("speed", "Speed"),
                cell("a1", "$10/mo", "Basic"),
                cell("a2", "Slow", "Basic"),
                cell("b1", "$50/mo", "Premium"),
                cell("b2", "Fast", "Premium"),
            ],
        );
        let output = solve(&brief, &fonts());
        assert_invariants(&output);

        // 2 header cells + 2 criteria labels + 4 data cells
        let labels = output
            .layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Label)
            .count();
        let blocks = output
            .layout
            .elements
            .iter()
            .filter(|e| e.kind == ElementKind::Block)
            .count();
        assert_eq!(labels, 4);
        assert_eq!(blocks, 4);
    }

    #[test]
    fn test_alternating_row_tint() {
        let brief = brief_of(
            DiagramType::Comparison,
            vec![
                cell("a1", "Row one", "Only"),
                cell("a2", "Row two", "Only"),
                cell("a3", "Row three", "Only"),
            ],
        );
        let output = solve(&brief, &fonts());
        let a1 = output.layout.element_by_id("a1").unwrap();
        let a2 = output.layout.element_by_id("a2").unwrap();
        let a3 = output.layout.element_by_id("a3").unwrap();
        assert_ne!(a1.fill_color, a2.fill_color);
        assert_eq!(a1.fill_color, a3.fill_color);
    }

    #[test]
    fn test_ungrouped_only_degrades_to_single_column() {
        let brief = brief_of(
            DiagramType::Comparison,
            vec![entity("a", "Alpha"), entity("b", "Beta")],
        );
        let output = solve(&brief, &fonts());
        assert_invariants(&output);
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("no grouped entities")));
        assert_eq!(output.layout.elements.len(), 2);
    }
}
