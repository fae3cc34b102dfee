//! Marketecture — horizontal business-unit row with cross-cutting bands.
//!
//! Grid: (1 row if a top cross-cut layer exists) + 1 main row + (1 row if a
//! bottom cross-cut layer exists), row heights weighted {1, 3, 1}. The main
//! row holds one centered block per business unit; cross-cutting layers
//! render as full-width bands behind the blocks (z = −1).

use std::collections::HashSet;

use crate::layout::positioned::{
    ElementKind, PositionedElement, PositionedLayout, PositionedText, ShapeHint, TextAlign,
};
use crate::layout::theme::text_color_for;
use crate::layout::units::{CONTENT_WIDTH, CROSS_CUT_HEIGHT, GUTTER_H, GUTTER_V, MARGIN_LEFT};
use crate::models::brief::{Entity, Layer, LayerPosition};

use super::{add_brief_connectors, place_block, size_blocks, Ctx};

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let brief = ctx.brief;

    // Cross-cutting layers become bands: position decides top or bottom;
    // plain cross-cutting defaults to the top row.
    let top_band = brief.layers.iter().find(|l| {
        matches!(l.position, LayerPosition::CrossCutting | LayerPosition::Top)
    });
    let bottom_band = brief
        .layers
        .iter()
        .filter(|l| !top_band.map(|t| t.id == l.id).unwrap_or(false))
        .find(|l| l.position == LayerPosition::Bottom);

    // Cross-cutting members are already out of the main set; top/bottom
    // band members leave it too.
    let band_members: HashSet<&str> = [top_band, bottom_band]
        .iter()
        .flatten()
        .flat_map(|l| l.members.iter().map(|m| m.as_str()))
        .collect();
    let main: Vec<&Entity> = brief
        .main_entities()
        .into_iter()
        .filter(|e| !band_members.contains(e.id.as_str()))
        .collect();

    // Row heights by weight {1, 3, 1} over the rows actually present.
    let mut weights: Vec<(Row, f64)> = Vec::new();
    if top_band.is_some() {
        weights.push((Row::Top, 1.0));
    }
    weights.push((Row::Main, 3.0));
    if bottom_band.is_some() {
        weights.push((Row::Bottom, 1.0));
    }
    let total_weight: f64 = weights.iter().map(|(_, w)| w).sum();
    let usable = ctx.content_height - (weights.len() - 1) as f64 * GUTTER_V;

    let mut y = ctx.content_top;
    for (row, weight) in &weights {
        let row_height = usable * weight / total_weight;
        match row {
            Row::Top => place_band(ctx, top_band.unwrap(), y, row_height, layout),
            Row::Bottom => place_band(ctx, bottom_band.unwrap(), y, row_height, layout),
            Row::Main => place_main_row(ctx, &main, y, row_height, layout, warnings),
        }
        y += row_height + GUTTER_V;
    }

    add_brief_connectors(ctx, layout);
}

enum Row {
    Top,
    Main,
    Bottom,
}

fn place_band(ctx: &Ctx<'_>, layer: &Layer, row_y: f64, row_height: f64, layout: &mut PositionedLayout) {
    let theme = &ctx.brief.theme;
    let height = CROSS_CUT_HEIGHT.min(row_height);
    let fill = theme.secondary.clone();
    let measured = ctx
        .fonts
        .fit(&layer.label, CONTENT_WIDTH, &theme.font_family, 12, 18, true);
    layout.elements.push(PositionedElement {
        id: layer.id.clone(),
        kind: ElementKind::Band,
        shape: ShapeHint::RoundedRect,
        x_in: MARGIN_LEFT,
        y_in: row_y + (row_height - height) / 2.0,
        width_in: CONTENT_WIDTH,
        height_in: height,
        fill_color: fill.clone(),
        stroke_color: None,
        stroke_width_pt: 0.0,
        corner_radius_in: theme.corner_radius_in,
        text: Some(PositionedText {
            measured,
            font_family: theme.font_family.clone(),
            bold: true,
            color: text_color_for(&fill, theme),
            align: TextAlign::Center,
        }),
        opacity: 0.92,
        z_order: -1,
        layer_id: Some(layer.id.clone()),
    });
}

fn place_main_row(
    ctx: &Ctx<'_>,
    entities: &[&Entity],
    row_y: f64,
    row_height: f64,
    layout: &mut PositionedLayout,
    warnings: &mut Vec<String>,
) {
    if entities.is_empty() {
        return;
    }
    let sized = size_blocks(ctx, entities, entities.len(), warnings);
    let total_width: f64 = sized.iter().map(|b| b.width).sum::<f64>()
        + (sized.len() - 1) as f64 * GUTTER_H;
    let mut x = MARGIN_LEFT + (CONTENT_WIDTH - total_width) / 2.0;

    for block in &sized {
        let y = row_y + (row_height - block.height) / 2.0;
        layout
            .elements
            .push(place_block(block, x, y, &ctx.brief.theme));
        x += block.width + GUTTER_H;
    }
}
