//! Timeline — dated markers on a horizontal axis.
//!
//! The axis sits at the vertical midpoint of the content area with n equally
//! spaced markers. Entity labels are the dates, kept adjacent to their
//! marker; descriptions alternate above and below the axis.

use crate::layout::positioned::{
    ConnectorStyle, ElementKind, PositionedConnector, PositionedElement, PositionedLayout,
    PositionedText, ShapeHint, TextAlign,
};
use crate::layout::theme::text_color_for;
use crate::layout::units::{CONTENT_WIDTH, MARGIN_LEFT};
use crate::models::brief::Entity;

use super::{fill_for_emphasis, Ctx};

const MARKER_SIZE: f64 = 0.28;
const DATE_HEIGHT: f64 = 0.3;
const DESC_OFFSET: f64 = 0.5;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities: Vec<&Entity> = ctx.brief.entities.iter().collect();
    if entities.is_empty() {
        return;
    }

    let theme = &ctx.brief.theme;
    let n = entities.len();
    let axis_y = ctx.content_top + ctx.content_height / 2.0;
    let slot_w = CONTENT_WIDTH / n as f64;
    let text_w = slot_w - 0.1;

    // The axis itself: a plain connector spanning the content width.
    layout.connectors.push(PositionedConnector {
        id: "axis".to_string(),
        start_x: MARGIN_LEFT + 0.1,
        start_y: axis_y,
        end_x: MARGIN_LEFT + CONTENT_WIDTH - 0.1,
        end_y: axis_y,
        style: ConnectorStyle::Plain,
        color: "999999".to_string(),
        stroke_width_pt: 1.5,
        label: None,
        from_element_id: None,
        to_element_id: None,
    });

    for (k, entity) in entities.iter().enumerate() {
        let center_x = MARGIN_LEFT + (k as f64 + 0.5) * slot_w;
        let above = k % 2 == 0;

        // Marker on the axis.
        let fill = fill_for_emphasis(entity.emphasis, theme);
        layout.elements.push(PositionedElement {
            id: entity.id.clone(),
            kind: ElementKind::Block,
            shape: ShapeHint::Ellipse,
            x_in: center_x - MARKER_SIZE / 2.0,
            y_in: axis_y - MARKER_SIZE / 2.0,
            width_in: MARKER_SIZE,
            height_in: MARKER_SIZE,
            fill_color: fill,
            stroke_color: Some(theme.background.clone()),
            stroke_width_pt: 1.0,
            corner_radius_in: MARKER_SIZE / 2.0,
            text: None,
            opacity: 1.0,
            z_order: 1,
            layer_id: None,
        });

        // Date label adjacent to the marker, on the side away from the
        // description.
        let date = ctx.fonts.fit(&entity.label, text_w, &theme.font_family, 9, 12, true);
        if !date.fits {
            warnings.push(format!("date label for '{}' was truncated", entity.id));
        }
        let date_y = if above {
            axis_y + MARKER_SIZE / 2.0 + 0.08
        } else {
            axis_y - MARKER_SIZE / 2.0 - 0.08 - DATE_HEIGHT
        };
        layout.elements.push(text_label(
            &format!("{}_date", entity.id),
            center_x - text_w / 2.0,
            date_y,
            text_w,
            DATE_HEIGHT,
            theme.background.clone(),
            PositionedText {
                measured: date,
                font_family: theme.font_family.clone(),
                bold: true,
                color: theme.text.clone(),
                align: TextAlign::Center,
            },
        ));

        // Description alternates above/below the axis.
        if let Some(description) = entity.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let measured = ctx.fonts.fit(description, text_w, &theme.font_family, 9, 12, false);
            if !measured.fits {
                warnings.push(format!("description for '{}' was truncated", entity.id));
            }
            let height = measured.total_height_in + 0.1;
            let y = if above {
                axis_y - DESC_OFFSET - height
            } else {
                axis_y + DESC_OFFSET
            };
            let fill = theme.background.clone();
            let color = text_color_for(&fill, theme);
            layout.elements.push(text_label(
                &format!("{}_desc", entity.id),
                center_x - text_w / 2.0,
                y,
                text_w,
                height,
                fill,
                PositionedText {
                    measured,
                    font_family: theme.font_family.clone(),
                    bold: false,
                    color,
                    align: TextAlign::Center,
                },
            ));
        }
    }
}

fn text_label(
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
        corner_radius_in: 0.0,
        text: Some(text),
        opacity: 1.0,
        z_order: 0,
        layer_id: None,
    }
}
