//! Hub-spoke — a central concept with satellites on a circle.
//!
//! The first entity is the hub, rendered as an ellipse at the content
//! center. Satellites sit on a circle of radius 0.35 × min(content width,
//! content height), starting at the top (270°) and proceeding clockwise.
//! Connectors run from the hub edge to each satellite edge. Block widths are
//! capped by the chord between neighbouring satellites so the circle never
//! self-intersects.

use std::f64::consts::PI;

use crate::layout::positioned::{PositionedLayout, ShapeHint};
use crate::layout::theme::text_color_for;
use crate::layout::units::{
    clamp, CONTENT_WIDTH, GUTTER_H, MARGIN_LEFT, MAX_BLOCK_WIDTH, MIN_BLOCK_WIDTH,
};
use crate::models::brief::{Connection, ConnectionStyle, Emphasis, Entity};

use super::{connect, place_block, size_block_at, Ctx};

/// Circle radius as a fraction of the smaller content dimension.
const RADIUS_FRACTION: f64 = 0.35;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities: Vec<&Entity> = ctx.brief.entities.iter().collect();
    let Some((hub, satellites)) = entities.split_first() else {
        return;
    };

    let cx = MARGIN_LEFT + CONTENT_WIDTH / 2.0;
    let cy = ctx.content_top + ctx.content_height / 2.0;
    let radius = RADIUS_FRACTION * CONTENT_WIDTH.min(ctx.content_height);
    let n = satellites.len();

    // Width caps: neighbouring satellites must clear each other along the
    // chord, and the hub must clear the closest satellite radially.
    let chord = if n >= 2 {
        2.0 * radius * (PI / n as f64).sin()
    } else {
        f64::MAX
    };
    let sat_width = clamp(
        (CONTENT_WIDTH - (n.max(1) as f64 - 1.0) * GUTTER_H) / n.max(1) as f64,
        MIN_BLOCK_WIDTH,
        MAX_BLOCK_WIDTH,
    )
    .min((chord - 0.15).max(0.9));
    let hub_width = MAX_BLOCK_WIDTH
        .min(2.0 * (radius - sat_width / 2.0 - 0.2))
        .max(0.9);

    // Hub: an ellipse at the content center, in the primary role unless the
    // Brief says otherwise.
    let hub_sized = size_block_at(ctx, hub, hub_width, warnings);
    let mut hub_elem = place_block(
        &hub_sized,
        cx - hub_sized.width / 2.0,
        cy - hub_sized.height / 2.0,
        &ctx.brief.theme,
    );
    hub_elem.shape = ShapeHint::Ellipse;
    if hub.emphasis == Emphasis::Normal {
        hub_elem.fill_color = ctx.brief.theme.primary.clone();
        if let Some(text) = &mut hub_elem.text {
            text.color = text_color_for(&hub_elem.fill_color, &ctx.brief.theme);
        }
    }
    layout.elements.push(hub_elem);

    if satellites.is_empty() {
        return;
    }

    // Satellites at 270° + k·360°/n, screen-y downward, so k = 0 is the top.
    for (k, satellite) in satellites.iter().enumerate() {
        let sized = size_block_at(ctx, satellite, sat_width, warnings);
        let angle = (270.0 + k as f64 * 360.0 / n as f64).to_radians();
        let sx = cx + radius * angle.cos();
        let sy = cy + radius * angle.sin();
        layout.elements.push(place_block(
            &sized,
            sx - sized.width / 2.0,
            sy - sized.height / 2.0,
            &ctx.brief.theme,
        ));
    }

    // Hub-to-satellite connectors, plain, edge to edge.
    let spoke = Connection {
        from_id: String::new(),
        to_id: String::new(),
        label: None,
        style: ConnectionStyle::Plain,
    };
    let mut connectors = Vec::new();
    let hub_elem = layout.element_by_id(&hub.id).cloned();
    if let Some(hub_elem) = hub_elem {
        for (k, satellite) in satellites.iter().enumerate() {
            if let Some(sat_elem) = layout.element_by_id(&satellite.id) {
                connectors.push(connect(
                    ctx,
                    &format!("spoke_{k}"),
                    &hub_elem,
                    sat_elem,
                    &spoke,
                ));
            }
        }
    }
    layout.connectors.extend(connectors);
}

#[cfg(test)]
mod tests {
    use super::super::solve;
    use super::super::testutil::*;
    use crate::layout::positioned::ShapeHint;
    use crate::layout::units::CONNECTOR_INSET;
    use crate::models::brief::DiagramType;

    fn hub_brief(spokes: usize) -> crate::models::brief::Brief {
        let mut entities = vec![entity("hub", "Platform Core")];
        entities.extend((0..spokes).map(|i| entity(&format!("s{i}"), &format!("Service {i}"))));
        brief_of(DiagramType::HubSpoke, entities)
    }

    #[test]
    fn test_hub_is_an_ellipse_at_center() {
        let output = solve(&hub_brief(5), &fonts());
        assert_invariants(&output);

        let hub = output.layout.element_by_id("hub").unwrap();
        assert_eq!(hub.shape, ShapeHint::Ellipse);

        // Satellites surround the hub on both sides.
        let left = output.layout.elements.iter().any(|e| e.center_x() < hub.center_x() - 1.0);
        let right = output.layout.elements.iter().any(|e| e.center_x() > hub.center_x() + 1.0);
        assert!(left && right);
    }

    #[test]
    fn test_first_satellite_is_at_the_top() {
        let output = solve(&hub_brief(4), &fonts());
        let hub = output.layout.element_by_id("hub").unwrap();
        let first = output.layout.element_by_id("s0").unwrap();
        assert!(first.center_y() < hub.center_y());
        assert!((first.center_x() - hub.center_x()).abs() < 1e-6);
    }

    #[test]
    fn test_satellites_equidistant_from_hub() {
        let output = solve(&hub_brief(6), &fonts());
        assert_invariants(&output);
        let hub = output.layout.element_by_id("hub").unwrap();
        let distances: Vec<f64> = (0..6)
            .map(|i| {
                let s = output.layout.element_by_id(&format!("s{i}")).unwrap();
                let dx = s.center_x() - hub.center_x();
                let dy = s.center_y() - hub.center_y();
                (dx * dx + dy * dy).sqrt()
            })
            .collect();
        for d in &distances {
            assert!((d - distances[0]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_eight_spokes_stay_disjoint() {
        let output = solve(&hub_brief(8), &fonts());
        assert_invariants(&output);
        assert_eq!(output.layout.elements.len(), 9);
        assert_eq!(output.layout.connectors.len(), 8);
    }

    #[test]
    fn test_spoke_endpoints_clear_both_shapes() {
        let output = solve(&hub_brief(4), &fonts());
        assert_eq!(output.layout.connectors.len(), 4);
        let hub = output.layout.element_by_id("hub").unwrap();
        for conn in &output.layout.connectors {
            // Start point lies outside the hub's bounding box by the inset.
            let outside_x = conn.start_x < hub.x_in - CONNECTOR_INSET / 2.0
                || conn.start_x > hub.right_edge() + CONNECTOR_INSET / 2.0;
            let outside_y = conn.start_y < hub.y_in - CONNECTOR_INSET / 2.0
                || conn.start_y > hub.bottom_edge() + CONNECTOR_INSET / 2.0;
            assert!(outside_x || outside_y, "spoke start must clear the hub");
        }
    }
}
