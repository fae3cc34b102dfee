//! Process flow — sequential steps connected by arrows in reading order.
//!
//! Up to six steps sit on one row. Beyond that the flow folds onto two rows
//! with a U-turn: the bottom row runs right-to-left so the sequence keeps
//! reading continuously.

use crate::layout::positioned::PositionedLayout;
use crate::layout::units::{CONTENT_WIDTH, GUTTER_H, GUTTER_V, MARGIN_LEFT};
use crate::models::brief::{Connection, ConnectionStyle, Entity};

use super::{connect, place_block, size_blocks, Ctx};

/// Step count above which the flow folds onto two rows.
const U_TURN_THRESHOLD: usize = 6;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities: Vec<&Entity> = ctx.brief.entities.iter().collect();
    if entities.is_empty() {
        return;
    }

    let n = entities.len();
    let rows = if n <= U_TURN_THRESHOLD { 1 } else { 2 };
    let cols = n.div_ceil(rows);

    let sized = size_blocks(ctx, &entities, cols, warnings);
    let cell_w = (CONTENT_WIDTH - (cols - 1) as f64 * GUTTER_H) / cols as f64;
    let row_h = (ctx.content_height - (rows - 1) as f64 * GUTTER_V) / rows as f64;

    for (i, block) in sized.iter().enumerate() {
        let row = i / cols;
        // Bottom row runs right-to-left.
        let col = if row == 0 { i } else { cols - 1 - (i - cols) };
        let cell_x = MARGIN_LEFT + col as f64 * (cell_w + GUTTER_H);
        let x = cell_x + (cell_w - block.width) / 2.0;
        let y = ctx.content_top + row as f64 * (row_h + GUTTER_V) + (row_h - block.height) / 2.0;
        layout
            .elements
            .push(place_block(block, x, y, &ctx.brief.theme));
    }

    // The sequence defines the connectivity: one arrow between each pair of
    // adjacent steps in reading order. Brief-level connections are ignored.
    let sequence = Connection {
        from_id: String::new(),
        to_id: String::new(),
        label: None,
        style: ConnectionStyle::Arrow,
    };
    let mut connectors = Vec::new();
    for i in 0..n - 1 {
        let from = layout.element_by_id(&entities[i].id);
        let to = layout.element_by_id(&entities[i + 1].id);
        if let (Some(from), Some(to)) = (from, to) {
            connectors.push(connect(ctx, &format!("flow_{i}"), from, to, &sequence));
        }
    }
    layout.connectors.extend(connectors);
}

#[cfg(test)]
mod tests {
    use super::super::solve;
    use super::super::testutil::*;
    use super::*;
    use crate::layout::units::CONNECTOR_INSET;
    use crate::models::brief::DiagramType;

    fn flow_of(n: usize) -> Vec<Entity> {
        (0..n)
            .map(|i| entity(&format!("step{i}"), &format!("Step {i}")))
            .collect()
    }

    #[test]
    fn test_four_steps_single_row_with_three_arrows() {
        let brief = brief_of(DiagramType::ProcessFlow, flow_of(4));
        let output = solve(&brief, &fonts());
        assert_invariants(&output);

        assert_eq!(output.layout.elements.len(), 4);
        assert_eq!(output.layout.connectors.len(), 3);

        // Single row: all blocks share a center-y; x strictly increases.
        let cy = output.layout.elements[0].center_y();
        let mut last_x = f64::MIN;
        for elem in &output.layout.elements {
            assert!((elem.center_y() - cy).abs() < 1e-6);
            assert!(elem.x_in > last_x);
            last_x = elem.x_in;
        }
    }

    #[test]
    fn test_connector_spans_the_gap_between_adjacent_steps() {
        let brief = brief_of(DiagramType::ProcessFlow, flow_of(3));
        let output = solve(&brief, &fonts());
        let first = output.layout.element_by_id("step0").unwrap();
        let second = output.layout.element_by_id("step1").unwrap();
        let conn = &output.layout.connectors[0];

        // Starts just right of step0, ends just left of step1, at mid height.
        assert!((conn.start_x - (first.right_edge() + CONNECTOR_INSET)).abs() < 1e-6);
        assert!((conn.end_x - (second.x_in - CONNECTOR_INSET)).abs() < 1e-6);
        assert!((conn.start_y - first.center_y()).abs() < 1e-6);
    }

    #[test]
    fn test_seven_steps_fold_onto_two_rows_with_u_turn() {
        let brief = brief_of(DiagramType::ProcessFlow, flow_of(7));
        let output = solve(&brief, &fonts());
        assert_invariants(&output);

        let top_y = output.layout.element_by_id("step0").unwrap().y_in;
        let bottom = output.layout.element_by_id("step6").unwrap();
        assert!(bottom.y_in > top_y, "overflow steps sit on the second row");

        // Bottom row runs right-to-left: step4 is rightmost of the second row.
        let s4 = output.layout.element_by_id("step4").unwrap();
        let s5 = output.layout.element_by_id("step5").unwrap();
        assert!(s4.x_in > s5.x_in);
        assert!(s5.x_in > bottom.x_in);

        // Still a continuous chain of six arrows.
        assert_eq!(output.layout.connectors.len(), 6);
    }

    #[test]
    fn test_six_steps_stay_on_one_row() {
        let brief = brief_of(DiagramType::ProcessFlow, flow_of(6));
        let output = solve(&brief, &fonts());
        let cy = output.layout.elements[0].center_y();
        for elem in &output.layout.elements {
            assert!((elem.center_y() - cy).abs() < 1e-6);
        }
    }
}
