//! Value chain — a single row of chevrons flowing left to right.
//!
//! Segments sit edge to edge; the chevron tip length is 0.1 × block width,
//! carried in the element's corner-radius slot so both renderers cut the
//! same tip. Bounding boxes stay disjoint — the flow reads from the shape,
//! not from overlap.

use crate::layout::positioned::{PositionedLayout, ShapeHint};
use crate::layout::units::{CONTENT_WIDTH, MARGIN_LEFT};
use crate::models::brief::Entity;

use super::{place_block, size_blocks, Ctx};

/// Tip length as a fraction of segment width.
const TIP_FRACTION: f64 = 0.1;

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities: Vec<&Entity> = ctx.brief.entities.iter().collect();
    if entities.is_empty() {
        return;
    }

    let n = entities.len();
    let sized = size_blocks(ctx, &entities, n, warnings);

    // One shared height keeps the chain reading as a single band.
    let height = sized
        .iter()
        .map(|b| b.height)
        .fold(f64::MIN, f64::max);
    let width = sized[0].width;
    let total = width * n as f64;
    let mut x = MARGIN_LEFT + (CONTENT_WIDTH - total).max(0.0) / 2.0;
    let y = ctx.content_top + (ctx.content_height - height) / 2.0;

    for block in &sized {
        let mut elem = place_block(block, x, y, &ctx.brief.theme);
        elem.height_in = height;
        elem.shape = ShapeHint::Chevron;
        elem.corner_radius_in = width * TIP_FRACTION;
        layout.elements.push(elem);
        x += width;
    }
}

#[cfg(test)]
mod tests {
    use super::super::solve;
    use super::super::testutil::*;
    use crate::layout::positioned::ShapeHint;
    use crate::models::brief::DiagramType;

    fn chain_brief(n: usize) -> crate::models::brief::Brief {
        brief_of(
            DiagramType::ValueChain,
            (0..n)
                .map(|i| entity(&format!("v{i}"), &format!("Stage {i}")))
                .collect(),
        )
    }

    #[test]
    fn test_chevrons_share_a_row_edge_to_edge() {
        let output = solve(&chain_brief(5), &fonts());
        assert_invariants(&output);
        assert_eq!(output.layout.elements.len(), 5);

        let y = output.layout.elements[0].y_in;
        for pair in output.layout.elements.windows(2) {
            assert!((pair[0].y_in - y).abs() < 1e-9);
            assert!(
                (pair[1].x_in - pair[0].right_edge()).abs() < 1e-9,
                "segments sit edge to edge"
            );
        }
    }

    #[test]
    fn test_tip_length_is_tenth_of_width() {
        let output = solve(&chain_brief(4), &fonts());
        for elem in &output.layout.elements {
            assert_eq!(elem.shape, ShapeHint::Chevron);
            assert!((elem.corner_radius_in - elem.width_in * 0.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_uniform_heights() {
        let output = solve(&chain_brief(3), &fonts());
        let h = output.layout.elements[0].height_in;
        for elem in &output.layout.elements {
            assert!((elem.height_in - h).abs() < 1e-9);
        }
    }
}
