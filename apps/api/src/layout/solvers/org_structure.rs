//! Org structure — reporting hierarchy, one row per level.
//!
//! An entity's `group` names its parent entity id; entities without a parent
//! are roots on the top row. Children spread evenly beneath their parent,
//! with the classic three-segment connectors: down from the parent, across
//! the siblings, down into each child.

use std::collections::{HashMap, HashSet};

use crate::layout::positioned::{ConnectorStyle, PositionedConnector, PositionedLayout};
use crate::layout::units::{CONNECTOR_INSET, CONTENT_WIDTH, GUTTER_V, MARGIN_LEFT};
use crate::models::brief::Entity;

use super::{place_block, size_blocks, Ctx};

/// The resolvable parent of an entity: its `group`, when that names another
/// existing entity.
fn parent_of<'e>(entity: &'e Entity, ids: &HashSet<&str>) -> Option<&'e str> {
    entity
        .group
        .as_deref()
        .filter(|parent| ids.contains(parent) && *parent != entity.id)
}

pub(super) fn solve(ctx: &Ctx<'_>, layout: &mut PositionedLayout, warnings: &mut Vec<String>) {
    let entities = &ctx.brief.entities;
    if entities.is_empty() {
        return;
    }

    let ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();

    // Breadth-first levels from the roots.
    let mut placed: HashSet<&str> = HashSet::new();
    let mut levels: Vec<Vec<&Entity>> = Vec::new();
    let roots: Vec<&Entity> = entities
        .iter()
        .filter(|e| parent_of(e, &ids).is_none())
        .collect();
    for root in &roots {
        placed.insert(root.id.as_str());
    }
    levels.push(roots);

    loop {
        let frontier: HashSet<&str> = levels
            .last()
            .map(|l| l.iter().map(|e| e.id.as_str()).collect())
            .unwrap_or_default();
        let next: Vec<&Entity> = entities
            .iter()
            .filter(|e| !placed.contains(e.id.as_str()))
            .filter(|e| {
                parent_of(e, &ids)
                    .map(|p| frontier.contains(p))
                    .unwrap_or(false)
            })
            .collect();
        if next.is_empty() {
            break;
        }
        for entity in &next {
            placed.insert(entity.id.as_str());
        }
        levels.push(next);
    }

    // Entities stranded by a reference cycle still render, on a final row.
    let stranded: Vec<&Entity> = entities
        .iter()
        .filter(|e| !placed.contains(e.id.as_str()))
        .collect();
    if !stranded.is_empty() {
        warnings.push(format!(
            "{} org entities have unresolvable parents; placed on the bottom row",
            stranded.len()
        ));
        levels.push(stranded);
    }

    let depth = levels.len();
    let row_h = (ctx.content_height - (depth - 1) as f64 * GUTTER_V) / depth as f64;
    let widest = levels.iter().map(|l| l.len()).max().unwrap_or(1);

    // Leaf slots distribute the width; parents center over their children.
    // When computed centers would collide, the level falls back to even
    // spacing.
    let mut centers: HashMap<String, f64> = HashMap::new();
    for level in levels.iter().rev() {
        let mut proposed: Vec<(String, f64)> = level
            .iter()
            .enumerate()
            .map(|(i, entity)| {
                let children: Vec<f64> = ctx
                    .brief
                    .entities
                    .iter()
                    .filter(|c| parent_of(c, &ids) == Some(entity.id.as_str()))
                    .filter_map(|c| centers.get(c.id.as_str()).copied())
                    .collect();
                let center = if children.is_empty() {
                    MARGIN_LEFT + (i as f64 + 0.5) * CONTENT_WIDTH / level.len() as f64
                } else {
                    children.iter().sum::<f64>() / children.len() as f64
                };
                (entity.id.clone(), center)
            })
            .collect();

        let min_spacing = CONTENT_WIDTH / widest as f64;
        let collides = proposed
            .windows(2)
            .any(|pair| (pair[1].1 - pair[0].1).abs() < min_spacing * 0.8);
        if collides && level.len() > 1 {
            for (i, entry) in proposed.iter_mut().enumerate() {
                entry.1 = MARGIN_LEFT + (i as f64 + 0.5) * CONTENT_WIDTH / level.len() as f64;
            }
        }
        for (id, center) in proposed {
            centers.insert(id, center);
        }
    }

    for (depth_idx, level) in levels.iter().enumerate() {
        let sized = size_blocks(ctx, level, widest.max(3), warnings);
        let row_y = ctx.content_top + depth_idx as f64 * (row_h + GUTTER_V);
        for block in &sized {
            let cx = centers[block.entity.id.as_str()];
            let y = row_y + (row_h - block.height) / 2.0;
            layout.elements.push(place_block(
                block,
                cx - block.width / 2.0,
                y,
                &ctx.brief.theme,
            ));
        }
    }

    add_tree_connectors(ctx, &ids, layout);
}

/// Three-segment reporting lines: parent bottom → mid-gap, across the
/// siblings, mid-gap → each child top. All segments are plain.
fn add_tree_connectors(ctx: &Ctx<'_>, ids: &HashSet<&str>, layout: &mut PositionedLayout) {
    let mut connectors: Vec<PositionedConnector> = Vec::new();
    let segment = |id: String, (sx, sy): (f64, f64), (ex, ey): (f64, f64)| PositionedConnector {
        id,
        start_x: sx,
        start_y: sy,
        end_x: ex,
        end_y: ey,
        style: ConnectorStyle::Plain,
        color: "999999".to_string(),
        stroke_width_pt: 1.25,
        label: None,
        from_element_id: None,
        to_element_id: None,
    };

    for parent in ctx.brief.entities.iter() {
        let children: Vec<_> = ctx
            .brief
            .entities
            .iter()
            .filter(|c| parent_of(c, ids) == Some(parent.id.as_str()))
            .filter_map(|c| layout.element_by_id(&c.id))
            .collect();
        if children.is_empty() {
            continue;
        }
        let Some(parent_elem) = layout.element_by_id(&parent.id) else {
            continue;
        };

        let child_top = children.iter().map(|c| c.y_in).fold(f64::MAX, f64::min);
        let mid_y = (parent_elem.bottom_edge() + child_top) / 2.0;
        let px = parent_elem.center_x();

        connectors.push(segment(
            format!("org_{}_down", parent.id),
            (px, parent_elem.bottom_edge() + CONNECTOR_INSET),
            (px, mid_y),
        ));

        if children.len() > 1 {
            let left = children.iter().map(|c| c.center_x()).fold(f64::MAX, f64::min);
            let right = children.iter().map(|c| c.center_x()).fold(f64::MIN, f64::max);
            connectors.push(segment(
                format!("org_{}_across", parent.id),
                (left, mid_y),
                (right, mid_y),
            ));
        }

        for child in &children {
            connectors.push(segment(
                format!("org_{}_{}_up", parent.id, child.id),
                (child.center_x(), mid_y),
                (child.center_x(), child.y_in - CONNECTOR_INSET),
            ));
        }
    }

    layout.connectors.extend(connectors);
}
