//! Join layout and auto-arrange
//!
//! Pure position computation. Nothing here talks to the store; the results
//! are carried to it inside a [`JoinCommand`] or a bulk layout save.

use serde::{Deserialize, Serialize};
use shared::models::{JoinCommand, PositionUpdate, TableId};
use uuid::Uuid;

use crate::grouping::{FloorPlan, GroupingError};
use crate::spatial::{CardFootprint, Point};

/// Auto-arrange grid: columns per row
pub const ARRANGE_COLUMNS: usize = 5;
/// Auto-arrange grid origin (percent)
pub const ARRANGE_ORIGIN: Point = Point::new(5.0, 5.0);
/// Horizontal cell spacing (percent)
pub const ARRANGE_GAP_X: f64 = 15.0;
/// Vertical cell spacing (percent)
pub const ARRANGE_GAP_Y: f64 = 20.0;

/// Computed join (拼桌方案)
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub operation_id: String,
    pub parent_id: TableId,
    /// Expanded membership, ascending (parent first)
    pub member_ids: Vec<TableId>,
    /// New positions of every child, in member order
    pub placements: Vec<PositionUpdate>,
    /// Non-member tables pushed right out of the group's row
    pub shifted: Vec<PositionUpdate>,
}

impl JoinPlan {
    pub fn children_count(&self) -> usize {
        self.member_ids.len().saturating_sub(1)
    }

    /// Command carrying the relationship and every position change
    pub fn command(&self) -> JoinCommand {
        JoinCommand {
            operation_id: self.operation_id.clone(),
            table_ids: self.member_ids.clone(),
            positions: self
                .placements
                .iter()
                .chain(self.shifted.iter())
                .cloned()
                .collect(),
        }
    }
}

/// Compute the layout for joining `nominated` tables
///
/// Membership expands to every member of every group touched. The lowest
/// id becomes the parent and stays where it is; children line up to its
/// right, one card width apart. Any other table inside the new group's
/// horizontal span and within one row height of the parent is shifted
/// right by `card width × children count`. Results are not clamped.
pub fn plan_join(
    floor: &FloorPlan,
    nominated: &[TableId],
    footprint: CardFootprint,
) -> Result<JoinPlan, GroupingError> {
    let mut distinct: Vec<TableId> = nominated.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(GroupingError::TooFewTables(distinct.len()));
    }

    let members = floor.expand(&distinct)?;
    let member_ids: Vec<TableId> = members.iter().copied().collect();
    let parent_id = member_ids[0];
    let anchor = Point::of(floor.require(parent_id)?);

    let placements: Vec<PositionUpdate> = member_ids
        .iter()
        .skip(1)
        .enumerate()
        .map(|(i, &id)| {
            PositionUpdate::new(
                id,
                anchor.x + footprint.width_pct * (i + 1) as f64,
                anchor.y,
            )
        })
        .collect();

    let children_count = member_ids.len() - 1;
    let span_start = anchor.x;
    let span_end = anchor.x + footprint.width_pct * member_ids.len() as f64;
    let shift = footprint.width_pct * children_count as f64;

    let shifted: Vec<PositionUpdate> = floor
        .tables()
        .filter(|t| !members.contains(&t.id))
        .filter(|t| {
            (t.position_y - anchor.y).abs() < footprint.height_pct
                && t.position_x >= span_start
                && t.position_x < span_end
        })
        .map(|t| PositionUpdate::new(t.id, t.position_x + shift, t.position_y))
        .collect();

    Ok(JoinPlan {
        operation_id: Uuid::new_v4().to_string(),
        parent_id,
        member_ids,
        placements,
        shifted,
    })
}

/// Sort direction for auto-arrange (by numeric table number)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrangeOrder {
    #[default]
    Ascending,
    Descending,
}

/// Grid positions for every table (自动排列)
///
/// Standalone tables and group parents fill a 5-column grid ordered by
/// table number; a non-numeric number sorts as 0. Children keep their
/// offset relative to their parent so groups move as a unit.
pub fn auto_arrange(floor: &FloorPlan, order: ArrangeOrder) -> Vec<PositionUpdate> {
    let mut roots: Vec<_> = floor.tables().filter(|t| t.parent_id.is_none()).collect();
    roots.sort_by_key(|t| (t.number_value().unwrap_or(0), t.id));
    if order == ArrangeOrder::Descending {
        roots.reverse();
    }

    let mut updates = Vec::with_capacity(floor.len());
    for (index, root) in roots.iter().enumerate() {
        let col = index % ARRANGE_COLUMNS;
        let row = index / ARRANGE_COLUMNS;
        let x = ARRANGE_ORIGIN.x + col as f64 * ARRANGE_GAP_X;
        let y = ARRANGE_ORIGIN.y + row as f64 * ARRANGE_GAP_Y;
        updates.push(PositionUpdate::new(root.id, x, y));

        let dx = x - root.position_x;
        let dy = y - root.position_y;
        for child in floor.children_of(root.id) {
            if let Some(t) = floor.get(child) {
                updates.push(PositionUpdate::new(child, t.position_x + dx, t.position_y + dy));
            }
        }
    }
    updates
}
