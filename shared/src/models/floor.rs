//! Floor-plan grouping payloads (join / disjoin / layout)

use serde::{Deserialize, Serialize};

use super::dining_table::{PositionUpdate, TableId};

/// Join command (拼桌)
///
/// Carries the relationship and every computed position so the store can
/// apply both in one transaction. `operation_id` makes retries safe: a
/// command whose id was already applied is acknowledged without re-applying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinCommand {
    pub operation_id: String,
    /// Full expanded member list (every member of every touched group)
    pub table_ids: Vec<TableId>,
    /// Child placements and collision shifts
    #[serde(default)]
    pub positions: Vec<PositionUpdate>,
}

/// Result of an applied join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinReceipt {
    pub operation_id: String,
    pub parent_id: TableId,
    pub member_ids: Vec<TableId>,
    /// True when the operation id had already been applied
    #[serde(default)]
    pub replayed: bool,
}

/// Disjoin request (拆桌)
///
/// Without `remove_table_ids` the whole group is disbanded. Naming the
/// group's parent also disbands the whole group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisjoinRequest {
    #[serde(default)]
    pub remove_table_ids: Option<Vec<TableId>>,
    /// Move released tables back to the position they had before joining
    #[serde(default)]
    pub restore_positions: bool,
}

impl DisjoinRequest {
    /// Disband the whole group
    pub fn whole() -> Self {
        Self::default()
    }

    /// Release only the given members
    pub fn members(ids: Vec<TableId>) -> Self {
        Self {
            remove_table_ids: Some(ids),
            restore_positions: false,
        }
    }

    pub fn with_restore_positions(mut self, restore: bool) -> Self {
        self.restore_positions = restore;
        self
    }
}

/// Result of an applied disjoin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisjoinReceipt {
    pub parent_id: TableId,
    pub released: Vec<TableId>,
    /// True when the whole group was disbanded
    pub disbanded: bool,
}

/// Bulk layout save payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutUpdate {
    pub positions: Vec<PositionUpdate>,
}
