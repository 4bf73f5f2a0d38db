//! Grouping model (拼桌关系)
//!
//! Group membership is stored as an optional `parent_id` on each table.
//! [`FloorPlan`] derives the role of every table from that flat list and
//! enforces the one-level tree invariant:
//!
//! - a child's parent exists and is not itself a child
//! - a table is never its own parent
//! - a parent is never a child
//!
//! Join and disjoin are applied here as pure transformations, so the
//! in-memory store and the server apply exactly the same rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use shared::error::ErrorCode;
use shared::models::{DiningTable, TableId};
use thiserror::Error;

/// Derived role of a table in the grouping tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum GroupRole {
    Standalone,
    Parent { children: BTreeSet<TableId> },
    Child { parent: TableId },
}

impl GroupRole {
    pub fn is_grouped(&self) -> bool {
        !matches!(self, GroupRole::Standalone)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupingError {
    #[error("Table {0} not found")]
    UnknownTable(TableId),

    #[error("Table {0} is its own parent")]
    SelfParent(TableId),

    #[error("Table {child} references missing parent {parent}")]
    MissingParent { child: TableId, parent: TableId },

    #[error("Table {child} references {parent}, which is itself a child")]
    NestedGroup { child: TableId, parent: TableId },

    #[error("At least 2 tables are required to join, got {0}")]
    TooFewTables(usize),

    #[error("Table {0} is not part of a group")]
    NotJoined(TableId),

    #[error("Table {table} is not a member of group {group}")]
    NotInGroup { table: TableId, group: TableId },
}

impl GroupingError {
    /// Business error code reported to API callers
    pub fn code(&self) -> ErrorCode {
        match self {
            GroupingError::UnknownTable(_) => ErrorCode::TableNotFound,
            GroupingError::TooFewTables(_) => ErrorCode::JoinTooFewTables,
            GroupingError::NotJoined(_) | GroupingError::NotInGroup { .. } => {
                ErrorCode::TableNotJoined
            }
            GroupingError::SelfParent(_)
            | GroupingError::MissingParent { .. }
            | GroupingError::NestedGroup { .. } => ErrorCode::GroupInvariantViolated,
        }
    }

    /// Structural corruption of the stored tree, as opposed to a bad request
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            GroupingError::SelfParent(_)
                | GroupingError::MissingParent { .. }
                | GroupingError::NestedGroup { .. }
        )
    }
}

/// Result of applying a join to a plan
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedJoin {
    pub parent_id: TableId,
    /// Sorted ascending, parent first
    pub member_ids: Vec<TableId>,
}

/// Result of applying a disjoin to a plan
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDisjoin {
    pub parent_id: TableId,
    /// Tables whose `parent_id` link was cleared or that lost all children
    pub released: Vec<TableId>,
    pub disbanded: bool,
}

/// Annotated table for rendering (membership derived, never stored)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    #[serde(flatten)]
    pub table: DiningTable,
    pub role: GroupRole,
    /// Root of the group this table belongs to (itself when standalone)
    pub group_id: TableId,
}

/// Working copy of the floor: every table keyed by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloorPlan {
    tables: BTreeMap<TableId, DiningTable>,
}

impl FloorPlan {
    pub fn new(tables: impl IntoIterator<Item = DiningTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.id, t)).collect(),
        }
    }

    /// Build and validate the grouping invariant
    pub fn checked(tables: impl IntoIterator<Item = DiningTable>) -> Result<Self, GroupingError> {
        let plan = Self::new(tables);
        plan.validate()?;
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    pub fn get(&self, id: TableId) -> Option<&DiningTable> {
        self.tables.get(&id)
    }

    pub fn require(&self, id: TableId) -> Result<&DiningTable, GroupingError> {
        self.tables.get(&id).ok_or(GroupingError::UnknownTable(id))
    }

    pub fn require_mut(&mut self, id: TableId) -> Result<&mut DiningTable, GroupingError> {
        self.tables
            .get_mut(&id)
            .ok_or(GroupingError::UnknownTable(id))
    }

    /// Tables ordered by id
    pub fn tables(&self) -> impl Iterator<Item = &DiningTable> {
        self.tables.values()
    }

    pub fn into_tables(self) -> Vec<DiningTable> {
        self.tables.into_values().collect()
    }

    /// Insert or replace a table
    pub fn upsert(&mut self, table: DiningTable) {
        self.tables.insert(table.id, table);
    }

    pub fn remove(&mut self, id: TableId) -> Option<DiningTable> {
        self.tables.remove(&id)
    }

    pub fn set_position(&mut self, id: TableId, x: f64, y: f64) -> Result<(), GroupingError> {
        let table = self.require_mut(id)?;
        table.position_x = x;
        table.position_y = y;
        Ok(())
    }

    /// Direct children of `id` (empty unless `id` is a parent)
    pub fn children_of(&self, id: TableId) -> BTreeSet<TableId> {
        self.tables
            .values()
            .filter(|t| t.parent_id == Some(id))
            .map(|t| t.id)
            .collect()
    }

    pub fn role(&self, id: TableId) -> Result<GroupRole, GroupingError> {
        let table = self.require(id)?;
        if let Some(parent) = table.parent_id {
            return Ok(GroupRole::Child { parent });
        }
        let children = self.children_of(id);
        if children.is_empty() {
            Ok(GroupRole::Standalone)
        } else {
            Ok(GroupRole::Parent { children })
        }
    }

    /// Group root of `id` (the parent for a child, itself otherwise)
    pub fn root_of(&self, id: TableId) -> Result<TableId, GroupingError> {
        Ok(self.require(id)?.parent_id.unwrap_or(id))
    }

    /// Every member of the group containing `id`, ascending
    pub fn group_of(&self, id: TableId) -> Result<BTreeSet<TableId>, GroupingError> {
        let root = self.root_of(id)?;
        let mut members = self.children_of(root);
        members.insert(root);
        Ok(members)
    }

    /// Expand nominated ids to full group membership
    pub fn expand(&self, ids: &[TableId]) -> Result<BTreeSet<TableId>, GroupingError> {
        let mut members = BTreeSet::new();
        for &id in ids {
            members.extend(self.group_of(id)?);
        }
        Ok(members)
    }

    /// Check the one-level tree invariant
    pub fn validate(&self) -> Result<(), GroupingError> {
        for table in self.tables.values() {
            let Some(parent) = table.parent_id else {
                continue;
            };
            if parent == table.id {
                return Err(GroupingError::SelfParent(table.id));
            }
            match self.tables.get(&parent) {
                None => {
                    return Err(GroupingError::MissingParent {
                        child: table.id,
                        parent,
                    });
                }
                Some(p) if p.parent_id.is_some() => {
                    return Err(GroupingError::NestedGroup {
                        child: table.id,
                        parent,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Annotated tables for rendering, ordered by id
    pub fn views(&self) -> Vec<TableView> {
        self.tables
            .values()
            .map(|t| {
                let children = self.children_of(t.id);
                let role = match t.parent_id {
                    Some(parent) => GroupRole::Child { parent },
                    None if children.is_empty() => GroupRole::Standalone,
                    None => GroupRole::Parent { children },
                };
                TableView {
                    table: t.clone(),
                    role,
                    group_id: t.parent_id.unwrap_or(t.id),
                }
            })
            .collect()
    }

    /// Merge the groups of all nominated tables under the lowest id
    ///
    /// Records each member's pre-join position the first time it is joined.
    /// Positions are not changed here.
    pub fn apply_join(&mut self, nominated: &[TableId]) -> Result<AppliedJoin, GroupingError> {
        let distinct: BTreeSet<TableId> = nominated.iter().copied().collect();
        if distinct.len() < 2 {
            return Err(GroupingError::TooFewTables(distinct.len()));
        }
        let ids: Vec<TableId> = distinct.into_iter().collect();
        let members = self.expand(&ids)?;
        let parent_id = *members
            .first()
            .ok_or(GroupingError::TooFewTables(0))?;

        for &id in &members {
            let table = self.require_mut(id)?;
            if table.original_x.is_none() && table.original_y.is_none() {
                table.original_x = Some(table.position_x);
                table.original_y = Some(table.position_y);
            }
            table.parent_id = if id == parent_id { None } else { Some(parent_id) };
        }

        self.validate()?;
        Ok(AppliedJoin {
            parent_id,
            member_ids: members.into_iter().collect(),
        })
    }

    /// Split the group containing `target`
    ///
    /// `remove` of `None`, or one that names the parent, disbands the whole
    /// group. Otherwise only the named children are released. With
    /// `restore_positions` released tables move back to their pre-join
    /// position; their recorded original position is cleared either way.
    pub fn apply_disjoin(
        &mut self,
        target: TableId,
        remove: Option<&[TableId]>,
        restore_positions: bool,
    ) -> Result<AppliedDisjoin, GroupingError> {
        let parent_id = self.root_of(target)?;
        let group = self.group_of(parent_id)?;
        if group.len() <= 1 {
            return Err(GroupingError::NotJoined(target));
        }

        let requested: BTreeSet<TableId> = match remove {
            Some(ids) => {
                for &id in ids {
                    self.require(id)?;
                    if !group.contains(&id) {
                        return Err(GroupingError::NotInGroup {
                            table: id,
                            group: parent_id,
                        });
                    }
                }
                ids.iter().copied().collect()
            }
            None => group.clone(),
        };
        if requested.is_empty() {
            return Err(GroupingError::NotJoined(target));
        }

        let disbanded = requested.contains(&parent_id)
            || group.iter().all(|id| *id == parent_id || requested.contains(id));

        let released: BTreeSet<TableId> = if disbanded {
            group
        } else {
            requested
        };

        for &id in &released {
            let table = self.require_mut(id)?;
            table.parent_id = None;
            if restore_positions {
                if let (Some(x), Some(y)) = (table.original_x, table.original_y) {
                    table.position_x = x;
                    table.position_y = y;
                }
            }
            table.original_x = None;
            table.original_y = None;
        }

        self.validate()?;
        Ok(AppliedDisjoin {
            parent_id,
            released: released.into_iter().collect(),
            disbanded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: TableId, parent: Option<TableId>) -> DiningTable {
        let mut t = DiningTable::new(id, id.to_string(), id as f64 * 10.0, 20.0);
        t.parent_id = parent;
        t
    }

    fn plan() -> FloorPlan {
        // 1 <- 2, 1 <- 3, 4 standalone, 5 <- 6
        FloorPlan::new(vec![
            table(1, None),
            table(2, Some(1)),
            table(3, Some(1)),
            table(4, None),
            table(5, None),
            table(6, Some(5)),
        ])
    }

    #[test]
    fn test_roles() {
        let p = plan();
        assert_eq!(
            p.role(1).unwrap(),
            GroupRole::Parent {
                children: [2, 3].into_iter().collect()
            }
        );
        assert_eq!(p.role(2).unwrap(), GroupRole::Child { parent: 1 });
        assert_eq!(p.role(4).unwrap(), GroupRole::Standalone);
        assert_eq!(p.role(99), Err(GroupingError::UnknownTable(99)));
    }

    #[test]
    fn test_expand_covers_whole_groups() {
        let p = plan();
        let members = p.expand(&[3, 6]).unwrap();
        assert_eq!(members.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 5, 6]);
    }

    #[test]
    fn test_validate_rejects_nested_groups() {
        let p = FloorPlan::new(vec![table(1, None), table(2, Some(1)), table(3, Some(2))]);
        assert_eq!(
            p.validate(),
            Err(GroupingError::NestedGroup {
                child: 3,
                parent: 2
            })
        );

        let p = FloorPlan::new(vec![table(7, Some(7))]);
        assert_eq!(p.validate(), Err(GroupingError::SelfParent(7)));

        let p = FloorPlan::new(vec![table(2, Some(1))]);
        assert!(p.validate().unwrap_err().is_corruption());
    }

    #[test]
    fn test_join_merges_groups_under_lowest_id() {
        let mut p = plan();
        let applied = p.apply_join(&[6, 2]).unwrap();
        assert_eq!(applied.parent_id, 1);
        assert_eq!(applied.member_ids, vec![1, 2, 3, 5, 6]);
        assert_eq!(p.get(5).unwrap().parent_id, Some(1));
        assert_eq!(p.get(6).unwrap().parent_id, Some(1));
        assert_eq!(p.get(1).unwrap().parent_id, None);
        assert_eq!(p.get(4).unwrap().parent_id, None);
        p.validate().unwrap();
    }

    #[test]
    fn test_join_records_original_position_once() {
        let mut p = plan();
        p.apply_join(&[4, 5]).unwrap();
        assert_eq!(p.get(4).unwrap().original_x, Some(40.0));

        p.set_position(4, 77.0, 77.0).unwrap();
        p.apply_join(&[4, 1]).unwrap();
        assert_eq!(p.get(4).unwrap().original_x, Some(40.0));
    }

    #[test]
    fn test_join_requires_two_distinct_tables() {
        let mut p = plan();
        assert_eq!(p.apply_join(&[4, 4]), Err(GroupingError::TooFewTables(1)));
        assert_eq!(p.apply_join(&[]), Err(GroupingError::TooFewTables(0)));
        assert_eq!(p.apply_join(&[4, 42]), Err(GroupingError::UnknownTable(42)));
    }

    #[test]
    fn test_disjoin_whole_group() {
        let mut p = plan();
        let applied = p.apply_disjoin(2, None, false).unwrap();
        assert_eq!(applied.parent_id, 1);
        assert_eq!(applied.released, vec![1, 2, 3]);
        assert!(applied.disbanded);
        assert_eq!(p.role(1).unwrap(), GroupRole::Standalone);
    }

    #[test]
    fn test_disjoin_single_child_keeps_group() {
        let mut p = plan();
        let applied = p.apply_disjoin(1, Some(&[3]), false).unwrap();
        assert_eq!(applied.released, vec![3]);
        assert!(!applied.disbanded);
        assert_eq!(p.get(2).unwrap().parent_id, Some(1));
        assert_eq!(p.get(3).unwrap().parent_id, None);
    }

    #[test]
    fn test_disjoin_parent_disbands() {
        let mut p = plan();
        let applied = p.apply_disjoin(1, Some(&[1]), false).unwrap();
        assert!(applied.disbanded);
        assert!(p.tables().all(|t| t.id == 6 || t.parent_id.is_none()));
    }

    #[test]
    fn test_disjoin_restores_positions_on_request() {
        let mut p = plan();
        p.apply_join(&[4, 5]).unwrap();
        p.set_position(5, 60.0, 60.0).unwrap();

        p.apply_disjoin(4, None, true).unwrap();
        let t = p.get(5).unwrap();
        assert_eq!((t.position_x, t.position_y), (50.0, 20.0));
        assert_eq!(t.original_x, None);
    }

    #[test]
    fn test_disjoin_keeps_positions_by_default() {
        let mut p = plan();
        p.apply_join(&[4, 5]).unwrap();
        p.set_position(5, 60.0, 60.0).unwrap();

        p.apply_disjoin(4, None, false).unwrap();
        assert_eq!(p.get(5).unwrap().position(), (60.0, 60.0));
    }

    #[test]
    fn test_disjoin_errors() {
        let mut p = plan();
        assert_eq!(
            p.apply_disjoin(4, None, false),
            Err(GroupingError::NotJoined(4))
        );
        assert_eq!(
            p.apply_disjoin(1, Some(&[6]), false),
            Err(GroupingError::NotInGroup { table: 6, group: 1 })
        );
    }

    #[test]
    fn test_views_annotate_membership() {
        let views = plan().views();
        let child = views.iter().find(|v| v.table.id == 3).unwrap();
        assert_eq!(child.group_id, 1);
        assert!(child.role.is_grouped());
        let lone = views.iter().find(|v| v.table.id == 4).unwrap();
        assert_eq!(lone.role, GroupRole::Standalone);
    }
}
