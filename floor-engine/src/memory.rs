//! In-memory table store
//!
//! Applies the same grouping rules as the server against a [`FloorPlan`]
//! held behind a mutex. Every mutation works on a copy and swaps it in
//! only on success, so a failed call leaves no partial state.
//!
//! Used by engine tests and for embedding the engine without a server.
//! Calls are recorded and failures can be injected per operation.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::error::ErrorCode;
use shared::models::{
    DiningTable, DisjoinReceipt, DisjoinRequest, ItemId, JoinCommand, JoinReceipt, PositionUpdate,
    TableId,
};

use crate::grouping::{FloorPlan, GroupingError};
use crate::store::{StoreError, StoreResult, TableStore};

/// Store operation, for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListTables,
    UpdatePosition,
    UpdateOccupancy,
    Join,
    Disjoin,
    Transfer,
    SaveLayout,
}

/// Join receipts kept for replay detection; older ones are dropped
pub const MAX_PROCESSED_JOINS: usize = 10_000;

#[derive(Debug, Default)]
struct MemoryState {
    floor: FloorPlan,
    /// Open order lines keyed by owning group root
    orders: BTreeMap<TableId, Vec<ItemId>>,
    processed_joins: HashMap<String, JoinReceipt>,
    /// Operation ids in the order they were applied
    join_log: VecDeque<String>,
    join_receipt_limit: Option<usize>,
    calls: Vec<StoreOp>,
    failing: HashSet<StoreOp>,
}

/// In-memory [`TableStore`]
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<MemoryState>,
}

fn grouping_rejection(err: GroupingError) -> StoreError {
    StoreError::rejected(err.code(), err.to_string())
}

impl MemoryTableStore {
    pub fn new(tables: impl IntoIterator<Item = DiningTable>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                floor: FloorPlan::new(tables),
                ..Default::default()
            }),
        }
    }

    /// Seed an open order owned by `table_id`
    pub fn with_order(self, table_id: TableId, items: Vec<ItemId>) -> Self {
        {
            let mut state = self.state.lock();
            state.orders.insert(table_id, items);
            if let Ok(table) = state.floor.require_mut(table_id) {
                table.is_occupied = true;
            }
        }
        self
    }

    /// Keep at most `limit` join receipts instead of [`MAX_PROCESSED_JOINS`]
    pub fn with_join_receipt_limit(self, limit: usize) -> Self {
        self.state.lock().join_receipt_limit = Some(limit);
        self
    }

    /// Snapshot of all tables, ordered by id
    pub fn tables(&self) -> Vec<DiningTable> {
        self.state.lock().floor.tables().cloned().collect()
    }

    pub fn table(&self, id: TableId) -> Option<DiningTable> {
        self.state.lock().floor.get(id).cloned()
    }

    /// Items of the open order owned by `table_id`
    pub fn order_items(&self, table_id: TableId) -> Vec<ItemId> {
        self.state
            .lock()
            .orders
            .get(&table_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<StoreOp> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Make every subsequent call of `op` fail with a transport error
    pub fn fail_on(&self, op: StoreOp) {
        self.state.lock().failing.insert(op);
    }

    pub fn heal(&self) {
        self.state.lock().failing.clear();
    }

    /// Record the call and apply failure injection
    fn enter(state: &mut MemoryState, op: StoreOp) -> StoreResult<()> {
        state.calls.push(op);
        if state.failing.contains(&op) {
            tracing::debug!(?op, "Injected store failure");
            return Err(StoreError::Transport(format!("{op:?} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn list_tables(&self) -> StoreResult<Vec<DiningTable>> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::ListTables)?;
        Ok(state.floor.tables().cloned().collect())
    }

    async fn update_table_position(
        &self,
        id: TableId,
        x: f64,
        y: f64,
    ) -> StoreResult<DiningTable> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::UpdatePosition)?;
        let table = state.floor.require_mut(id).map_err(grouping_rejection)?;
        table.position_x = x;
        table.position_y = y;
        Ok(table.clone())
    }

    async fn update_table_occupancy(
        &self,
        id: TableId,
        occupied: bool,
    ) -> StoreResult<DiningTable> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::UpdateOccupancy)?;
        let table = state.floor.require_mut(id).map_err(grouping_rejection)?;
        table.is_occupied = occupied;
        Ok(table.clone())
    }

    async fn join_tables(&self, command: &JoinCommand) -> StoreResult<JoinReceipt> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::Join)?;

        if let Some(receipt) = state.processed_joins.get(&command.operation_id) {
            return Ok(JoinReceipt {
                replayed: true,
                ..receipt.clone()
            });
        }

        let mut floor = state.floor.clone();
        let mut orders = state.orders.clone();

        let applied = floor
            .apply_join(&command.table_ids)
            .map_err(grouping_rejection)?;
        for pos in &command.positions {
            floor
                .set_position(pos.id, pos.position_x, pos.position_y)
                .map_err(grouping_rejection)?;
        }

        // Merge member orders into the parent's order
        for &id in &applied.member_ids {
            if id == applied.parent_id {
                continue;
            }
            if let Some(items) = orders.remove(&id) {
                orders.entry(applied.parent_id).or_default().extend(items);
            }
        }

        let any_occupied = applied
            .member_ids
            .iter()
            .any(|id| floor.get(*id).is_some_and(|t| t.is_occupied));
        if any_occupied {
            for &id in &applied.member_ids {
                floor.require_mut(id).map_err(grouping_rejection)?.is_occupied = true;
            }
        }

        let receipt = JoinReceipt {
            operation_id: command.operation_id.clone(),
            parent_id: applied.parent_id,
            member_ids: applied.member_ids,
            replayed: false,
        };
        state.floor = floor;
        state.orders = orders;
        state
            .processed_joins
            .insert(command.operation_id.clone(), receipt.clone());
        state.join_log.push_back(command.operation_id.clone());

        let limit = state.join_receipt_limit.unwrap_or(MAX_PROCESSED_JOINS);
        while state.join_log.len() > limit {
            let Some(oldest) = state.join_log.pop_front() else {
                break;
            };
            state.processed_joins.remove(&oldest);
        }
        Ok(receipt)
    }

    async fn disjoin_group(
        &self,
        table_id: TableId,
        request: &DisjoinRequest,
    ) -> StoreResult<DisjoinReceipt> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::Disjoin)?;

        let mut floor = state.floor.clone();
        let applied = floor
            .apply_disjoin(
                table_id,
                request.remove_table_ids.as_deref(),
                request.restore_positions,
            )
            .map_err(grouping_rejection)?;

        for &id in &applied.released {
            if !state.orders.contains_key(&id) {
                floor.require_mut(id).map_err(grouping_rejection)?.is_occupied = false;
            }
        }

        state.floor = floor;
        Ok(DisjoinReceipt {
            parent_id: applied.parent_id,
            released: applied.released,
            disbanded: applied.disbanded,
        })
    }

    async fn transfer_order_items(
        &self,
        source: TableId,
        destination: TableId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::Transfer)?;

        let source_root = state.floor.root_of(source).map_err(grouping_rejection)?;
        let dest_root = state
            .floor
            .root_of(destination)
            .map_err(grouping_rejection)?;
        if source_root == dest_root {
            return Err(StoreError::rejected(
                ErrorCode::TransferDestinationInvalid,
                "Destination belongs to the source group",
            ));
        }

        let mut floor = state.floor.clone();
        let mut orders = state.orders.clone();

        let source_items = orders.get_mut(&source_root).ok_or_else(|| {
            StoreError::rejected(
                ErrorCode::OrderNotFound,
                format!("No open order for table {source}"),
            )
        })?;
        if let Some(missing) = item_ids.iter().find(|id| !source_items.contains(*id)) {
            return Err(StoreError::rejected(
                ErrorCode::OrderItemNotFound,
                format!("Item {missing} not in order of table {source}"),
            ));
        }
        source_items.retain(|id| !item_ids.contains(id));
        let source_empty = source_items.is_empty();
        if source_empty {
            orders.remove(&source_root);
        }
        orders
            .entry(dest_root)
            .or_default()
            .extend(item_ids.iter().copied());

        let source_group = floor.group_of(source_root).map_err(grouping_rejection)?;
        let dest_group = floor.group_of(dest_root).map_err(grouping_rejection)?;
        for id in dest_group {
            floor.require_mut(id).map_err(grouping_rejection)?.is_occupied = true;
        }
        if source_empty {
            for id in source_group {
                floor.require_mut(id).map_err(grouping_rejection)?.is_occupied = false;
            }
        }

        state.floor = floor;
        state.orders = orders;
        Ok(())
    }

    async fn save_layout(&self, positions: &[PositionUpdate]) -> StoreResult<Vec<DiningTable>> {
        let mut state = self.state.lock();
        Self::enter(&mut state, StoreOp::SaveLayout)?;

        let mut floor = state.floor.clone();
        let mut updated = Vec::with_capacity(positions.len());
        for pos in positions {
            floor
                .set_position(pos.id, pos.position_x, pos.position_y)
                .map_err(grouping_rejection)?;
            if let Some(t) = floor.get(pos.id) {
                updated.push(t.clone());
            }
        }
        state.floor = floor;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryTableStore {
        MemoryTableStore::new(vec![
            DiningTable::new(1, "1", 10.0, 10.0),
            DiningTable::new(2, "2", 40.0, 10.0),
            DiningTable::new(3, "3", 70.0, 10.0),
        ])
    }

    fn join(op: &str, ids: Vec<TableId>) -> JoinCommand {
        JoinCommand {
            operation_id: op.to_string(),
            table_ids: ids,
            positions: vec![PositionUpdate::new(2, 20.0, 10.0)],
        }
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let store = store();
        let first = store.join_tables(&join("op-1", vec![1, 2])).await.unwrap();
        assert!(!first.replayed);
        assert_eq!(first.parent_id, 1);

        store.update_table_position(2, 55.0, 55.0).await.unwrap();
        let again = store.join_tables(&join("op-1", vec![1, 2])).await.unwrap();
        assert!(again.replayed);
        assert_eq!(store.table(2).unwrap().position(), (55.0, 55.0));
    }

    #[tokio::test]
    async fn test_old_join_receipts_are_dropped() {
        let store = MemoryTableStore::new([
            DiningTable::new(1, "1", 10.0, 10.0),
            DiningTable::new(2, "2", 40.0, 10.0),
            DiningTable::new(3, "3", 70.0, 10.0),
        ])
        .with_join_receipt_limit(1);

        store.join_tables(&join("op-1", vec![1, 2])).await.unwrap();
        store.disjoin_group(1, &DisjoinRequest::whole()).await.unwrap();
        store.join_tables(&join("op-2", vec![1, 3])).await.unwrap();
        store.disjoin_group(1, &DisjoinRequest::whole()).await.unwrap();

        // op-1 fell out of the window, so it applies again
        let replay = store.join_tables(&join("op-1", vec![1, 2])).await.unwrap();
        assert!(!replay.replayed);
        assert_eq!(store.table(2).unwrap().parent_id, Some(1));

        let replay = store.join_tables(&join("op-1", vec![1, 2])).await.unwrap();
        assert!(replay.replayed);
    }

    #[tokio::test]
    async fn test_join_is_atomic() {
        let store = store();
        let mut command = join("op-2", vec![1, 2]);
        command.positions.push(PositionUpdate::new(99, 0.0, 0.0));

        let err = store.join_tables(&command).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TableNotFound));
        assert_eq!(store.table(2).unwrap().parent_id, None);
        assert_eq!(store.table(2).unwrap().position(), (40.0, 10.0));
    }

    #[tokio::test]
    async fn test_join_merges_orders_and_occupancy() {
        let store = store().with_order(2, vec![100, 101]);
        store.join_tables(&join("op-3", vec![1, 2])).await.unwrap();

        assert_eq!(store.order_items(1), vec![100, 101]);
        assert!(store.order_items(2).is_empty());
        assert!(store.table(1).unwrap().is_occupied);
        assert!(store.table(2).unwrap().is_occupied);
    }

    #[tokio::test]
    async fn test_disjoin_clears_occupancy_of_released() {
        let store = store().with_order(1, vec![7]);
        store.join_tables(&join("op-4", vec![1, 2])).await.unwrap();

        let receipt = store
            .disjoin_group(2, &DisjoinRequest::whole())
            .await
            .unwrap();
        assert!(receipt.disbanded);
        assert!(store.table(1).unwrap().is_occupied);
        assert!(!store.table(2).unwrap().is_occupied);
    }

    #[tokio::test]
    async fn test_transfer_empties_source() {
        let store = store().with_order(1, vec![7, 8]);
        store.transfer_order_items(1, 3, &[7, 8]).await.unwrap();

        assert_eq!(store.order_items(3), vec![7, 8]);
        assert!(!store.table(1).unwrap().is_occupied);
        assert!(store.table(3).unwrap().is_occupied);
    }

    #[tokio::test]
    async fn test_transfer_rejects_unknown_item() {
        let store = store().with_order(1, vec![7]);
        let err = store.transfer_order_items(1, 3, &[8]).await.unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OrderItemNotFound));
        assert_eq!(store.order_items(1), vec![7]);
    }

    #[tokio::test]
    async fn test_failure_injection_and_recording() {
        let store = store();
        store.fail_on(StoreOp::ListTables);
        assert!(matches!(
            store.list_tables().await,
            Err(StoreError::Transport(_))
        ));
        store.heal();
        assert_eq!(store.list_tables().await.unwrap().len(), 3);
        assert_eq!(store.calls(), vec![StoreOp::ListTables, StoreOp::ListTables]);
    }
}
