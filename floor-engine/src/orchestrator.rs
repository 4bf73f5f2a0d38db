//! Join / disjoin orchestration
//!
//! Validates against the caller's working copy, computes the layout,
//! commits through the store and re-fetches. Inputs are explicit: the
//! working copy, the nominated tables and the canvas, never ambient state.

use shared::models::{
    DiningTable, DisjoinReceipt, DisjoinRequest, JoinReceipt, PositionUpdate, TableId,
};

use crate::config::LayoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::grouping::FloorPlan;
use crate::layout::{ArrangeOrder, JoinPlan, auto_arrange, plan_join};
use crate::spatial::{Canvas, Point};
use crate::store::{StoreError, TableStore};
use crate::transfer::BillTransfer;

/// Attempts per join command; retries reuse the operation id
pub const JOIN_ATTEMPTS: usize = 2;

/// Committed join and the refreshed floor
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub plan: JoinPlan,
    pub receipt: JoinReceipt,
    pub floor: FloorPlan,
}

/// Committed disjoin and the refreshed floor
#[derive(Debug, Clone)]
pub struct DisjoinOutcome {
    pub receipt: DisjoinReceipt,
    pub floor: FloorPlan,
}

/// Join orchestrator (拼桌编排)
pub struct JoinOrchestrator<S> {
    store: S,
    config: LayoutConfig,
}

impl<S: TableStore> JoinOrchestrator<S> {
    pub fn new(store: S, config: LayoutConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Fetch every table and validate the grouping invariant
    pub async fn refresh(&self) -> EngineResult<FloorPlan> {
        let tables = self.store.list_tables().await?;
        Ok(FloorPlan::checked(tables)?)
    }

    /// Join the nominated tables (and every member of their groups)
    pub async fn join(
        &self,
        floor: &FloorPlan,
        nominated: &[TableId],
        canvas: Option<Canvas>,
    ) -> EngineResult<JoinOutcome> {
        // 1. At least two distinct tables
        let mut distinct = nominated.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(EngineError::validation(
                "Select at least 2 tables to join",
            ));
        }

        // 2. Canvas must be measured
        let canvas = canvas.ok_or(EngineError::LayoutNotReady)?;

        // 3. Compute layout against the working copy
        let plan = plan_join(floor, &distinct, canvas.footprint(&self.config))?;
        let command = plan.command();

        // 4. Commit; the operation id makes a retry safe
        let mut attempt = 1;
        let receipt = loop {
            match self.store.join_tables(&command).await {
                Ok(receipt) => break receipt,
                Err(StoreError::Transport(msg)) if attempt < JOIN_ATTEMPTS => {
                    tracing::warn!(
                        operation_id = %command.operation_id,
                        attempt,
                        "Join commit failed in transit, retrying: {}",
                        msg
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(
            operation_id = %receipt.operation_id,
            parent_id = receipt.parent_id,
            members = ?receipt.member_ids,
            shifted = plan.shifted.len(),
            replayed = receipt.replayed,
            "Tables joined"
        );

        // 5. Re-fetch and check the invariant
        let floor = self.refresh().await?;
        Ok(JoinOutcome {
            plan,
            receipt,
            floor,
        })
    }

    /// Split the group containing `target`
    pub async fn disjoin(
        &self,
        floor: &FloorPlan,
        target: TableId,
        request: &DisjoinRequest,
    ) -> EngineResult<DisjoinOutcome> {
        let group = floor.group_of(target)?;
        if group.len() <= 1 {
            return Err(EngineError::validation(format!(
                "Table {target} is not part of a group"
            )));
        }
        if let Some(ids) = &request.remove_table_ids {
            if ids.is_empty() {
                return Err(EngineError::validation("No tables selected to remove"));
            }
            if let Some(outsider) = ids.iter().find(|id| !group.contains(*id)) {
                return Err(EngineError::validation(format!(
                    "Table {outsider} is not a member of this group"
                )));
            }
        }

        let receipt = self.store.disjoin_group(target, request).await?;
        tracing::info!(
            parent_id = receipt.parent_id,
            released = ?receipt.released,
            disbanded = receipt.disbanded,
            "Group split"
        );

        let floor = self.refresh().await?;
        Ok(DisjoinOutcome { receipt, floor })
    }

    /// Persist a plain move of one table; grouping is not affected
    pub async fn move_table(
        &self,
        floor: &FloorPlan,
        id: TableId,
        to: Point,
    ) -> EngineResult<DiningTable> {
        floor.require(id)?;
        let table = self.store.update_table_position(id, to.x, to.y).await?;
        tracing::debug!(table_id = id, x = to.x, y = to.y, "Table moved");
        Ok(table)
    }

    pub async fn set_occupancy(&self, id: TableId, occupied: bool) -> EngineResult<DiningTable> {
        Ok(self.store.update_table_occupancy(id, occupied).await?)
    }

    /// Bulk-save positions and re-fetch
    pub async fn save_layout(&self, positions: &[PositionUpdate]) -> EngineResult<FloorPlan> {
        if positions.is_empty() {
            return self.refresh().await;
        }
        self.store.save_layout(positions).await?;
        tracing::info!(count = positions.len(), "Layout saved");
        self.refresh().await
    }

    /// Grid-arrange every table by number and persist
    pub async fn arrange(&self, floor: &FloorPlan, order: ArrangeOrder) -> EngineResult<FloorPlan> {
        let positions = auto_arrange(floor, order);
        self.save_layout(&positions).await
    }

    /// Transfer order lines and re-fetch (occupancy may change)
    pub async fn transfer(&self, floor: &FloorPlan, transfer: &BillTransfer) -> EngineResult<FloorPlan> {
        transfer.execute(floor, &self.store).await?;
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::{MemoryTableStore, StoreOp};

    fn tables() -> Vec<DiningTable> {
        vec![
            DiningTable::new(1, "1", 10.0, 30.0),
            DiningTable::new(2, "2", 60.0, 70.0),
            DiningTable::new(3, "3", 80.0, 10.0),
            // sits in the row right of table 1
            DiningTable::new(4, "4", 25.0, 32.0),
        ]
    }

    fn setup() -> (Arc<MemoryTableStore>, JoinOrchestrator<Arc<MemoryTableStore>>) {
        let store = Arc::new(MemoryTableStore::new(tables()));
        let orchestrator = JoinOrchestrator::new(store.clone(), LayoutConfig::default());
        (store, orchestrator)
    }

    fn canvas() -> Option<Canvas> {
        // 960 px wide: one card is 10%
        Canvas::new(960.0, 800.0)
    }

    #[tokio::test]
    async fn test_join_commits_layout_and_refreshes() {
        let (store, orch) = setup();
        let floor = orch.refresh().await.unwrap();

        let outcome = orch.join(&floor, &[2, 1], canvas()).await.unwrap();
        assert_eq!(outcome.receipt.parent_id, 1);

        let child = outcome.floor.get(2).unwrap();
        assert_eq!(child.parent_id, Some(1));
        assert!((child.position_x - 20.0).abs() < 1e-9);
        assert_eq!(child.position_y, 30.0);

        // Table 4 was inside the span and shifted by one card width
        let shifted = outcome.floor.get(4).unwrap();
        assert!((shifted.position_x - 35.0).abs() < 1e-9);
        assert_eq!(shifted.parent_id, None);

        assert_eq!(
            store.calls(),
            vec![StoreOp::ListTables, StoreOp::Join, StoreOp::ListTables]
        );
    }

    #[tokio::test]
    async fn test_join_validation_makes_no_store_call() {
        let (store, orch) = setup();
        let floor = FloorPlan::new(tables());

        let err = orch.join(&floor, &[1], canvas()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = orch.join(&floor, &[1, 2], None).await.unwrap_err();
        assert!(matches!(err, EngineError::LayoutNotReady));

        let err = orch.join(&floor, &[1, 42], canvas()).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_retries_with_same_operation_id() {
        let (store, orch) = setup();
        let floor = FloorPlan::new(tables());
        store.fail_on(StoreOp::Join);

        let err = orch.join(&floor, &[1, 2], canvas()).await.unwrap_err();
        assert!(err.needs_resync());
        assert_eq!(store.calls(), vec![StoreOp::Join, StoreOp::Join]);
        // Nothing applied
        assert_eq!(store.table(2).unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn test_join_into_existing_group() {
        let (_store, orch) = setup();
        let floor = orch.refresh().await.unwrap();
        let floor = orch.join(&floor, &[1, 2], canvas()).await.unwrap().floor;

        let outcome = orch.join(&floor, &[3, 2], canvas()).await.unwrap();
        assert_eq!(outcome.receipt.member_ids, vec![1, 2, 3]);
        assert_eq!(outcome.floor.get(3).unwrap().parent_id, Some(1));
        assert!((outcome.floor.get(3).unwrap().position_x - 30.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_disjoin_member_and_whole() {
        let (_store, orch) = setup();
        let floor = orch.refresh().await.unwrap();
        let floor = orch.join(&floor, &[1, 2, 3], canvas()).await.unwrap().floor;

        let outcome = orch
            .disjoin(&floor, 1, &DisjoinRequest::members(vec![3]))
            .await
            .unwrap();
        assert!(!outcome.receipt.disbanded);
        assert_eq!(outcome.floor.get(3).unwrap().parent_id, None);
        assert_eq!(outcome.floor.get(2).unwrap().parent_id, Some(1));

        let outcome = orch
            .disjoin(&outcome.floor, 2, &DisjoinRequest::whole().with_restore_positions(true))
            .await
            .unwrap();
        assert!(outcome.receipt.disbanded);
        assert_eq!(outcome.floor.get(2).unwrap().position(), (60.0, 70.0));
    }

    #[tokio::test]
    async fn test_disjoin_standalone_is_rejected_locally() {
        let (store, orch) = setup();
        let floor = FloorPlan::new(tables());
        let err = orch
            .disjoin(&floor, 3, &DisjoinRequest::whole())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejects_corrupt_tree() {
        let mut a = DiningTable::new(1, "1", 0.0, 0.0);
        a.parent_id = Some(2);
        let mut b = DiningTable::new(2, "2", 0.0, 0.0);
        b.parent_id = Some(3);
        let store = MemoryTableStore::new(vec![a, b, DiningTable::new(3, "3", 0.0, 0.0)]);
        let orch = JoinOrchestrator::new(store, LayoutConfig::default());
        assert!(matches!(
            orch.refresh().await,
            Err(EngineError::Invariant(_))
        ));
    }
}
