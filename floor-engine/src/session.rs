//! Floor-plan session
//!
//! What the UI layer talks to. Owns the working copy, the selection, the
//! measured canvas and the drag state, and turns every mutating action into
//! a notification. Any remote failure triggers a full re-fetch so the
//! working copy never drifts from the store.

use serde::Serialize;
use shared::models::{DisjoinReceipt, DisjoinRequest, JoinReceipt, TableId};

use crate::config::LayoutConfig;
use crate::drag::{DragSession, DropDetector, DropOutcome, JoinPrompt};
use crate::error::{EngineError, EngineResult};
use crate::grouping::{FloorPlan, TableView};
use crate::layout::ArrangeOrder;
use crate::orchestrator::JoinOrchestrator;
use crate::selection::Selection;
use crate::spatial::{Canvas, Point};
use crate::store::TableStore;
use crate::transfer::BillTransfer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// User-facing outcome of a mutating action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

pub struct FloorSession<S> {
    orchestrator: JoinOrchestrator<S>,
    detector: DropDetector,
    floor: FloorPlan,
    selection: Selection,
    canvas: Option<Canvas>,
    drag: Option<DragSession>,
    pending_join: Option<JoinPrompt>,
    notifications: Vec<Notification>,
}

impl<S: TableStore> FloorSession<S> {
    pub fn new(store: S, config: LayoutConfig) -> Self {
        Self {
            orchestrator: JoinOrchestrator::new(store, config),
            detector: DropDetector::new(config),
            floor: FloorPlan::default(),
            selection: Selection::new(),
            canvas: None,
            drag: None,
            pending_join: None,
            notifications: Vec::new(),
        }
    }

    /// Initial fetch
    pub async fn load(&mut self) -> EngineResult<()> {
        let floor = self.orchestrator.refresh().await?;
        self.replace_floor(floor);
        Ok(())
    }

    pub fn store(&self) -> &S {
        self.orchestrator.store()
    }

    /// Record measured canvas size; returns whether the layout is ready
    pub fn set_canvas(&mut self, width_px: f64, height_px: f64) -> bool {
        self.canvas = Canvas::new(width_px, height_px);
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<Canvas> {
        self.canvas
    }

    pub fn floor(&self) -> &FloorPlan {
        &self.floor
    }

    /// Tables annotated with derived group membership
    pub fn views(&self) -> Vec<TableView> {
        self.floor.views()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn toggle_selection(&mut self, id: TableId) -> bool {
        self.selection.toggle(id)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn pending_join(&self) -> Option<&JoinPrompt> {
        self.pending_join.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Drain notifications raised since the last call
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Join the current selection; clears it on success
    pub async fn join_selected(&mut self) -> EngineResult<JoinReceipt> {
        let ids = self.selection.ids();
        let receipt = self.join(&ids).await?;
        self.selection.clear();
        Ok(receipt)
    }

    pub async fn join(&mut self, ids: &[TableId]) -> EngineResult<JoinReceipt> {
        let result = self.orchestrator.join(&self.floor, ids, self.canvas).await;
        let outcome = self.settle("Join", result).await?;
        let receipt = outcome.receipt.clone();
        self.replace_floor(outcome.floor);
        self.notify(
            NoticeLevel::Success,
            format!("Joined {} tables", receipt.member_ids.len()),
        );
        Ok(receipt)
    }

    pub async fn disjoin(
        &mut self,
        target: TableId,
        request: &DisjoinRequest,
    ) -> EngineResult<DisjoinReceipt> {
        let result = self.orchestrator.disjoin(&self.floor, target, request).await;
        let outcome = self.settle("Split", result).await?;
        let receipt = outcome.receipt.clone();
        self.replace_floor(outcome.floor);
        let message = if receipt.disbanded {
            "Group disbanded".to_string()
        } else {
            format!("Released {} tables", receipt.released.len())
        };
        self.notify(NoticeLevel::Success, message);
        Ok(receipt)
    }

    pub fn begin_drag(&mut self, id: TableId) -> EngineResult<()> {
        self.drag = Some(self.detector.begin(&self.floor, id)?);
        Ok(())
    }

    pub fn drag_to(&mut self, point: Point) -> EngineResult<Point> {
        let (canvas, detector) = (self.canvas, self.detector);
        let session = self.active_drag()?;
        detector.drag_to(session, point, canvas)
    }

    pub fn drag_by(&mut self, dx_px: f64, dy_px: f64) -> EngineResult<Point> {
        let (canvas, detector) = (self.canvas, self.detector);
        let session = self.active_drag()?;
        detector.drag_by(session, dx_px, dy_px, canvas)
    }

    /// End the drag: either commit a plain move or raise a join prompt
    pub async fn release_drag(&mut self) -> EngineResult<DropOutcome> {
        let session = self
            .drag
            .take()
            .ok_or_else(|| EngineError::validation("No drag in progress"))?;
        let outcome = self.detector.release(&self.floor, session);
        match outcome {
            DropOutcome::Move(update) => {
                self.commit_move(update.id, Point::new(update.position_x, update.position_y))
                    .await?;
            }
            DropOutcome::ConfirmJoin(prompt) => {
                self.pending_join = Some(prompt);
            }
        }
        Ok(outcome)
    }

    /// Join exactly the dragged table and its drop target
    pub async fn confirm_join(&mut self) -> EngineResult<JoinReceipt> {
        let prompt = self
            .pending_join
            .take()
            .ok_or_else(|| EngineError::validation("No join awaiting confirmation"))?;
        self.join(&prompt.join_ids()).await
    }

    /// Decline the prompt; the dragged table moves to where it was dropped
    pub async fn reject_join(&mut self) -> EngineResult<()> {
        let prompt = self
            .pending_join
            .take()
            .ok_or_else(|| EngineError::validation("No join awaiting confirmation"))?;
        self.commit_move(prompt.dragged, prompt.dropped_at).await
    }

    pub async fn transfer(&mut self, transfer: &BillTransfer) -> EngineResult<()> {
        let result = self.orchestrator.transfer(&self.floor, transfer).await;
        let floor = self.settle("Transfer", result).await?;
        self.replace_floor(floor);
        self.notify(
            NoticeLevel::Success,
            format!("Moved {} items", transfer.item_ids().len()),
        );
        Ok(())
    }

    pub async fn arrange(&mut self, order: ArrangeOrder) -> EngineResult<()> {
        let result = self.orchestrator.arrange(&self.floor, order).await;
        let floor = self.settle("Arrange", result).await?;
        self.replace_floor(floor);
        self.notify(NoticeLevel::Success, "Layout arranged");
        Ok(())
    }

    pub async fn set_occupancy(&mut self, id: TableId, occupied: bool) -> EngineResult<()> {
        let result = self.orchestrator.set_occupancy(id, occupied).await;
        let table = self.settle("Occupancy update", result).await?;
        self.floor.upsert(table);
        Ok(())
    }

    async fn commit_move(&mut self, id: TableId, to: Point) -> EngineResult<()> {
        let result = self.orchestrator.move_table(&self.floor, id, to).await;
        let table = self.settle("Move", result).await?;
        self.floor.upsert(table);
        Ok(())
    }

    fn active_drag(&mut self) -> EngineResult<&mut DragSession> {
        self.drag
            .as_mut()
            .ok_or_else(|| EngineError::validation("No drag in progress"))
    }

    /// Notify on failure and re-fetch when the working copy may be stale
    async fn settle<T>(&mut self, action: &str, result: EngineResult<T>) -> EngineResult<T> {
        let err = match result {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        tracing::warn!(action, error = %err, "Floor-plan action failed");
        self.notify(NoticeLevel::Failure, format!("{action} failed: {err}"));
        if err.needs_resync() {
            match self.orchestrator.refresh().await {
                Ok(floor) => self.replace_floor(floor),
                Err(e) => tracing::error!(error = %e, "Re-fetch after failure failed"),
            }
        }
        Err(err)
    }

    fn replace_floor(&mut self, floor: FloorPlan) {
        self.selection.retain(|id| floor.contains(id));
        self.floor = floor;
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notifications.push(Notification {
            level,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::{MemoryTableStore, StoreOp};
    use shared::models::DiningTable;

    async fn session() -> (Arc<MemoryTableStore>, FloorSession<Arc<MemoryTableStore>>) {
        let store = Arc::new(MemoryTableStore::new(vec![
            DiningTable::new(1, "1", 10.0, 10.0),
            DiningTable::new(2, "2", 50.0, 50.0),
            DiningTable::new(3, "3", 80.0, 80.0),
        ]));
        let mut session = FloorSession::new(store.clone(), LayoutConfig::default());
        session.load().await.unwrap();
        session.set_canvas(1000.0, 1000.0);
        store.clear_calls();
        (store, session)
    }

    #[tokio::test]
    async fn test_join_selected_clears_selection() {
        let (_store, mut session) = session().await;
        session.toggle_selection(3);
        session.toggle_selection(2);

        let receipt = session.join_selected().await.unwrap();
        assert_eq!(receipt.parent_id, 2);
        assert!(session.selection().is_empty());
        assert_eq!(session.floor().get(3).unwrap().parent_id, Some(2));

        let notes = session.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NoticeLevel::Success);
        assert!(session.take_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_join_before_canvas_is_measured() {
        let (store, mut session) = session().await;
        session.set_canvas(0.0, 0.0);
        let err = session.join(&[1, 2]).await.unwrap_err();
        assert!(matches!(err, EngineError::LayoutNotReady));
        assert!(store.calls().is_empty());
        assert_eq!(session.take_notifications()[0].level, NoticeLevel::Failure);
    }

    #[tokio::test]
    async fn test_drop_confirm_joins_pair() {
        let (store, mut session) = session().await;
        session.begin_drag(1).unwrap();
        session.drag_to(Point::new(52.0, 48.0)).unwrap();

        let outcome = session.release_drag().await.unwrap();
        assert!(matches!(outcome, DropOutcome::ConfirmJoin(_)));
        // Drop position not committed while the prompt is open
        assert_eq!(session.floor().get(1).unwrap().position(), (10.0, 10.0));

        let receipt = session.confirm_join().await.unwrap();
        assert_eq!(receipt.member_ids, vec![1, 2]);
        assert!(session.pending_join().is_none());

        // Same result as joining the pair explicitly on an untouched floor
        let (manual_store, mut manual) = self::session().await;
        let manual_receipt = manual.join(&[1, 2]).await.unwrap();
        assert_eq!(receipt.parent_id, manual_receipt.parent_id);
        for id in [1, 2, 3] {
            let dropped = session.floor().get(id).unwrap();
            let joined = manual.floor().get(id).unwrap();
            assert_eq!(dropped.parent_id, joined.parent_id, "parent of table {id}");
            assert_eq!(dropped.position(), joined.position(), "position of table {id}");
        }
        assert_eq!(store.tables(), manual_store.tables());
    }

    #[tokio::test]
    async fn test_drop_reject_moves_to_drop_point() {
        let (store, mut session) = session().await;
        session.begin_drag(1).unwrap();
        session.drag_to(Point::new(52.0, 48.0)).unwrap();
        session.release_drag().await.unwrap();

        session.reject_join().await.unwrap();
        assert_eq!(store.table(1).unwrap().position(), (52.0, 48.0));
        assert_eq!(store.table(1).unwrap().parent_id, None);
        assert_eq!(store.table(2).unwrap().position(), (50.0, 50.0));
        assert_eq!(store.calls(), vec![StoreOp::UpdatePosition]);
    }

    #[tokio::test]
    async fn test_failed_move_resyncs() {
        let (store, mut session) = session().await;
        store.fail_on(StoreOp::UpdatePosition);
        session.begin_drag(3).unwrap();
        session.drag_to(Point::new(30.0, 70.0)).unwrap();

        assert!(session.release_drag().await.is_err());
        assert_eq!(
            store.calls(),
            vec![StoreOp::UpdatePosition, StoreOp::ListTables]
        );
        assert_eq!(session.floor().get(3).unwrap().position(), (80.0, 80.0));
        assert_eq!(session.take_notifications()[0].level, NoticeLevel::Failure);
    }

    #[tokio::test]
    async fn test_release_without_drag() {
        let (_store, mut session) = session().await;
        assert!(matches!(
            session.release_drag().await,
            Err(EngineError::Validation(_))
        ));
        assert!(session.confirm_join().await.is_err());
    }

    #[tokio::test]
    async fn test_disjoin_notifies() {
        let (_store, mut session) = session().await;
        session.join(&[1, 2]).await.unwrap();
        session.take_notifications();

        let receipt = session
            .disjoin(2, &DisjoinRequest::whole())
            .await
            .unwrap();
        assert!(receipt.disbanded);
        assert!(session.views().iter().all(|v| !v.role.is_grouped()));
        assert_eq!(
            session.take_notifications()[0].message,
            "Group disbanded"
        );
    }

    #[tokio::test]
    async fn test_arrange_persists_grid() {
        let (_store, mut session) = session().await;
        session.arrange(ArrangeOrder::Descending).await.unwrap();
        assert_eq!(session.floor().get(3).unwrap().position(), (5.0, 5.0));
        assert_eq!(session.floor().get(1).unwrap().position(), (35.0, 5.0));
    }
}
