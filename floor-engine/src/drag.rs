//! Drop-to-join detection
//!
//! A drag reports provisional positions until release. On release the
//! dragged table is compared with every other table; a proximity match
//! turns the drop into a join prompt instead of a plain move.

use serde::Serialize;
use shared::models::{PositionUpdate, TableId};

use crate::config::LayoutConfig;
use crate::error::{EngineError, EngineResult};
use crate::grouping::FloorPlan;
use crate::spatial::{Canvas, Point};

/// In-progress drag of one table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    table_id: TableId,
    origin: Point,
    current: Point,
}

impl DragSession {
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Position when the drag started
    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Latest clamped provisional position
    pub fn current(&self) -> Point {
        self.current
    }
}

/// Join confirmation request raised by a drop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinPrompt {
    pub dragged: TableId,
    pub target: TableId,
    pub dropped_at: Point,
}

impl JoinPrompt {
    /// Ids to join on confirmation, exactly the two tables
    pub fn join_ids(&self) -> [TableId; 2] {
        [self.dragged, self.target]
    }

    /// Plain move committed on rejection
    pub fn as_move(&self) -> PositionUpdate {
        PositionUpdate::new(self.dragged, self.dropped_at.x, self.dropped_at.y)
    }
}

/// What a released drag resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Move(PositionUpdate),
    ConfirmJoin(JoinPrompt),
}

/// Drop-to-join detector (拖拽拼桌)
#[derive(Debug, Clone, Copy)]
pub struct DropDetector {
    config: LayoutConfig,
}

impl DropDetector {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn begin(&self, floor: &FloorPlan, table_id: TableId) -> EngineResult<DragSession> {
        let origin = Point::of(floor.require(table_id)?);
        Ok(DragSession {
            table_id,
            origin,
            current: origin,
        })
    }

    /// Report an absolute provisional position (percent)
    pub fn drag_to(
        &self,
        session: &mut DragSession,
        point: Point,
        canvas: Option<Canvas>,
    ) -> EngineResult<Point> {
        let canvas = canvas.ok_or(EngineError::LayoutNotReady)?;
        session.current = canvas.clamp(point, &self.config);
        Ok(session.current)
    }

    /// Report the pixel offset from where the drag started
    pub fn drag_by(
        &self,
        session: &mut DragSession,
        dx_px: f64,
        dy_px: f64,
        canvas: Option<Canvas>,
    ) -> EngineResult<Point> {
        let canvas = canvas.ok_or(EngineError::LayoutNotReady)?;
        let (dx, dy) = canvas.delta_to_pct(dx_px, dy_px);
        let point = Point::new(session.origin.x + dx, session.origin.y + dy);
        session.current = canvas.clamp(point, &self.config);
        Ok(session.current)
    }

    /// Closest other table within the proximity threshold
    pub fn nearest_target(&self, floor: &FloorPlan, dragged: TableId, at: Point) -> Option<TableId> {
        floor
            .tables()
            .filter(|t| t.id != dragged)
            .map(|t| (t.id, Point::of(t)))
            .filter(|(_, p)| at.is_close_to(p, self.config.proximity_pct))
            .min_by(|(_, a), (_, b)| at.distance_sq(a).total_cmp(&at.distance_sq(b)))
            .map(|(id, _)| id)
    }

    /// Resolve the drag; the session ends here
    pub fn release(&self, floor: &FloorPlan, session: DragSession) -> DropOutcome {
        let at = session.current;
        match self.nearest_target(floor, session.table_id, at) {
            Some(target) => {
                tracing::debug!(dragged = session.table_id, target, "Drop near another table");
                DropOutcome::ConfirmJoin(JoinPrompt {
                    dragged: session.table_id,
                    target,
                    dropped_at: at,
                })
            }
            None => DropOutcome::Move(PositionUpdate::new(session.table_id, at.x, at.y)),
        }
    }
}
