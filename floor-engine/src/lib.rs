//! Floor Engine - 桌台拼桌与平面图布局引擎
//!
//! Keeps table identity, parent/child grouping and percentage positions on
//! a floor-plan canvas consistent while staff join, split, drag and
//! re-arrange tables.
//!
//! # 模块结构
//!
//! ```text
//! floor-engine/src/
//! ├── config.rs        # LayoutConfig (card size, proximity threshold)
//! ├── spatial.rs       # Percent coordinates, canvas, clamping, proximity
//! ├── grouping.rs      # FloorPlan, GroupRole, join/disjoin rules
//! ├── layout.rs        # Join layout and auto-arrange
//! ├── orchestrator.rs  # Validate → plan → commit → re-fetch
//! ├── drag.rs          # Drop-to-join detection
//! ├── transfer.rs      # Bill transfer between groups
//! ├── selection.rs     # Multi-select
//! ├── session.rs       # UI-facing façade with notifications
//! ├── store.rs         # TableStore trait
//! └── memory.rs        # In-memory TableStore
//! ```
//!
//! # Example
//!
//! ```
//! use floor_engine::{FloorPlan, LayoutConfig, Canvas, plan_join};
//! use shared::models::DiningTable;
//!
//! let floor = FloorPlan::new(vec![
//!     DiningTable::new(1, "1", 10.0, 10.0),
//!     DiningTable::new(2, "2", 60.0, 60.0),
//! ]);
//! let canvas = Canvas::new(960.0, 720.0).unwrap();
//! let plan = plan_join(&floor, &[2, 1], canvas.footprint(&LayoutConfig::default())).unwrap();
//! assert_eq!(plan.parent_id, 1);
//! assert_eq!(plan.placements[0].position_y, 10.0);
//! ```

pub mod config;
pub mod drag;
pub mod error;
pub mod grouping;
pub mod layout;
pub mod memory;
pub mod orchestrator;
pub mod selection;
pub mod session;
pub mod spatial;
pub mod store;
pub mod transfer;

pub use config::LayoutConfig;
pub use drag::{DragSession, DropDetector, DropOutcome, JoinPrompt};
pub use error::{EngineError, EngineResult};
pub use grouping::{FloorPlan, GroupRole, GroupingError, TableView};
pub use layout::{ArrangeOrder, JoinPlan, auto_arrange, plan_join};
pub use memory::{MemoryTableStore, StoreOp};
pub use orchestrator::{DisjoinOutcome, JoinOrchestrator, JoinOutcome};
pub use selection::Selection;
pub use session::{FloorSession, NoticeLevel, Notification};
pub use spatial::{Canvas, CardFootprint, Point};
pub use store::{StoreError, StoreResult, TableStore};
pub use transfer::BillTransfer;
