//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Table identifier (assigned by the store, immutable)
pub type TableId = i64;

/// Default seat count for new tables
pub const DEFAULT_CAPACITY: i32 = 4;

/// Default position for new tables (canvas center, percent)
pub const DEFAULT_POSITION: f64 = 50.0;

/// Dining table entity (桌台)
///
/// Positions are percentages (0–100) of the floor-plan canvas. `parent_id`
/// marks the table as a child of the group rooted at that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: TableId,
    pub number: String,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    #[serde(default)]
    pub is_occupied: bool,
    #[serde(default)]
    pub parent_id: Option<TableId>,
    #[serde(default)]
    pub position_x: f64,
    #[serde(default)]
    pub position_y: f64,
    /// Snap-back position recorded when the table first joined a group
    #[serde(default)]
    pub original_x: Option<f64>,
    #[serde(default)]
    pub original_y: Option<f64>,
}

fn default_capacity() -> i32 {
    DEFAULT_CAPACITY
}

impl DiningTable {
    /// New standalone, unoccupied table
    pub fn new(id: TableId, number: impl Into<String>, position_x: f64, position_y: f64) -> Self {
        Self {
            id,
            number: number.into(),
            capacity: DEFAULT_CAPACITY,
            is_occupied: false,
            parent_id: None,
            position_x,
            position_y,
            original_x: None,
            original_y: None,
        }
    }

    /// Current position as `(x, y)` percent
    pub fn position(&self) -> (f64, f64) {
        (self.position_x, self.position_y)
    }

    /// Numeric value of the table number, used for natural ordering
    pub fn number_value(&self) -> Option<i64> {
        self.number.trim().parse().ok()
    }
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: String,
    pub capacity: Option<i32>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

/// Update dining table payload
///
/// Grouping and occupancy are not editable here; they go through the
/// join/disjoin/occupancy endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<String>,
    pub capacity: Option<i32>,
}

/// Position update for a single table (percent)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: TableId,
    pub position_x: f64,
    pub position_y: f64,
}

impl PositionUpdate {
    pub fn new(id: TableId, position_x: f64, position_y: f64) -> Self {
        Self {
            id,
            position_x,
            position_y,
        }
    }
}

/// Move payload for one table (`PUT /api/tables/{id}/position`)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TablePosition {
    pub position_x: f64,
    pub position_y: f64,
}

/// Occupancy update payload
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OccupancyUpdate {
    pub is_occupied: bool,
}
