//! Open order (bill) model
//!
//! Minimal per-group bill used at the item-transfer boundary. Orders belong
//! to the group root table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dining_table::TableId;

/// Order line item identifier
pub type ItemId = i64;

/// Line item as submitted from the cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub option_ids: Vec<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

impl OrderLineInput {
    /// Identity key: menu item plus its sorted option ids
    pub fn fingerprint(&self) -> String {
        fingerprint(self.menu_item_id, &self.option_ids)
    }
}

/// Order line on an open bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: ItemId,
    pub menu_item_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub option_ids: Vec<i64>,
    pub quantity: i32,
}

impl OrderLine {
    pub fn fingerprint(&self) -> String {
        fingerprint(self.menu_item_id, &self.option_ids)
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Open order for a table group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenOrder {
    /// Group root table owning this bill
    pub table_id: TableId,
    pub lines: Vec<OrderLine>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OpenOrder {
    pub fn new(table_id: TableId, now: i64) -> Self {
        Self {
            table_id,
            lines: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.lines.iter().any(|l| l.id == item_id)
    }
}

/// Submit order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub table_id: TableId,
    pub items: Vec<OrderLineInput>,
}

/// Move order lines between tables (bill split)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferItemsRequest {
    pub source_table_id: TableId,
    pub destination_table_id: TableId,
    pub item_ids: Vec<ItemId>,
}

fn fingerprint(menu_item_id: i64, option_ids: &[i64]) -> String {
    let mut options = option_ids.to_vec();
    options.sort_unstable();
    let options = options
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-{}", menu_item_id, options)
}
