//! Bill transfer (转菜)
//!
//! Moves selected order lines from the source table's group to another
//! table's group. Grouping and positions are never touched. All checks run
//! against the working copy before the store is called.

use shared::models::{ItemId, TableId};

use crate::error::{EngineError, EngineResult};
use crate::grouping::FloorPlan;
use crate::store::TableStore;

/// Pending transfer, built up by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillTransfer {
    source: TableId,
    destination: Option<TableId>,
    item_ids: Vec<ItemId>,
}

impl BillTransfer {
    pub fn from_table(source: TableId) -> Self {
        Self {
            source,
            destination: None,
            item_ids: Vec::new(),
        }
    }

    pub fn to_table(mut self, destination: TableId) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_items(mut self, items: impl IntoIterator<Item = ItemId>) -> Self {
        for id in items {
            if !self.item_ids.contains(&id) {
                self.item_ids.push(id);
            }
        }
        self
    }

    /// Toggle one line in or out of the transfer
    pub fn toggle_item(&mut self, id: ItemId) {
        if let Some(pos) = self.item_ids.iter().position(|i| *i == id) {
            self.item_ids.remove(pos);
        } else {
            self.item_ids.push(id);
        }
    }

    pub fn set_destination(&mut self, destination: Option<TableId>) {
        self.destination = destination;
    }

    pub fn source(&self) -> TableId {
        self.source
    }

    pub fn destination(&self) -> Option<TableId> {
        self.destination
    }

    pub fn item_ids(&self) -> &[ItemId] {
        &self.item_ids
    }

    /// Local validation; returns the destination on success
    pub fn validate(&self, floor: &FloorPlan) -> EngineResult<TableId> {
        if self.item_ids.is_empty() {
            return Err(EngineError::validation("No items selected for transfer"));
        }
        let destination = self
            .destination
            .ok_or_else(|| EngineError::validation("No destination table selected"))?;

        let source_group = floor.group_of(self.source)?;
        floor.require(destination)?;
        if source_group.contains(&destination) {
            return Err(EngineError::validation(format!(
                "Table {destination} belongs to the source group"
            )));
        }
        Ok(destination)
    }

    /// Validate, then ask the store to move the lines
    pub async fn execute<S: TableStore + ?Sized>(
        &self,
        floor: &FloorPlan,
        store: &S,
    ) -> EngineResult<TableId> {
        let destination = self.validate(floor)?;
        store
            .transfer_order_items(self.source, destination, &self.item_ids)
            .await?;
        tracing::info!(
            source = self.source,
            destination,
            items = self.item_ids.len(),
            "Order items transferred"
        );
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTableStore;
    use shared::models::DiningTable;

    fn floor() -> Vec<DiningTable> {
        let mut child = DiningTable::new(2, "2", 20.0, 10.0);
        child.parent_id = Some(1);
        vec![
            DiningTable::new(1, "1", 10.0, 10.0),
            child,
            DiningTable::new(3, "3", 50.0, 50.0),
        ]
    }

    #[test]
    fn test_validation_order() {
        let plan = FloorPlan::new(floor());

        let empty = BillTransfer::from_table(1).to_table(3);
        assert!(matches!(empty.validate(&plan), Err(EngineError::Validation(_))));

        let no_dest = BillTransfer::from_table(1).with_items([10]);
        assert!(matches!(no_dest.validate(&plan), Err(EngineError::Validation(_))));

        let same_group = BillTransfer::from_table(1).to_table(2).with_items([10]);
        assert!(matches!(
            same_group.validate(&plan),
            Err(EngineError::Validation(_))
        ));

        let ok = BillTransfer::from_table(2).to_table(3).with_items([10, 10]);
        assert_eq!(ok.item_ids(), &[10]);
        assert_eq!(ok.validate(&plan).unwrap(), 3);
    }

    #[test]
    fn test_toggle_item() {
        let mut t = BillTransfer::from_table(1).with_items([1, 2]);
        t.toggle_item(1);
        t.toggle_item(5);
        assert_eq!(t.item_ids(), &[2, 5]);
    }

    #[tokio::test]
    async fn test_invalid_transfer_makes_no_store_call() {
        let store = MemoryTableStore::new(floor()).with_order(1, vec![10]);
        let plan = FloorPlan::new(store.tables());

        let err = BillTransfer::from_table(1)
            .to_table(2)
            .with_items([10])
            .execute(&plan, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_makes_no_store_call() {
        let store = MemoryTableStore::new(floor()).with_order(1, vec![10]);
        let plan = FloorPlan::new(store.tables());

        let err = BillTransfer::from_table(1)
            .to_table(3)
            .execute(&plan, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.calls().is_empty());
        assert_eq!(store.order_items(1), vec![10]);
    }

    #[tokio::test]
    async fn test_missing_destination_makes_no_store_call() {
        let store = MemoryTableStore::new(floor()).with_order(1, vec![10]);
        let plan = FloorPlan::new(store.tables());

        let err = BillTransfer::from_table(1)
            .with_items([10])
            .execute(&plan, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.calls().is_empty());

        let err = BillTransfer::from_table(1)
            .to_table(99)
            .with_items([10])
            .execute(&plan, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(store.calls().is_empty());
        assert_eq!(store.order_items(1), vec![10]);
    }

    #[tokio::test]
    async fn test_transfer_from_child_moves_group_order() {
        let store = MemoryTableStore::new(floor()).with_order(1, vec![10, 11]);
        let plan = FloorPlan::new(store.tables());

        BillTransfer::from_table(2)
            .to_table(3)
            .with_items([11])
            .execute(&plan, &store)
            .await
            .unwrap();
        assert_eq!(store.order_items(1), vec![10]);
        assert_eq!(store.order_items(3), vec![11]);
        assert_eq!(store.table(2).unwrap().parent_id, Some(1));
    }
}
