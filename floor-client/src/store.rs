//! [`TableStore`] over HTTP

use async_trait::async_trait;
use floor_engine::{StoreResult, TableStore};
use shared::models::{
    DiningTable, DisjoinReceipt, DisjoinRequest, ItemId, JoinCommand, JoinReceipt, PositionUpdate,
    TableId, TransferItemsRequest,
};

use crate::HttpClient;

#[async_trait]
impl TableStore for HttpClient {
    async fn list_tables(&self) -> StoreResult<Vec<DiningTable>> {
        Ok(HttpClient::list_tables(self).await?)
    }

    async fn update_table_position(
        &self,
        id: TableId,
        x: f64,
        y: f64,
    ) -> StoreResult<DiningTable> {
        Ok(self.update_position(id, x, y).await?)
    }

    async fn update_table_occupancy(
        &self,
        id: TableId,
        occupied: bool,
    ) -> StoreResult<DiningTable> {
        Ok(self.update_occupancy(id, occupied).await?)
    }

    async fn join_tables(&self, command: &JoinCommand) -> StoreResult<JoinReceipt> {
        Ok(HttpClient::join_tables(self, command).await?)
    }

    async fn disjoin_group(
        &self,
        table_id: TableId,
        request: &DisjoinRequest,
    ) -> StoreResult<DisjoinReceipt> {
        Ok(self.disjoin(table_id, request).await?)
    }

    async fn transfer_order_items(
        &self,
        source: TableId,
        destination: TableId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        let request = TransferItemsRequest {
            source_table_id: source,
            destination_table_id: destination,
            item_ids: item_ids.to_vec(),
        };
        Ok(self.transfer_items(&request).await?)
    }

    async fn save_layout(&self, positions: &[PositionUpdate]) -> StoreResult<Vec<DiningTable>> {
        Ok(HttpClient::save_layout(self, positions).await?)
    }
}
