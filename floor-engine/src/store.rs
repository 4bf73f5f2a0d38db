//! Remote table store boundary
//!
//! Everything the floor-plan engine persists goes through [`TableStore`].
//! Implementations: [`crate::memory::MemoryTableStore`] (tests, embedded)
//! and the HTTP client in `floor-client`.

use std::sync::Arc;

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    DiningTable, DisjoinReceipt, DisjoinRequest, ItemId, JoinCommand, JoinReceipt, PositionUpdate,
    TableId,
};
use thiserror::Error;

/// Store error
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Rejected by the store with a business error code
    #[error("{message} (code {code})")]
    Rejected { code: ErrorCode, message: String },

    /// Store unreachable or request failed in transit
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    pub fn rejected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            message: message.into(),
        }
    }

    /// Error code when the store rejected the request
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            StoreError::Rejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<AppError> for StoreError {
    fn from(err: AppError) -> Self {
        StoreError::Rejected {
            code: err.code,
            message: err.message,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations consumed by the engine
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch all tables (order unspecified)
    async fn list_tables(&self) -> StoreResult<Vec<DiningTable>>;

    /// Persist a plain move of one table
    async fn update_table_position(&self, id: TableId, x: f64, y: f64)
        -> StoreResult<DiningTable>;

    async fn update_table_occupancy(&self, id: TableId, occupied: bool)
        -> StoreResult<DiningTable>;

    /// Apply relationship and positions atomically; idempotent per operation id
    async fn join_tables(&self, command: &JoinCommand) -> StoreResult<JoinReceipt>;

    /// Split the group containing `table_id`
    async fn disjoin_group(
        &self,
        table_id: TableId,
        request: &DisjoinRequest,
    ) -> StoreResult<DisjoinReceipt>;

    /// Move order lines between the open orders of two groups
    async fn transfer_order_items(
        &self,
        source: TableId,
        destination: TableId,
        item_ids: &[ItemId],
    ) -> StoreResult<()>;

    /// Bulk position save
    async fn save_layout(&self, positions: &[PositionUpdate]) -> StoreResult<Vec<DiningTable>>;
}

#[async_trait]
impl<T: TableStore + ?Sized> TableStore for Arc<T> {
    async fn list_tables(&self) -> StoreResult<Vec<DiningTable>> {
        (**self).list_tables().await
    }

    async fn update_table_position(
        &self,
        id: TableId,
        x: f64,
        y: f64,
    ) -> StoreResult<DiningTable> {
        (**self).update_table_position(id, x, y).await
    }

    async fn update_table_occupancy(
        &self,
        id: TableId,
        occupied: bool,
    ) -> StoreResult<DiningTable> {
        (**self).update_table_occupancy(id, occupied).await
    }

    async fn join_tables(&self, command: &JoinCommand) -> StoreResult<JoinReceipt> {
        (**self).join_tables(command).await
    }

    async fn disjoin_group(
        &self,
        table_id: TableId,
        request: &DisjoinRequest,
    ) -> StoreResult<DisjoinReceipt> {
        (**self).disjoin_group(table_id, request).await
    }

    async fn transfer_order_items(
        &self,
        source: TableId,
        destination: TableId,
        item_ids: &[ItemId],
    ) -> StoreResult<()> {
        (**self)
            .transfer_order_items(source, destination, item_ids)
            .await
    }

    async fn save_layout(&self, positions: &[PositionUpdate]) -> StoreResult<Vec<DiningTable>> {
        (**self).save_layout(positions).await
    }
}
