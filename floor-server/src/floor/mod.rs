//! 桌台业务逻辑 - tables, grouping and open orders
//!
//! Handlers stay thin; each function here owns one write transaction and
//! reports failures as [`AppError`] with a business error code.

pub mod joins;
pub mod orders;
pub mod tables;

use floor_engine::GroupingError;
use shared::error::AppError;

use crate::db::StorageError;

/// Map a grouping rule violation to an API error
pub(crate) fn grouping_error(err: GroupingError) -> AppError {
    AppError::with_message(err.code(), err.to_string())
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::database(err.to_string())
    }
}
