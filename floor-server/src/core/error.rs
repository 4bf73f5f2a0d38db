use thiserror::Error;

use crate::db::StorageError;

/// 服务器启动/运行错误
///
/// 请求级错误走 [`shared::error::AppError`]，这里只覆盖进程生命周期。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储初始化失败: {0}")]
    Storage(#[from] StorageError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误")]
    Internal(#[from] anyhow::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
