//! 数据库层 - redb 嵌入式存储

pub mod storage;

pub use storage::{FloorStorage, StorageError, StorageResult};
