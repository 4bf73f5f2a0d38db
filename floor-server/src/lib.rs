//! Floor Server - 桌台平面图服务
//!
//! # 架构概述
//!
//! 持久化桌台、拼桌关系、位置与账单，并通过 REST API 提供给
//! floor-client / floor-engine 使用。
//!
//! - **存储** (`db`): 嵌入式 redb，所有拼桌类变更单事务提交
//! - **业务** (`floor`): 桌台 CRUD、拼桌/拆桌、下单/转菜/结账
//! - **HTTP API** (`api`): axum 路由，统一 `ApiResponse` 信封
//!
//! # 模块结构
//!
//! ```text
//! floor-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── db/            # redb 存储
//! ├── floor/         # 桌台/拼桌/账单业务
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod floor;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use db::{FloorStorage, StorageError};
pub use utils::logger::{init_logger, init_logger_with_file};
