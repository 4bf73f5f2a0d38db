//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 健康检查 (含存储统计) |

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::error::ApiResponse;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | degraded)
    status: &'static str,
    version: &'static str,
    environment: String,
    /// 运行时间 (秒)
    uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    table_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    open_orders: Option<u64>,
}

async fn health(State(state): State<ServerState>) -> ApiResponse<HealthResponse> {
    let table_count = state.storage.count_tables();
    let open_orders = state.storage.count_orders();
    let status = if table_count.is_ok() && open_orders.is_ok() {
        "ok"
    } else {
        tracing::warn!("Health check: storage unreadable");
        "degraded"
    };

    ApiResponse::success(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        uptime_seconds: state.uptime_seconds(),
        table_count: table_count.ok(),
        open_orders: open_orders.ok(),
    })
}
