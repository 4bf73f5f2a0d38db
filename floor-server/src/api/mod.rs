//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`tables`] - 桌台、布局、拼桌/拆桌接口
//! - [`orders`] - 下单、转菜接口
//!
//! 所有接口返回统一的 [`shared::error::ApiResponse`] 信封。

pub mod health;
pub mod orders;
pub mod tables;

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(tables::router())
        .merge(orders::router())
        .merge(health::router())
}

/// Build the application with middleware; state is attached by the caller
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router()
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_millis(state.config.request_timeout_ms),
        ))
        // CORS - floor-plan UI may be served from another origin
        .layer(CorsLayer::permissive())
        // Trace - Request tracing (logs at INFO level)
        .layer(TraceLayer::new_for_http())
}
