//! Order API Handlers

use axum::{Json, extract::State};
use shared::error::{ApiResponse, AppResult};
use shared::models::{OpenOrder, SubmitOrder, TransferItemsRequest};

use crate::core::ServerState;
use crate::floor::orders;

/// POST /api/orders - 下单 (落到桌组主桌的账单)
pub async fn submit(
    State(state): State<ServerState>,
    Json(payload): Json<SubmitOrder>,
) -> AppResult<ApiResponse<OpenOrder>> {
    let order = orders::submit(&state.storage, payload)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/orders/transfer - 转菜 (拆单)
pub async fn transfer(
    State(state): State<ServerState>,
    Json(request): Json<TransferItemsRequest>,
) -> AppResult<ApiResponse<()>> {
    orders::transfer(&state.storage, &request)?;
    Ok(ApiResponse::ok())
}
