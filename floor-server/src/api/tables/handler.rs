//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::error::{ApiResponse, AppResult};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, DisjoinReceipt, DisjoinRequest,
    JoinCommand, JoinReceipt, LayoutUpdate, OccupancyUpdate, OpenOrder, TableId, TablePosition,
};

use crate::core::ServerState;
use crate::floor::{joins, orders, tables};

/// GET /api/tables - 获取所有桌台
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<DiningTable>>> {
    let tables = tables::list(&state.storage)?;
    Ok(ApiResponse::success(tables))
}

/// GET /api/tables/:id - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = tables::get(&state.storage, id)?;
    Ok(ApiResponse::success(table))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = tables::create(&state.storage, payload)?;
    Ok(ApiResponse::success(table))
}

/// PUT /api/tables/:id - 更新桌台编号/座位数
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = tables::update(&state.storage, id, payload)?;
    Ok(ApiResponse::success(table))
}

/// DELETE /api/tables/:id - 删除桌台 (拼桌中或占用中拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
) -> AppResult<ApiResponse<bool>> {
    let deleted = tables::delete(&state.storage, id)?;
    Ok(ApiResponse::success(deleted))
}

/// PUT /api/tables/:id/position - 移动桌台
pub async fn update_position(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
    Json(payload): Json<TablePosition>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = tables::move_table(&state.storage, id, payload.position_x, payload.position_y)?;
    Ok(ApiResponse::success(table))
}

/// PUT /api/tables/:id/occupancy
pub async fn update_occupancy(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
    Json(payload): Json<OccupancyUpdate>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = tables::set_occupancy(&state.storage, id, payload.is_occupied)?;
    Ok(ApiResponse::success(table))
}

/// PUT /api/tables/layout - 批量保存位置
pub async fn save_layout(
    State(state): State<ServerState>,
    Json(payload): Json<LayoutUpdate>,
) -> AppResult<ApiResponse<Vec<DiningTable>>> {
    let tables = tables::save_layout(&state.storage, &payload.positions)?;
    Ok(ApiResponse::success(tables))
}

/// POST /api/tables/join - 拼桌
pub async fn join(
    State(state): State<ServerState>,
    Json(command): Json<JoinCommand>,
) -> AppResult<ApiResponse<JoinReceipt>> {
    let receipt = joins::join(&state.storage, &command)?;
    Ok(ApiResponse::success(receipt))
}

/// POST /api/tables/:id/disjoin - 拆桌
pub async fn disjoin(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
    Json(request): Json<DisjoinRequest>,
) -> AppResult<ApiResponse<DisjoinReceipt>> {
    let receipt = joins::disjoin(&state.storage, id, &request)?;
    Ok(ApiResponse::success(receipt))
}

/// GET /api/tables/:id/order - 桌组当前账单 (无账单时 data 为 null)
pub async fn get_order(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
) -> AppResult<ApiResponse<Option<OpenOrder>>> {
    let order = orders::get_order(&state.storage, id)?;
    Ok(ApiResponse::success(order))
}

/// POST /api/tables/:id/settle - 结账
pub async fn settle(
    State(state): State<ServerState>,
    Path(id): Path<TableId>,
) -> AppResult<ApiResponse<OpenOrder>> {
    let order = orders::settle(&state.storage, id)?;
    Ok(ApiResponse::success(order))
}
