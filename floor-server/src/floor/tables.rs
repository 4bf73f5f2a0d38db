//! Dining table CRUD, moves, occupancy and bulk layout

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    DEFAULT_CAPACITY, DEFAULT_POSITION, DiningTable, DiningTableCreate, DiningTableUpdate,
    PositionUpdate, TableId,
};

use crate::db::FloorStorage;
use crate::db::storage::TABLE_ID_KEY;

fn validate_number(number: &str) -> AppResult<String> {
    let number = number.trim();
    if number.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "Table number is required",
        ));
    }
    Ok(number.to_string())
}

fn validate_capacity(capacity: i32) -> AppResult<i32> {
    if capacity <= 0 {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Capacity must be positive, got {capacity}"),
        ));
    }
    Ok(capacity)
}

fn validate_coordinate(value: f64, axis: &str) -> AppResult<f64> {
    if !value.is_finite() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Position {axis} must be a finite number"),
        ));
    }
    Ok(value)
}

fn number_conflict(number: &str) -> AppError {
    AppError::with_message(
        ErrorCode::TableNumberExists,
        format!("Table number {number} already exists"),
    )
    .with_detail("number", number)
}

/// All tables ordered by number (numeric first)
pub fn list(storage: &FloorStorage) -> AppResult<Vec<DiningTable>> {
    let mut tables = storage.list_tables()?;
    tables.sort_by(|a, b| {
        let key = |t: &DiningTable| (t.number_value().is_none(), t.number_value());
        key(a)
            .cmp(&key(b))
            .then_with(|| a.number.cmp(&b.number))
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(tables)
}

pub fn get(storage: &FloorStorage, id: TableId) -> AppResult<DiningTable> {
    storage
        .get_table(id)?
        .ok_or_else(|| AppError::table_not_found(id))
}

pub fn create(storage: &FloorStorage, payload: DiningTableCreate) -> AppResult<DiningTable> {
    let number = validate_number(&payload.number)?;
    let capacity = validate_capacity(payload.capacity.unwrap_or(DEFAULT_CAPACITY))?;
    let x = validate_coordinate(payload.position_x.unwrap_or(DEFAULT_POSITION), "x")?;
    let y = validate_coordinate(payload.position_y.unwrap_or(DEFAULT_POSITION), "y")?;

    let txn = storage.begin_write()?;
    let floor = storage.load_floor(&txn)?;
    if floor.tables().any(|t| t.number == number) {
        return Err(number_conflict(&number));
    }

    let id = storage.next_id(&txn, TABLE_ID_KEY)?;
    let mut table = DiningTable::new(id, number, x, y);
    table.capacity = capacity;
    storage.put_table(&txn, &table)?;
    txn.commit().map_err(crate::db::StorageError::from)?;

    tracing::info!(table_id = id, number = %table.number, "Table created");
    Ok(table)
}

pub fn update(
    storage: &FloorStorage,
    id: TableId,
    payload: DiningTableUpdate,
) -> AppResult<DiningTable> {
    let txn = storage.begin_write()?;
    let floor = storage.load_floor(&txn)?;
    let mut table = floor
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::table_not_found(id))?;

    if let Some(number) = payload.number {
        let number = validate_number(&number)?;
        if floor.tables().any(|t| t.id != id && t.number == number) {
            return Err(number_conflict(&number));
        }
        table.number = number;
    }
    if let Some(capacity) = payload.capacity {
        table.capacity = validate_capacity(capacity)?;
    }

    storage.put_table(&txn, &table)?;
    txn.commit().map_err(crate::db::StorageError::from)?;
    Ok(table)
}

/// Delete a standalone, free table
pub fn delete(storage: &FloorStorage, id: TableId) -> AppResult<bool> {
    let txn = storage.begin_write()?;
    let floor = storage.load_floor(&txn)?;
    let table = floor.get(id).ok_or_else(|| AppError::table_not_found(id))?;

    if table.parent_id.is_some() || !floor.children_of(id).is_empty() {
        return Err(AppError::with_message(
            ErrorCode::TableGrouped,
            format!("Table {} is part of a group; split it first", table.number),
        ));
    }
    if storage.has_order_txn(&txn, id)? {
        return Err(AppError::with_message(
            ErrorCode::TableHasOrders,
            format!("Table {} has an open order", table.number),
        ));
    }
    if table.is_occupied {
        return Err(AppError::with_message(
            ErrorCode::TableOccupied,
            format!("Table {} is occupied", table.number),
        ));
    }

    let deleted = storage.delete_table(&txn, id)?;
    txn.commit().map_err(crate::db::StorageError::from)?;
    tracing::info!(table_id = id, "Table deleted");
    Ok(deleted)
}

/// Plain move of one table; grouping untouched
pub fn move_table(storage: &FloorStorage, id: TableId, x: f64, y: f64) -> AppResult<DiningTable> {
    let x = validate_coordinate(x, "x")?;
    let y = validate_coordinate(y, "y")?;

    let txn = storage.begin_write()?;
    let mut table = storage
        .get_table_txn(&txn, id)?
        .ok_or_else(|| AppError::table_not_found(id))?;
    table.position_x = x;
    table.position_y = y;
    storage.put_table(&txn, &table)?;
    txn.commit().map_err(crate::db::StorageError::from)?;
    Ok(table)
}

pub fn set_occupancy(storage: &FloorStorage, id: TableId, occupied: bool) -> AppResult<DiningTable> {
    let txn = storage.begin_write()?;
    let mut table = storage
        .get_table_txn(&txn, id)?
        .ok_or_else(|| AppError::table_not_found(id))?;
    table.is_occupied = occupied;
    storage.put_table(&txn, &table)?;
    txn.commit().map_err(crate::db::StorageError::from)?;
    Ok(table)
}

/// Bulk position save; all ids must exist
pub fn save_layout(
    storage: &FloorStorage,
    positions: &[PositionUpdate],
) -> AppResult<Vec<DiningTable>> {
    let txn = storage.begin_write()?;
    let mut floor = storage.load_floor(&txn)?;
    let mut updated = Vec::with_capacity(positions.len());

    for pos in positions {
        let x = validate_coordinate(pos.position_x, "x")?;
        let y = validate_coordinate(pos.position_y, "y")?;
        floor
            .set_position(pos.id, x, y)
            .map_err(|_| AppError::table_not_found(pos.id))?;
        if let Some(table) = floor.get(pos.id) {
            storage.put_table(&txn, table)?;
            updated.push(table.clone());
        }
    }

    txn.commit().map_err(crate::db::StorageError::from)?;
    tracing::info!(count = updated.len(), "Layout saved");
    Ok(updated)
}
