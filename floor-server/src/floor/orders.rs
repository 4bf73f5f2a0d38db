//! Open orders per table group
//!
//! A bill belongs to the group root. Submitting to any member lands on the
//! root's order; identical lines (same menu item and options) are merged.

use std::collections::BTreeSet;

use floor_engine::FloorPlan;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ItemId, OpenOrder, OrderLine, SubmitOrder, TableId, TransferItemsRequest};
use shared::util::now_millis;

use super::grouping_error;
use crate::db::storage::ITEM_ID_KEY;
use crate::db::{FloorStorage, StorageError};

fn set_group_occupancy(
    floor: &mut FloorPlan,
    root_id: TableId,
    occupied: bool,
) -> AppResult<()> {
    for id in floor.group_of(root_id).map_err(grouping_error)? {
        floor.require_mut(id).map_err(grouping_error)?.is_occupied = occupied;
    }
    Ok(())
}

/// Open order of the group containing `table_id`
pub fn get_order(storage: &FloorStorage, table_id: TableId) -> AppResult<Option<OpenOrder>> {
    let tables = storage.list_tables()?;
    let floor = FloorPlan::new(tables);
    let root = floor.root_of(table_id).map_err(grouping_error)?;
    Ok(storage.get_order(root)?)
}

pub fn submit(storage: &FloorStorage, payload: SubmitOrder) -> AppResult<OpenOrder> {
    if payload.items.is_empty() {
        return Err(AppError::new(ErrorCode::OrderEmpty));
    }
    if let Some(line) = payload.items.iter().find(|i| i.quantity <= 0) {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            format!("Quantity of {} must be positive", line.name),
        ));
    }

    let txn = storage.begin_write()?;
    let mut floor = storage.load_floor(&txn)?;
    let root = floor.root_of(payload.table_id).map_err(grouping_error)?;

    let now = now_millis();
    let mut order = storage
        .get_order_txn(&txn, root)?
        .unwrap_or_else(|| OpenOrder::new(root, now));

    for input in payload.items {
        let fingerprint = input.fingerprint();
        match order
            .lines
            .iter_mut()
            .find(|l| l.fingerprint() == fingerprint && l.unit_price == input.unit_price)
        {
            Some(line) => {
                let item_id = line.id;
                line.quantity = line.quantity.checked_add(input.quantity).ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::ValueOutOfRange,
                        format!("Quantity of {} is too large", input.name),
                    )
                    .with_detail("item_id", item_id)
                })?;
            }
            None => {
                let id = storage.next_id(&txn, ITEM_ID_KEY)?;
                order.lines.push(OrderLine {
                    id,
                    menu_item_id: input.menu_item_id,
                    name: input.name,
                    unit_price: input.unit_price,
                    option_ids: input.option_ids,
                    quantity: input.quantity,
                });
            }
        }
    }
    order.updated_at = now;

    storage.put_order(&txn, &order)?;
    set_group_occupancy(&mut floor, root, true)?;
    storage.put_floor(&txn, &floor)?;
    txn.commit().map_err(StorageError::from)?;

    tracing::info!(table_id = root, lines = order.lines.len(), "Order submitted");
    Ok(order)
}

/// Close the group's bill and free its tables
pub fn settle(storage: &FloorStorage, table_id: TableId) -> AppResult<OpenOrder> {
    let txn = storage.begin_write()?;
    let mut floor = storage.load_floor(&txn)?;
    let root = floor.root_of(table_id).map_err(grouping_error)?;

    let order = storage.remove_order(&txn, root)?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::OrderNotFound,
            format!("No open order for table {table_id}"),
        )
    })?;
    set_group_occupancy(&mut floor, root, false)?;
    storage.put_floor(&txn, &floor)?;
    txn.commit().map_err(StorageError::from)?;

    tracing::info!(table_id = root, total = %order.total(), "Order settled");
    Ok(order)
}

/// Move lines from the source group's bill to the destination group's bill
///
/// Line ids survive the move. An emptied source bill is closed and its
/// group freed; the destination group becomes occupied.
pub fn transfer(storage: &FloorStorage, request: &TransferItemsRequest) -> AppResult<()> {
    if request.item_ids.is_empty() {
        return Err(AppError::validation("No items selected for transfer"));
    }

    let txn = storage.begin_write()?;
    let mut floor = storage.load_floor(&txn)?;
    let source_root = floor
        .root_of(request.source_table_id)
        .map_err(grouping_error)?;
    let dest_root = floor
        .root_of(request.destination_table_id)
        .map_err(grouping_error)?;
    if source_root == dest_root {
        return Err(AppError::with_message(
            ErrorCode::TransferDestinationInvalid,
            "Destination belongs to the source group",
        ));
    }

    let mut source = storage.get_order_txn(&txn, source_root)?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::OrderNotFound,
            format!("No open order for table {}", request.source_table_id),
        )
    })?;

    let wanted: BTreeSet<ItemId> = request.item_ids.iter().copied().collect();
    if let Some(missing) = wanted.iter().find(|id| !source.contains(**id)) {
        return Err(AppError::with_message(
            ErrorCode::OrderItemNotFound,
            format!(
                "Item {missing} not in order of table {}",
                request.source_table_id
            ),
        )
        .with_detail("item_id", *missing));
    }

    let now = now_millis();
    let (moved, kept): (Vec<OrderLine>, Vec<OrderLine>) = source
        .lines
        .drain(..)
        .partition(|line| wanted.contains(&line.id));
    source.lines = kept;

    let mut destination = storage
        .get_order_txn(&txn, dest_root)?
        .unwrap_or_else(|| OpenOrder::new(dest_root, now));
    destination.lines.extend(moved);
    destination.updated_at = now;
    storage.put_order(&txn, &destination)?;
    set_group_occupancy(&mut floor, dest_root, true)?;

    if source.is_empty() {
        storage.remove_order(&txn, source_root)?;
        set_group_occupancy(&mut floor, source_root, false)?;
    } else {
        source.updated_at = now;
        storage.put_order(&txn, &source)?;
    }

    storage.put_floor(&txn, &floor)?;
    txn.commit().map_err(StorageError::from)?;

    tracing::info!(
        source = source_root,
        destination = dest_root,
        items = ?request.item_ids,
        "Order items transferred"
    );
    Ok(())
}
