//! Join (拼桌) and disjoin (拆桌) on the persisted floor
//!
//! Both run in one redb write transaction: relationship, positions, merged
//! orders and occupancy commit together. A join whose `operation_id` was
//! already applied returns the stored receipt with `replayed = true`.

use shared::error::{AppError, AppResult};
use shared::models::{
    DisjoinReceipt, DisjoinRequest, JoinCommand, JoinReceipt, OpenOrder, TableId,
};
use shared::util::now_millis;

use super::grouping_error;
use crate::db::{FloorStorage, StorageError};

pub fn join(storage: &FloorStorage, command: &JoinCommand) -> AppResult<JoinReceipt> {
    if command.operation_id.trim().is_empty() {
        return Err(AppError::validation("operation_id is required"));
    }

    let txn = storage.begin_write()?;

    // 1. Replayed command: acknowledge without re-applying
    if let Some(receipt) = storage.processed_join(&txn, &command.operation_id)? {
        tracing::info!(operation_id = %command.operation_id, "Join already applied");
        return Ok(JoinReceipt {
            replayed: true,
            ..receipt
        });
    }

    // 2. Relationship
    let mut floor = storage.load_floor(&txn)?;
    let applied = floor.apply_join(&command.table_ids).map_err(grouping_error)?;

    // 3. Positions computed by the caller
    for pos in &command.positions {
        if !pos.position_x.is_finite() || !pos.position_y.is_finite() {
            return Err(AppError::validation(format!(
                "Position of table {} must be finite",
                pos.id
            )));
        }
        floor
            .set_position(pos.id, pos.position_x, pos.position_y)
            .map_err(grouping_error)?;
    }

    // 4. Merge member orders into the parent's order
    let mut parent_order = storage.get_order_txn(&txn, applied.parent_id)?;
    for &id in &applied.member_ids {
        if id == applied.parent_id {
            continue;
        }
        if let Some(order) = storage.remove_order(&txn, id)? {
            let target = parent_order
                .get_or_insert_with(|| OpenOrder::new(applied.parent_id, order.created_at));
            target.lines.extend(order.lines);
            target.created_at = target.created_at.min(order.created_at);
            target.updated_at = now_millis();
        }
    }
    if let Some(order) = &parent_order {
        storage.put_order(&txn, order)?;
    }

    // 5. Occupancy spreads over the whole group
    let any_occupied = parent_order.is_some()
        || applied
            .member_ids
            .iter()
            .any(|id| floor.get(*id).is_some_and(|t| t.is_occupied));
    if any_occupied {
        for &id in &applied.member_ids {
            floor.require_mut(id).map_err(grouping_error)?.is_occupied = true;
        }
    }

    // 6. Persist and record
    storage.put_floor(&txn, &floor)?;
    let receipt = JoinReceipt {
        operation_id: command.operation_id.clone(),
        parent_id: applied.parent_id,
        member_ids: applied.member_ids,
        replayed: false,
    };
    storage.mark_join_processed(&txn, &receipt)?;
    txn.commit().map_err(StorageError::from)?;

    tracing::info!(
        operation_id = %receipt.operation_id,
        parent_id = receipt.parent_id,
        members = ?receipt.member_ids,
        "Tables joined"
    );
    Ok(receipt)
}

pub fn disjoin(
    storage: &FloorStorage,
    table_id: TableId,
    request: &DisjoinRequest,
) -> AppResult<DisjoinReceipt> {
    let txn = storage.begin_write()?;
    let mut floor = storage.load_floor(&txn)?;
    if !floor.contains(table_id) {
        return Err(AppError::table_not_found(table_id));
    }

    let applied = floor
        .apply_disjoin(
            table_id,
            request.remove_table_ids.as_deref(),
            request.restore_positions,
        )
        .map_err(grouping_error)?;

    // Released tables without a bill of their own become free
    for &id in &applied.released {
        if !storage.has_order_txn(&txn, id)? {
            floor.require_mut(id).map_err(grouping_error)?.is_occupied = false;
        }
    }

    storage.put_floor(&txn, &floor)?;
    txn.commit().map_err(StorageError::from)?;

    tracing::info!(
        parent_id = applied.parent_id,
        released = ?applied.released,
        disbanded = applied.disbanded,
        "Tables disjoined"
    );
    Ok(DisjoinReceipt {
        parent_id: applied.parent_id,
        released: applied.released,
        disbanded: applied.disbanded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floor::tables;
    use shared::error::ErrorCode;
    use shared::models::{DiningTableCreate, PositionUpdate};

    fn setup(count: usize) -> (FloorStorage, Vec<TableId>) {
        let storage = FloorStorage::open_in_memory().unwrap();
        let ids = (1..=count)
            .map(|n| {
                tables::create(
                    &storage,
                    DiningTableCreate {
                        number: n.to_string(),
                        capacity: None,
                        position_x: Some(n as f64 * 20.0),
                        position_y: Some(10.0),
                    },
                )
                .unwrap()
                .id
            })
            .collect();
        (storage, ids)
    }

    fn command(op: &str, ids: &[TableId]) -> JoinCommand {
        JoinCommand {
            operation_id: op.to_string(),
            table_ids: ids.to_vec(),
            positions: vec![],
        }
    }

    #[test]
    fn test_join_sets_parent_and_positions() {
        let (storage, ids) = setup(3);
        let mut cmd = command("op-1", &[ids[2], ids[0]]);
        cmd.positions = vec![PositionUpdate::new(ids[2], 28.0, 10.0)];

        let receipt = join(&storage, &cmd).unwrap();
        assert_eq!(receipt.parent_id, ids[0]);
        assert_eq!(receipt.member_ids, vec![ids[0], ids[2]]);
        assert!(!receipt.replayed);

        let child = tables::get(&storage, ids[2]).unwrap();
        assert_eq!(child.parent_id, Some(ids[0]));
        assert_eq!(child.position(), (28.0, 10.0));
        assert_eq!(child.original_x, Some(60.0));
    }

    #[test]
    fn test_join_replay_is_noop() {
        let (storage, ids) = setup(2);
        let cmd = command("op-1", &ids);
        join(&storage, &cmd).unwrap();
        tables::move_table(&storage, ids[1], 70.0, 70.0).unwrap();

        let replay = join(&storage, &cmd).unwrap();
        assert!(replay.replayed);
        assert_eq!(replay.parent_id, ids[0]);
        assert_eq!(tables::get(&storage, ids[1]).unwrap().position(), (70.0, 70.0));
    }

    #[test]
    fn test_failed_join_changes_nothing() {
        let (storage, ids) = setup(2);
        let mut cmd = command("op-1", &ids);
        cmd.positions = vec![PositionUpdate::new(999, 1.0, 1.0)];

        let err = join(&storage, &cmd).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotFound);
        assert!(tables::get(&storage, ids[1]).unwrap().parent_id.is_none());

        let err = join(&storage, &command("op-2", &[ids[0]])).unwrap_err();
        assert_eq!(err.code, ErrorCode::JoinTooFewTables);
    }

    #[test]
    fn test_join_spreads_occupancy() {
        let (storage, ids) = setup(3);
        tables::set_occupancy(&storage, ids[1], true).unwrap();
        join(&storage, &command("op-1", &ids)).unwrap();
        for id in ids {
            assert!(tables::get(&storage, id).unwrap().is_occupied);
        }
    }

    #[test]
    fn test_partial_and_full_disjoin() {
        let (storage, ids) = setup(3);
        join(&storage, &command("op-1", &ids)).unwrap();

        let receipt = disjoin(&storage, ids[0], &DisjoinRequest::members(vec![ids[2]])).unwrap();
        assert!(!receipt.disbanded);
        assert_eq!(receipt.released, vec![ids[2]]);
        assert_eq!(tables::get(&storage, ids[1]).unwrap().parent_id, Some(ids[0]));

        let receipt = disjoin(&storage, ids[1], &DisjoinRequest::whole()).unwrap();
        assert!(receipt.disbanded);
        assert!(tables::get(&storage, ids[1]).unwrap().parent_id.is_none());

        let err = disjoin(&storage, ids[0], &DisjoinRequest::whole()).unwrap_err();
        assert_eq!(err.code, ErrorCode::TableNotJoined);
    }

    #[test]
    fn test_disjoin_restores_positions() {
        let (storage, ids) = setup(2);
        let mut cmd = command("op-1", &ids);
        cmd.positions = vec![PositionUpdate::new(ids[1], 28.0, 10.0)];
        join(&storage, &cmd).unwrap();

        disjoin(
            &storage,
            ids[0],
            &DisjoinRequest::whole().with_restore_positions(true),
        )
        .unwrap();
        let table = tables::get(&storage, ids[1]).unwrap();
        assert_eq!(table.position(), (40.0, 10.0));
        assert!(table.original_x.is_none());
    }
}
