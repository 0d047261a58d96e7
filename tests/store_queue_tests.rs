use fleetlog::core::mutation::MutationLogic;
use fleetlog::db::{queue, store};
use fleetlog::errors::AppError;
use fleetlog::models::expense::{Expense, ExpenseCategory};
use fleetlog::models::sync::{Mutation, SyncAction, SyncStatus};
use fleetlog::models::table::{Record, Table};
use fleetlog::models::trip::Trip;

mod common;
use common::{OWNER, date, memory_pool, trip};

#[test]
fn test_mutations_leave_net_effect() {
    let mut pool = memory_pool();

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 500.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t3", 750.0)).unwrap();

    let mut t2 = trip("t2", 500.0);
    t2.agreed_price = 650.0;
    MutationLogic::update(&mut pool, t2).unwrap();
    MutationLogic::delete(&mut pool, Table::Trips, "t1").unwrap();

    let trips: Vec<Trip> = store::all_records(&pool.conn).unwrap();
    let ids: Vec<&str> = trips.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["t2", "t3"]);
    assert_eq!(trips[0].agreed_price, 650.0);
    assert!(store::get(&pool.conn, Table::Trips, "t1").unwrap().is_none());
}

#[test]
fn test_each_mutation_adds_one_pending_entry() {
    let mut pool = memory_pool();

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    let mut t1 = trip("t1", 1000.0);
    t1.notes = Some("late unloading".into());
    MutationLogic::update(&mut pool, t1).unwrap();
    MutationLogic::delete(&mut pool, Table::Trips, "t1").unwrap();

    let pending = queue::list_pending(&pool.conn).unwrap();
    assert_eq!(pending.len(), 3);

    let actions: Vec<SyncAction> = pending.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![SyncAction::Insert, SyncAction::Update, SyncAction::Delete]
    );
    assert!(pending.iter().all(|e| e.record_id() == "t1"));
    assert!(pending.iter().all(|e| e.table == Table::Trips));
    assert!(pending.iter().all(|e| e.status == SyncStatus::Pending));
    assert!(pending.iter().all(|e| e.attempts == 0));
}

#[test]
fn test_new_rows_are_pending_until_confirmed() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Pending)
    );
    assert_eq!(store::count_pending(&pool.conn, Table::Trips).unwrap(), 1);

    store::mark_synced(&pool.conn, Table::Trips, "t1").unwrap();
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Synced)
    );
    assert_eq!(store::count_pending(&pool.conn, Table::Trips).unwrap(), 0);
}

#[test]
fn test_mark_synced_twice_is_noop() {
    let mut pool = memory_pool();
    let queue_id = MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 200.0)).unwrap();

    assert!(queue::mark_synced(&pool.conn, queue_id).unwrap());
    assert!(!queue::mark_synced(&pool.conn, queue_id).unwrap());

    assert!(queue::get_entry(&pool.conn, queue_id).unwrap().is_none());
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 1);
}

#[test]
fn test_insert_with_same_id_is_upsert() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t1", 1200.0)).unwrap();

    assert_eq!(store::count(&pool.conn, Table::Trips).unwrap(), 1);
    let t: Trip = store::get_record(&pool.conn, "t1").unwrap().unwrap();
    assert_eq!(t.agreed_price, 1200.0);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 2);
}

#[test]
fn test_update_or_delete_unknown_id_fails_without_queueing() {
    let mut pool = memory_pool();

    let err = MutationLogic::update(&mut pool, trip("ghost", 1.0)).unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    let err = MutationLogic::delete(&mut pool, Table::Trips, "ghost").unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));

    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);
    assert_eq!(store::count(&pool.conn, Table::Trips).unwrap(), 0);
}

#[test]
fn test_failed_mutation_rolls_back_table_write() {
    let mut pool = memory_pool();
    pool.conn.execute_batch("DROP TABLE sync_queue;").unwrap();

    let result = queue::enqueue(&mut pool, Mutation::Insert(trip("t1", 1000.0).into_payload()));
    assert!(result.is_err());
    assert!(store::get(&pool.conn, Table::Trips, "t1").unwrap().is_none());
}

#[test]
fn test_tables_are_independent() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("same-id", 1000.0)).unwrap();

    let mut e = Expense::new(
        "Diesel",
        180.5,
        ExpenseCategory::Fuel,
        date("2025-06-02"),
        None,
        OWNER,
    );
    e.id = "same-id".into();
    MutationLogic::insert(&mut pool, e).unwrap();

    assert_eq!(store::count(&pool.conn, Table::Trips).unwrap(), 1);
    assert_eq!(store::count(&pool.conn, Table::Expenses).unwrap(), 1);

    MutationLogic::delete(&mut pool, Table::Expenses, "same-id").unwrap();
    assert!(store::get(&pool.conn, Table::Trips, "same-id").unwrap().is_some());
    assert!(queue::has_pending_for(&pool.conn, Table::Trips, "same-id").unwrap());
}

#[test]
fn test_queue_payload_carries_full_record() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let entry = &queue::list_pending(&pool.conn).unwrap()[0];
    match &entry.payload {
        fleetlog::models::sync::SyncPayload::Record(p) => {
            let body = p.to_json().unwrap();
            assert_eq!(body["id"], "t1");
            assert_eq!(body["agreed_price"], 1000.0);
            assert_eq!(body["commission_value"], 100.0);
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn test_clear_empties_one_table_only() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 500.0)).unwrap();
    let e = Expense::new(
        "Diesel",
        180.5,
        ExpenseCategory::Fuel,
        date("2025-06-02"),
        Some("t1".into()),
        OWNER,
    );
    MutationLogic::insert(&mut pool, e).unwrap();

    let queued_before = queue::pending_count(&pool.conn).unwrap();
    let removed = store::clear(&pool.conn, Table::Trips).unwrap();

    assert_eq!(removed, 2);
    assert!(store::get_all(&pool.conn, Table::Trips).unwrap().is_empty());
    assert_eq!(store::count(&pool.conn, Table::Expenses).unwrap(), 1);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), queued_before);

    // already empty
    assert_eq!(store::clear(&pool.conn, Table::Trips).unwrap(), 0);
}
