use chrono::{DateTime, Duration, Utc};
use fleetlog::core::mutation::MutationLogic;
use fleetlog::core::remote::MemoryRemote;
use fleetlog::core::sync::{
    DrainOutcome, Reconciler, RetryPolicy, SyncReport, SyncScheduler, Trigger,
    wait_for_connectivity,
};
use std::thread;
use std::time::Duration as StdDuration;
use fleetlog::db::{queue, store};
use fleetlog::models::sync::{SyncAction, SyncStatus};
use fleetlog::models::table::Table;

mod common;
use common::{memory_pool, trip};

/// Whole-second clock: queue timestamps are stored with microsecond precision.
fn clock() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2030-01-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn policy() -> RetryPolicy {
    RetryPolicy {
        base: Duration::seconds(5),
        max: Duration::seconds(900),
    }
}

#[test]
fn test_drain_pushes_trip_to_remote() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let report = Reconciler::new(&remote, policy())
        .drain(&mut pool, Utc::now())
        .unwrap();

    assert_eq!(
        report,
        SyncReport {
            attempted: 1,
            synced: 1,
            failed: 0,
            deferred: 0
        }
    );
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);

    let remote_trip = remote.get(Table::Trips, "t1").expect("t1 on remote");
    assert_eq!(remote_trip["agreed_price"], 1000.0);
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Synced)
    );
}

#[test]
fn test_remote_failure_keeps_entry_pending() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let now = clock();
    let report = Reconciler::new(&remote, policy()).drain(&mut pool, now).unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.synced, 0);

    let pending = queue::list_pending(&pool.conn).unwrap();
    assert_eq!(pending.len(), 1);
    let entry = &pending[0];
    assert_eq!(entry.attempts, 1);
    assert!(entry.last_error.as_deref().unwrap_or("").contains("network"));
    assert_eq!(entry.next_attempt_at, Some(now + Duration::seconds(5)));

    assert!(remote.is_empty());
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Pending)
    );
}

#[test]
fn test_failed_entry_waits_for_backoff() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let reconciler = Reconciler::new(&remote, policy());
    let now = Utc::now();
    reconciler.drain(&mut pool, now).unwrap();

    remote.set_offline(false);

    // still inside the 5 s window
    let report = reconciler.drain(&mut pool, now + Duration::seconds(2)).unwrap();
    assert_eq!(report.attempted, 0);
    assert_eq!(report.deferred, 1);
    assert!(remote.is_empty());

    let report = reconciler.drain(&mut pool, now + Duration::seconds(6)).unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);
}

#[test]
fn test_forced_drain_ignores_backoff() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let reconciler = Reconciler::new(&remote, policy());
    let now = Utc::now();
    reconciler.drain(&mut pool, now).unwrap();
    remote.set_offline(false);

    let report = reconciler.drain_forced(&mut pool, now).unwrap();
    assert_eq!(report.synced, 1);
    assert!(remote.get(Table::Trips, "t1").is_some());
}

#[test]
fn test_failure_holds_later_entries_of_same_record() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 300.0)).unwrap();
    let mut t1 = trip("t1", 1000.0);
    t1.agreed_price = 1100.0;
    MutationLogic::update(&mut pool, t1).unwrap();

    remote.fail_for("t1");
    let reconciler = Reconciler::new(&remote, policy());
    let now = Utc::now();
    let report = reconciler.drain(&mut pool, now).unwrap();

    // t1 insert fails, t1 update is held back, t2 goes through
    assert_eq!(report.attempted, 2);
    assert_eq!(report.synced, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.deferred, 1);

    let pending = queue::list_pending(&pool.conn).unwrap();
    let actions: Vec<SyncAction> = pending.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![SyncAction::Insert, SyncAction::Update]);
    assert_eq!(pending[1].attempts, 0);

    remote.heal("t1");
    let report = reconciler.drain(&mut pool, now + Duration::seconds(10)).unwrap();
    assert_eq!(report.synced, 2);
    assert_eq!(
        remote.calls(),
        vec!["insert trips/t2", "insert trips/t1", "update trips/t1"]
    );
    assert_eq!(remote.get(Table::Trips, "t1").unwrap()["agreed_price"], 1100.0);
}

#[test]
fn test_row_stays_pending_while_newer_entry_waits() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let reconciler = Reconciler::new(&remote, policy());
    reconciler.drain(&mut pool, Utc::now()).unwrap();
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Synced)
    );

    let mut t1 = trip("t1", 1000.0);
    t1.agreed_price = 900.0;
    MutationLogic::update(&mut pool, t1).unwrap();
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Pending)
    );
}

#[test]
fn test_delete_reaches_remote() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    let reconciler = Reconciler::new(&remote, policy());

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    reconciler.drain(&mut pool, Utc::now()).unwrap();
    assert_eq!(remote.len(Table::Trips), 1);

    MutationLogic::delete(&mut pool, Table::Trips, "t1").unwrap();
    reconciler.drain(&mut pool, Utc::now()).unwrap();

    assert_eq!(remote.len(Table::Trips), 0);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);
}

#[test]
fn test_entries_are_never_dropped() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    remote.set_offline(true);
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let reconciler = Reconciler::new(&remote, policy());
    let now = clock();
    for _ in 0..8 {
        reconciler.drain_forced(&mut pool, now).unwrap();
    }

    let pending = queue::list_pending(&pool.conn).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].attempts, 8);
    assert_eq!(pending[0].next_attempt_at, Some(now + Duration::seconds(640)));
}

#[test]
fn test_retry_policy_is_bounded_exponential() {
    let p = policy();
    assert_eq!(p.delay_for(1), Duration::seconds(5));
    assert_eq!(p.delay_for(2), Duration::seconds(10));
    assert_eq!(p.delay_for(3), Duration::seconds(20));
    assert_eq!(p.delay_for(8), Duration::seconds(640));
    assert_eq!(p.delay_for(9), Duration::seconds(900));
    assert_eq!(p.delay_for(40), Duration::seconds(900));
}

#[test]
fn test_rehearse_leaves_queue_untouched() {
    let mut pool = memory_pool();
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 200.0)).unwrap();

    let remote = MemoryRemote::new();
    let report = Reconciler::new(&remote, policy())
        .rehearse(&pool.conn)
        .unwrap();

    assert_eq!(report.synced, 2);
    assert_eq!(remote.len(Table::Trips), 2);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 2);
    assert_eq!(
        store::sync_state(&pool.conn, Table::Trips, "t1").unwrap(),
        Some(SyncStatus::Pending)
    );
}

#[test]
fn test_scheduler_is_single_flight() {
    let scheduler = SyncScheduler::new();

    let outer = scheduler
        .trigger(Trigger::Manual, || {
            assert!(scheduler.is_running());
            let inner = scheduler
                .trigger(Trigger::Connectivity, || Ok(SyncReport::default()))
                .unwrap();
            assert_eq!(inner, DrainOutcome::AlreadyRunning);
            Ok(SyncReport {
                attempted: 1,
                synced: 1,
                ..SyncReport::default()
            })
        })
        .unwrap();

    assert!(matches!(outer, DrainOutcome::Completed(r) if r.synced == 1));
    assert!(!scheduler.is_running());

    // guard released: the next trigger runs
    let again = scheduler
        .trigger(Trigger::Periodic, || Ok(SyncReport::default()))
        .unwrap();
    assert_eq!(again, DrainOutcome::Completed(SyncReport::default()));
}

#[test]
fn test_scheduler_releases_guard_on_error() {
    let scheduler = SyncScheduler::new();
    let result = scheduler.trigger(Trigger::Manual, || {
        Err(fleetlog::errors::AppError::Other("disk full".into()))
    });
    assert!(result.is_err());
    assert!(!scheduler.is_running());
}

#[test]
fn test_entries_enqueued_during_drain_wait_for_next_pass() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    let reconciler = Reconciler::new(&remote, policy());

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    let report = reconciler.drain(&mut pool, Utc::now()).unwrap();
    MutationLogic::insert(&mut pool, trip("t2", 400.0)).unwrap();

    assert_eq!(report.synced, 1);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 1);

    let report = reconciler.drain(&mut pool, Utc::now()).unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(remote.len(Table::Trips), 2);
}

#[test]
fn test_report_all_failed() {
    let offline = SyncReport {
        attempted: 3,
        failed: 3,
        ..SyncReport::default()
    };
    assert!(offline.all_failed());

    let partial = SyncReport {
        attempted: 3,
        synced: 1,
        failed: 2,
        ..SyncReport::default()
    };
    assert!(!partial.all_failed());
    assert!(!SyncReport::default().all_failed());
}

#[test]
fn test_connectivity_regain_triggers_pass() {
    let remote = MemoryRemote::new();
    remote.set_offline(true);

    let trigger = thread::scope(|s| {
        s.spawn(|| {
            thread::sleep(StdDuration::from_millis(50));
            remote.set_offline(false);
        });
        wait_for_connectivity(&remote, StdDuration::from_secs(10), StdDuration::from_millis(10))
    });

    assert_eq!(trigger, Trigger::Connectivity);
}

#[test]
fn test_no_connectivity_trigger_without_outage() {
    let remote = MemoryRemote::new();
    let trigger =
        wait_for_connectivity(&remote, StdDuration::from_millis(20), StdDuration::from_millis(5));
    assert_eq!(trigger, Trigger::Periodic);

    remote.set_offline(true);
    let trigger =
        wait_for_connectivity(&remote, StdDuration::from_millis(30), StdDuration::from_millis(10));
    assert_eq!(trigger, Trigger::Periodic);
}

#[test]
fn test_connectivity_pass_retries_entries_in_backoff() {
    let mut pool = memory_pool();
    let remote = MemoryRemote::new();
    let scheduler = SyncScheduler::new();
    remote.set_offline(true);
    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();

    let reconciler = Reconciler::new(&remote, policy());
    let now = clock();
    let first = reconciler.drain(&mut pool, now).unwrap();
    assert!(first.all_failed());

    remote.set_offline(false);
    let outcome = scheduler
        .trigger(Trigger::Connectivity, || reconciler.drain_forced(&mut pool, now))
        .unwrap();

    assert!(matches!(outcome, DrainOutcome::Completed(r) if r.synced == 1));
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);
}
