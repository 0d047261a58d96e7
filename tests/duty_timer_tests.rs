use chrono::{DateTime, Duration, Utc};
use fleetlog::core::duty::{ClearConfirmation, DutyLogic};
use fleetlog::core::mutation::MutationLogic;
use fleetlog::core::timer::{AlertKind, DutyLimits, DutyMode, DutyTimer, Severity};
use fleetlog::db::{queue, store};
use fleetlog::models::duty_log::{DutyKind, DutyLog};
use fleetlog::models::sync::SyncAction;
use fleetlog::models::table::Table;

mod common;
use common::{OWNER, RecordingNotifier, memory_pool, trip};

fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2030-03-04T06:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

// ------------------------------------------------
// Pure state machine
// ------------------------------------------------

#[test]
fn test_new_timer_is_idle() {
    let timer = DutyTimer::new(DutyLimits::default());
    assert_eq!(timer.mode, DutyMode::Idle);
    assert_eq!(timer.elapsed_secs(at(100)), 0);
    assert_eq!(timer.remaining_secs(at(100)), None);
}

#[test]
fn test_driving_limit_alert_fires_once() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, t0(), OWNER);

    assert!(timer.tick(at(19_799)).is_none());
    let alert = timer.tick(at(19_800)).expect("driving limit alert");
    assert_eq!(alert.kind, AlertKind::DrivingLimitReached);
    assert_eq!(alert.severity, Severity::Warning);
    assert!(alert.message.contains("05:30:00"));

    assert!(timer.tick(at(20_000)).is_none());
    // thresholds never change the mode
    assert_eq!(timer.mode, DutyMode::Driving);
}

#[test]
fn test_idle_driving_idle_after_limit() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, t0(), OWNER);

    let outcome = timer.transition(DutyMode::Idle, at(19_800), OWNER);

    let alert = outcome.alert.expect("alert delivered by the transition");
    assert_eq!(alert.kind, AlertKind::DrivingLimitReached);

    let log = outcome.log.expect("driving session logged");
    assert_eq!(log.kind, DutyKind::Driving);
    assert_eq!(log.duration_seconds, 19_800);
    assert_eq!(log.start_time, t0());
    assert_eq!(log.end_time, at(19_800));
    assert_eq!(timer.mode, DutyMode::Idle);
    assert_eq!(timer.started_at, None);
}

#[test]
fn test_driving_to_resting_after_ten_seconds() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, t0(), OWNER);

    let outcome = timer.transition(DutyMode::Resting, at(10), OWNER);
    assert!(outcome.changed);
    assert!(outcome.alert.is_none());

    let log = outcome.log.expect("driving session logged");
    assert_eq!(log.kind, DutyKind::Driving);
    assert_eq!(log.duration_seconds, 10);

    assert_eq!(timer.mode, DutyMode::Resting);
    assert_eq!(timer.started_at, Some(at(10)));
    assert_eq!(timer.elapsed_secs(at(10)), 0);
    assert!(!timer.driving_alert_fired);
    assert!(!timer.rest_alert_fired);
}

#[test]
fn test_rest_complete_alert() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Resting, t0(), OWNER);

    assert_eq!(timer.remaining_secs(at(800)), Some(1_000));
    let alert = timer.tick(at(1_800)).expect("rest complete");
    assert_eq!(alert.kind, AlertKind::RestComplete);
    assert_eq!(alert.severity, Severity::Info);
    assert_eq!(timer.remaining_secs(at(2_000)), Some(0));
}

#[test]
fn test_same_mode_request_is_noop() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, t0(), OWNER);

    let outcome = timer.transition(DutyMode::Driving, at(600), OWNER);
    assert!(!outcome.changed);
    assert!(outcome.log.is_none());
    assert_eq!(timer.started_at, Some(t0()));

    let mut idle = DutyTimer::new(DutyLimits::default());
    assert!(!idle.transition(DutyMode::Idle, t0(), OWNER).changed);
}

#[test]
fn test_sub_second_session_is_not_logged() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, t0(), OWNER);
    let outcome = timer.transition(DutyMode::Idle, t0() + Duration::milliseconds(400), OWNER);
    assert!(outcome.changed);
    assert!(outcome.log.is_none());
}

#[test]
fn test_clock_going_backwards_never_gives_negative_elapsed() {
    let mut timer = DutyTimer::new(DutyLimits::default());
    timer.transition(DutyMode::Driving, at(100), OWNER);
    assert_eq!(timer.elapsed_secs(t0()), 0);
    assert!(timer.tick(t0()).is_none());
}

#[test]
fn test_custom_limits() {
    let limits = DutyLimits {
        driving_limit_secs: 60,
        rest_target_secs: 30,
    };
    let mut timer = DutyTimer::new(limits);
    timer.transition(DutyMode::Driving, t0(), OWNER);
    assert!(timer.tick(at(60)).is_some());
}

// ------------------------------------------------
// Persisted timer
// ------------------------------------------------

#[test]
fn test_transition_persists_state_and_log() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, t0(), OWNER, &notifier).unwrap();
    let state = DutyLogic::load_state(&pool.conn, limits).unwrap();
    assert_eq!(state.mode, DutyMode::Driving);
    assert_eq!(state.started_at, Some(t0()));

    DutyLogic::transition(&mut pool, limits, DutyMode::Resting, at(10), OWNER, &notifier).unwrap();

    let logs: Vec<DutyLog> = store::all_records(&pool.conn).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].duration_seconds, 10);

    // the log went through the mutation path
    let pending = queue::list_pending(&pool.conn).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].table, Table::DutyLogs);
    assert_eq!(pending[0].action, SyncAction::Insert);
    assert_eq!(pending[0].record_id(), logs[0].id);

    assert!(notifier.alerts.borrow().is_empty());
}

#[test]
fn test_alert_delivered_once_across_tick_and_transition() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, t0(), OWNER, &notifier).unwrap();

    let (_, alert) = DutyLogic::tick(&mut pool, limits, at(19_800), &notifier).unwrap();
    assert!(alert.is_some());
    let (_, alert) = DutyLogic::tick(&mut pool, limits, at(19_900), &notifier).unwrap();
    assert!(alert.is_none());

    let outcome =
        DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(19_800), OWNER, &notifier)
            .unwrap();
    assert!(outcome.alert.is_none());

    let alerts = notifier.alerts.borrow();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::DrivingLimitReached);

    let logs = DutyLogic::logs(&pool.conn, OWNER, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].kind, DutyKind::Driving);
    assert_eq!(logs[0].duration_seconds, 19_800);
}

#[test]
fn test_same_mode_transition_writes_nothing() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    DutyLogic::transition(&mut pool, limits, DutyMode::Resting, t0(), OWNER, &notifier).unwrap();
    let outcome =
        DutyLogic::transition(&mut pool, limits, DutyMode::Resting, at(50), OWNER, &notifier)
            .unwrap();

    assert!(!outcome.changed);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);
    assert_eq!(
        DutyLogic::load_state(&pool.conn, limits).unwrap().started_at,
        Some(t0())
    );
}

#[test]
fn test_totals_per_kind() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, t0(), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Resting, at(3_600), OWNER, &notifier)
        .unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, at(5_400), OWNER, &notifier)
        .unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(7_200), OWNER, &notifier).unwrap();

    let logs = DutyLogic::logs(&pool.conn, OWNER, None).unwrap();
    assert_eq!(logs.len(), 3);
    let totals = DutyLogic::totals(&logs);
    assert_eq!(totals.driving_secs, 5_400);
    assert_eq!(totals.resting_secs, 1_800);
}

#[test]
fn test_clear_history_removes_duty_logs_only() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, t0(), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(120), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Resting, at(200), OWNER, &notifier)
        .unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(260), OWNER, &notifier).unwrap();

    let queued_before = queue::pending_count(&pool.conn).unwrap();
    assert_eq!(store::count(&pool.conn, Table::DutyLogs).unwrap(), 2);

    let removed =
        DutyLogic::clear_history(&mut pool, OWNER, None, ClearConfirmation::confirmed()).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(store::count(&pool.conn, Table::DutyLogs).unwrap(), 0);
    assert_eq!(store::count(&pool.conn, Table::Trips).unwrap(), 1);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), queued_before);
}

#[test]
fn test_clear_history_keeps_other_owners() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, t0(), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(30), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, at(40), "driver-2", &notifier)
        .unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(90), "driver-2", &notifier)
        .unwrap();

    let removed =
        DutyLogic::clear_history(&mut pool, OWNER, None, ClearConfirmation::confirmed()).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(DutyLogic::logs(&pool.conn, "driver-2", None).unwrap().len(), 1);
}

#[test]
fn test_persisted_session_keeps_sub_second_start() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();
    let start = t0() + Duration::milliseconds(700);

    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, start, OWNER, &notifier).unwrap();
    assert_eq!(
        DutyLogic::load_state(&pool.conn, limits).unwrap().started_at,
        Some(start)
    );

    // half a second: nothing persisted
    let outcome = DutyLogic::transition(
        &mut pool,
        limits,
        DutyMode::Idle,
        start + Duration::milliseconds(500),
        OWNER,
        &notifier,
    )
    .unwrap();
    assert!(outcome.changed);
    assert!(outcome.log.is_none());
    assert!(DutyLogic::logs(&pool.conn, OWNER, None).unwrap().is_empty());
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), 0);

    // 1.9 s: floored to one second, start kept exact
    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, start, OWNER, &notifier).unwrap();
    DutyLogic::transition(
        &mut pool,
        limits,
        DutyMode::Resting,
        start + Duration::milliseconds(1_900),
        OWNER,
        &notifier,
    )
    .unwrap();

    let logs = DutyLogic::logs(&pool.conn, OWNER, None).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].duration_seconds, 1);
    assert_eq!(logs[0].start_time, start);
    assert_eq!(logs[0].end_time, start + Duration::milliseconds(1_900));
}

#[test]
fn test_clear_history_of_sole_owner_empties_table() {
    let mut pool = memory_pool();
    let notifier = RecordingNotifier::default();
    let limits = DutyLimits::default();

    MutationLogic::insert(&mut pool, trip("t1", 1000.0)).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Resting, t0(), OWNER, &notifier).unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Driving, at(1_800), OWNER, &notifier)
        .unwrap();
    DutyLogic::transition(&mut pool, limits, DutyMode::Idle, at(2_400), OWNER, &notifier).unwrap();

    let queued_before = queue::pending_count(&pool.conn).unwrap();
    let removed =
        DutyLogic::clear_history(&mut pool, OWNER, None, ClearConfirmation::confirmed()).unwrap();

    assert_eq!(removed, 2);
    assert_eq!(store::count(&pool.conn, Table::DutyLogs).unwrap(), 0);
    assert_eq!(store::count(&pool.conn, Table::Trips).unwrap(), 1);
    assert_eq!(queue::pending_count(&pool.conn).unwrap(), queued_before);
}
