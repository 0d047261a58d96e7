#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::NaiveDate;
use fleetlog::core::timer::{Alert, Notifier};
use fleetlog::db::pool::DbPool;
use fleetlog::models::trip::Trip;
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::PathBuf;

pub const OWNER: &str = "driver-1";

pub fn fleetlog() -> Command {
    cargo_bin_cmd!("fleetlog")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_fleetlog.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_fleetlog_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

/// `--test init` on a fresh DB (schema only, no config file written)
pub fn init_db(db_path: &str) {
    fleetlog()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

/// In-memory pool with the full schema, for library-level tests
pub fn memory_pool() -> DbPool {
    DbPool::in_memory().expect("in-memory db")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

/// Trip with a fixed id, 10% commission
pub fn trip(id: &str, price: f64) -> Trip {
    let mut t = Trip::new(
        "Milano",
        "Bologna",
        215.0,
        price,
        10.0,
        "pallets",
        date("2025-06-02"),
        OWNER,
    );
    t.id = id.to_string();
    t
}

/// Notifier that keeps every alert it receives
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: RefCell<Vec<Alert>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, alert: &Alert) {
        self.alerts.borrow_mut().push(alert.clone());
    }
}
