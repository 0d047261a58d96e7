//! Remote store collaborator: the hosted backend the queue is drained into.

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::table::Table;
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Operations the reconciliation driver needs from the backend.
///
/// Every call is keyed by the record id, so replaying an entry after a lost
/// acknowledgement converges to the same remote state.
pub trait RemoteStore {
    fn insert(&self, table: Table, record: &Value) -> AppResult<()>;
    fn update(&self, table: Table, id: &str, patch: &Value) -> AppResult<()>;
    fn delete(&self, table: Table, id: &str) -> AppResult<()>;

    /// Whether the backend answers at all, whatever the status code.
    fn is_reachable(&self) -> bool;
}

/// PostgREST-style REST endpoint (`{base}/rest/v1/{table}`).
pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestRemote {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: std::time::Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(cfg: &Config) -> AppResult<Self> {
        let url = cfg
            .remote_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(AppError::RemoteNotConfigured)?;
        Self::new(url, cfg.remote_api_key.clone(), cfg.remote_timeout())
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request
                .header("apikey", key)
                .header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder, method: &str, table: Table) -> AppResult<()> {
        debug!("{method} {table}");
        let response = self.with_auth(request).send()?;
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        let body = match response.text() {
            Ok(b) => b,
            Err(e) => {
                debug!("{method} {table}: cannot read error body: {e}");
                format!("<unreadable body: {e}>")
            }
        };
        Err(AppError::RemoteStatus {
            status: status.as_u16(),
            body,
        })
    }
}

impl RemoteStore for RestRemote {
    fn insert(&self, table: Table, record: &Value) -> AppResult<()> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record);
        self.send(request, "POST", table)
    }

    fn update(&self, table: Table, id: &str, patch: &Value) -> AppResult<()> {
        let request = self
            .client
            .patch(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(patch);
        self.send(request, "PATCH", table)
    }

    fn delete(&self, table: Table, id: &str) -> AppResult<()> {
        let request = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", format!("eq.{id}"))]);
        self.send(request, "DELETE", table)
    }

    fn is_reachable(&self) -> bool {
        let request = self.client.head(format!("{}/rest/v1/", self.base_url));
        match self.with_auth(request).send() {
            Ok(_) => true,
            Err(e) => {
                debug!("remote not reachable: {e}");
                false
            }
        }
    }
}

/// In-process remote store. Used by `sync run --dry-run` and by the tests,
/// where it can be switched into failure mode globally or per record.
#[derive(Default)]
pub struct MemoryRemote {
    rows: Mutex<BTreeMap<(Table, String), Value>>,
    offline: Mutex<bool>,
    failing_ids: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        *lock(&self.offline) = offline;
    }

    /// Make calls touching this record id fail.
    pub fn fail_for(&self, id: &str) {
        lock(&self.failing_ids).insert(id.to_string());
    }

    pub fn heal(&self, id: &str) {
        lock(&self.failing_ids).remove(id);
    }

    pub fn get(&self, table: Table, id: &str) -> Option<Value> {
        lock(&self.rows).get(&(table, id.to_string())).cloned()
    }

    pub fn len(&self, table: Table) -> usize {
        lock(&self.rows).keys().filter(|(t, _)| *t == table).count()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.rows).is_empty()
    }

    /// Log of applied calls, e.g. `"insert trips/t1"`.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn check(&self, op: &str, table: Table, id: &str) -> AppResult<()> {
        if *lock(&self.offline) {
            return Err(AppError::Remote("network unreachable".into()));
        }
        if lock(&self.failing_ids).contains(id) {
            return Err(AppError::RemoteStatus {
                status: 503,
                body: format!("{op} {table}/{id} rejected"),
            });
        }
        lock(&self.calls).push(format!("{op} {table}/{id}"));
        Ok(())
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // un lock avvelenato significa solo che un test è andato in panic
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn record_id(record: &Value) -> AppResult<String> {
    record
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::Remote("record without id".into()))
}

impl RemoteStore for MemoryRemote {
    fn insert(&self, table: Table, record: &Value) -> AppResult<()> {
        let id = record_id(record)?;
        self.check("insert", table, &id)?;
        lock(&self.rows).insert((table, id), record.clone());
        Ok(())
    }

    fn update(&self, table: Table, id: &str, patch: &Value) -> AppResult<()> {
        self.check("update", table, id)?;
        let mut rows = lock(&self.rows);
        // come PostgREST: PATCH su una riga inesistente non modifica nulla
        if let Some(Value::Object(current)) = rows.get_mut(&(table, id.to_string()))
            && let Value::Object(fields) = patch
        {
            for (k, v) in fields {
                current.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    fn delete(&self, table: Table, id: &str) -> AppResult<()> {
        self.check("delete", table, id)?;
        if lock(&self.rows).remove(&(table, id.to_string())).is_some() {
            info!("memory remote: removed {table}/{id}");
        }
        Ok(())
    }

    fn is_reachable(&self) -> bool {
        !*lock(&self.offline)
    }
}
