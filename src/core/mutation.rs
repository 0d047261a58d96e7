//! The only write path used by the command handlers: every change lands in
//! the local table and in the sync queue, atomically.

use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::queue;
use crate::errors::AppResult;
use crate::models::sync::Mutation;
use crate::models::table::{Record, Table};

pub struct MutationLogic;

impl MutationLogic {
    pub fn apply(pool: &mut DbPool, mutation: Mutation) -> AppResult<i64> {
        let op = mutation.action().to_db_str();
        let target = format!("{}/{}", mutation.table(), mutation.record_id());

        let queue_id = queue::enqueue(pool, mutation)?;
        ttlog_quiet(&pool.conn, op, &target, &format!("queued as #{queue_id}"));
        Ok(queue_id)
    }

    pub fn insert<R: Record>(pool: &mut DbPool, record: R) -> AppResult<i64> {
        Self::apply(pool, Mutation::Insert(record.into_payload()))
    }

    pub fn update<R: Record>(pool: &mut DbPool, record: R) -> AppResult<i64> {
        Self::apply(pool, Mutation::Update(record.into_payload()))
    }

    pub fn delete(pool: &mut DbPool, table: Table, id: &str) -> AppResult<i64> {
        Self::apply(
            pool,
            Mutation::Delete {
                table,
                id: id.to_string(),
            },
        )
    }
}
