//! Unit-of-work helper.
//!
//! All mutating engine operations funnel through [`with_uow`], which wraps
//! the closure in a single SQLite transaction. The transaction begins with
//! `IMMEDIATE` behavior so the write lock is taken up front. Concurrent
//! writers queue on the busy handler instead of interleaving, which makes
//! read-then-write sequences such as the time-log overlap check behave
//! serializably.

use dayflow_core::EngineError;
use dayflow_store::ConnectionPool;
use rusqlite::{Transaction, TransactionBehavior};

/// Run `f` inside a single transaction on a pooled connection.
///
/// Commits when the closure returns `Ok`; any error rolls the whole
/// transaction back when the [`Transaction`] handle drops.
pub fn with_uow<T>(
    pool: &ConnectionPool,
    f: impl FnOnce(&Transaction<'_>) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let conn = pool.get()?;
    let tx = Transaction::new_unchecked(&conn, TransactionBehavior::Immediate)?;
    let out = f(&tx)?;
    tx.commit()?;
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
