//! Serialized write access to the persistent store.
//!
//! Every mutating engine call runs "read current state, validate, write new state" inside a
//! [`WriteTxn`]: the process-wide write mutex plus a database transaction. Two mutations never
//! interleave, and a mutation that fails half way (or whose handle is simply dropped) is rolled
//! back as a whole. Reads that do not feed a mutation go straight to [`Store::connection`].

use crate::errors::Result;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Database connection plus the global mutation lock.
pub struct Store {
    database: DatabaseConnection,
    write_lock: Mutex<()>,
}

impl Store {
    /// Wraps an open database connection.
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self {
            database,
            write_lock: Mutex::new(()),
        }
    }

    /// Connection for plain reads.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.database
    }

    /// Waits for the write lock, then opens a transaction under it.
    pub async fn begin_write(&self) -> Result<WriteTxn<'_>> {
        let guard = self.write_lock.lock().await;
        trace!("Write lock acquired");
        let txn = self.database.begin().await?;
        Ok(WriteTxn { txn, guard })
    }
}

/// An open write: holds the lock until committed or dropped.
///
/// The transaction is declared first so that on drop it rolls back before the lock is released.
pub struct WriteTxn<'a> {
    txn: DatabaseTransaction,
    guard: MutexGuard<'a, ()>,
}

impl<'a> WriteTxn<'a> {
    /// Connection to run the reads and writes of this mutation on.
    #[must_use]
    pub const fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction, then releases the lock.
    pub async fn commit(self) -> Result<()> {
        let guard = self.commit_holding_lock().await?;
        drop(guard);
        trace!("Write committed, lock released");
        Ok(())
    }

    /// Commits the transaction but keeps the lock until the returned guard is dropped.
    ///
    /// For bookkeeping outside the database that must only happen once the write is durable, and
    /// must not race with the next mutation.
    pub async fn commit_holding_lock(self) -> Result<MutexGuard<'a, ()>> {
        let Self { txn, guard } = self;
        txn.commit().await?;
        Ok(guard)
    }
}
