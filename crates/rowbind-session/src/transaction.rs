//! Transaction Registry.
//!
//! Binds a begun transaction to the calling thread so that later statements
//! issued by that thread run inside it. One registry exists per connection
//! and is shared by every session created from it.
//!
//! The registry owns a gate that is held from `begin` until `commit` or
//! `rollback`: at most one transaction is in flight per connection, and a
//! `begin` from another thread blocks until the holder finishes. Sessions on
//! different connections never wait on each other.
//!
//! A transaction that is neither committed nor rolled back keeps the gate
//! closed and the driver transaction open. Finishing it is the caller's
//! responsibility; nothing recovers it automatically.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use rowbind_core::{Connection, Error, Result, Transaction};

/// Thread-keyed transaction bindings for one connection.
#[derive(Default)]
pub struct TransactionRegistry {
    /// The thread currently allowed to hold a transaction
    holder: Mutex<Option<ThreadId>>,
    released: Condvar,
    active: Mutex<HashMap<ThreadId, Arc<dyn Transaction>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TransactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction on `connection` for the calling thread.
    ///
    /// Blocks while another thread holds this connection's transaction.
    /// Fails with [`Error::TransactionAlreadyActive`] if the calling thread
    /// already holds it.
    pub fn begin(&self, connection: &dyn Connection) -> Result<()> {
        let me = thread::current().id();
        {
            let mut holder = lock(&self.holder);
            if *holder == Some(me) {
                return Err(Error::TransactionAlreadyActive);
            }
            while holder.is_some() {
                tracing::debug!("Waiting for the connection's transaction to finish");
                holder = self
                    .released
                    .wait(holder)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *holder = Some(me);
        }

        match connection.begin() {
            Ok(transaction) => {
                lock(&self.active).insert(me, Arc::from(transaction));
                tracing::info!(thread = ?me, "Transaction begun");
                Ok(())
            }
            Err(e) => {
                self.release(me);
                Err(Error::transaction("begin", e))
            }
        }
    }

    /// The transaction bound to the calling thread, if any.
    pub fn current(&self) -> Option<Arc<dyn Transaction>> {
        lock(&self.active).get(&thread::current().id()).cloned()
    }

    /// Whether the calling thread holds a transaction.
    pub fn is_active(&self) -> bool {
        lock(&self.active).contains_key(&thread::current().id())
    }

    pub fn commit(&self) -> Result<()> {
        self.finish("commit", |tx| tx.commit())
    }

    pub fn rollback(&self) -> Result<()> {
        self.finish("rollback", |tx| tx.rollback())
    }

    /// Remove the calling thread's registration, run `op` on it and release
    /// the gate whatever the driver reports.
    fn finish(
        &self,
        name: &'static str,
        op: impl FnOnce(&dyn Transaction) -> Result<()>,
    ) -> Result<()> {
        let me = thread::current().id();
        let transaction = lock(&self.active)
            .remove(&me)
            .ok_or(Error::NoActiveTransaction)?;

        let result = op(transaction.as_ref());
        self.release(me);

        match result {
            Ok(()) => {
                tracing::info!(thread = ?me, op = name, "Transaction finished");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(thread = ?me, op = name, error = %e, "Transaction failed to finish");
                Err(Error::transaction(name, e))
            }
        }
    }

    fn release(&self, me: ThreadId) {
        let mut holder = lock(&self.holder);
        if *holder == Some(me) {
            *holder = None;
            self.released.notify_one();
        }
    }
}

impl std::fmt::Debug for TransactionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionRegistry")
            .field("holder", &*lock(&self.holder))
            .field("active", &lock(&self.active).len())
            .finish()
    }
}
