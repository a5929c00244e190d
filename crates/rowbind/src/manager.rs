//! Connection manager.
//!
//! Opens connections through a [`Driver`], hands out numeric ids for them and
//! creates [`Session`]s on demand. Every session created from one id shares
//! that connection and its transaction registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rowbind_core::{ConnectConfig, Connection, Driver, Error, Result, SessionConfig};
use rowbind_session::{Session, SharedConnection};

/// Identifies a connection opened by a [`Manager`].
pub type ConnectionId = u64;

struct Managed<C> {
    shared: Arc<SharedConnection<C>>,
    config: SessionConfig,
}

/// Owns the connections opened through one driver.
pub struct Manager<D: Driver> {
    driver: D,
    next_id: AtomicU64,
    connections: Mutex<HashMap<ConnectionId, Managed<D::Connection>>>,
}

impl<D: Driver> Manager<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    fn connections(&self) -> MutexGuard<'_, HashMap<ConnectionId, Managed<D::Connection>>> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a connection and return its id.
    #[tracing::instrument(level = "debug", skip(self, config))]
    pub fn connect(&self, config: &ConnectConfig) -> Result<ConnectionId> {
        let connection = self.driver.connect(config)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections().insert(id, Managed {
            shared: Arc::new(SharedConnection::new(connection)),
            config: config.session_config(),
        });
        tracing::info!(id, dsn = %config.redacted_dsn(), "Connected");
        Ok(id)
    }

    /// Open a connection from individual parameters. An empty password
    /// connects without one.
    pub fn connect_with(
        &self,
        host: &str,
        port: u16,
        user: &str,
        password: &str,
        database: &str,
    ) -> Result<ConnectionId> {
        let mut config = ConnectConfig::new()
            .host(host)
            .port(port)
            .user(user)
            .database(database);
        if !password.is_empty() {
            config = config.password(password);
        }
        self.connect(&config)
    }

    /// Create a session on the connection `id`.
    pub fn create(&self, id: ConnectionId) -> Result<Session<D::Connection>> {
        let connections = self.connections();
        let managed = connections.get(&id).ok_or(Error::UnknownConnection(id))?;
        Ok(Session::with_shared(
            Arc::clone(&managed.shared),
            managed.config,
        ))
    }

    /// Close the connection `id` and forget it.
    pub fn close(&self, id: ConnectionId) -> Result<()> {
        let managed = self
            .connections()
            .remove(&id)
            .ok_or(Error::UnknownConnection(id))?;
        managed.shared.connection().close()?;
        tracing::info!(id, "Connection closed");
        Ok(())
    }

    /// Close and forget every connection.
    ///
    /// All connections are attempted; the first failure is returned.
    /// Sessions still holding a closed connection fail on their next call.
    pub fn close_all(&self) -> Result<()> {
        let drained: Vec<_> = self.connections().drain().collect();
        let mut first_error = None;
        for (id, managed) in drained {
            match managed.shared.connection().close() {
                Ok(()) => tracing::info!(id, "Connection closed"),
                Err(e) => {
                    tracing::warn!(id, error = %e, "Failed to close connection");
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub fn len(&self) -> usize {
        self.connections().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections().is_empty()
    }
}

impl<D: Driver> std::fmt::Debug for Manager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.connections().keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("Manager").field("connections", &ids).finish()
    }
}

/// Open one connection and return a session on it, without a manager.
///
/// The connection is closed by dropping every session that uses it.
pub fn fast_create<D: Driver>(driver: D, config: &ConnectConfig) -> Result<Session<D::Connection>> {
    let connection = driver.connect(config)?;
    tracing::info!(dsn = %config.redacted_dsn(), "Connected");
    Ok(Session::with_shared(
        Arc::new(SharedConnection::new(connection)),
        config.session_config(),
    ))
}
