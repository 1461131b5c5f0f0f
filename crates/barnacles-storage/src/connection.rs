// SPDX-FileCopyrightText: 2026 Barnacles Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StoreConnection trait.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use barnacles_config::model::ConnectionConfig;
use barnacles_core::{
    BarnaclesError, ConnectionState, ExecutionOutcome, PersistenceRequest, StoreConnection,
    Target,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store connection.
///
/// Wraps a [`Database`] handle. The database is opened lazily on the first
/// call to [`SqliteConnection::initialize`]; until then the connection
/// reports [`ConnectionState::Connecting`] and refuses to execute.
pub struct SqliteConnection {
    config: ConnectionConfig,
    db: OnceCell<Database>,
    state: Mutex<ConnectionState>,
}

impl SqliteConnection {
    /// Create a new connection with the given configuration.
    ///
    /// The database is not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            state: Mutex::new(ConnectionState::Connecting),
        }
    }

    /// Open the database and create any missing target tables.
    ///
    /// On failure the connection moves to [`ConnectionState::Failed`].
    pub async fn initialize(&self, targets: &[Target]) -> Result<(), BarnaclesError> {
        if self.db.initialized() {
            return Err(BarnaclesError::storage(std::io::Error::other(
                "connection already initialized",
            )));
        }

        match self.open_with_tables(targets).await {
            Ok(db) => {
                self.db.set(db).map_err(|_| {
                    BarnaclesError::Internal("connection initialized concurrently".into())
                })?;
                self.set_state(ConnectionState::Ready);
                debug!(path = %self.config.database_path, "SQLite connection initialized");
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn open_with_tables(&self, targets: &[Target]) -> Result<Database, BarnaclesError> {
        let db = Database::open(&self.config).await?;
        for target in targets {
            db.ensure_table(target).await?;
        }
        Ok(db)
    }

    /// Rows stored for `target`, oldest first.
    pub async fn stored_rows(
        &self,
        target: &Target,
    ) -> Result<Vec<queries::events::StoredRow>, BarnaclesError> {
        queries::events::list_rows(self.db()?, target).await
    }

    fn db(&self) -> Result<&Database, BarnaclesError> {
        self.db.get().ok_or(BarnaclesError::ConnectionNotReady {
            state: self.state(),
        })
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

#[async_trait]
impl StoreConnection for SqliteConnection {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn execute(
        &self,
        request: &PersistenceRequest,
    ) -> Result<ExecutionOutcome, BarnaclesError> {
        let state = self.state();
        if !state.is_ready() {
            return Err(BarnaclesError::ConnectionNotReady { state });
        }
        let store_id =
            queries::events::insert_payload(self.db()?, &request.statement, &request.payload)
                .await?;
        Ok(ExecutionOutcome { store_id })
    }

    async fn close(&self) -> Result<(), BarnaclesError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("WAL checkpoint complete");
        }
        self.set_state(ConnectionState::Closed);
        Ok(())
    }
}

/// Build a connection from parameters and initialize it, logging the outcome.
///
/// A failed open is reported but not returned as an error: the connection
/// stays in [`ConnectionState::Failed`] and every submitted request will be
/// dropped as not-ready.
pub async fn connect(config: ConnectionConfig, targets: &[Target]) -> SqliteConnection {
    let connection = SqliteConnection::new(config);
    match connection.initialize(targets).await {
        Ok(()) => info!(
            path = %connection.config.database_path,
            "database connection successful"
        ),
        Err(e) => error!(
            path = %connection.config.database_path,
            error = %e,
            "database connection failed"
        ),
    }
    connection
}
