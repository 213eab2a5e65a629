//! StateStore: redb-backed persistence for tracked services.
//!
//! Provides typed CRUD operations over service records plus the status
//! update the poller issues after each cycle. Values are JSON-serialized
//! into redb's `&[u8]` value columns. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SERVICES).map_err(map_err!(Table))?;
        txn.open_table(META).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Register a new service. The status starts as `Unknown`.
    pub fn create_service(&self, name: &str, url: &str) -> StateResult<Service> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let service;
        {
            let mut meta = txn.open_table(META).map_err(map_err!(Table))?;
            let id = meta
                .get(LAST_SERVICE_ID)
                .map_err(map_err!(Read))?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            meta.insert(LAST_SERVICE_ID, id).map_err(map_err!(Write))?;

            service = Service {
                id,
                name: name.to_string(),
                url: url.to_string(),
                status: ServiceStatus::Unknown,
                created_at: epoch_secs(),
            };
            let value = serde_json::to_vec(&service).map_err(map_err!(Serialize))?;
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            table
                .insert(id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = service.id, url = %service.url, "service created");
        Ok(service)
    }

    /// Get a service by id.
    pub fn get_service(&self, id: ServiceId) -> StateResult<Option<Service>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let service: Service =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(service))
            }
            None => Ok(None),
        }
    }

    /// List all services, ordered by id.
    pub fn list_services(&self) -> StateResult<Vec<Service>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let service: Service =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(service);
        }
        Ok(results)
    }

    /// Change a service's name and URL. Returns false if it doesn't exist.
    pub fn update_service(&self, id: ServiceId, name: &str, url: &str) -> StateResult<bool> {
        self.modify_service(id, |svc| {
            svc.name = name.to_string();
            svc.url = url.to_string();
        })
    }

    /// Record the latest probe status. Returns false if the service is gone.
    pub fn update_status(&self, id: ServiceId, status: ServiceStatus) -> StateResult<bool> {
        self.modify_service(id, |svc| svc.status = status)
    }

    /// Delete a service by id. Returns true if it existed.
    pub fn delete_service(&self, id: ServiceId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            existed = table.remove(id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, existed, "service deleted");
        Ok(existed)
    }

    /// Read-modify-write a single record inside one write transaction.
    fn modify_service(&self, id: ServiceId, f: impl FnOnce(&mut Service)) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let found;
        {
            let mut table = txn.open_table(SERVICES).map_err(map_err!(Table))?;
            let existing: Option<Service> = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    Some(serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?)
                }
                None => None,
            };
            found = existing.is_some();
            if let Some(mut service) = existing {
                f(&mut service);
                let value = serde_json::to_vec(&service).map_err(map_err!(Serialize))?;
                table
                    .insert(id, value.as_slice())
                    .map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(found)
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
