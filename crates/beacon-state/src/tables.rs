//! redb table definitions for the Beacon state store.

use redb::TableDefinition;

/// Service records keyed by numeric service id.
pub const SERVICES: TableDefinition<u64, &[u8]> = TableDefinition::new("services");

/// Store metadata (id counter) keyed by name.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Key in [`META`] holding the last id handed out.
pub const LAST_SERVICE_ID: &str = "last_service_id";
