//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. Money is integer minor units.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Clients (tenant roots, global scope)
-- =======================================================================
DEFINE TABLE client SCHEMAFULL;
DEFINE FIELD name ON TABLE client TYPE string;
DEFINE FIELD slug ON TABLE client TYPE string;
DEFINE FIELD plan ON TABLE client TYPE string \
    ASSERT $value IN ['Starter', 'Standard', 'Premium'];
DEFINE FIELD status ON TABLE client TYPE string \
    ASSERT $value IN ['Trial', 'Active', 'PastDue', 'Suspended', \
    'Cancelled'];
DEFINE FIELD contact_email ON TABLE client TYPE string;
DEFINE FIELD currency ON TABLE client TYPE string;
DEFINE FIELD trial_ends_at ON TABLE client TYPE option<datetime>;
DEFINE FIELD current_period_end ON TABLE client TYPE option<datetime>;
DEFINE FIELD metadata ON TABLE client TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE client TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_client_slug ON TABLE client COLUMNS slug UNIQUE;

-- =======================================================================
-- Staff users (tenant scope)
-- =======================================================================
DEFINE TABLE staff_user SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE staff_user TYPE string;
DEFINE FIELD username ON TABLE staff_user TYPE string;
DEFINE FIELD display_name ON TABLE staff_user TYPE string;
DEFINE FIELD password_hash ON TABLE staff_user TYPE string;
DEFINE FIELD role ON TABLE staff_user TYPE string \
    ASSERT $value IN ['Owner', 'Manager', 'Cashier', 'Kitchen', \
    'Waiter'];
DEFINE FIELD status ON TABLE staff_user TYPE string \
    ASSERT $value IN ['Active', 'Suspended'];
DEFINE FIELD created_at ON TABLE staff_user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE staff_user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_staff_tenant_username ON TABLE staff_user \
    COLUMNS tenant_id, username UNIQUE;

-- =======================================================================
-- HQ operators (global scope)
-- =======================================================================
DEFINE TABLE hq_operator SCHEMAFULL;
DEFINE FIELD username ON TABLE hq_operator TYPE string;
DEFINE FIELD display_name ON TABLE hq_operator TYPE string;
DEFINE FIELD password_hash ON TABLE hq_operator TYPE string;
DEFINE FIELD status ON TABLE hq_operator TYPE string \
    ASSERT $value IN ['Active', 'Suspended'];
DEFINE FIELD created_at ON TABLE hq_operator TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE hq_operator TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_hq_operator_username ON TABLE hq_operator \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Sessions (tenant scope; HQ sessions use the nil tenant id)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE session TYPE string;
DEFINE FIELD user_id ON TABLE session TYPE string;
DEFINE FIELD refresh_token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS tenant_id, refresh_token_hash UNIQUE;
DEFINE INDEX idx_session_user ON TABLE session \
    COLUMNS tenant_id, user_id;

-- =======================================================================
-- Menu items (tenant scope)
-- =======================================================================
DEFINE TABLE menu_item SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE menu_item TYPE string;
DEFINE FIELD name ON TABLE menu_item TYPE string;
DEFINE FIELD description ON TABLE menu_item TYPE option<string>;
DEFINE FIELD category ON TABLE menu_item TYPE option<string>;
DEFINE FIELD price_cents ON TABLE menu_item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD available ON TABLE menu_item TYPE bool DEFAULT true;
DEFINE FIELD sort_order ON TABLE menu_item TYPE int DEFAULT 0;
DEFINE FIELD created_at ON TABLE menu_item TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE menu_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_menu_tenant ON TABLE menu_item COLUMNS tenant_id;

-- =======================================================================
-- Orders (tenant scope)
-- `order` is a reserved word in SurrealQL, hence the plural table name.
-- =======================================================================
DEFINE TABLE orders SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE orders TYPE string;
DEFINE FIELD table_label ON TABLE orders TYPE option<string>;
DEFINE FIELD status ON TABLE orders TYPE string \
    ASSERT $value IN ['Pending', 'Preparing', 'Ready', 'Served', \
    'Cancelled'];
DEFINE FIELD channel ON TABLE orders TYPE string \
    ASSERT $value IN ['Counter', 'SelfService'];
DEFINE FIELD placed_by ON TABLE orders TYPE option<string>;
DEFINE FIELD note ON TABLE orders TYPE option<string>;
DEFINE FIELD total_cents ON TABLE orders TYPE int ASSERT $value >= 0;
DEFINE FIELD created_at ON TABLE orders TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE orders TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_orders_tenant_status ON TABLE orders \
    COLUMNS tenant_id, status;
DEFINE INDEX idx_orders_tenant_created ON TABLE orders \
    COLUMNS tenant_id, created_at;

-- =======================================================================
-- Order items (tenant scope; name/price captured at placement)
-- =======================================================================
DEFINE TABLE order_item SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE order_item TYPE string;
DEFINE FIELD order_id ON TABLE order_item TYPE string;
DEFINE FIELD menu_item_id ON TABLE order_item TYPE string;
DEFINE FIELD name ON TABLE order_item TYPE string;
DEFINE FIELD quantity ON TABLE order_item TYPE int ASSERT $value >= 1;
DEFINE FIELD unit_price_cents ON TABLE order_item TYPE int \
    ASSERT $value >= 0;
DEFINE FIELD status ON TABLE order_item TYPE string \
    ASSERT $value IN ['Queued', 'Preparing', 'Ready', 'Served', \
    'Cancelled'];
DEFINE FIELD note ON TABLE order_item TYPE option<string>;
DEFINE FIELD created_at ON TABLE order_item TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE order_item TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_order_item_order ON TABLE order_item \
    COLUMNS tenant_id, order_id;

-- =======================================================================
-- Feedback (tenant scope, append-only)
-- =======================================================================
DEFINE TABLE feedback SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tenant_id ON TABLE feedback TYPE string;
DEFINE FIELD order_id ON TABLE feedback TYPE option<string>;
DEFINE FIELD rating ON TABLE feedback TYPE int \
    ASSERT $value >= 1 AND $value <= 5;
DEFINE FIELD comment ON TABLE feedback TYPE option<string>;
DEFINE FIELD created_at ON TABLE feedback TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_feedback_tenant_time ON TABLE feedback \
    COLUMNS tenant_id, created_at;

-- =======================================================================
-- Access codes (tenant scope)
-- =======================================================================
DEFINE TABLE access_code SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE access_code TYPE string;
DEFINE FIELD code ON TABLE access_code TYPE string;
DEFINE FIELD label ON TABLE access_code TYPE option<string>;
DEFINE FIELD max_uses ON TABLE access_code TYPE int ASSERT $value >= 1;
DEFINE FIELD use_count ON TABLE access_code TYPE int DEFAULT 0;
DEFINE FIELD revoked ON TABLE access_code TYPE bool DEFAULT false;
DEFINE FIELD expires_at ON TABLE access_code TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE access_code TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE access_code TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_code_tenant_code ON TABLE access_code \
    COLUMNS tenant_id, code UNIQUE;

-- =======================================================================
-- Subscription events (client scope, append-only)
-- =======================================================================
DEFINE TABLE subscription_event SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD client_id ON TABLE subscription_event TYPE string;
DEFINE FIELD kind ON TABLE subscription_event TYPE object FLEXIBLE;
DEFINE FIELD actor ON TABLE subscription_event TYPE option<string>;
DEFINE FIELD created_at ON TABLE subscription_event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_sub_event_client_time ON TABLE subscription_event \
    COLUMNS client_id, created_at;

-- =======================================================================
-- Entitlement snapshots (one row per tenant, record id = tenant id)
-- =======================================================================
DEFINE TABLE entitlement_snapshot SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE entitlement_snapshot TYPE string;
DEFINE FIELD plan ON TABLE entitlement_snapshot TYPE string \
    ASSERT $value IN ['Starter', 'Standard', 'Premium'];
DEFINE FIELD status ON TABLE entitlement_snapshot TYPE string \
    ASSERT $value IN ['Trial', 'Active', 'PastDue', 'Suspended', \
    'Cancelled'];
DEFINE FIELD refreshed_at ON TABLE entitlement_snapshot TYPE datetime;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_defines_every_domain_table() {
        for table in [
            "client",
            "staff_user",
            "hq_operator",
            "session",
            "menu_item",
            "orders",
            "order_item",
            "feedback",
            "access_code",
            "subscription_event",
            "entitlement_snapshot",
        ] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} ")),
                "missing table definition: {table}"
            );
        }
    }
}
