//! Schema Management
//!
//! Encapsulates the DDL this subsystem depends on and the only two
//! schema-mutating operations in the system: idempotent index creation and
//! whole-database drop.
//!
//! Three indices make extraction and write-back correct and efficient:
//!
//! - `position`: composite range index on `(center_z, center_y, center_x)`,
//!   serving the region range query.
//! - `id`: uniqueness index on `nodes.id` - node ids are globally unique.
//! - `incident`: uniqueness index on `edges(u, v)` - canonical edge keys are
//!   globally unique, and the leading `u` column serves the membership query
//!   on lower endpoints.

use crate::db::error::GraphError;
use libsql::Connection;
use std::path::Path;

pub struct SchemaManager;

impl SchemaManager {
    /// Create tables and indices. Idempotent: safe to call on every open.
    pub async fn setup(conn: &Connection) -> Result<(), GraphError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS nodes (
                id INTEGER NOT NULL,
                center_z REAL NOT NULL,
                center_y REAL NOT NULL,
                center_x REAL NOT NULL,
                attrs TEXT NOT NULL DEFAULT '{}'
            )",
            (),
        )
        .await?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS edges (
                u INTEGER NOT NULL,
                v INTEGER NOT NULL,
                attrs TEXT NOT NULL DEFAULT '{}'
            )",
            (),
        )
        .await?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS position
             ON nodes (center_z, center_y, center_x)",
            (),
        )
        .await?;

        conn.execute("CREATE UNIQUE INDEX IF NOT EXISTS id ON nodes (id)", ())
            .await?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS incident ON edges (u, v)",
            (),
        )
        .await?;

        Ok(())
    }

    /// Whether the named logical database exists under `root`.
    pub fn database_exists(root: &Path, db_name: &str) -> bool {
        root.join(format!("{}.db", db_name)).is_file()
    }

    /// Drop the named database: the backing file and its WAL/SHM siblings.
    /// Destructive and idempotent; dropping a database that does not exist
    /// is a no-op.
    pub fn drop_database(root: &Path, db_name: &str) -> Result<(), GraphError> {
        tracing::info!(db = %db_name, "dropping database");

        let base = root.join(format!("{}.db", db_name));
        for path in [
            base.clone(),
            base.with_extension("db-wal"),
            base.with_extension("db-shm"),
        ] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Names of all logical databases under `root`. A missing root directory
    /// holds no databases.
    pub fn list_database_names(root: &Path) -> Result<Vec<String>, GraphError> {
        let entries = match std::fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("db") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
