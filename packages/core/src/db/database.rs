//! Store Access Layer
//!
//! This module provides the binding to one logical graph database and the
//! SQL paths used by extraction and write-back. A [`DatabaseService`] holds
//! no open connection: every top-level operation (extract, each sync call,
//! schema setup) acquires a fresh connection via [`DatabaseService::connect`]
//! and releases it when the call returns, on every exit path. This replaces
//! the single shared, ambiently reused client of earlier designs.
//!
//! One logical database is one libsql file `<name>.db` inside the store root
//! directory.
//!
//! # Batch insert semantics
//!
//! Inserts are unordered: records are written one by one inside the scoped
//! connection, a unique-constraint failure on one record never blocks the
//! others, and every conflicting record is collected and reported through
//! [`GraphError::DuplicateKey`]. Partial success is a normal outcome - the
//! caller learns exactly which records were already present. Any other store
//! error aborts the batch and passes through unmodified.

use crate::db::error::GraphError;
use crate::models::{Attributes, NodeId, Point3, Region};
use libsql::{Builder, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on ids formatted into one membership query, below SQLite's
/// statement-length limits with comfortable margin.
const MEMBERSHIP_CHUNK: usize = 500;

/// Access mode a database was opened under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Queries only; never creates schema or mutates the store.
    ReadOnly,
    /// Queries and sync writes; creates schema if the database is new.
    ReadWrite,
    /// Drops the named database on open, then recreates schema. Destructive.
    Reset,
}

impl AccessMode {
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// Persisted node row. `Stub` nodes are never persisted, so position fields
/// are always present. Attributes are flattened so the serialized form is
/// `{id, center_z, center_y, center_x, <attr>: <value>, ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub center_z: f64,
    pub center_y: f64,
    pub center_x: f64,
    #[serde(flatten)]
    pub attrs: Attributes,
}

impl NodeRecord {
    pub fn center(&self) -> Point3 {
        Point3::new(self.center_z, self.center_y, self.center_x)
    }
}

/// Persisted edge row, always canonically oriented (`u < v` for distinct
/// endpoints).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub u: NodeId,
    pub v: NodeId,
    #[serde(flatten)]
    pub attrs: Attributes,
}

/// Binding to one logical graph database: store root, database name, and
/// the access mode it was opened under.
///
/// Cheap to clone; cloning copies the binding, never a connection.
#[derive(Debug, Clone)]
pub struct DatabaseService {
    root: PathBuf,
    db_name: String,
    mode: AccessMode,
}

impl DatabaseService {
    pub(crate) fn new(root: PathBuf, db_name: String, mode: AccessMode) -> Self {
        Self {
            root,
            db_name,
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Path of the libsql file backing this logical database.
    pub fn db_path(&self) -> PathBuf {
        self.root.join(format!("{}.db", self.db_name))
    }

    /// Acquire a connection scoped to one top-level call.
    ///
    /// The connection is dropped (and thereby released) when the caller's
    /// scope ends, including on error paths. Sets a busy timeout so
    /// concurrent workers wait on the write lock instead of failing
    /// immediately.
    pub(crate) async fn connect(&self) -> Result<Connection, GraphError> {
        let path = self.db_path();
        let db = Builder::new_local(&path)
            .build()
            .await
            .map_err(|e| GraphError::connection_failed(path.clone(), e))?;
        let conn = db
            .connect()
            .map_err(|e| GraphError::connection_failed(path, e))?;
        execute_pragma(&conn, "PRAGMA busy_timeout = 5000").await?;
        Ok(conn)
    }

    /// Range-query all nodes whose center satisfies
    /// `begin <= coord < end` on every axis.
    pub(crate) async fn nodes_in_region(
        &self,
        conn: &Connection,
        region: &Region,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        tracing::debug!(region = ?region, "querying nodes");

        let (b, e) = (region.begin(), region.end());
        let mut stmt = conn
            .prepare(
                "SELECT id, center_z, center_y, center_x, attrs FROM nodes
                 WHERE center_z >= ? AND center_z < ?
                   AND center_y >= ? AND center_y < ?
                   AND center_x >= ? AND center_x < ?",
            )
            .await?;

        let mut rows = stmt.query((b[0], e[0], b[1], e[1], b[2], e[2])).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            let attrs_json: String = row.get(4)?;
            records.push(NodeRecord {
                id: row.get(0)?,
                center_z: row.get(1)?,
                center_y: row.get(2)?,
                center_x: row.get(3)?,
                attrs: serde_json::from_str(&attrs_json)?,
            });
        }

        tracing::debug!(count = records.len(), "found nodes");
        Ok(records)
    }

    /// Membership-query all edges whose canonical lower endpoint `u` is in
    /// `ids`. By the canonical-orientation invariant this recovers every
    /// edge incident to the id set without a second query on `v`.
    pub(crate) async fn edges_with_u_in(
        &self,
        conn: &Connection,
        ids: &[NodeId],
    ) -> Result<Vec<EdgeRecord>, GraphError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(count = ids.len(), "querying edges by lower endpoint");

        let mut records = Vec::new();
        for chunk in ids.chunks(MEMBERSHIP_CHUNK) {
            // Ids are integers; formatting them into the statement keeps the
            // membership list clear of the bound-parameter limit.
            let list = chunk
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("SELECT u, v, attrs FROM edges WHERE u IN ({})", list);

            let mut stmt = conn.prepare(&sql).await?;
            let mut rows = stmt.query(()).await?;
            while let Some(row) = rows.next().await? {
                let attrs_json: String = row.get(2)?;
                records.push(EdgeRecord {
                    u: row.get(0)?,
                    v: row.get(1)?,
                    attrs: serde_json::from_str(&attrs_json)?,
                });
            }
        }

        tracing::debug!(count = records.len(), "found edges");
        Ok(records)
    }

    /// Insert node records, unordered. Conflicting ids are collected and
    /// reported; the rest of the batch is still written.
    pub(crate) async fn insert_nodes(
        &self,
        conn: &Connection,
        records: &[NodeRecord],
    ) -> Result<(), GraphError> {
        let mut conflicts = Vec::new();
        for record in records {
            let attrs_json = serde_json::to_string(&record.attrs)?;
            let result = conn
                .execute(
                    "INSERT INTO nodes (id, center_z, center_y, center_x, attrs)
                     VALUES (?, ?, ?, ?, ?)",
                    (
                        record.id,
                        record.center_z,
                        record.center_y,
                        record.center_x,
                        attrs_json,
                    ),
                )
                .await;
            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    conflicts.push(serde_json::to_value(record)?);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            tracing::error!(
                count = conflicts.len(),
                "duplicate node ids rejected by uniqueness index"
            );
            Err(GraphError::duplicate_key("nodes", conflicts))
        }
    }

    /// Insert edge records, unordered, with the same conflict semantics as
    /// [`Self::insert_nodes`].
    pub(crate) async fn insert_edges(
        &self,
        conn: &Connection,
        records: &[EdgeRecord],
    ) -> Result<(), GraphError> {
        let mut conflicts = Vec::new();
        for record in records {
            let attrs_json = serde_json::to_string(&record.attrs)?;
            let result = conn
                .execute(
                    "INSERT INTO edges (u, v, attrs) VALUES (?, ?, ?)",
                    (record.u, record.v, attrs_json),
                )
                .await;
            match result {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => {
                    conflicts.push(serde_json::to_value(record)?);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            tracing::error!(
                count = conflicts.len(),
                "duplicate edge keys rejected by uniqueness index"
            );
            Err(GraphError::duplicate_key("edges", conflicts))
        }
    }
}

/// Execute a PRAGMA statement.
///
/// PRAGMA statements return rows, so query() must be used instead of
/// execute().
pub(crate) async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), GraphError> {
    let mut stmt = conn.prepare(pragma).await?;
    let _ = stmt.query(()).await?;
    Ok(())
}

/// Whether a store error is a uniqueness-index violation, as opposed to a
/// transport failure.
fn is_unique_violation(err: &libsql::Error) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}
