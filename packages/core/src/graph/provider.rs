//! Graph Provider
//!
//! Opens a shared graph database and serves region-scoped extractions. The
//! provider holds a store binding, never an open connection; each `open`,
//! `setup_schema`, and `extract` call acquires its own connection and
//! releases it on every exit path.
//!
//! # Examples
//!
//! ```rust,no_run
//! use blockgraph_core::db::AccessMode;
//! use blockgraph_core::graph::GraphProvider;
//! use blockgraph_core::models::Region;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider =
//!         GraphProvider::open("./data", "fragments", AccessMode::ReadWrite).await?;
//!
//!     let block = Region::cube(0.0, 100.0);
//!     let graph = provider.extract(&block).await?;
//!     println!("{} nodes, {} edges", graph.node_count(), graph.edge_count());
//!     Ok(())
//! }
//! ```

use crate::db::{AccessMode, DatabaseService, GraphError, SchemaManager};
use crate::graph::SubGraph;
use crate::models::{NodeId, Region};
use std::path::PathBuf;

/// Provider for one shared region-adjacency graph database.
#[derive(Debug)]
pub struct GraphProvider {
    db: DatabaseService,
}

impl GraphProvider {
    /// Open the named logical database under `root`.
    ///
    /// Mode semantics:
    ///
    /// - [`AccessMode::Reset`] drops the named database first - destructive,
    ///   no confirmation - then creates the schema.
    /// - [`AccessMode::ReadWrite`] creates the schema only if the database
    ///   does not yet exist.
    /// - [`AccessMode::ReadOnly`] never creates schema or mutates; opening a
    ///   database that does not exist fails with a precondition error.
    ///
    /// The connection used for schema setup is scoped to this call.
    pub async fn open(
        root: impl Into<PathBuf>,
        db_name: impl Into<String>,
        mode: AccessMode,
    ) -> Result<Self, GraphError> {
        let root = root.into();
        let db_name = db_name.into();
        let db = DatabaseService::new(root.clone(), db_name.clone(), mode);

        match mode {
            AccessMode::Reset => {
                std::fs::create_dir_all(&root)?;
                SchemaManager::drop_database(&root, &db_name)?;
                Self::apply_schema(&db).await?;
            }
            AccessMode::ReadWrite => {
                std::fs::create_dir_all(&root)?;
                if !SchemaManager::database_exists(&root, &db_name) {
                    Self::apply_schema(&db).await?;
                }
            }
            AccessMode::ReadOnly => {
                if !SchemaManager::database_exists(&root, &db_name) {
                    return Err(GraphError::precondition(format!(
                        "database '{}' does not exist and read-only mode never creates it",
                        db_name
                    )));
                }
            }
        }

        Ok(Self { db })
    }

    async fn apply_schema(db: &DatabaseService) -> Result<(), GraphError> {
        let conn = db.connect().await?;
        SchemaManager::setup(&conn).await
    }

    /// Re-apply the schema. Idempotent; fails with a precondition error on a
    /// read-only binding before any store call.
    pub async fn setup_schema(&self) -> Result<(), GraphError> {
        if !self.db.mode().is_writable() {
            return Err(GraphError::precondition(
                "cannot set up schema on a read-only binding",
            ));
        }
        Self::apply_schema(&self.db).await
    }

    pub fn db_name(&self) -> &str {
        self.db.db_name()
    }

    pub fn mode(&self) -> AccessMode {
        self.db.mode()
    }

    /// Names of all logical databases under this provider's store root.
    pub fn list_databases(&self) -> Result<Vec<String>, GraphError> {
        SchemaManager::list_database_names(self.db.root())
    }

    /// Extract the subgraph relevant to `region`.
    ///
    /// Returns every node whose center lies in the half-open `region`, every
    /// edge whose canonical lower endpoint is among those nodes, and a stub
    /// for each edge endpoint outside the fetched set. The returned
    /// [`SubGraph`] is bound to this provider's store identity and access
    /// mode.
    ///
    /// Never mutates the store. Fails with a precondition error - before
    /// any connection or query - if `region` is not 3-dimensional.
    pub async fn extract(&self, region: &Region) -> Result<SubGraph, GraphError> {
        if region.dims() != 3 {
            return Err(GraphError::precondition(format!(
                "extraction regions must be 3-dimensional, got {} dimension(s)",
                region.dims()
            )));
        }

        let node_records;
        let edge_records;
        {
            let conn = self.db.connect().await?;
            node_records = self.db.nodes_in_region(&conn, region).await?;
            let ids: Vec<NodeId> = node_records.iter().map(|r| r.id).collect();
            edge_records = self.db.edges_with_u_in(&conn, &ids).await?;
        }

        let mut graph = SubGraph::new(self.db.clone());
        for record in node_records {
            graph.add_node(record.id, record.center(), record.attrs);
        }
        for record in edge_records {
            // Endpoints outside the fetched node set become stubs.
            graph.add_edge(record.u, record.v, record.attrs);
        }

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "assembled subgraph"
        );
        Ok(graph)
    }
}
