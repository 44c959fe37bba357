//! SubGraph - Per-Extraction Graph View
//!
//! A [`SubGraph`] is the ephemeral, in-memory slice of the shared graph a
//! worker operates on. It is assembled by extraction, mutated/annotated by
//! the caller, and written back through [`SubGraph::sync_nodes`] and
//! [`SubGraph::sync_edges`]. It owns no persistent state but remembers the
//! store binding (target database and access mode) it was extracted from.
//!
//! # Ownership rule
//!
//! Every edge has exactly one canonical writer: the region containing the
//! center of its lower-id endpoint. `sync_edges(region)` writes only the
//! edges `region` owns. When the regions used for ownership decisions tile
//! the coordinate space without overlap, no two independently running
//! workers ever insert the same edge, with zero coordination. Overlapping or
//! gapped region assignment is a caller error that the store's uniqueness
//! index exposes as a duplicate-key conflict instead of silent duplication.

use crate::db::{AccessMode, DatabaseService, EdgeRecord, GraphError, NodeRecord};
use crate::models::{Attributes, EdgeKey, Node, NodeId, Point3, Region};
use std::collections::HashMap;

/// In-memory graph view bound to the store it was extracted from.
#[derive(Debug)]
pub struct SubGraph {
    db: DatabaseService,
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Attributes>,
}

impl SubGraph {
    pub(crate) fn new(db: DatabaseService) -> Self {
        Self {
            db,
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Access mode of the binding this subgraph was extracted from.
    pub fn mode(&self) -> AccessMode {
        self.db.mode()
    }

    /// Insert a located node, replacing any previous node (or stub) with the
    /// same id.
    pub fn add_node(&mut self, id: NodeId, center: Point3, attrs: Attributes) {
        self.nodes.insert(id, Node::full(id, center, attrs));
    }

    /// Insert the undirected edge `(a, b)` under its canonical orientation,
    /// replacing any previous attributes for the same edge. Endpoints not
    /// yet present are added as stubs.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, attrs: Attributes) -> EdgeKey {
        let key = EdgeKey::new(a, b);
        self.nodes.entry(key.u()).or_insert_with(|| Node::stub(key.u()));
        self.nodes.entry(key.v()).or_insert_with(|| Node::stub(key.v()));
        self.edges.insert(key, attrs);
        key
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edge(&self, key: &EdgeKey) -> Option<&Attributes> {
        self.edges.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeKey, &Attributes)> {
        self.edges.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn ensure_writable(&self) -> Result<(), GraphError> {
        if !self.db.mode().is_writable() {
            return Err(GraphError::precondition(
                "cannot sync through a read-only binding",
            ));
        }
        Ok(())
    }

    /// Write all located nodes of this subgraph to the store.
    ///
    /// Stubs are never synced. An empty candidate set performs no store
    /// interaction. A duplicate id is fatal and surfaced with the offending
    /// records: node ids are globally unique and each node is synced by
    /// exactly one caller, so a conflict means two workers claimed the same
    /// node.
    pub async fn sync_nodes(&self) -> Result<(), GraphError> {
        self.ensure_writable()?;

        let records: Vec<NodeRecord> = self
            .nodes
            .values()
            .filter_map(|node| match node {
                Node::Full { id, center, attrs } => Some(NodeRecord {
                    id: *id,
                    center_z: center.z,
                    center_y: center.y,
                    center_x: center.x,
                    attrs: attrs.clone(),
                }),
                Node::Stub { .. } => None,
            })
            .collect();

        if records.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = records.len(), "writing nodes");

        let conn = self.db.connect().await?;
        self.db.insert_nodes(&conn, &records).await
    }

    /// Write the edges owned by `region` to the store.
    ///
    /// An edge is owned by `region` iff its lower-id endpoint is a located
    /// node whose center lies in `region`; edges whose lower endpoint is a
    /// stub or lies elsewhere are skipped - they belong to whichever region
    /// holds that endpoint. An empty owned set performs no store
    /// interaction. Duplicate edge keys are fatal and surfaced with the
    /// offending records.
    ///
    /// A subgraph stays usable after any number of sync calls.
    pub async fn sync_edges(&self, region: &Region) -> Result<(), GraphError> {
        self.ensure_writable()?;

        let records: Vec<EdgeRecord> = self
            .edges
            .iter()
            .filter(|(key, _)| {
                self.nodes
                    .get(&key.u())
                    .map_or(false, |min_node| region_owns_edge(min_node, region))
            })
            .map(|(key, attrs)| EdgeRecord {
                u: key.u(),
                v: key.v(),
                attrs: attrs.clone(),
            })
            .collect();

        if records.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = records.len(), region = ?region, "writing owned edges");

        let conn = self.db.connect().await?;
        self.db.insert_edges(&conn, &records).await
    }
}

/// The ownership rule: `region` is the canonical writer of an edge iff the
/// edge's lower-id endpoint is a located node whose center lies in `region`.
///
/// A stub endpoint fails closed: it was pulled in from outside the
/// extraction region, carries no position, and is therefore outside every
/// candidate region - ownership belongs to the worker whose region actually
/// holds it.
pub fn region_owns_edge(min_endpoint: &Node, region: &Region) -> bool {
    match min_endpoint {
        Node::Full { center, .. } => region.contains(center),
        Node::Stub { .. } => false,
    }
}
