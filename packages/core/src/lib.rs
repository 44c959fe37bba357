//! BlockGraph Core Persistence Layer
//!
//! This crate persists a very large region-adjacency graph in a shared
//! store and lets many independent workers - each bound to a disjoint
//! axis-aligned 3D region - extract a locally relevant slice and write back
//! newly computed nodes and edges exactly once, without coordination.
//!
//! # Architecture
//!
//! - **Canonical edges**: every undirected edge is stored as `(u, v)` with
//!   `u = min(u, v)`, so querying by `u` alone recovers all edges incident
//!   to a node set
//! - **Ownership rule**: an edge is written only by the region containing
//!   its lower-id endpoint; a space-tiling region assignment makes writes
//!   collision-free with zero coordination
//! - **Uniqueness indices as the only concurrency primitive**: an ownership
//!   violation surfaces as an observable duplicate-key conflict, never as
//!   silent duplication
//! - **Scoped connections**: one connection per top-level call, released on
//!   every exit path
//!
//! # Modules
//!
//! - [`models`] - Domain types (Node, EdgeKey, Region)
//! - [`db`] - Store access layer, schema management, error types
//! - [`graph`] - GraphProvider extraction and SubGraph write-back

pub mod db;
pub mod graph;
pub mod models;

// Re-export commonly used types
pub use db::{AccessMode, EdgeRecord, GraphError, NodeRecord};
pub use graph::{region_owns_edge, GraphProvider, SubGraph};
pub use models::{Attributes, EdgeKey, Node, NodeId, Point3, Region};
