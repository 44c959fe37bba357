//! Graph Layer
//!
//! The region-scoped extraction protocol and the ownership-based write-back
//! protocol:
//!
//! - [`GraphProvider`] - opens a shared graph database and extracts
//!   region-scoped subgraphs
//! - [`SubGraph`] - in-memory per-extraction view with `sync_nodes` /
//!   `sync_edges` write-back
//! - [`region_owns_edge`] - the pure ownership rule deciding which region
//!   writes an edge

mod provider;
mod subgraph;

pub use provider::GraphProvider;
pub use subgraph::{region_owns_edge, SubGraph};
