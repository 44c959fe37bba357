//! Data Model Layer
//!
//! Domain types shared by extraction and write-back:
//!
//! - [`node`] - Node identity, position, and the located/stub split
//! - [`edge`] - Canonically oriented edge keys
//! - [`region`] - Axis-aligned half-open query regions

pub mod edge;
pub mod node;
pub mod region;

pub use edge::EdgeKey;
pub use node::{Attributes, Node, NodeId, Point3};
pub use region::Region;
