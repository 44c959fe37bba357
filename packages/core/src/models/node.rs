//! Node Data Structures
//!
//! A node in the shared region-adjacency graph is a spatially located entity
//! with an open attribute map. Nodes come in two shapes:
//!
//! - **Full**: located by a range query or created by the caller; carries a
//!   center position and attributes.
//! - **Stub**: known by identity only. Stubs enter a subgraph as endpoints of
//!   edges leaving the queried region. They carry no position, are never
//!   persisted, and never pass a spatial containment test.
//!
//! # Examples
//!
//! ```rust
//! use blockgraph_core::models::{Node, Point3};
//! use serde_json::json;
//!
//! let mut attrs = serde_json::Map::new();
//! attrs.insert("score".to_string(), json!(0.9));
//!
//! let node = Node::full(42, Point3::new(1.0, 2.0, 3.0), attrs);
//! assert_eq!(node.id(), 42);
//! assert!(!node.is_stub());
//! ```

use serde::{Deserialize, Serialize};

/// Globally unique node identifier, assigned by the producing pipeline.
pub type NodeId = i64;

/// Open attribute map attached to nodes and edges.
///
/// Attribute values are arbitrary JSON; the store persists them opaquely.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// 3D position in `(z, y, x)` order, matching the persisted
/// `center_z`/`center_y`/`center_x` field order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3 {
    pub z: f64,
    pub y: f64,
    pub x: f64,
}

impl Point3 {
    pub fn new(z: f64, y: f64, x: f64) -> Self {
        Self { z, y, x }
    }
}

/// A graph node: either fully located or an identity-only stub.
///
/// Every spatial test must pattern-match on the variant; a `Stub` has no
/// position and containment fails closed for it. Position is never inferred
/// from context.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A located node with center position and attributes.
    Full {
        id: NodeId,
        center: Point3,
        attrs: Attributes,
    },
    /// An endpoint outside the queried region, pulled in purely as an
    /// anchor. Never persisted.
    Stub { id: NodeId },
}

impl Node {
    /// Create a located node.
    pub fn full(id: NodeId, center: Point3, attrs: Attributes) -> Self {
        Self::Full { id, center, attrs }
    }

    /// Create an identity-only stub.
    pub fn stub(id: NodeId) -> Self {
        Self::Stub { id }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Self::Full { id, .. } | Self::Stub { id } => *id,
        }
    }

    /// Center position, `None` for stubs.
    pub fn center(&self) -> Option<&Point3> {
        match self {
            Self::Full { center, .. } => Some(center),
            Self::Stub { .. } => None,
        }
    }

    /// Attributes, `None` for stubs.
    pub fn attrs(&self) -> Option<&Attributes> {
        match self {
            Self::Full { attrs, .. } => Some(attrs),
            Self::Stub { .. } => None,
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(self, Self::Stub { .. })
    }
}
