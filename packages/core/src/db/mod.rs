//! Store Layer
//!
//! Everything that touches the backing store lives here:
//!
//! - Database binding and scoped connections ([`DatabaseService`])
//! - Record shapes and the unordered, conflict-reporting batch inserts
//! - Schema definition and teardown ([`SchemaManager`])
//! - Error types ([`GraphError`])
//!
//! Connections are acquired per top-level call and released on every exit
//! path; no connection is held across calls or shared ambiently.

mod database;
mod error;
mod schema;

pub use database::{AccessMode, DatabaseService, EdgeRecord, NodeRecord};
pub use error::GraphError;
pub use schema::SchemaManager;
