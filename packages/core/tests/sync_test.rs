//! Integration tests for ownership-based write-back
//!
//! Tests cover:
//! - The two-worker tiling scenario (each edge written exactly once)
//! - Partition exclusivity and union coverage over a tiling
//! - Duplicate-key conflicts: fatal, detailed, and partial-success aware
//! - Read-only enforcement before any store mutation

use anyhow::Result;
use blockgraph_core::{
    AccessMode, Attributes, GraphError, GraphProvider, Point3, Region,
};
use serde_json::json;
use tempfile::TempDir;

fn attrs(pairs: &[(&str, serde_json::Value)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn two_workers_on_a_tiling_write_each_edge_once() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;

    // Seed the node set: 3 in worker 1's block, 7 in worker 2's.
    let mut seed = provider.extract(&Region::cube(0.0, 10.0)).await?;
    seed.add_node(3, Point3::new(1.0, 1.0, 1.0), Attributes::new());
    seed.add_node(7, Point3::new(7.0, 7.0, 7.0), Attributes::new());
    seed.sync_nodes().await?;

    let tile_1 = Region::cube(0.0, 5.0);
    let tile_2 = Region::cube(5.0, 10.0);

    // Both workers independently compute the boundary edge (3,7).
    let mut worker_1 = provider.extract(&tile_1).await?;
    worker_1.add_edge(3, 7, attrs(&[("score", json!(0.8))]));

    let mut worker_2 = provider.extract(&tile_2).await?;
    worker_2.add_edge(3, 7, attrs(&[("score", json!(0.8))]));

    // Worker 1 owns the edge (node 3 is full and inside tile 1); worker 2
    // sees node 3 only as a stub and must skip it. Order does not matter.
    worker_2.sync_edges(&tile_2).await?;
    worker_1.sync_edges(&tile_1).await?;

    let graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
    assert_eq!(graph.edge_count(), 1);

    // Write-once: replaying the owning worker's sync now conflicts.
    let err = worker_1.sync_edges(&tile_1).await.unwrap_err();
    assert!(err.is_duplicate_key());

    Ok(())
}

#[tokio::test]
async fn tiling_partition_covers_exactly_the_full_edge_set() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;

    let mut seed = provider.extract(&Region::cube(0.0, 10.0)).await?;
    for (id, coord) in [(1, 1.0), (2, 2.0), (6, 6.0), (8, 8.0)] {
        seed.add_node(id, Point3::new(coord, coord, coord), Attributes::new());
    }
    seed.sync_nodes().await?;

    let tiles = [Region::cube(0.0, 5.0), Region::cube(5.0, 10.0)];
    let all_edges = [(1, 2), (2, 6), (6, 8)];

    // Every worker redundantly computes every edge; the ownership rule must
    // still hand each edge to exactly one of them.
    for tile in &tiles {
        let mut worker = provider.extract(tile).await?;
        for (a, b) in all_edges {
            worker.add_edge(a, b, Attributes::new());
        }
        worker.sync_edges(tile).await?;
    }

    let graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
    let mut keys: Vec<(i64, i64)> = graph.edges().map(|(k, _)| (k.u(), k.v())).collect();
    keys.sort();
    assert_eq!(keys, vec![(1, 2), (2, 6), (6, 8)]);

    Ok(())
}

#[tokio::test]
async fn duplicate_node_id_is_fatal_and_reports_the_offender() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;

    let mut first = provider.extract(&Region::cube(0.0, 10.0)).await?;
    first.add_node(1, Point3::new(1.0, 1.0, 1.0), Attributes::new());
    first.add_node(2, Point3::new(2.0, 2.0, 2.0), Attributes::new());
    first.sync_nodes().await?;

    // A second caller claims node 2 again, plus a fresh node 3.
    let mut second = provider.extract(&Region::cube(0.0, 10.0)).await?;
    second.add_node(2, Point3::new(2.0, 2.0, 2.0), Attributes::new());
    second.add_node(3, Point3::new(3.0, 3.0, 3.0), Attributes::new());

    let err = second.sync_nodes().await.unwrap_err();
    match err {
        GraphError::DuplicateKey {
            collection,
            records,
        } => {
            assert_eq!(collection, "nodes");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["id"], json!(2));
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    // Unordered batch semantics: the conflicting record did not block its
    // sibling; node 3 landed.
    let graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
    assert!(graph.contains_node(3));

    Ok(())
}

#[tokio::test]
async fn duplicate_edge_key_is_fatal_and_reports_the_offender() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;

    let region = Region::cube(0.0, 10.0);
    let mut graph = provider.extract(&region).await?;
    graph.add_node(1, Point3::new(1.0, 1.0, 1.0), Attributes::new());
    graph.add_node(2, Point3::new(2.0, 2.0, 2.0), Attributes::new());
    graph.add_edge(1, 2, attrs(&[("score", json!(0.4))]));
    graph.sync_nodes().await?;
    graph.sync_edges(&region).await?;

    let err = graph.sync_edges(&region).await.unwrap_err();
    match err {
        GraphError::DuplicateKey {
            collection,
            records,
        } => {
            assert_eq!(collection, "edges");
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["u"], json!(1));
            assert_eq!(records[0]["v"], json!(2));
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn rerun_after_conflict_only_refails_on_rows_already_present() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;

    let mut first = provider.extract(&Region::cube(0.0, 10.0)).await?;
    first.add_node(1, Point3::new(1.0, 1.0, 1.0), Attributes::new());
    first.sync_nodes().await?;

    let mut second = provider.extract(&Region::cube(0.0, 10.0)).await?;
    second.add_node(1, Point3::new(1.0, 1.0, 1.0), Attributes::new());
    second.add_node(4, Point3::new(4.0, 4.0, 4.0), Attributes::new());

    // First run: node 1 conflicts, node 4 is inserted anyway.
    assert!(second.sync_nodes().await.unwrap_err().is_duplicate_key());

    // Re-running reports both rows as present now - never duplicates them.
    let err = second.sync_nodes().await.unwrap_err();
    match err {
        GraphError::DuplicateKey { records, .. } => assert_eq!(records.len(), 2),
        other => panic!("expected DuplicateKey, got {other:?}"),
    }

    let graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
    assert_eq!(graph.node_count(), 2);

    Ok(())
}

#[tokio::test]
async fn read_only_binding_rejects_sync_before_touching_the_store() -> Result<()> {
    let dir = TempDir::new()?;
    {
        let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;
        let mut graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
        graph.add_node(1, Point3::new(1.0, 1.0, 1.0), Attributes::new());
        graph.sync_nodes().await?;
    }

    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::ReadOnly).await?;
    let mut graph = provider.extract(&Region::cube(0.0, 10.0)).await?;
    graph.add_node(9, Point3::new(2.0, 2.0, 2.0), Attributes::new());
    graph.add_edge(1, 9, Attributes::new());

    assert!(graph.sync_nodes().await.unwrap_err().is_precondition());
    assert!(graph
        .sync_edges(&Region::cube(0.0, 10.0))
        .await
        .unwrap_err()
        .is_precondition());

    // Nothing reached the store.
    let rw = GraphProvider::open(dir.path(), "rag", AccessMode::ReadWrite).await?;
    let graph = rw.extract(&Region::cube(0.0, 10.0)).await?;
    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.edge_count(), 0);

    Ok(())
}

#[tokio::test]
async fn schema_setup_is_idempotent_and_mode_guarded() -> Result<()> {
    let dir = TempDir::new()?;
    let provider = GraphProvider::open(dir.path(), "rag", AccessMode::Reset).await?;
    provider.setup_schema().await?;
    provider.setup_schema().await?;

    let ro = GraphProvider::open(dir.path(), "rag", AccessMode::ReadOnly).await?;
    assert!(ro.setup_schema().await.unwrap_err().is_precondition());

    Ok(())
}
