use std::sync::Arc;

use neighbourcache::{
    EdgeConditions, EdgeDirection, EdgeFilter, EdgeStore, MemoryMonitor, NeighbourProvider,
    ProviderConfig, SqliteEdgeCursor, Step, VertexId,
    bench_utils::{GraphShape, generate_graph},
    bfs::{bfs_vertices, expand_neighbours, shortest_path},
    multi_hop::{count_paths, enumerate_paths},
};
use serde_json::json;

const COLLECTION: &str = "links";

fn v(idx: usize) -> VertexId {
    VertexId::from(format!("vertices/{idx}"))
}

fn ids(path: &[usize]) -> Vec<VertexId> {
    path.iter().copied().map(v).collect()
}

fn store_with(shape: GraphShape, nodes: usize, seed: u64) -> Arc<EdgeStore> {
    let store = EdgeStore::open_in_memory().expect("store");
    generate_graph(shape, nodes, seed)
        .load_into(&store, COLLECTION, "test")
        .expect("load");
    Arc::new(store)
}

fn store_with_edges(edges: &[(usize, usize)]) -> Arc<EdgeStore> {
    let store = EdgeStore::open_in_memory().expect("store");
    for &(from, to) in edges {
        store
            .insert_edge(COLLECTION, &v(from), &v(to), &json!({}))
            .expect("edge");
    }
    Arc::new(store)
}

fn provider(
    store: &Arc<EdgeStore>,
    direction: EdgeDirection,
    config: ProviderConfig,
) -> NeighbourProvider<SqliteEdgeCursor> {
    let cursor = SqliteEdgeCursor::new(store.clone(), [COLLECTION], direction).expect("cursor");
    NeighbourProvider::new(cursor, Arc::new(MemoryMonitor::new()), &config).expect("provider")
}

#[test]
fn test_bfs_follows_line() {
    let store = store_with(GraphShape::Line, 5, 0);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::default());
    let visited = bfs_vertices(&mut provider, &v(0), 10, EdgeDirection::Outgoing).expect("bfs");
    assert_eq!(visited, ids(&[0, 1, 2, 3, 4]));

    let limited = bfs_vertices(&mut provider, &v(0), 2, EdgeDirection::Outgoing).expect("bfs");
    assert_eq!(limited, ids(&[0, 1, 2]));
}

#[test]
fn test_bfs_incoming_walks_backwards() {
    let store = store_with(GraphShape::Line, 5, 0);
    let mut provider = provider(&store, EdgeDirection::Incoming, ProviderConfig::default());
    let visited = bfs_vertices(&mut provider, &v(4), 10, EdgeDirection::Incoming).expect("bfs");
    assert_eq!(visited, ids(&[4, 3, 2, 1, 0]));
}

#[test]
fn test_expand_neighbours_in_cursor_order() {
    let store = store_with(GraphShape::Star, 4, 0);
    let mut provider = provider(
        &store,
        EdgeDirection::Outgoing,
        ProviderConfig::cached().with_batch_size(1),
    );
    let step = Step::new(v(0), 0);
    let first = expand_neighbours(&mut provider, &step, EdgeDirection::Outgoing).unwrap();
    assert_eq!(first, ids(&[1, 2, 3]));
    let second = expand_neighbours(&mut provider, &step, EdgeDirection::Outgoing).unwrap();
    assert_eq!(second, first);
    assert_eq!(provider.stats().replays, 1);
}

#[test]
fn test_shortest_path_exists() {
    let store = store_with_edges(&[(1, 2), (2, 3), (1, 4), (4, 3)]);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::default());
    let path = shortest_path(&mut provider, &v(1), &v(3), EdgeDirection::Outgoing).unwrap();
    assert_eq!(path, Some(ids(&[1, 2, 3])));
}

#[test]
fn test_shortest_path_not_exists() {
    let store = store_with_edges(&[(1, 2), (3, 4)]);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::default());
    let path = shortest_path(&mut provider, &v(1), &v(4), EdgeDirection::Outgoing).unwrap();
    assert_eq!(path, None);
    let trivial = shortest_path(&mut provider, &v(3), &v(3), EdgeDirection::Outgoing).unwrap();
    assert_eq!(trivial, Some(ids(&[3])));
}

#[test]
fn test_enumerate_paths_replays_shared_vertices() {
    let store = store_with(GraphShape::Diamond { width: 2 }, 6, 0);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::cached());
    let paths = enumerate_paths(&mut provider, &v(0), 3, EdgeDirection::Outgoing).unwrap();
    assert_eq!(
        paths,
        vec![
            ids(&[0, 2]),
            ids(&[0, 2, 4]),
            ids(&[0, 2, 5]),
            ids(&[0, 3]),
            ids(&[0, 3, 4]),
            ids(&[0, 3, 5]),
        ]
    );
    // 4 and 5 are expanded once per path reaching them; the second time comes from cache.
    let stats = provider.stats();
    assert_eq!(stats.rearmed, 5);
    assert_eq!(stats.replays, 2);
}

#[test]
fn test_uncached_provider_reads_every_expansion() {
    let store = store_with(GraphShape::Diamond { width: 2 }, 6, 0);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::uncached());
    let total = count_paths(&mut provider, &v(0), 3, EdgeDirection::Outgoing).unwrap();
    assert_eq!(total, 6);
    assert_eq!(provider.stats().rearmed, 7);
    assert_eq!(provider.stats().replays, 0);
}

#[test]
fn test_cached_and_uncached_traversals_agree() {
    let store = store_with(GraphShape::ScaleFree { m: 2 }, 60, 0x5EED);
    let mut cached = provider(&store, EdgeDirection::Outgoing, ProviderConfig::cached());
    let mut uncached = provider(&store, EdgeDirection::Outgoing, ProviderConfig::uncached());

    let start = v(0);
    let cached_paths = enumerate_paths(&mut cached, &start, 3, EdgeDirection::Outgoing).unwrap();
    let plain_paths = enumerate_paths(&mut uncached, &start, 3, EdgeDirection::Outgoing).unwrap();
    assert_eq!(cached_paths, plain_paths);
    assert!(cached.stats().replays > 0);
    assert!(cached.stats().rearmed < uncached.stats().rearmed);

    let cached_bfs = bfs_vertices(&mut cached, &start, 4, EdgeDirection::Outgoing).unwrap();
    let plain_bfs = bfs_vertices(&mut uncached, &start, 4, EdgeDirection::Outgoing).unwrap();
    assert_eq!(cached_bfs, plain_bfs);
}

#[test]
fn test_depth_filters_use_uncached_provider() {
    let store = EdgeStore::open_in_memory().expect("store");
    for (from, to, kind) in [(0, 1, "x"), (0, 2, "y"), (1, 3, "y"), (2, 3, "x")] {
        store
            .insert_edge(COLLECTION, &v(from), &v(to), &json!({ "kind": kind }))
            .unwrap();
    }
    let store = Arc::new(store);
    let conditions =
        EdgeConditions::new().with_depth_filter(1, EdgeFilter::attribute_equals("kind", "y"));
    let config = ProviderConfig::cached().with_depth_filters(conditions.has_depth_filters());
    let mut provider = provider(&store, EdgeDirection::Outgoing, config);
    provider.prepare_index_expressions(&conditions).unwrap();
    assert!(!provider.is_caching());
    assert!(provider.has_depth_specific_lookup(1));

    let paths = enumerate_paths(&mut provider, &v(0), 2, EdgeDirection::Outgoing).unwrap();
    assert_eq!(paths, vec![ids(&[0, 1]), ids(&[0, 1, 3]), ids(&[0, 2])]);
}

#[test]
fn test_cursor_with_depth_filters_is_never_cached() {
    let store = EdgeStore::open_in_memory().expect("store");
    for (to, weight) in [(1, 1), (2, 2)] {
        store
            .insert_edge(COLLECTION, &v(0), &v(to), &json!({ "w": weight }))
            .unwrap();
    }
    let store = Arc::new(store);
    let conditions =
        EdgeConditions::new().with_depth_filter(1, EdgeFilter::attribute_equals("w", 2));
    let cursor = SqliteEdgeCursor::new(store.clone(), [COLLECTION], EdgeDirection::Outgoing)
        .unwrap()
        .with_conditions(conditions);
    let mut provider =
        NeighbourProvider::new(cursor, Arc::new(MemoryMonitor::new()), &ProviderConfig::default())
            .unwrap();
    assert!(!provider.is_caching());

    let shallow = expand_neighbours(&mut provider, &Step::new(v(0), 0), EdgeDirection::Outgoing);
    let deep = expand_neighbours(&mut provider, &Step::new(v(0), 1), EdgeDirection::Outgoing);
    assert_eq!(shallow.unwrap(), ids(&[1, 2]));
    assert_eq!(deep.unwrap(), ids(&[2]));
}

#[test]
fn test_caching_provider_refuses_depth_filters() {
    let store = store_with(GraphShape::Line, 3, 0);
    let mut provider = provider(&store, EdgeDirection::Outgoing, ProviderConfig::cached());
    let conditions =
        EdgeConditions::new().with_depth_filter(1, EdgeFilter::attribute_equals("label", "x"));
    let err = provider.prepare_index_expressions(&conditions).unwrap_err();
    assert!(err.is_contract_violation());
    assert!(!provider.has_depth_specific_lookup(1));

    let base_only =
        EdgeConditions::new().with_filter(EdgeFilter::attribute_equals("label", "test"));
    provider.prepare_index_expressions(&base_only).unwrap();
    let visited = bfs_vertices(&mut provider, &v(0), 5, EdgeDirection::Outgoing).unwrap();
    assert_eq!(visited, ids(&[0, 1, 2]));
}
