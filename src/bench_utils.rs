//! Deterministic graph generators for benchmarks and traversal tests.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::json;

use crate::{errors::NeighbourError, record::VertexId, store::EdgeStore};

/// Vertex ids plus directed edges given as indexes into `vertices`.
#[derive(Clone, Debug)]
pub struct GraphDataset {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<(usize, usize)>,
}

impl GraphDataset {
    pub fn degrees(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.vertices.len()];
        for &(from, to) in &self.edges {
            counts[from] += 1;
            counts[to] += 1;
        }
        counts
    }

    pub fn hub_index(&self) -> usize {
        let mut best = (0usize, 0usize);
        for (idx, deg) in self.degrees().into_iter().enumerate() {
            if deg > best.0 {
                best = (deg, idx);
            }
        }
        best.1
    }

    /// Writes every edge into `collection` of `store`, tagging it with `label`.
    pub fn load_into(
        &self,
        store: &EdgeStore,
        collection: &str,
        label: &str,
    ) -> Result<(), NeighbourError> {
        for &(from, to) in &self.edges {
            store.insert_edge(
                collection,
                &self.vertices[from],
                &self.vertices[to],
                &json!({ "label": label }),
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum GraphShape {
    Line,
    Star,
    /// Layers of `width` vertices, each fully connected to the next layer.
    Diamond { width: usize },
    ScaleFree { m: usize },
}

pub fn generate_graph(shape: GraphShape, node_count: usize, seed: u64) -> GraphDataset {
    assert!(node_count > 1, "node_count must exceed 1");
    let vertices = build_vertices(node_count);
    let mut edges = match shape {
        GraphShape::Line => (0..node_count - 1).map(|idx| (idx, idx + 1)).collect(),
        GraphShape::Star => (1..node_count).map(|leaf| (0, leaf)).collect(),
        GraphShape::Diamond { width } => generate_diamond_edges(width, node_count),
        GraphShape::ScaleFree { m } => generate_scale_free_edges(node_count, m, seed),
    };
    edges.sort_unstable();
    GraphDataset { vertices, edges }
}

fn build_vertices(count: usize) -> Vec<VertexId> {
    (0..count)
        .map(|idx| VertexId::from(format!("vertices/{idx}")))
        .collect()
}

fn generate_diamond_edges(width: usize, node_count: usize) -> Vec<(usize, usize)> {
    assert!(width > 0, "width must be positive");
    let mut edges = Vec::new();
    let mut layer_start = 0usize;
    while layer_start + width < node_count {
        let next_start = layer_start + width;
        let next_end = (next_start + width).min(node_count);
        for from in layer_start..next_start {
            for to in next_start..next_end {
                edges.push((from, to));
            }
        }
        layer_start = next_start;
    }
    edges
}

fn generate_scale_free_edges(node_count: usize, m: usize, seed: u64) -> Vec<(usize, usize)> {
    assert!(m > 0, "m must be positive");
    assert!(node_count > m + 1, "node_count must exceed m + 1");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut degrees = vec![0usize; node_count];
    let mut edges = Vec::new();
    let seed_nodes = m + 1;
    for u in 0..seed_nodes {
        for v in (u + 1)..seed_nodes {
            edges.push((u, v));
            degrees[u] += 1;
            degrees[v] += 1;
        }
    }
    let mut total_degree: usize = degrees.iter().sum();
    for new_node in seed_nodes..node_count {
        let mut targets = Vec::new();
        while targets.len() < m {
            let pick = rng.gen_range(0..total_degree);
            let mut cumulative = 0usize;
            for candidate in 0..new_node {
                cumulative += degrees[candidate];
                if pick < cumulative {
                    if !targets.contains(&candidate) {
                        targets.push(candidate);
                    }
                    break;
                }
            }
        }
        targets.sort_unstable();
        targets.dedup();
        while targets.len() < m {
            targets.push(targets.len() % new_node);
            targets.sort_unstable();
            targets.dedup();
        }
        for target in targets {
            edges.push((target, new_node));
            degrees[target] += 1;
            degrees[new_node] += 1;
            total_degree += 2;
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_are_deterministic() {
        let a = generate_graph(GraphShape::ScaleFree { m: 2 }, 30, 7);
        let b = generate_graph(GraphShape::ScaleFree { m: 2 }, 30, 7);
        assert_eq!(a.edges, b.edges);
        assert!(a.edges.iter().all(|&(from, to)| from < to));
    }

    #[test]
    fn test_diamond_layers_fully_connected() {
        let dataset = generate_graph(GraphShape::Diamond { width: 2 }, 6, 0);
        assert_eq!(
            dataset.edges,
            vec![(0, 2), (0, 3), (1, 2), (1, 3), (2, 4), (2, 5), (3, 4), (3, 5)]
        );
    }

    #[test]
    fn test_star_hub_is_centre() {
        let dataset = generate_graph(GraphShape::Star, 5, 0);
        assert_eq!(dataset.degrees(), vec![4, 1, 1, 1, 1]);
        assert_eq!(dataset.hub_index(), 0);
        assert_eq!(dataset.vertices[0].as_str(), "vertices/0");
    }
}
