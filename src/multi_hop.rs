//! Path enumeration without global vertex deduplication.
//!
//! Every simple path is followed independently, so the same vertex is expanded once per
//! path that reaches it. This is the access pattern the neighbour cache exists for.

use crate::{
    bfs::expand_neighbours,
    cursor::{EdgeCursor, EdgeDirection, Step},
    errors::NeighbourError,
    provider::NeighbourProvider,
    record::VertexId,
};

/// All simple paths of one to `max_depth` edges starting at `start`, in depth-first
/// discovery order.
pub fn enumerate_paths<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    start: &VertexId,
    max_depth: u64,
    direction: EdgeDirection,
) -> Result<Vec<Vec<VertexId>>, NeighbourError> {
    let mut paths = Vec::new();
    let mut path = vec![start.clone()];
    extend_paths(provider, &mut path, max_depth, direction, &mut paths)?;
    Ok(paths)
}

fn extend_paths<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    path: &mut Vec<VertexId>,
    max_depth: u64,
    direction: EdgeDirection,
    paths: &mut Vec<Vec<VertexId>>,
) -> Result<(), NeighbourError> {
    let depth = (path.len() - 1) as u64;
    if depth >= max_depth {
        return Ok(());
    }
    let Some(tail) = path.last().cloned() else {
        return Ok(());
    };
    // Expansion must finish before recursing: the provider serves one vertex at a time.
    let neighbours = expand_neighbours(provider, &Step::new(tail, depth), direction)?;
    for next in neighbours {
        if path.contains(&next) {
            continue;
        }
        path.push(next);
        paths.push(path.clone());
        extend_paths(provider, path, max_depth, direction, paths)?;
        path.pop();
    }
    Ok(())
}

/// Number of simple paths of one to `max_depth` edges starting at `start`.
pub fn count_paths<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    start: &VertexId,
    max_depth: u64,
    direction: EdgeDirection,
) -> Result<usize, NeighbourError> {
    Ok(enumerate_paths(provider, start, max_depth, direction)?.len())
}
