use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};

use crate::{
    cursor::{EdgeCursor, EdgeDirection, Step},
    errors::NeighbourError,
    provider::NeighbourProvider,
    record::{EdgeRecord, VertexId},
};

/// Vertex an edge leads to when followed in `direction`.
pub fn target_vertex(
    record: &EdgeRecord,
    direction: EdgeDirection,
) -> Result<VertexId, NeighbourError> {
    let document = record.document()?;
    document
        .get(direction.target_attribute())
        .and_then(|value| value.as_str())
        .map(VertexId::from)
        .ok_or_else(|| {
            NeighbourError::document(format!(
                "edge {} has no string {} attribute",
                record.token().row_id(),
                direction.target_attribute()
            ))
        })
}

/// Runs one full expansion of `step` and returns the neighbours in cursor order.
pub fn expand_neighbours<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    step: &Step,
    direction: EdgeDirection,
) -> Result<Vec<VertexId>, NeighbourError> {
    provider.rearm(step)?;
    let mut neighbours = Vec::new();
    while provider.has_more(step.depth) {
        let batch = provider.next()?;
        for record in batch.iter() {
            neighbours.push(target_vertex(record, direction)?);
        }
    }
    Ok(neighbours)
}

pub fn bfs_vertices<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    start: &VertexId,
    max_depth: u64,
    direction: EdgeDirection,
) -> Result<Vec<VertexId>, NeighbourError> {
    let mut visited = Vec::new();
    let mut seen = AHashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(Step::new(start.clone(), 0));
    seen.insert(start.clone());
    while let Some(step) = queue.pop_front() {
        visited.push(step.vertex.clone());
        if step.depth >= max_depth {
            continue;
        }
        for next in expand_neighbours(provider, &step, direction)? {
            if seen.insert(next.clone()) {
                queue.push_back(Step::new(next, step.depth + 1));
            }
        }
    }
    Ok(visited)
}

pub fn shortest_path<C: EdgeCursor>(
    provider: &mut NeighbourProvider<C>,
    start: &VertexId,
    end: &VertexId,
    direction: EdgeDirection,
) -> Result<Option<Vec<VertexId>>, NeighbourError> {
    if start == end {
        return Ok(Some(vec![start.clone()]));
    }
    let mut queue = VecDeque::new();
    let mut parents: AHashMap<VertexId, VertexId> = AHashMap::new();
    let mut seen = AHashSet::new();
    queue.push_back(Step::new(start.clone(), 0));
    seen.insert(start.clone());
    let mut found = false;
    while let Some(step) = queue.pop_front() {
        for next in expand_neighbours(provider, &step, direction)? {
            if seen.insert(next.clone()) {
                parents.insert(next.clone(), step.vertex.clone());
                if &next == end {
                    found = true;
                    break;
                }
                queue.push_back(Step::new(next, step.depth + 1));
            }
        }
        if found {
            break;
        }
    }
    if !found {
        return Ok(None);
    }
    let mut path = vec![end.clone()];
    let mut current = end;
    while let Some(parent) = parents.get(current) {
        path.push(parent.clone());
        current = parent;
    }
    path.reverse();
    Ok(Some(path))
}
