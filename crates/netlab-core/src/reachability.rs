// ── Physical reachability ──
//
// Breadth-first search over the undirected "is cabled to" graph.
// Neighbor order follows insertion order, so the first shortest path
// found is deterministic for a given topology.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::model::DeviceId;

/// Simple undirected graph of device ids. Parallel edges collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    neighbors: IndexMap<DeviceId, Vec<DeviceId>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: DeviceId) {
        self.neighbors.entry(id).or_default();
    }

    pub fn add_edge(&mut self, a: DeviceId, b: DeviceId) {
        if a == b {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            let list = self.neighbors.entry(from).or_default();
            if !list.contains(&to) {
                list.push(to);
            }
        }
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.neighbors.contains_key(&id)
    }

    pub fn neighbors(&self, id: DeviceId) -> &[DeviceId] {
        self.neighbors.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn edge_count(&self) -> usize {
        self.neighbors.values().map(Vec::len).sum::<usize>() / 2
    }
}

/// Whether any cabled path joins `start` and `end`.
///
/// `start == end` is trivially true; ping callers reject that case before
/// asking.
pub fn exists_physical_path(graph: &AdjacencyGraph, start: DeviceId, end: DeviceId) -> bool {
    physical_path(graph, start, end).is_some()
}

/// First-found shortest sequence of device ids from `start` to `end`,
/// both included.
pub fn physical_path(
    graph: &AdjacencyGraph,
    start: DeviceId,
    end: DeviceId,
) -> Option<Vec<DeviceId>> {
    if !graph.contains(start) || !graph.contains(end) {
        return None;
    }
    if start == end {
        return Some(vec![start]);
    }

    let mut visited = HashSet::from([start]);
    let mut parent: HashMap<DeviceId, DeviceId> = HashMap::new();
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        for &next in graph.neighbors(current) {
            if !visited.insert(next) {
                continue;
            }
            parent.insert(next, current);
            if next == end {
                return Some(backtrack(&parent, start, end));
            }
            queue.push_back(next);
        }
    }
    None
}

fn backtrack(parent: &HashMap<DeviceId, DeviceId>, start: DeviceId, end: DeviceId) -> Vec<DeviceId> {
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let Some(&prev) = parent.get(&current) else { break };
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
