//! Cycle Detector - Three-Colour Depth-First Search
//!
//! # Algorithm
//!
//! ```text
//! for root in 0..N (ascending):
//!     skip if already explored
//!     DFS(root):
//!         mark u on-path, push u
//!         for v in successors(u) (ascending):
//!             unvisited -> descend into v
//!             on-path   -> cycle = path[pos(v)..], stop the whole search
//!             explored  -> skip
//!         mark u explored, pop u
//! ```
//!
//! The traversal is iterative: a frame stack replaces the call stack, so
//! deep chains cannot overflow it. The colour array is sized to the node
//! (process) count. Root and edge order are ascending, so the same graph
//! always yields the same cycle.

use super::types::ProcessId;
use super::wait_for::WaitForGraph;
use serde::{Deserialize, Serialize};
use std::collections::btree_set;
use std::fmt;

/// Per-node DFS state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Unvisited,
    /// On the current path, at this index of the path stack
    OnPath(usize),
    Explored,
}

/// Processes forming a wait cycle, in traversal order
///
/// Members are stored without the closing repeat; [`Cycle::closed_path`]
/// appends the first member again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle(Vec<ProcessId>);

impl Cycle {
    /// Wrap an ordered member list
    pub fn new(members: Vec<ProcessId>) -> Self {
        Self(members)
    }

    /// Members in traversal order
    pub fn members(&self) -> &[ProcessId] {
        &self.0
    }

    /// Number of distinct processes in the cycle
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a detected cycle
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `process` takes part in the cycle
    pub fn contains(&self, process: ProcessId) -> bool {
        self.0.contains(&process)
    }

    /// Members followed by the first member again
    pub fn closed_path(&self) -> Vec<ProcessId> {
        let mut path = self.0.clone();
        if let Some(&first) = self.0.first() {
            path.push(first);
        }
        path
    }

    /// Consecutive edges of the closed path
    pub fn edges(&self) -> impl Iterator<Item = (ProcessId, ProcessId)> + '_ {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i], self.0[(i + 1) % n]))
    }

    /// Take the member list
    pub fn into_members(self) -> Vec<ProcessId> {
        self.0
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.closed_path().iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

/// Stateless DFS cycle finder
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleDetector;

impl CycleDetector {
    /// Return the first cycle found, or `None` for an acyclic graph
    pub fn find_cycle(graph: &WaitForGraph) -> Option<Cycle> {
        let nodes = graph.node_count();
        let mut color = vec![Color::Unvisited; nodes];
        let mut path: Vec<ProcessId> = Vec::with_capacity(nodes);
        let mut frames: Vec<(usize, btree_set::Iter<'_, ProcessId>)> = Vec::with_capacity(nodes);

        for root in 0..nodes {
            if color[root] != Color::Unvisited {
                continue;
            }

            color[root] = Color::OnPath(path.len());
            path.push(ProcessId(root));
            frames.push((root, graph.successor_set(root).iter()));

            while let Some((node, edges)) = frames.last_mut() {
                let node = *node;
                let step = edges.next().copied();
                match step {
                    Some(next) => match color[next.as_usize()] {
                        Color::Unvisited => {
                            color[next.as_usize()] = Color::OnPath(path.len());
                            path.push(next);
                            frames.push((next.as_usize(), graph.successor_set(next.as_usize()).iter()));
                        }
                        Color::OnPath(start) => {
                            return Some(Cycle(path.split_off(start)));
                        }
                        Color::Explored => {}
                    },
                    None => {
                        color[node] = Color::Explored;
                        path.pop();
                        frames.pop();
                    }
                }
            }
        }

        None
    }

    /// Whether the graph contains any directed cycle
    pub fn has_cycle(graph: &WaitForGraph) -> bool {
        Self::find_cycle(graph).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: usize, edges: &[(usize, usize)]) -> WaitForGraph {
        let mut g = WaitForGraph::with_nodes(nodes);
        for &(from, to) in edges {
            g.add_edge(ProcessId(from), ProcessId(to)).unwrap();
        }
        g
    }

    fn ids(raw: &[usize]) -> Vec<ProcessId> {
        raw.iter().copied().map(ProcessId).collect()
    }

    #[test]
    fn test_empty_graph_has_no_cycle() {
        assert_eq!(CycleDetector::find_cycle(&graph(4, &[])), None);
        assert_eq!(CycleDetector::find_cycle(&WaitForGraph::default()), None);
    }

    #[test]
    fn test_two_cycle() {
        let cycle = CycleDetector::find_cycle(&graph(3, &[(0, 1), (1, 0)])).unwrap();
        assert_eq!(cycle.members(), ids(&[0, 1]).as_slice());
        assert_eq!(cycle.closed_path(), ids(&[0, 1, 0]));
    }

    #[test]
    fn test_three_cycle_order() {
        let cycle = CycleDetector::find_cycle(&graph(4, &[(0, 1), (1, 2), (2, 0)])).unwrap();
        assert_eq!(cycle.members(), ids(&[0, 1, 2]).as_slice());
        assert_eq!(cycle.to_string(), "P0 -> P1 -> P2 -> P0");
    }

    #[test]
    fn test_cycle_excludes_path_prefix() {
        // 0 -> 1 -> 2 -> 3 -> 1: the cycle starts at P1, not the root
        let cycle = CycleDetector::find_cycle(&graph(4, &[(0, 1), (1, 2), (2, 3), (3, 1)])).unwrap();
        assert_eq!(cycle.members(), ids(&[1, 2, 3]).as_slice());
    }

    #[test]
    fn test_diamond_is_acyclic() {
        // Explored node reached twice must not be mistaken for a cycle
        let g = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        assert!(!CycleDetector::has_cycle(&g));
    }

    #[test]
    fn test_cycle_in_later_component() {
        // Node 0 is isolated; the cycle lives in {3, 4}, unreachable from 0
        let cycle = CycleDetector::find_cycle(&graph(5, &[(1, 2), (3, 4), (4, 3)])).unwrap();
        assert_eq!(cycle.members(), ids(&[3, 4]).as_slice());
    }

    #[test]
    fn test_self_loop() {
        let cycle = CycleDetector::find_cycle(&graph(2, &[(1, 1)])).unwrap();
        assert_eq!(cycle.members(), ids(&[1]).as_slice());
        assert_eq!(cycle.closed_path(), ids(&[1, 1]));
    }

    #[test]
    fn test_more_processes_than_anything_else() {
        // Colour array must follow the node count
        let edges: Vec<_> = (0..63).map(|i| (i, i + 1)).chain([(63, 40)]).collect();
        let cycle = CycleDetector::find_cycle(&graph(64, &edges)).unwrap();
        assert_eq!(cycle.len(), 24);
        assert_eq!(cycle.members()[0], ProcessId(40));
    }

    #[test]
    fn test_cycle_edges_exist_in_graph() {
        let g = graph(5, &[(0, 2), (2, 4), (4, 1), (1, 2), (3, 0)]);
        let cycle = CycleDetector::find_cycle(&g).unwrap();
        assert!(cycle.edges().all(|(a, b)| g.has_edge(a, b)));
        let closed = cycle.closed_path();
        assert_eq!(closed.first(), closed.last());
    }

    #[test]
    fn test_deterministic_result() {
        let g = graph(6, &[(5, 0), (0, 3), (3, 5), (1, 2), (2, 1), (4, 4)]);
        let first = CycleDetector::find_cycle(&g);
        for _ in 0..10 {
            assert_eq!(CycleDetector::find_cycle(&g), first);
        }
        assert_eq!(first.unwrap().members(), ids(&[0, 3, 5]).as_slice());
    }
}
