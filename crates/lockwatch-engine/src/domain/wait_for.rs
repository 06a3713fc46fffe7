//! Wait-For Graph Builder
//!
//! # Construction Rule
//!
//! For every process `i` and resource type `j` with `Request[i][j] > 0` that
//! the free pool cannot satisfy (`Available[j] < Request[i][j]`), add an edge
//! `i -> k` for every process `k` holding some of `j`.
//!
//! Any holder counts as a potential blocker; units are not matched to
//! specific holders. The graph over-approximates so no genuine wait on the
//! examined resources is ever missed. Self-loops are not special-cased.

use super::error::LedgerError;
use super::snapshot::Snapshot;
use super::types::ProcessId;
use std::collections::BTreeSet;
use std::fmt;

/// Directed graph on `{0..N}`; edge `i -> k` means "i waits on a unit held by k"
///
/// Successor sets are ordered, so every traversal visits edges in ascending
/// process order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WaitForGraph {
    successors: Vec<BTreeSet<ProcessId>>,
}

impl WaitForGraph {
    /// Edgeless graph on `nodes` processes
    pub fn with_nodes(nodes: usize) -> Self {
        Self {
            successors: vec![BTreeSet::new(); nodes],
        }
    }

    /// Derive the wait-for graph from a snapshot (never the live ledger)
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let dims = snapshot.dimensions();
        let available = snapshot.available();
        let allocation = snapshot.allocation();
        let request = snapshot.request();

        let mut graph = Self::with_nodes(dims.processes);

        for waiter in 0..dims.processes {
            for resource in 0..dims.resources {
                let wanted = request.get(waiter, resource);
                if wanted == 0 || available[resource] >= wanted {
                    continue;
                }
                for holder in 0..dims.processes {
                    if allocation.get(holder, resource) > 0 {
                        graph.successors[waiter].insert(ProcessId(holder));
                    }
                }
            }
        }

        graph
    }

    /// Insert `from -> to`; duplicate edges collapse
    ///
    /// # Errors
    /// `InvalidProcess` if either end is not a node of this graph. The graph
    /// is left unchanged.
    pub fn add_edge(&mut self, from: ProcessId, to: ProcessId) -> Result<(), LedgerError> {
        let limit = self.successors.len();
        if let Some(process) = [from, to].into_iter().find(|p| p.as_usize() >= limit) {
            return Err(LedgerError::InvalidProcess { process, limit });
        }
        self.successors[from.as_usize()].insert(to);
        Ok(())
    }

    /// Number of nodes (N)
    #[inline]
    pub fn node_count(&self) -> usize {
        self.successors.len()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(BTreeSet::len).sum()
    }

    /// Whether the graph has no edges at all
    pub fn is_empty(&self) -> bool {
        self.successors.iter().all(BTreeSet::is_empty)
    }

    /// Whether `from -> to` is present
    pub fn has_edge(&self, from: ProcessId, to: ProcessId) -> bool {
        self.successors
            .get(from.as_usize())
            .is_some_and(|set| set.contains(&to))
    }

    /// Out-neighbours of `node` in ascending order
    pub fn successors(&self, node: ProcessId) -> impl Iterator<Item = ProcessId> + '_ {
        self.successors
            .get(node.as_usize())
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// All edges, ordered by source then target
    pub fn edges(&self) -> impl Iterator<Item = (ProcessId, ProcessId)> + '_ {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, set)| set.iter().map(move |&to| (ProcessId(from), to)))
    }

    pub(super) fn successor_set(&self, node: usize) -> &BTreeSet<ProcessId> {
        &self.successors[node]
    }
}

impl fmt::Display for WaitForGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (from, to) in self.edges() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{from}->{to}")?;
            first = false;
        }
        if first {
            write!(f, "(no edges)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cycle::CycleDetector;
    use crate::domain::matrix::Matrix;

    fn snapshot(available: Vec<u32>, allocation: Vec<Vec<u32>>, request: Vec<Vec<u32>>) -> Snapshot {
        Snapshot::from_parts(
            available,
            Matrix::from_rows(allocation).unwrap(),
            Matrix::from_rows(request).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_process_mutual_wait() {
        // P0 holds R0 wants R1; P1 holds R1 wants R0; P2 idle
        let snap = snapshot(
            vec![0, 0],
            vec![vec![1, 0], vec![0, 1], vec![0, 0]],
            vec![vec![0, 1], vec![1, 0], vec![0, 0]],
        );
        let graph = WaitForGraph::from_snapshot(&snap);

        assert!(graph.has_edge(ProcessId(0), ProcessId(1)));
        assert!(graph.has_edge(ProcessId(1), ProcessId(0)));
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_satisfiable_request_adds_no_edge() {
        let snap = snapshot(vec![1], vec![vec![1], vec![0]], vec![vec![0], vec![1]]);
        let graph = WaitForGraph::from_snapshot(&snap);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_every_holder_is_a_candidate_blocker() {
        // P2 wants 2 of R0, P0 and P1 each hold one
        let snap = snapshot(
            vec![0],
            vec![vec![1], vec![1], vec![0]],
            vec![vec![0], vec![0], vec![2]],
        );
        let graph = WaitForGraph::from_snapshot(&snap);

        let targets: Vec<_> = graph.successors(ProcessId(2)).collect();
        assert_eq!(targets, vec![ProcessId(0), ProcessId(1)]);
    }

    #[test]
    fn test_self_loop_not_special_cased() {
        let snap = snapshot(vec![0], vec![vec![1]], vec![vec![1]]);
        let graph = WaitForGraph::from_snapshot(&snap);
        assert!(graph.has_edge(ProcessId(0), ProcessId(0)));
    }

    #[test]
    fn test_display_lists_edges() {
        let mut graph = WaitForGraph::with_nodes(2);
        assert_eq!(graph.to_string(), "(no edges)");
        graph.add_edge(ProcessId(1), ProcessId(0)).unwrap();
        assert_eq!(graph.to_string(), "P1->P0");
    }

    #[test]
    fn test_add_edge_rejects_unknown_nodes() {
        let mut graph = WaitForGraph::with_nodes(2);
        assert_eq!(
            graph.add_edge(ProcessId(0), ProcessId(2)),
            Err(LedgerError::InvalidProcess {
                process: ProcessId(2),
                limit: 2
            })
        );
        assert!(matches!(
            graph.add_edge(ProcessId(5), ProcessId(0)),
            Err(LedgerError::InvalidProcess { process: ProcessId(5), .. })
        ));
        assert!(graph.is_empty());
        assert!(CycleDetector::find_cycle(&graph).is_none());
    }
}
