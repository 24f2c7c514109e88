//! Degree-constrained subgraphs via reduction to matching.
//!
//! A degree-constrained subgraph (DCS) of `G` with caps `cap(v)` is a set
//! of edges in which every node `v` has at most `cap(v)` incident edges.
//! A maximum DCS is found by building an auxiliary graph `H`, running a
//! maximum matching on `H` and translating the matching back.
//!
//! # Vertex splitting
//! - node `v` becomes `cap(v)` *core* nodes;
//! - edge `uv` becomes two *gadget* nodes `e_u`, `e_v` joined by an edge,
//!   `e_u` adjacent to every core of `u`, `e_v` to every core of `v`.
//!
//! A maximum matching of `H` has size `|E| + |DCS|`: every gadget is
//! matched at least once, and the edge belongs to the DCS iff both gadget
//! nodes are matched to cores.
//!
//! Cores come first and gadgets follow edge insertion order, so the
//! numbering of `H` only depends on the caps and on the edge order. The
//! reduction of a graph is therefore a prefix of the reduction of any
//! supergraph that only appends edges, and a matching on the former
//! seeds the latter.
//!
//! # Reference
//! Shiloach (1981), "Another look at the degree constrained subgraph problem"

use std::collections::{BTreeSet, HashMap};
use std::fmt::Debug;
use std::ops::Range;

use super::{Graph, Matching, NodeIndex};

/// Auxiliary graph of a reduction, plus the bookkeeping to map it back.
#[derive(Debug, Clone)]
pub struct AuxiliaryGraph {
    /// The graph to run a matching on.
    pub graph: Graph,
    cores: Vec<Range<NodeIndex>>,
    gadgets: Vec<EdgeGadget>,
}

#[derive(Debug, Clone, Copy)]
struct EdgeGadget {
    u: NodeIndex,
    v: NodeIndex,
    e_u: NodeIndex,
    e_v: NodeIndex,
}

impl AuxiliaryGraph {
    /// Core nodes standing for original node `v`.
    pub fn cores(&self, v: NodeIndex) -> Range<NodeIndex> {
        self.cores[v].clone()
    }

    fn is_core(&self, node: NodeIndex) -> bool {
        self.cores.last().is_some_and(|last| node < last.end)
    }
}

/// Transform between DCS instances and matching instances.
pub trait DcsReduction: Send + Sync + Debug {
    /// Builds the auxiliary graph of `graph` under `capacities`
    /// (one cap per node of `graph`).
    fn construct_auxiliary_graph(&self, graph: &Graph, capacities: &[usize]) -> AuxiliaryGraph;

    /// Reads the DCS off a matching of the auxiliary graph.
    ///
    /// Maps every node of the original graph to its DCS neighbours.
    fn construct_dcs_from_matching(
        &self,
        auxiliary: &AuxiliaryGraph,
        matching: &Matching,
    ) -> HashMap<NodeIndex, BTreeSet<NodeIndex>>;
}

/// The vertex-splitting reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexSplittingReduction;

impl DcsReduction for VertexSplittingReduction {
    fn construct_auxiliary_graph(&self, graph: &Graph, capacities: &[usize]) -> AuxiliaryGraph {
        debug_assert_eq!(capacities.len(), graph.node_count());

        let mut cores = Vec::with_capacity(graph.node_count());
        let mut next = 0;
        for &cap in capacities {
            cores.push(next..next + cap);
            next += cap;
        }

        let mut aux = Graph::new(next + 2 * graph.edge_count());
        let mut gadgets = Vec::with_capacity(graph.edge_count());
        for &(u, v) in graph.edges() {
            let e_u = next;
            let e_v = next + 1;
            next += 2;

            aux.add_edge(e_u, e_v);
            for core in cores[u].clone() {
                aux.add_edge(e_u, core);
            }
            for core in cores[v].clone() {
                aux.add_edge(e_v, core);
            }
            gadgets.push(EdgeGadget { u, v, e_u, e_v });
        }

        AuxiliaryGraph {
            graph: aux,
            cores,
            gadgets,
        }
    }

    fn construct_dcs_from_matching(
        &self,
        auxiliary: &AuxiliaryGraph,
        matching: &Matching,
    ) -> HashMap<NodeIndex, BTreeSet<NodeIndex>> {
        let mut dcs: HashMap<NodeIndex, BTreeSet<NodeIndex>> = (0..auxiliary.cores.len())
            .map(|v| (v, BTreeSet::new()))
            .collect();

        for gadget in &auxiliary.gadgets {
            let to_core = |x: NodeIndex| matching.mate(x).is_some_and(|m| auxiliary.is_core(m));
            if to_core(gadget.e_u) && to_core(gadget.e_v) {
                dcs.entry(gadget.u).or_default().insert(gadget.v);
                dcs.entry(gadget.v).or_default().insert(gadget.u);
            }
        }
        dcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{EdmondsBlossom, MatchingSolver};

    fn solve(graph: &Graph, caps: &[usize]) -> HashMap<NodeIndex, BTreeSet<NodeIndex>> {
        let reduction = VertexSplittingReduction;
        let aux = reduction.construct_auxiliary_graph(graph, caps);
        let matching = EdmondsBlossom.maximum_matching(&aux.graph, None);
        reduction.construct_dcs_from_matching(&aux, &matching)
    }

    fn edge_count(dcs: &HashMap<NodeIndex, BTreeSet<NodeIndex>>) -> usize {
        dcs.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    #[test]
    fn test_auxiliary_numbering() {
        let mut g = Graph::new(2);
        g.add_edge(0, 1);
        let aux = VertexSplittingReduction.construct_auxiliary_graph(&g, &[2, 1]);
        assert_eq!(aux.cores(0), 0..2);
        assert_eq!(aux.cores(1), 2..3);
        // 3 cores + 2 gadget nodes; gadget edge + 2 + 1 core edges
        assert_eq!(aux.graph.node_count(), 5);
        assert_eq!(aux.graph.edge_count(), 4);
    }

    #[test]
    fn test_star_respects_center_cap() {
        let mut g = Graph::new(4);
        for leaf in 1..4 {
            g.add_edge(0, leaf);
        }
        let dcs = solve(&g, &[2, 1, 1, 1]);
        assert_eq!(dcs[&0].len(), 2);
        assert_eq!(edge_count(&dcs), 2);
    }

    #[test]
    fn test_caps_allow_every_edge() {
        // Triangle with caps 2 everywhere: the whole triangle fits.
        let mut g = Graph::new(3);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(0, 2);
        let dcs = solve(&g, &[2, 2, 2]);
        assert_eq!(edge_count(&dcs), 3);
        assert!(dcs.values().all(|n| n.len() == 2));
    }

    #[test]
    fn test_zero_cap_isolates_node() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        let dcs = solve(&g, &[1, 0, 1]);
        assert_eq!(edge_count(&dcs), 0);
        assert!(dcs[&1].is_empty());
    }

    #[test]
    fn test_appended_edges_keep_prefix() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1);
        let reduction = VertexSplittingReduction;
        let caps = [1, 1, 1];
        let first = reduction.construct_auxiliary_graph(&g, &caps);
        let matching = EdmondsBlossom.maximum_matching(&first.graph, None);

        g.add_edge(1, 2);
        let second = reduction.construct_auxiliary_graph(&g, &caps);
        assert_eq!(&second.graph.edges()[..first.graph.edge_count()], first.graph.edges());

        let seeded = EdmondsBlossom.maximum_matching(&second.graph, Some(&matching));
        let dcs = reduction.construct_dcs_from_matching(&second, &seeded);
        assert_eq!(edge_count(&dcs), 1);
    }
}
