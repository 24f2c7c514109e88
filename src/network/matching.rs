//! Maximum matching on general undirected graphs.
//!
//! The matching schedulers need a maximum matching that can be *seeded*:
//! the second pass of each scheduler resumes from the first pass's
//! matching. Augmenting along alternating paths never unmatches a
//! vertex, so every vertex matched in the seed stays matched.
//!
//! # Reference
//! Edmonds (1965), "Paths, Trees, and Flowers"

use std::collections::VecDeque;
use std::fmt::Debug;

use super::NodeIndex;

/// An undirected graph with edges kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    edges: Vec<(NodeIndex, NodeIndex)>,
    adjacency: Vec<Vec<NodeIndex>>,
}

impl Graph {
    /// Creates a graph with `node_count` isolated nodes.
    pub fn new(node_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); node_count],
        }
    }

    /// Appends a node, returning its index.
    pub fn add_node(&mut self) -> NodeIndex {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    /// Appends the edge `u - v`. Self-loops are ignored.
    pub fn add_edge(&mut self, u: NodeIndex, v: NodeIndex) {
        debug_assert!(u < self.node_count() && v < self.node_count());
        if u == v {
            return;
        }
        self.edges.push((u, v));
        self.adjacency[u].push(v);
        self.adjacency[v].push(u);
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[(NodeIndex, NodeIndex)] {
        &self.edges
    }

    /// Neighbours of `v`.
    pub fn neighbors(&self, v: NodeIndex) -> &[NodeIndex] {
        &self.adjacency[v]
    }
}

/// A set of vertex-disjoint edges, stored as a mate per vertex.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matching {
    mate: Vec<Option<NodeIndex>>,
}

impl Matching {
    /// An empty matching over `node_count` vertices.
    pub fn new(node_count: usize) -> Self {
        Self {
            mate: vec![None; node_count],
        }
    }

    /// Partner of `v`, if matched.
    pub fn mate(&self, v: NodeIndex) -> Option<NodeIndex> {
        self.mate.get(v).copied().flatten()
    }

    /// Whether `v` is matched.
    pub fn is_matched(&self, v: NodeIndex) -> bool {
        self.mate(v).is_some()
    }

    /// Number of matched edges.
    pub fn size(&self) -> usize {
        self.mate.iter().filter(|m| m.is_some()).count() / 2
    }

    /// Matched pairs `(u, v)` with `u < v`.
    pub fn pairs(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.mate
            .iter()
            .enumerate()
            .filter_map(|(u, m)| m.filter(|&v| u < v).map(|v| (u, v)))
    }

    /// Matches `u` with `v`, extending the vertex range as needed.
    ///
    /// Any previous partners of `u` or `v` become unmatched.
    pub fn insert(&mut self, u: NodeIndex, v: NodeIndex) {
        let needed = u.max(v) + 1;
        if self.mate.len() < needed {
            self.mate.resize(needed, None);
        }
        for x in [u, v] {
            if let Some(old) = self.mate[x].take() {
                self.mate[old] = None;
            }
        }
        self.mate[u] = Some(v);
        self.mate[v] = Some(u);
    }
}

/// A maximum-cardinality matching algorithm for general graphs.
pub trait MatchingSolver: Send + Sync + Debug {
    /// Solver name.
    fn name(&self) -> &'static str;

    /// Computes a maximum matching of `graph`.
    ///
    /// Pairs of `initial` that are edges of `graph` seed the search; the
    /// result never leaves a seeded vertex unmatched.
    fn maximum_matching(&self, graph: &Graph, initial: Option<&Matching>) -> Matching;
}

/// Edmonds' blossom algorithm, O(V^3).
#[derive(Debug, Clone, Copy, Default)]
pub struct EdmondsBlossom;

impl MatchingSolver for EdmondsBlossom {
    fn name(&self) -> &'static str {
        "edmonds_blossom"
    }

    fn maximum_matching(&self, graph: &Graph, initial: Option<&Matching>) -> Matching {
        let n = graph.node_count();
        let mut mate = vec![None; n];

        if let Some(seed) = initial {
            for &(u, v) in graph.edges() {
                if seed.mate(u) == Some(v) && mate[u].is_none() && mate[v].is_none() {
                    mate[u] = Some(v);
                    mate[v] = Some(u);
                }
            }
        }

        let mut search = BlossomSearch::new(graph, mate);
        let mut augmentations = 0usize;
        for root in 0..n {
            if search.mate[root].is_none() {
                if let Some(end) = search.find_augmenting_path(root) {
                    search.augment(end);
                    augmentations += 1;
                }
            }
        }
        tracing::trace!(nodes = n, augmentations, "maximum matching computed");

        Matching { mate: search.mate }
    }
}

struct BlossomSearch<'a> {
    graph: &'a Graph,
    mate: Vec<Option<NodeIndex>>,
    parent: Vec<Option<NodeIndex>>,
    base: Vec<NodeIndex>,
    used: Vec<bool>,
    blossom: Vec<bool>,
}

impl<'a> BlossomSearch<'a> {
    fn new(graph: &'a Graph, mate: Vec<Option<NodeIndex>>) -> Self {
        let n = graph.node_count();
        Self {
            graph,
            mate,
            parent: vec![None; n],
            base: (0..n).collect(),
            used: vec![false; n],
            blossom: vec![false; n],
        }
    }

    /// BFS over the alternating tree rooted at `root`, contracting
    /// blossoms as they appear. Returns the free endpoint of an
    /// augmenting path, with `parent` describing the path.
    fn find_augmenting_path(&mut self, root: NodeIndex) -> Option<NodeIndex> {
        let n = self.graph.node_count();
        self.parent.iter_mut().for_each(|p| *p = None);
        self.used.iter_mut().for_each(|u| *u = false);
        for (i, b) in self.base.iter_mut().enumerate() {
            *b = i;
        }

        self.used[root] = true;
        let mut queue = VecDeque::from([root]);

        while let Some(v) = queue.pop_front() {
            for &to in self.graph.neighbors(v) {
                if self.base[v] == self.base[to] || self.mate[v] == Some(to) {
                    continue;
                }
                let to_is_even = to == root
                    || self.mate[to].is_some_and(|m| self.parent[m].is_some());

                if to_is_even {
                    let current_base = self.lowest_common_ancestor(v, to);
                    self.blossom.iter_mut().for_each(|b| *b = false);
                    self.mark_path(v, current_base, to);
                    self.mark_path(to, current_base, v);
                    for i in 0..n {
                        if self.blossom[self.base[i]] {
                            self.base[i] = current_base;
                            if !self.used[i] {
                                self.used[i] = true;
                                queue.push_back(i);
                            }
                        }
                    }
                } else if self.parent[to].is_none() {
                    self.parent[to] = Some(v);
                    match self.mate[to] {
                        None => return Some(to),
                        Some(m) => {
                            self.used[m] = true;
                            queue.push_back(m);
                        }
                    }
                }
            }
        }
        None
    }

    fn lowest_common_ancestor(&self, a: NodeIndex, b: NodeIndex) -> NodeIndex {
        let mut on_path = vec![false; self.graph.node_count()];

        let mut a = a;
        loop {
            a = self.base[a];
            on_path[a] = true;
            match self.mate[a].and_then(|m| self.parent[m]) {
                Some(next) => a = next,
                None => break,
            }
        }

        let mut b = b;
        loop {
            b = self.base[b];
            if on_path[b] {
                return b;
            }
            match self.mate[b].and_then(|m| self.parent[m]) {
                Some(next) => b = next,
                None => return b,
            }
        }
    }

    fn mark_path(&mut self, mut v: NodeIndex, base: NodeIndex, mut child: NodeIndex) {
        while self.base[v] != base {
            let Some(m) = self.mate[v] else { break };
            self.blossom[self.base[v]] = true;
            self.blossom[self.base[m]] = true;
            self.parent[v] = Some(child);
            child = m;
            let Some(next) = self.parent[m] else { break };
            v = next;
        }
    }

    fn augment(&mut self, end: NodeIndex) {
        let mut v = Some(end);
        while let Some(x) = v {
            let Some(pv) = self.parent[x] else { break };
            let next = self.mate[pv];
            self.mate[x] = Some(pv);
            self.mate[pv] = Some(x);
            v = next;
        }
    }
}
