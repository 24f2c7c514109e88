//! Directed capacitated networks and maximum flow.
//!
//! The greedy schedulers only need "max flow value plus an assignment" on
//! a network whose capacities change between calls. [`FlowNetwork`]
//! stores capacities keyed by `(from, to)` so closing and reopening an
//! edge is a capacity toggle; solvers build their own residual graph on
//! every call and never mutate the network.
//!
//! # Solvers
//!
//! | [`FlowMethod`] | Strategy | Complexity |
//! |----------------|----------|------------|
//! | `EdmondsKarp` | BFS shortest augmenting paths | O(V E^2) |
//! | `FordFulkerson` | DFS augmenting paths | O(E f) |
//! | `Dinitz` | Blocking flows on level graphs | O(V^2 E) |
//! | `PreflowPush` | FIFO push-relabel | O(V^3) |
//! | `ShortestAugmentingPath` | Distance labels with gap relabeling | O(V^2 E) |
//! | `BoykovKolmogorov` | Bidirectional search trees with reuse | O(V E^2 f) |
//!
//! All return the same flow value; assignments may differ.
//!
//! # References
//! - Edmonds & Karp (1972), "Theoretical Improvements in Algorithmic
//!   Efficiency for Network Flow Problems"
//! - Dinitz (1970), "Algorithm for solution of a problem of maximum flow"
//! - Goldberg & Tarjan (1988), "A New Approach to the Maximum-Flow Problem"
//! - Ahuja & Orlin (1991), "Distance-Directed Augmenting Path Algorithms
//!   for Maximum Flow and Parametric Maximum Flow Problems"
//! - Boykov & Kolmogorov (2004), "An Experimental Comparison of
//!   Min-Cut/Max-Flow Algorithms for Energy Minimization in Vision"

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;

/// Node index within a network.
pub type NodeIndex = usize;

#[derive(Debug, Clone)]
struct Edge {
    from: NodeIndex,
    to: NodeIndex,
    capacity: i64,
}

/// A directed network with non-negative integer capacities.
///
/// At most one edge exists per ordered node pair. Setting a capacity to
/// zero keeps the edge but makes it unusable, which is equivalent to
/// removing it for every solver.
#[derive(Debug, Clone, Default)]
pub struct FlowNetwork {
    node_count: usize,
    edges: Vec<Edge>,
    index: HashMap<(NodeIndex, NodeIndex), usize>,
}

impl FlowNetwork {
    /// Creates a network with `node_count` nodes and no edges.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of edges, including zero-capacity ones.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Capacity of `from -> to`, zero if the edge does not exist.
    pub fn capacity(&self, from: NodeIndex, to: NodeIndex) -> i64 {
        self.index
            .get(&(from, to))
            .map(|&e| self.edges[e].capacity)
            .unwrap_or(0)
    }

    /// Sets the capacity of `from -> to`, creating the edge if needed.
    pub fn set_capacity(&mut self, from: NodeIndex, to: NodeIndex, capacity: i64) {
        debug_assert!(capacity >= 0, "negative capacity on {from} -> {to}");
        debug_assert!(from < self.node_count && to < self.node_count);
        match self.index.get(&(from, to)) {
            Some(&e) => self.edges[e].capacity = capacity,
            None => {
                self.index.insert((from, to), self.edges.len());
                self.edges.push(Edge { from, to, capacity });
            }
        }
    }

    /// Adds `delta` (possibly negative) to the capacity of `from -> to`.
    pub fn add_capacity(&mut self, from: NodeIndex, to: NodeIndex, delta: i64) {
        let capacity = self.capacity(from, to) + delta;
        self.set_capacity(from, to, capacity);
    }

    /// Iterates `(from, to, capacity)` in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, i64)> + '_ {
        self.edges.iter().map(|e| (e.from, e.to, e.capacity))
    }
}

/// Value and edge assignment of a maximum flow.
#[derive(Debug, Clone, Default)]
pub struct FlowResult {
    /// Total flow leaving the source.
    pub value: i64,
    flows: HashMap<(NodeIndex, NodeIndex), i64>,
}

impl FlowResult {
    /// Flow carried by `from -> to` (zero for absent edges).
    pub fn flow(&self, from: NodeIndex, to: NodeIndex) -> i64 {
        self.flows.get(&(from, to)).copied().unwrap_or(0)
    }

    /// Edges carrying positive flow.
    pub fn positive_flows(&self) -> impl Iterator<Item = ((NodeIndex, NodeIndex), i64)> + '_ {
        self.flows.iter().map(|(&k, &v)| (k, v))
    }
}

/// A maximum-flow algorithm.
pub trait MaxFlowSolver: Send + Sync + Debug {
    /// Solver name (e.g., "dinitz").
    fn name(&self) -> &'static str;

    /// Computes a maximum `source -> sink` flow.
    fn max_flow(&self, network: &FlowNetwork, source: NodeIndex, sink: NodeIndex) -> FlowResult;
}

/// Built-in maximum-flow algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMethod {
    /// BFS augmenting paths.
    EdmondsKarp,
    /// Blocking flows on level graphs.
    Dinitz,
    /// FIFO push-relabel.
    #[default]
    PreflowPush,
    /// DFS augmenting paths.
    FordFulkerson,
    /// Augmenting paths along exact distance labels.
    ShortestAugmentingPath,
    /// Source and sink search trees, repaired after each augmentation.
    BoykovKolmogorov,
}

impl FlowMethod {
    /// Every built-in method.
    pub const ALL: [FlowMethod; 6] = [
        FlowMethod::EdmondsKarp,
        FlowMethod::Dinitz,
        FlowMethod::PreflowPush,
        FlowMethod::FordFulkerson,
        FlowMethod::ShortestAugmentingPath,
        FlowMethod::BoykovKolmogorov,
    ];
}

impl MaxFlowSolver for FlowMethod {
    fn name(&self) -> &'static str {
        match self {
            FlowMethod::EdmondsKarp => "edmonds_karp",
            FlowMethod::Dinitz => "dinitz",
            FlowMethod::PreflowPush => "preflow_push",
            FlowMethod::FordFulkerson => "ford_fulkerson",
            FlowMethod::ShortestAugmentingPath => "shortest_augmenting_path",
            FlowMethod::BoykovKolmogorov => "boykov_kolmogorov",
        }
    }

    fn max_flow(&self, network: &FlowNetwork, source: NodeIndex, sink: NodeIndex) -> FlowResult {
        let mut residual = Residual::build(network);
        let value = if source == sink {
            0
        } else {
            match self {
                FlowMethod::EdmondsKarp => residual.augment_paths(source, sink, SearchOrder::Breadth),
                FlowMethod::FordFulkerson => residual.augment_paths(source, sink, SearchOrder::Depth),
                FlowMethod::Dinitz => residual.dinitz(source, sink),
                FlowMethod::PreflowPush => residual.preflow_push(source, sink),
                FlowMethod::ShortestAugmentingPath => residual.shortest_augmenting_path(source, sink),
                FlowMethod::BoykovKolmogorov => residual.boykov_kolmogorov(source, sink),
            }
        };
        tracing::trace!(method = self.name(), value, "max flow computed");
        residual.into_result(network, value)
    }
}

#[derive(Debug, Clone, Copy)]
enum SearchOrder {
    Breadth,
    Depth,
}

/// Membership of a node in the Boykov-Kolmogorov search trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tree {
    Free,
    Source,
    Sink,
}

/// Residual graph: arc `2k` is edge `k`, arc `2k + 1` its reverse.
struct Residual {
    head: Vec<NodeIndex>,
    cap: Vec<i64>,
    adj: Vec<Vec<usize>>,
}

impl Residual {
    fn build(network: &FlowNetwork) -> Self {
        let mut head = Vec::with_capacity(network.edges.len() * 2);
        let mut cap = Vec::with_capacity(network.edges.len() * 2);
        let mut adj = vec![Vec::new(); network.node_count];

        for edge in &network.edges {
            adj[edge.from].push(head.len());
            head.push(edge.to);
            cap.push(edge.capacity);

            adj[edge.to].push(head.len());
            head.push(edge.from);
            cap.push(0);
        }

        Self { head, cap, adj }
    }

    #[inline]
    fn tail(&self, arc: usize) -> NodeIndex {
        self.head[arc ^ 1]
    }

    #[inline]
    fn push(&mut self, arc: usize, amount: i64) {
        self.cap[arc] -= amount;
        self.cap[arc ^ 1] += amount;
    }

    fn into_result(self, network: &FlowNetwork, value: i64) -> FlowResult {
        let flows = network
            .edges
            .iter()
            .enumerate()
            .filter_map(|(k, e)| {
                let f = e.capacity - self.cap[2 * k];
                (f > 0).then_some(((e.from, e.to), f))
            })
            .collect();
        FlowResult { value, flows }
    }

    /// Repeated augmenting paths (Edmonds-Karp or Ford-Fulkerson).
    fn augment_paths(&mut self, source: NodeIndex, sink: NodeIndex, order: SearchOrder) -> i64 {
        let mut total = 0;
        while let Some(path) = self.find_path(source, sink, order) {
            let bottleneck = path.iter().map(|&a| self.cap[a]).min().unwrap_or(0);
            for &arc in &path {
                self.push(arc, bottleneck);
            }
            total += bottleneck;
        }
        total
    }

    fn find_path(&self, source: NodeIndex, sink: NodeIndex, order: SearchOrder) -> Option<Vec<usize>> {
        let n = self.adj.len();
        let mut pred: Vec<Option<usize>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut frontier = VecDeque::from([source]);
        visited[source] = true;

        while let Some(u) = match order {
            SearchOrder::Breadth => frontier.pop_front(),
            SearchOrder::Depth => frontier.pop_back(),
        } {
            if u == sink {
                break;
            }
            for &arc in &self.adj[u] {
                let v = self.head[arc];
                if !visited[v] && self.cap[arc] > 0 {
                    visited[v] = true;
                    pred[v] = Some(arc);
                    frontier.push_back(v);
                }
            }
        }

        if !visited[sink] {
            return None;
        }

        let mut path = Vec::new();
        let mut v = sink;
        while let Some(arc) = pred[v] {
            path.push(arc);
            v = self.tail(arc);
        }
        Some(path)
    }

    fn dinitz(&mut self, source: NodeIndex, sink: NodeIndex) -> i64 {
        let n = self.adj.len();
        let mut total = 0;

        loop {
            let mut level = vec![usize::MAX; n];
            level[source] = 0;
            let mut queue = VecDeque::from([source]);
            while let Some(u) = queue.pop_front() {
                for &arc in &self.adj[u] {
                    let v = self.head[arc];
                    if level[v] == usize::MAX && self.cap[arc] > 0 {
                        level[v] = level[u] + 1;
                        queue.push_back(v);
                    }
                }
            }
            if level[sink] == usize::MAX {
                return total;
            }

            let mut next_arc = vec![0usize; n];
            loop {
                let pushed = self.blocking_dfs(source, sink, i64::MAX, &level, &mut next_arc);
                if pushed == 0 {
                    break;
                }
                total += pushed;
            }
        }
    }

    fn blocking_dfs(
        &mut self,
        u: NodeIndex,
        sink: NodeIndex,
        limit: i64,
        level: &[usize],
        next_arc: &mut [usize],
    ) -> i64 {
        if u == sink {
            return limit;
        }
        while next_arc[u] < self.adj[u].len() {
            let arc = self.adj[u][next_arc[u]];
            let v = self.head[arc];
            if self.cap[arc] > 0 && level[v] == level[u] + 1 {
                let pushed = self.blocking_dfs(v, sink, limit.min(self.cap[arc]), level, next_arc);
                if pushed > 0 {
                    self.push(arc, pushed);
                    return pushed;
                }
            }
            next_arc[u] += 1;
        }
        0
    }

    fn preflow_push(&mut self, source: NodeIndex, sink: NodeIndex) -> i64 {
        let n = self.adj.len();
        let mut height = vec![0usize; n];
        let mut excess = vec![0i64; n];
        let mut queued = vec![false; n];
        let mut active = VecDeque::new();
        height[source] = n;

        for idx in 0..self.adj[source].len() {
            let arc = self.adj[source][idx];
            let amount = self.cap[arc];
            if amount <= 0 {
                continue;
            }
            let v = self.head[arc];
            self.push(arc, amount);
            excess[v] += amount;
            excess[source] -= amount;
            if v != source && v != sink && !queued[v] {
                queued[v] = true;
                active.push_back(v);
            }
        }

        while let Some(u) = active.pop_front() {
            queued[u] = false;

            while excess[u] > 0 {
                for idx in 0..self.adj[u].len() {
                    let arc = self.adj[u][idx];
                    let v = self.head[arc];
                    if self.cap[arc] <= 0 || height[u] != height[v] + 1 {
                        continue;
                    }
                    let amount = excess[u].min(self.cap[arc]);
                    self.push(arc, amount);
                    excess[u] -= amount;
                    excess[v] += amount;
                    if v != source && v != sink && !queued[v] {
                        queued[v] = true;
                        active.push_back(v);
                    }
                    if excess[u] == 0 {
                        break;
                    }
                }

                if excess[u] > 0 {
                    let lowest = self.adj[u]
                        .iter()
                        .filter(|&&arc| self.cap[arc] > 0)
                        .map(|&arc| height[self.head[arc]])
                        .min();
                    match lowest {
                        Some(h) => height[u] = h + 1,
                        None => break,
                    }
                }
            }
        }

        excess[sink]
    }

    fn shortest_augmenting_path(&mut self, source: NodeIndex, sink: NodeIndex) -> i64 {
        let n = self.adj.len();

        // Exact distances to the sink; unreachable nodes get `n`.
        let mut dist = vec![n; n];
        dist[sink] = 0;
        let mut queue = VecDeque::from([sink]);
        while let Some(v) = queue.pop_front() {
            for &arc in &self.adj[v] {
                let u = self.head[arc];
                if dist[u] == n && self.cap[arc ^ 1] > 0 {
                    dist[u] = dist[v] + 1;
                    queue.push_back(u);
                }
            }
        }

        let mut count = vec![0usize; n + 1];
        for &d in &dist {
            count[d] += 1;
        }

        let mut current = vec![0usize; n];
        let mut path: Vec<usize> = Vec::new();
        let mut total = 0;
        let mut u = source;
        while dist[source] < n {
            if u == sink {
                let bottleneck = path.iter().map(|&a| self.cap[a]).min().unwrap_or(0);
                for &arc in &path {
                    self.push(arc, bottleneck);
                }
                total += bottleneck;
                path.clear();
                u = source;
                continue;
            }

            let admissible = self.adj[u][current[u]..]
                .iter()
                .position(|&arc| self.cap[arc] > 0 && dist[u] == dist[self.head[arc]] + 1);
            if let Some(offset) = admissible {
                current[u] += offset;
                let arc = self.adj[u][current[u]];
                path.push(arc);
                u = self.head[arc];
                continue;
            }

            let relabel = self.adj[u]
                .iter()
                .filter(|&&arc| self.cap[arc] > 0)
                .map(|&arc| dist[self.head[arc]] + 1)
                .min()
                .unwrap_or(n)
                .min(n);
            count[dist[u]] -= 1;
            if count[dist[u]] == 0 {
                // No node is left at this distance, so the sink is cut off.
                break;
            }
            dist[u] = relabel;
            count[relabel] += 1;
            current[u] = 0;
            if let Some(arc) = path.pop() {
                u = self.tail(arc);
            }
        }
        total
    }

    /// Tree parents are stored as arcs pointing along the flow: into the
    /// node for the source tree, out of it for the sink tree.
    fn boykov_kolmogorov(&mut self, source: NodeIndex, sink: NodeIndex) -> i64 {
        let n = self.adj.len();
        let mut tree = vec![Tree::Free; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut active = VecDeque::from([source, sink]);
        let mut orphans = Vec::new();
        tree[source] = Tree::Source;
        tree[sink] = Tree::Sink;
        let mut total = 0;

        loop {
            let Some(bridge) = self.grow_trees(&mut tree, &mut parent, &mut active) else {
                return total;
            };

            let mut path = vec![bridge];
            let mut v = self.tail(bridge);
            while let Some(arc) = parent[v] {
                path.push(arc);
                v = self.tail(arc);
            }
            v = self.head[bridge];
            while let Some(arc) = parent[v] {
                path.push(arc);
                v = self.head[arc];
            }

            let bottleneck = path.iter().map(|&a| self.cap[a]).min().unwrap_or(0);
            for &arc in &path {
                self.push(arc, bottleneck);
            }
            total += bottleneck;

            for &arc in &path[1..] {
                if self.cap[arc] > 0 {
                    continue;
                }
                let child = match tree[self.tail(arc)] {
                    Tree::Source => self.head[arc],
                    _ => self.tail(arc),
                };
                parent[child] = None;
                orphans.push(child);
            }

            while let Some(orphan) = orphans.pop() {
                self.adopt(orphan, &mut tree, &mut parent, &mut active, &mut orphans, source, sink);
            }
        }
    }

    /// Grows both trees from the active nodes until they touch. Returns
    /// the arc from the source tree into the sink tree.
    fn grow_trees(
        &self,
        tree: &mut [Tree],
        parent: &mut [Option<usize>],
        active: &mut VecDeque<NodeIndex>,
    ) -> Option<usize> {
        while let Some(&p) = active.front() {
            let side = tree[p];
            if side == Tree::Free {
                active.pop_front();
                continue;
            }
            for &arc in &self.adj[p] {
                let q = self.head[arc];
                let along = if side == Tree::Source { arc } else { arc ^ 1 };
                if self.cap[along] <= 0 {
                    continue;
                }
                if tree[q] == Tree::Free {
                    tree[q] = side;
                    parent[q] = Some(along);
                    active.push_back(q);
                } else if tree[q] != side {
                    return Some(along);
                }
            }
            active.pop_front();
        }
        None
    }

    /// Finds a new parent for `orphan` or frees it, orphaning its children.
    #[allow(clippy::too_many_arguments)]
    fn adopt(
        &self,
        orphan: NodeIndex,
        tree: &mut [Tree],
        parent: &mut [Option<usize>],
        active: &mut VecDeque<NodeIndex>,
        orphans: &mut Vec<NodeIndex>,
        source: NodeIndex,
        sink: NodeIndex,
    ) {
        let side = tree[orphan];
        let (members, parents) = (&*tree, &*parent);
        let adopted = self.adj[orphan].iter().find_map(|&arc| {
            let q = self.head[arc];
            let into = if side == Tree::Source { arc ^ 1 } else { arc };
            (members[q] == side
                && self.cap[into] > 0
                && self.is_rooted(q, members, parents, source, sink))
            .then_some(into)
        });
        if adopted.is_some() {
            parent[orphan] = adopted;
            return;
        }

        for &arc in &self.adj[orphan] {
            let q = self.head[arc];
            if tree[q] != side {
                continue;
            }
            let hangs_below = parent[q].is_some_and(|pa| match side {
                Tree::Source => self.tail(pa) == orphan,
                _ => self.head[pa] == orphan,
            });
            if hangs_below {
                parent[q] = None;
                orphans.push(q);
            }
            let toward = if side == Tree::Source { arc ^ 1 } else { arc };
            if self.cap[toward] > 0 {
                active.push_back(q);
            }
        }
        tree[orphan] = Tree::Free;
    }

    /// Whether the parent chain of `v` ends at a terminal.
    fn is_rooted(
        &self,
        mut v: NodeIndex,
        tree: &[Tree],
        parent: &[Option<usize>],
        source: NodeIndex,
        sink: NodeIndex,
    ) -> bool {
        loop {
            if v == source || v == sink {
                return true;
            }
            let Some(arc) = parent[v] else {
                return false;
            };
            v = match tree[v] {
                Tree::Source => self.tail(arc),
                _ => self.head[arc],
            };
        }
    }
}
