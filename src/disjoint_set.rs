//! Disjoint-set forest over timestamps.
//!
//! Used by lazy activation to contract saturated deadlines: every
//! element carries a timestamp value, and resolving an element yields the
//! value stored on its set's root.
//!
//! # Orientation
//! A union leaves the smaller of the two roots' values on the new root.
//! Union by rank decides which node becomes the structural root; the
//! minimum value is then moved onto it, so the orientation never depends
//! on argument order. Unless [`DisjointSetForest::set_value`] lowers a
//! root in between, a root therefore holds the smallest original value
//! of its set.
//!
//! # Reference
//! Tarjan (1975), "Efficiency of a Good But Not Linear Set Union Algorithm"

/// Union-find with path compression, union by rank and min-value roots.
#[derive(Debug, Clone)]
pub struct DisjointSetForest {
    parent: Vec<usize>,
    rank: Vec<u8>,
    value: Vec<i64>,
}

impl DisjointSetForest {
    /// Creates one singleton set per value.
    pub fn new(values: impl IntoIterator<Item = i64>) -> Self {
        let value: Vec<i64> = values.into_iter().collect();
        Self {
            parent: (0..value.len()).collect(),
            rank: vec![0; value.len()],
            value,
        }
    }

    /// Singleton sets for every timestamp of `[first, last]`, element
    /// `i` holding `first + i`.
    pub fn over_range(first: i64, last: i64) -> Self {
        Self::new(first..=last)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Finds the root of `x`, compressing the path on the way.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    /// Value held by the root of `x`'s set.
    pub fn resolve(&mut self, x: usize) -> i64 {
        let root = self.find(x);
        self.value[root]
    }

    /// Replaces the value held by the root of `x`'s set.
    pub fn set_value(&mut self, x: usize, value: i64) {
        let root = self.find(x);
        self.value[root] = value;
    }

    /// Whether `a` and `b` belong to the same set.
    pub fn same_set(&mut self, a: usize, b: usize) -> bool {
        self.find(a) == self.find(b)
    }

    /// Unites the sets of `a` and `b`. No-op if already united.
    ///
    /// The resulting root holds the minimum of both roots' values.
    pub fn unite(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }

        let min_value = self.value[ra].min(self.value[rb]);
        let (root, child) = match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => (rb, ra),
            std::cmp::Ordering::Greater => (ra, rb),
            std::cmp::Ordering::Equal => {
                self.rank[ra] += 1;
                (ra, rb)
            }
        };
        self.parent[child] = root;
        self.value[root] = min_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_resolve_to_themselves() {
        let mut dsu = DisjointSetForest::over_range(10, 14);
        assert_eq!(dsu.len(), 5);
        for i in 0..5 {
            assert_eq!(dsu.find(i), i);
            assert_eq!(dsu.resolve(i), 10 + i as i64);
        }
    }

    #[test]
    fn test_root_holds_minimum_regardless_of_order() {
        let mut dsu = DisjointSetForest::over_range(0, 5);
        dsu.unite(4, 3);
        assert_eq!(dsu.resolve(4), 3);
        dsu.unite(2, 4);
        assert_eq!(dsu.resolve(4), 2);
        assert_eq!(dsu.resolve(3), 2);

        // Union from the low side: orientation must not depend on it.
        dsu.unite(1, 2);
        for i in 1..=4 {
            assert_eq!(dsu.resolve(i), 1);
        }
        assert_eq!(dsu.resolve(5), 5);
        assert_eq!(dsu.resolve(0), 0);
    }

    #[test]
    fn test_unite_is_idempotent() {
        let mut dsu = DisjointSetForest::new([7, 3, 9]);
        dsu.unite(0, 2);
        dsu.unite(2, 0);
        dsu.unite(0, 0);
        assert!(dsu.same_set(0, 2));
        assert!(!dsu.same_set(0, 1));
        assert_eq!(dsu.resolve(2), 7);
    }

    #[test]
    fn test_set_value_moves_with_root() {
        let mut dsu = DisjointSetForest::new([0, 10, 20]);
        dsu.set_value(2, 18);
        assert_eq!(dsu.resolve(2), 18);

        dsu.unite(2, 1);
        assert_eq!(dsu.resolve(2), 10);
        dsu.set_value(1, 9);
        assert_eq!(dsu.resolve(2), 9);
        assert_eq!(dsu.resolve(1), 9);
        assert_eq!(dsu.resolve(0), 0);
    }

    #[test]
    fn test_find_terminates_on_root() {
        let mut dsu = DisjointSetForest::over_range(0, 99);
        for i in (1..100).rev() {
            dsu.unite(i, i - 1);
        }
        let root = dsu.find(99);
        assert_eq!(dsu.find(root), root);
        assert_eq!(dsu.resolve(50), 0);
    }
}
