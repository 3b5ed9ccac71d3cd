//! Disjoint-set forest used to flatten a dendrogram at a cut height.

#[derive(Clone, Debug)]
pub(super) struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSet {
    pub(super) fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub(super) fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while let Some(&parent) = self.parent.get(root) {
            if parent == root {
                break;
            }
            root = parent;
        }
        while let Some(&parent) = self.parent.get(node) {
            if parent == root || parent == node {
                break;
            }
            if let Some(slot) = self.parent.get_mut(node) {
                *slot = root;
            }
            node = parent;
        }
        root
    }

    /// Joins the sets of `left` and `right`, attaching the smaller tree
    /// under the larger one. Returns the surviving root.
    pub(super) fn union(&mut self, left: usize, right: usize) -> usize {
        let mut big = self.find(left);
        let mut small = self.find(right);
        if big == small {
            return big;
        }
        let size_of = |set: &Self, node: usize| set.size.get(node).copied().unwrap_or(1);
        if size_of(self, big) < size_of(self, small) {
            std::mem::swap(&mut big, &mut small);
        }
        let merged = size_of(self, big) + size_of(self, small);
        if let Some(slot) = self.parent.get_mut(small) {
            *slot = big;
        }
        if let Some(slot) = self.size.get_mut(big) {
            *slot = merged;
        }
        big
    }
}
