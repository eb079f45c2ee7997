//! The prefix-compressed transaction tree.
//!
//! Transactions sharing a common prefix are represented by a single branch,
//! so a counting pass over the tree visits every shared prefix only once
//! instead of once per transaction. Nodes carry the summed weight of all
//! transactions below them and a depth hint (`max`) with the length of the
//! longest remaining suffix, which lets a counting pass cut branches that
//! are too short to matter.

use itertools::Itertools;

use crate::{ItemId, Supp, TransactionBag};

/// Index handle of a node in a [`TaTree`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TaNodeId(usize);

/// What a node holds below itself.
#[derive(Clone, Debug)]
pub enum TaKind {
    /// A single remaining transaction suffix (ascending items).
    Leaf(Vec<ItemId>),
    /// Edges to child nodes, ascending by edge item.
    Branch(Vec<(ItemId, TaNodeId)>),
}

#[derive(Clone, Debug)]
pub struct TaNode {
    wgt: Supp,
    max: usize,
    kind: TaKind,
}

impl TaNode {
    /// Summed weight of all transactions represented below this node.
    #[inline]
    pub fn wgt(&self) -> Supp {
        self.wgt
    }

    /// Length of the longest transaction suffix below this node.
    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    #[inline]
    pub fn kind(&self) -> &TaKind {
        &self.kind
    }
}

/// A prefix tree over the transactions of a bag. Owns its nodes in a flat
/// arena; edges are index handles.
#[derive(Clone, Debug)]
pub struct TaTree {
    nodes: Vec<TaNode>,
    root: TaNodeId,
}

impl TaTree {
    /// Builds the tree for `bag`. The bag itself is left untouched; the
    /// tree holds copies of the (suffix) item lists it needs.
    pub fn build(bag: &TransactionBag) -> Self {
        let mut sorted: Vec<(&[ItemId], Supp)> =
            bag.tracts().iter().map(|t| (t.items(), t.wgt())).collect();
        sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
        let mut nodes = Vec::new();
        let root = Self::build_node(&mut nodes, &sorted, 0);
        Self { nodes, root }
    }

    /// Recursively builds the node for a sorted group of transactions that
    /// share the first `depth` items.
    fn build_node(nodes: &mut Vec<TaNode>, group: &[(&[ItemId], Supp)], depth: usize) -> TaNodeId {
        let wgt = group.iter().map(|&(_, w)| w).sum();
        let max = group
            .iter()
            .map(|&(items, _)| items.len() - depth)
            .max()
            .unwrap_or(0);
        let kind = if group.len() == 1 {
            TaKind::Leaf(group[0].0[depth..].to_vec())
        } else {
            let mut edges = Vec::new();
            let groups = group
                .iter()
                .copied()
                .group_by(|&(items, _)| items.get(depth).copied());
            for (key, sub) in &groups {
                let sub: Vec<(&[ItemId], Supp)> = sub.collect();
                // transactions ending exactly here only contribute weight
                if let Some(item) = key {
                    let child = Self::build_node(nodes, &sub, depth + 1);
                    edges.push((item, child));
                }
            }
            TaKind::Branch(edges)
        };
        let id = TaNodeId(nodes.len());
        nodes.push(TaNode { wgt, max, kind });
        id
    }

    #[inline]
    pub fn root(&self) -> TaNodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: TaNodeId) -> &TaNode {
        &self.nodes[id.0]
    }

    /// Number of nodes in the tree.
    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ItemBase;

    fn bag_of(data: &[(&[ItemId], Supp)]) -> TransactionBag {
        let max_item = data
            .iter()
            .flat_map(|(items, _)| items.iter().copied())
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        let mut base = ItemBase::with_item_count(max_item);
        let mut bag = TransactionBag::new();
        for &(items, wgt) in data {
            bag.push(&mut base, items, wgt);
        }
        bag
    }

    #[test]
    fn shared_prefixes_are_merged() {
        let bag = bag_of(&[(&[0, 1, 2], 2), (&[0, 1, 3], 1), (&[4], 5)]);
        let tree = TaTree::build(&bag);
        let root = tree.node(tree.root());
        assert_eq!(root.wgt(), 8);
        assert_eq!(root.max(), 3);
        let edges = match root.kind() {
            TaKind::Branch(edges) => edges,
            TaKind::Leaf(_) => panic!("root must branch"),
        };
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].0, 0);
        assert_eq!(edges[1].0, 4);
        // the shared prefix 0 1 carries the combined weight
        let below0 = tree.node(edges[0].1);
        assert_eq!(below0.wgt(), 3);
        assert_eq!(below0.max(), 2);
    }

    #[test]
    fn single_transaction_becomes_a_leaf() {
        let bag = bag_of(&[(&[1, 2, 3], 7)]);
        let tree = TaTree::build(&bag);
        match tree.node(tree.root()).kind() {
            TaKind::Leaf(suffix) => assert_eq!(suffix.as_slice(), &[1, 2, 3]),
            TaKind::Branch(_) => panic!("expected a leaf"),
        }
        assert_eq!(tree.node(tree.root()).wgt(), 7);
    }

    #[test]
    fn transaction_ending_at_branch_contributes_weight_only() {
        let bag = bag_of(&[(&[0], 4), (&[0, 1], 1), (&[0, 2], 1)]);
        let tree = TaTree::build(&bag);
        let edges = match tree.node(tree.root()).kind() {
            TaKind::Branch(edges) => edges.clone(),
            TaKind::Leaf(_) => panic!("root must branch"),
        };
        assert_eq!(edges.len(), 1);
        let below0 = tree.node(edges[0].1);
        assert_eq!(below0.wgt(), 6);
        match below0.kind() {
            TaKind::Branch(e2) => {
                assert_eq!(e2.len(), 2);
                assert_eq!(tree.node(e2[0].1).wgt(), 1);
            }
            TaKind::Leaf(_) => panic!("prefix 0 must branch"),
        }
    }
}
