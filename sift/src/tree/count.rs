//! Transaction counting.
//!
//! The counting walks are read-only on the transaction source and
//! write-only on the counter cells of the deepest tree level; they never
//! allocate and never change the tree structure, so a counting pass can be
//! repeated or aborted at any point without corrupting the tree.

use basket::{ItemId, Supp, TaKind, TaNodeId, TaTree, TransactionBag};

use crate::tree::node::{ChildSlots, Layout, Node, NodeId};
use crate::tree::ItemsetTree;

/// Copy of the child-array shape of a node, taken before recursing so the
/// arena can be borrowed mutably inside the loop.
enum Kids {
    Dense { first: ItemId, len: usize },
    Packed { first: ItemId, last: ItemId },
}

impl ItemsetTree {
    /// Counts a single transaction: adds `wgt` to the counter of every
    /// item set of size `height` contained in `items` (ascending, unique).
    pub fn count_transaction(&mut self, items: &[ItemId], wgt: Supp) {
        let min = self.height();
        if items.len() >= min {
            self.count_node(NodeId::ROOT, items, wgt, min);
        }
    }

    /// Counts every transaction of a bag. Transactions shorter than the
    /// current height cannot reach the deepest level and are skipped.
    pub fn count_bag(&mut self, bag: &TransactionBag) {
        if bag.max() < self.height() {
            return;
        }
        let min = self.height();
        for idx in 0..bag.cnt() {
            let t = bag.tract(idx);
            if t.size() >= min {
                self.count_node(NodeId::ROOT, t.items(), t.wgt(), min);
            }
        }
    }

    /// Counts a prefix-compressed transaction tree; every shared prefix is
    /// walked only once, with the summed weight of the transactions below
    /// it.
    pub fn count_tree(&mut self, tatree: &TaTree) {
        let min = self.height();
        self.count_tree_node(tatree, tatree.root(), NodeId::ROOT, min);
    }

    /// Recursive walk of one node against the item suffix of one
    /// transaction; `min` is the depth still to travel before weights are
    /// deposited.
    fn count_node(&mut self, nid: NodeId, items: &[ItemId], wgt: Supp, min: usize) {
        if self.node(nid).cut {
            return;
        }
        if self.node(nid).children.is_none() {
            self.deposit(nid, items, wgt);
            return;
        }
        debug_assert!(min >= 1, "interior nodes sit above the deposit depth");
        let kids = match self.kids(nid) {
            Some(kids) => kids,
            None => return,
        };
        let min2 = min - 1;
        match kids {
            Kids::Dense { first, len } => {
                let mut idx = 0;
                while items.len() - idx >= min && items[idx] < first {
                    idx += 1;
                }
                while items.len() - idx > min2 {
                    let it = items[idx];
                    idx += 1;
                    let off = it - first;
                    if off >= len {
                        return;
                    }
                    if let Some(child) = self.dense_child(nid, off) {
                        self.count_node(child, &items[idx..], wgt, min2);
                    }
                }
            }
            Kids::Packed { first, last } => {
                let mut idx = 0;
                while items.len() - idx >= min && items[idx] < first {
                    idx += 1;
                }
                while items.len() - idx > min2 {
                    let it = items[idx];
                    idx += 1;
                    if it > last {
                        return;
                    }
                    if let Some(child) = self.packed_child(nid, it) {
                        self.count_node(child, &items[idx..], wgt, min2);
                    }
                }
            }
        }
    }

    /// Recursive walk of one tree node against one transaction-tree node.
    fn count_tree_node(&mut self, tatree: &TaTree, tn: TaNodeId, nid: NodeId, min: usize) {
        let tnode = tatree.node(tn);
        if tnode.max() < min {
            return;
        }
        let edges = match tnode.kind() {
            TaKind::Leaf(suffix) => {
                self.count_node(nid, suffix, tnode.wgt(), min);
                return;
            }
            TaKind::Branch(edges) => edges,
        };
        // deeper item sets first: the same node against every suffix group
        for &(_, tchild) in edges {
            self.count_tree_node(tatree, tchild, nid, min);
        }
        if self.node(nid).cut {
            return;
        }
        if self.node(nid).children.is_none() {
            // deposit the weights of the suffix groups at matching counters
            enum Window {
                Dense { o: ItemId, size: usize },
                Sparse { lo: ItemId, hi: ItemId },
            }
            let win = {
                let node = self.node(nid);
                match &node.layout {
                    Layout::Dense { offset } => Window::Dense {
                        o: *offset,
                        size: node.size(),
                    },
                    Layout::Sparse { map } => {
                        if map.is_empty() {
                            return;
                        }
                        Window::Sparse {
                            lo: map[0],
                            hi: map[map.len() - 1],
                        }
                    }
                }
            };
            match win {
                Window::Dense { o, size } => {
                    for &(it, tchild) in edges {
                        if it < o {
                            continue;
                        }
                        if it - o >= size {
                            break;
                        }
                        let w = tatree.node(tchild).wgt();
                        self.node_mut(nid).cnts[it - o] += w;
                    }
                }
                Window::Sparse { lo, hi } => {
                    for &(it, tchild) in edges {
                        if it < lo {
                            continue;
                        }
                        if it > hi {
                            break;
                        }
                        if let Ok(i) = self.counter_lookup(nid, it) {
                            let w = tatree.node(tchild).wgt();
                            self.node_mut(nid).cnts[i] += w;
                        }
                    }
                }
            }
            return;
        }
        let kids = match self.kids(nid) {
            Some(kids) => kids,
            None => return,
        };
        let min2 = min - 1;
        match kids {
            Kids::Dense { first, len } => {
                for &(it, tchild) in edges {
                    if it < first {
                        continue;
                    }
                    if it - first >= len {
                        break;
                    }
                    if let Some(child) = self.dense_child(nid, it - first) {
                        self.count_tree_node(tatree, tchild, child, min2);
                    }
                }
            }
            Kids::Packed { first, last } => {
                for &(it, tchild) in edges {
                    if it < first {
                        continue;
                    }
                    if it > last {
                        break;
                    }
                    if let Some(child) = self.packed_child(nid, it) {
                        self.count_tree_node(tatree, tchild, child, min2);
                    }
                }
            }
        }
    }

    /// Adds `wgt` to every counter of a leaf node whose item occurs in the
    /// transaction suffix.
    fn deposit(&mut self, nid: NodeId, items: &[ItemId], wgt: Supp) {
        let node = self.node_mut(nid);
        let Node { layout, cnts, .. } = node;
        match layout {
            Layout::Dense { offset } => {
                let o = *offset;
                let size = cnts.len();
                let mut idx = 0;
                while idx < items.len() && items[idx] < o {
                    idx += 1;
                }
                for &it in &items[idx..] {
                    if it - o >= size {
                        return;
                    }
                    cnts[it - o] += wgt;
                }
            }
            Layout::Sparse { map } => {
                if map.is_empty() {
                    return;
                }
                let lo = map[0];
                let hi = map[map.len() - 1];
                let mut idx = 0;
                while idx < items.len() && items[idx] < lo {
                    idx += 1;
                }
                for &it in &items[idx..] {
                    if it > hi {
                        return;
                    }
                    if let Ok(i) = map.binary_search(&it) {
                        cnts[i] += wgt;
                    }
                }
            }
        }
    }

    fn kids(&self, nid: NodeId) -> Option<Kids> {
        match self.node(nid).children.as_ref() {
            Some(ChildSlots::Dense { first, slots }) => Some(Kids::Dense {
                first: *first,
                len: slots.len(),
            }),
            Some(ChildSlots::Packed { slots }) => slots.first().map(|&(first, _)| Kids::Packed {
                first,
                last: slots[slots.len() - 1].0,
            }),
            None => None,
        }
    }

    fn dense_child(&self, nid: NodeId, off: usize) -> Option<NodeId> {
        match self.node(nid).children.as_ref() {
            Some(ChildSlots::Dense { slots, .. }) => slots.get(off).copied().flatten(),
            _ => None,
        }
    }

    fn packed_child(&self, nid: NodeId, item: ItemId) -> Option<NodeId> {
        match self.node(nid).children.as_ref() {
            Some(ChildSlots::Packed { slots }) => slots
                .binary_search_by_key(&item, |&(it, _)| it)
                .ok()
                .map(|i| slots[i].1),
            _ => None,
        }
    }

    fn counter_lookup(&self, nid: NodeId, item: ItemId) -> Result<usize, usize> {
        self.node(nid).counter_index(item)
    }
}
