//! Post-count compaction of the deepest level.

use vob::Vob;

use basket::ItemId;

use crate::tree::node::{ChildSlots, Layout, Node, NodeId};
use crate::tree::ItemsetTree;

impl ItemsetTree {
    /// Compacts the deepest level after a counting pass: counter windows
    /// shrink to their frequent range, parents drop pointers to emptied
    /// children, and nodes without any surviving counter leave the level.
    /// Nodes of shallower levels are never touched, so the supports needed
    /// for subset checks and rule bodies stay available.
    pub fn prune(&mut self) {
        if self.height() <= 1 {
            return;
        }
        let deepest = self.height() - 1;
        let supp = self.supp;

        // shrink the counter windows of the deepest nodes
        for pos in 0..self.levels[deepest].len() {
            let nid = self.levels[deepest][pos];
            let node = self.node_mut(nid);
            let frequent =
                |node: &Node, i: usize| -> bool { node.cnts[i] >= supp && !node.skipped(i) };
            match node.layout {
                Layout::Dense { .. } => {
                    let mut hi = node.size();
                    while hi > 0 && !frequent(node, hi - 1) {
                        hi -= 1;
                    }
                    let mut lo = 0;
                    while lo < hi && !frequent(node, lo) {
                        lo += 1;
                    }
                    node.shrink_dense(lo, hi);
                }
                Layout::Sparse { .. } => {
                    let mut keep = Vec::new();
                    for i in 0..node.size() {
                        if frequent(node, i) {
                            keep.push(i);
                        }
                    }
                    let Node { layout, cnts, skip, .. } = node;
                    if let Layout::Sparse { map } = layout {
                        for (k, &i) in keep.iter().enumerate() {
                            cnts[k] = cnts[i];
                            map[k] = map[i];
                        }
                        cnts.truncate(keep.len());
                        map.truncate(keep.len());
                    }
                    *skip = Vob::from_elem(keep.len(), false);
                }
            }
        }

        // compact the child arrays of the parent level
        let parents = deepest - 1;
        for pos in 0..self.levels[parents].len() {
            let pid = self.levels[parents][pos];
            let alive = |c: Option<NodeId>| match c {
                Some(id) => self.node(id).size() > 0,
                None => false,
            };
            let rebuilt: Option<Option<ChildSlots>> = match &self.node(pid).children {
                None => None,
                Some(ChildSlots::Dense { first, slots }) => {
                    let mut hi = slots.len();
                    while hi > 0 && !alive(slots[hi - 1]) {
                        hi -= 1;
                    }
                    let mut lo = 0;
                    while lo < hi && !alive(slots[lo]) {
                        lo += 1;
                    }
                    if lo >= hi {
                        Some(None)
                    } else {
                        let window: Vec<Option<NodeId>> = slots[lo..hi]
                            .iter()
                            .map(|&c| c.filter(|&id| self.node(id).size() > 0))
                            .collect();
                        Some(Some(ChildSlots::Dense {
                            first: first + lo,
                            slots: window,
                        }))
                    }
                }
                Some(ChildSlots::Packed { slots }) => {
                    let window: Vec<(ItemId, NodeId)> = slots
                        .iter()
                        .copied()
                        .filter(|&(_, c)| self.node(c).size() > 0)
                        .collect();
                    if window.is_empty() {
                        Some(None)
                    } else {
                        Some(Some(ChildSlots::Packed { slots: window }))
                    }
                }
            };
            match rebuilt {
                None => {}
                Some(Some(slots)) => self.node_mut(pid).children = Some(slots),
                Some(None) => {
                    // every child vanished; cut the node for counting
                    let node = self.node_mut(pid);
                    node.children = None;
                    node.cut = true;
                }
            }
        }

        // drop emptied nodes from the level list
        let mut level = std::mem::take(&mut self.levels[deepest]);
        level.retain(|&nid| self.nodes[nid.0].size() > 0);
        self.levels[deepest] = level;
    }
}
