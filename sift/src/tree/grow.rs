//! Candidate generation: growing the tree by one level.

use basket::{Appearance, ItemId, Supp};

use crate::measures::Measure;
use crate::tree::node::{ChildSlots, Layout, Node, NodeId};
use crate::tree::{ItemsetTree, PathSupp};

impl ItemsetTree {
    /// Builds the next tree level from the counters of the current deepest
    /// level. Returns false when no candidate survives, leaving the tree
    /// unchanged apart from skip marks; the tree then cannot grow further
    /// for the configured thresholds.
    ///
    /// Candidate filtering per deepest node and counter pair:
    /// item-appearance filters, the direct support window
    /// (`supp..perfect-extension support`), the Apriori subset-support
    /// check over all one-smaller subsets, and the rule-body flags. When a
    /// measure with a prune depth is configured, the deepest counters are
    /// SKIP-flagged by evaluation before candidates are formed.
    pub fn add_level(&mut self) -> bool {
        let depth = self.height() - 1;
        let maxht = self.height() + 3;
        if self.buf.len() < maxht {
            self.buf.resize(maxht, 0);
        }

        // evaluation-based pruning of the deepest counters
        if self.eval.measure != Measure::None && self.height() >= self.eval.prune {
            for pos in 0..self.levels[depth].len() {
                let nid = self.levels[depth][pos];
                for i in 0..self.node(nid).size() {
                    let val = self.evaluate(nid, i);
                    if self.eval.dir * val < self.eval.thresh {
                        self.node_mut(nid).set_skip(i);
                    }
                }
            }
        }

        let mut new_level: Vec<NodeId> = Vec::new();
        for pos in 0..self.levels[depth].len() {
            let nid = self.levels[depth][pos];
            // support for a perfect extension: the support of the set
            // represented by the node itself
            let spx = if !self.perfect {
                Supp::MAX
            } else {
                match self.node(nid).parent {
                    None => self.wgt,
                    Some(par) => {
                        let pn = self.node(par);
                        match pn.counter_index(self.node(nid).item) {
                            Ok(i) => pn.cnts[i],
                            Err(_) => Supp::MAX,
                        }
                    }
                }
            };
            let first = new_level.len();
            for i in 0..self.node(nid).size() {
                if let Some(child) = self.make_child(nid, i, spx) {
                    new_level.push(child);
                }
            }
            if new_level.len() == first {
                // nothing grew below this node; counting passes skip it
                self.node_mut(nid).cut = true;
                continue;
            }
            let kids = &new_level[first..];
            let slots = match &self.node(nid).layout {
                Layout::Dense { .. } => {
                    let lo = self.node(kids[0]).item;
                    let hi = self.node(kids[kids.len() - 1]).item;
                    let mut slots: Vec<Option<NodeId>> = vec![None; hi - lo + 1];
                    for &c in kids {
                        slots[self.node(c).item - lo] = Some(c);
                    }
                    ChildSlots::Dense { first: lo, slots }
                }
                Layout::Sparse { .. } => ChildSlots::Packed {
                    slots: kids.iter().map(|&c| (self.node(c).item, c)).collect(),
                },
            };
            self.node_mut(nid).children = Some(slots);
        }
        if new_level.is_empty() {
            return false;
        }
        self.levels.push(new_level);
        // cut subtrees in which no leaf produced children
        self.mark_skippable(NodeId::ROOT);
        true
    }

    /// Creates the child node extending the set at (`nid`, `index`), or
    /// nothing when no candidate item survives the filters.
    fn make_child(&mut self, nid: NodeId, index: usize, spx: Supp) -> Option<NodeId> {
        let maxht = self.buf.len();
        let (item, hdonly, set_body) = {
            let node = self.node(nid);
            let s_set = node.cnts[index];
            if node.skipped(index) || s_set < self.supp || s_set >= spx {
                return None;
            }
            let item = node.item_at(index);
            let app = self.apps[item];
            if app == Appearance::Ignore {
                return None;
            }
            // a set with two head-only items can be neither rule body
            // nor consequent
            if app == Appearance::Head && node.head_only {
                return None;
            }
            (
                item,
                node.head_only || app == Appearance::Head,
                s_set >= self.rule,
            )
        };
        self.buf[maxht - 2] = item;
        let mut map: Vec<ItemId> = Vec::new();
        for j in index + 1..self.node(nid).size() {
            let node = self.node(nid);
            let cand = node.item_at(j);
            let app = self.apps[cand];
            if app == Appearance::Ignore || (hdonly && app == Appearance::Head) {
                continue;
            }
            let s_cand = node.cnts[j];
            if node.skipped(j) || s_cand < self.supp || s_cand >= spx {
                continue;
            }
            let mut body = if set_body { 1u8 } else { 0 };
            if s_cand >= self.rule {
                body |= 2;
            }
            // check all subsets obtained by dropping one ancestor item
            self.buf[maxht - 1] = cand;
            let mut p = maxht - 2;
            let mut curr = nid;
            let passed = loop {
                let par = match self.node(curr).parent {
                    Some(par) => par,
                    None => break true,
                };
                match self.path_support(par, &self.buf[p..maxht]) {
                    PathSupp::Counted { supp, skip } if !skip && supp >= self.supp => {
                        if supp >= self.rule {
                            body |= 4;
                        }
                    }
                    _ => break false,
                }
                p -= 1;
                let edge = self.node(curr).item;
                self.buf[p] = edge;
                curr = par;
            };
            if passed && body != 0 {
                map.push(cand);
            }
        }
        if map.is_empty() {
            return None;
        }
        let n = map.len();
        let span = map[n - 1] - map[0] + 1;
        let (layout, size) = if 2 * n >= span {
            (Layout::Dense { offset: map[0] }, span)
        } else {
            (Layout::Sparse { map }, n)
        };
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Node::new(Some(nid), item, hdonly, layout, size));
        Some(id)
    }

    /// Bottom-up check marking every subtree in which no leaf can still
    /// grow; counting passes cut those subtrees. Returns whether the
    /// subtree is still needed.
    fn mark_skippable(&mut self, nid: NodeId) -> bool {
        if self.node(nid).cut {
            return false;
        }
        let kids: Vec<NodeId> = match &self.node(nid).children {
            None => return true,
            Some(ChildSlots::Dense { slots, .. }) => slots.iter().copied().flatten().collect(),
            Some(ChildSlots::Packed { slots }) => slots.iter().map(|&(_, c)| c).collect(),
        };
        let mut needed = false;
        for child in kids {
            needed |= self.mark_skippable(child);
        }
        if !needed {
            self.node_mut(nid).cut = true;
        }
        needed
    }
}
